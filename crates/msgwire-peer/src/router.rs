use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use msgwire_frame::FrameWriter;
use msgwire_transport::WireStream;
use tracing::debug;

use crate::error::Result;
use crate::message::Message;

/// A connection's writer half, shared between the dispatch path and every
/// [`Reply`] handed out for that connection.
pub(crate) type SharedWriter = Arc<Mutex<FrameWriter<WireStream>>>;

pub(crate) fn lock_writer(writer: &SharedWriter) -> MutexGuard<'_, FrameWriter<WireStream>> {
    match writer.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

type Handler = Arc<dyn Fn(Message, Reply) + Send + Sync>;

/// Dispatches inbound messages to handlers by their `type` field.
///
/// Built by application code before the listening socket opens, then shared
/// read-only across all connections. Several independent servers can each
/// carry their own router; there is no process-global registration.
#[derive(Clone, Default)]
pub struct Router {
    routes: HashMap<String, Vec<Handler>>,
    fallback: Vec<Handler>,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for messages carrying the given `type` tag.
    ///
    /// May be called repeatedly for the same tag; handlers run in
    /// registration order.
    pub fn on(
        mut self,
        kind: impl Into<String>,
        handler: impl Fn(Message, Reply) + Send + Sync + 'static,
    ) -> Self {
        self.routes
            .entry(kind.into())
            .or_default()
            .push(Arc::new(handler));
        self
    }

    /// Register a handler for messages without a `type` tag, and for tags
    /// with no dedicated handler.
    pub fn on_default(mut self, handler: impl Fn(Message, Reply) + Send + Sync + 'static) -> Self {
        self.fallback.push(Arc::new(handler));
        self
    }

    /// Route one inbound message.
    ///
    /// A message with no matching handler and no default is dropped without
    /// error or reply.
    pub(crate) fn dispatch(&self, message: Message, reply: Reply) {
        let handlers = match message.kind.as_deref() {
            Some(kind) => self.routes.get(kind).unwrap_or(&self.fallback),
            None => &self.fallback,
        };

        if handlers.is_empty() {
            debug!(kind = ?message.kind, "dropping message with no registered handler");
            return;
        }

        for handler in handlers {
            handler(message.clone(), reply.clone());
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .field("fallback_handlers", &self.fallback.len())
            .finish()
    }
}

/// Sends a response over the connection a request arrived on.
///
/// The response's `id` is overwritten with the request's id, so the remote
/// pending table matches it; replies are never broadcast to other
/// connections.
#[derive(Clone)]
pub struct Reply {
    writer: SharedWriter,
    request_id: Option<String>,
}

impl Reply {
    pub(crate) fn new(writer: SharedWriter, request_id: Option<String>) -> Self {
        Self { writer, request_id }
    }

    /// The id of the request this reply is bound to, if it carried one.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Send `message` back over the originating connection with its `id`
    /// set to the request's id.
    pub fn send(&self, mut message: Message) -> Result<()> {
        message.id = self.request_id.clone();
        let value = message.to_value()?;
        lock_writer(&self.writer).send(&value)?;
        Ok(())
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reply")
            .field("request_id", &self.request_id)
            .finish()
    }
}
