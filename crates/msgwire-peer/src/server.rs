use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::{Arc, Mutex};

use msgwire_frame::{FrameConfig, FrameError, FrameReader, FrameWriter};
use msgwire_transport::{WireListener, WireStream};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::message::Message;
use crate::router::{Reply, Router};

/// Server connection endpoint.
///
/// Binds a TCP listener and serves framed JSON messages. Registration is
/// complete once the router is handed to [`bind`]; from then on it is
/// shared read-only across connections. Each accepted connection runs on
/// its own thread with its own decode buffer, so connections never share
/// codec state.
///
/// [`bind`]: Server::bind
pub struct Server {
    listener: WireListener,
    router: Arc<Router>,
    config: FrameConfig,
}

impl Server {
    /// Bind with default configuration (1-byte prefix, no timeouts).
    pub fn bind(addr: impl ToSocketAddrs + ToString, router: Router) -> Result<Self> {
        Self::bind_with_config(addr, router, FrameConfig::default())
    }

    /// Bind with explicit configuration.
    ///
    /// The prefix width applies to every accepted connection for its whole
    /// lifetime; clients must be configured to match.
    pub fn bind_with_config(
        addr: impl ToSocketAddrs + ToString,
        router: Router,
        config: FrameConfig,
    ) -> Result<Self> {
        let listener = WireListener::bind(addr)?;
        Ok(Self {
            listener,
            router: Arc::new(router),
            config,
        })
    }

    /// The address this server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Accept connections until the listener fails.
    ///
    /// Each connection gets its own thread; a connection error ends that
    /// connection only, never the accept loop.
    pub fn serve(&self) -> Result<()> {
        loop {
            let stream = self.listener.accept()?;
            let peer = stream.peer_addr();
            let router = Arc::clone(&self.router);
            let config = self.config.clone();

            std::thread::Builder::new()
                .name(format!("msgwire-conn-{peer}"))
                .spawn(move || {
                    if let Err(err) = handle_connection(stream, router, config) {
                        warn!(%peer, error = %err, "connection ended with error");
                    }
                })
                .map_err(FrameError::Io)?;
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.listener.local_addr())
            .field("router", &self.router)
            .finish()
    }
}

/// Per-connection receive loop: decode, deserialize, dispatch.
fn handle_connection(stream: WireStream, router: Arc<Router>, config: FrameConfig) -> Result<()> {
    let peer = stream.peer_addr();
    let reader_stream = stream.try_clone()?;
    let mut reader = FrameReader::with_config_stream(reader_stream, config.clone())?;
    let writer = Arc::new(Mutex::new(FrameWriter::with_config_stream(stream, config)?));

    info!(%peer, "connection established");

    loop {
        let value = match reader.read_message() {
            Ok(value) => value,
            Err(FrameError::MalformedFrame(err)) => {
                warn!(%peer, error = %err, "discarding malformed frame");
                continue;
            }
            Err(FrameError::ConnectionClosed) => {
                info!(%peer, "connection closed");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let message = match Message::from_value(value) {
            Ok(message) => message,
            Err(err) => {
                warn!(%peer, error = %err, "dropping non-object message");
                continue;
            }
        };

        debug!(%peer, kind = ?message.kind, id = ?message.id, "dispatching message");
        let reply = Reply::new(Arc::clone(&writer), message.id.clone());
        router.dispatch(message, reply);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_reports_local_addr() {
        let server = Server::bind("127.0.0.1:0", Router::new()).unwrap();
        let addr = server.local_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn bind_fails_on_invalid_address() {
        let result = Server::bind("256.256.256.256:0", Router::new());
        assert!(result.is_err());
    }
}
