use std::collections::HashMap;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use msgwire_frame::{FrameConfig, FrameError, FrameReader, FrameWriter};
use msgwire_transport::{WireListener, WireStream};
use tracing::{debug, info, warn};

use crate::error::{PeerError, Result};
use crate::message::Message;
use crate::router::{lock_writer, SharedWriter};

/// Requests awaiting replies, keyed by correlation id.
///
/// Shared between caller threads and the reader thread; the reader completes
/// each entry exactly once and clears the whole table when the connection
/// dies, so blocked callers fail with `Disconnected` instead of hanging.
type PendingTable = Arc<Mutex<HashMap<String, mpsc::Sender<Message>>>>;

fn lock_pending(pending: &PendingTable) -> std::sync::MutexGuard<'_, HashMap<String, mpsc::Sender<Message>>> {
    match pending.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Client connection endpoint.
///
/// Owns one TCP connection and a background reader thread. [`request`]
/// blocks until the reply carrying the same id arrives;
/// [`request_with_timeout`] bounds the wait. Replies whose id matches no
/// outstanding request are dropped.
///
/// [`request`]: Client::request
/// [`request_with_timeout`]: Client::request_with_timeout
pub struct Client {
    writer: SharedWriter,
    pending: PendingTable,
    // Extra handle onto the connection so Drop can shut the socket down and
    // unblock the reader thread.
    stream: WireStream,
    peer_addr: SocketAddr,
}

impl Client {
    /// Connect with default configuration (1-byte prefix, no timeouts).
    pub fn connect(addr: impl ToSocketAddrs + ToString) -> Result<Self> {
        Self::connect_with_config(addr, FrameConfig::default())
    }

    /// Connect with explicit configuration.
    ///
    /// The prefix width must match the server's; the contract is out of
    /// band, nothing on the wire negotiates it.
    pub fn connect_with_config(
        addr: impl ToSocketAddrs + ToString,
        config: FrameConfig,
    ) -> Result<Self> {
        let stream = WireListener::connect(addr)?;
        let peer_addr = stream.peer_addr();

        let reader_stream = stream.try_clone()?;
        let control_stream = stream.try_clone()?;

        let reader = FrameReader::with_config_stream(reader_stream, config.clone())?;
        let writer = FrameWriter::with_config_stream(stream, config)?;

        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let reader_pending = Arc::clone(&pending);
        std::thread::Builder::new()
            .name(format!("msgwire-client-{peer_addr}"))
            .spawn(move || reader_loop(reader, reader_pending, peer_addr))
            .map_err(FrameError::Io)?;

        info!(%peer_addr, "client connected");

        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            pending,
            stream: control_stream,
            peer_addr,
        })
    }

    /// Address of the remote endpoint.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Send a message without waiting for a reply.
    ///
    /// Assigns a fresh correlation id when the message carries none.
    pub fn send(&self, mut message: Message) -> Result<()> {
        message.ensure_id();
        self.write_message(&message)
    }

    /// Send a request and block until the matching reply arrives.
    ///
    /// There is no timeout on this path: a peer that never replies leaves
    /// the caller blocked until the connection closes. Use
    /// [`request_with_timeout`] to bound the wait.
    ///
    /// [`request_with_timeout`]: Client::request_with_timeout
    pub fn request(&self, message: Message) -> Result<Message> {
        let (_id, rx) = self.register_and_send(message)?;
        rx.recv()
            .map_err(|_| PeerError::Disconnected("connection closed awaiting reply".to_string()))
    }

    /// Send a request and wait at most `timeout` for the matching reply.
    ///
    /// On expiry the pending entry is removed — a late reply is then
    /// dropped like any other unmatched message.
    pub fn request_with_timeout(&self, message: Message, timeout: Duration) -> Result<Message> {
        let (id, rx) = self.register_and_send(message)?;
        match rx.recv_timeout(timeout) {
            Ok(reply) => Ok(reply),
            Err(RecvTimeoutError::Timeout) => {
                lock_pending(&self.pending).remove(&id);
                Err(PeerError::Timeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(PeerError::Disconnected(
                "connection closed awaiting reply".to_string(),
            )),
        }
    }

    fn register_and_send(&self, mut message: Message) -> Result<(String, mpsc::Receiver<Message>)> {
        let id = message.ensure_id().to_string();
        let (tx, rx) = mpsc::channel();
        lock_pending(&self.pending).insert(id.clone(), tx);

        if let Err(err) = self.write_message(&message) {
            lock_pending(&self.pending).remove(&id);
            return Err(err);
        }

        Ok((id, rx))
    }

    fn write_message(&self, message: &Message) -> Result<()> {
        let value = message.to_value()?;
        lock_writer(&self.writer).send(&value)?;
        Ok(())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // Wakes the reader thread out of its blocking read.
        let _ = self.stream.shutdown();
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("peer", &self.peer_addr)
            .finish()
    }
}

fn reader_loop(mut reader: FrameReader<WireStream>, pending: PendingTable, peer: SocketAddr) {
    loop {
        let value = match reader.read_message() {
            Ok(value) => value,
            Err(FrameError::MalformedFrame(err)) => {
                warn!(%peer, error = %err, "discarding malformed frame");
                continue;
            }
            Err(FrameError::ConnectionClosed) => {
                info!(%peer, "connection closed");
                break;
            }
            Err(err) => {
                warn!(%peer, error = %err, "transport error; connection unusable");
                break;
            }
        };

        let message = match Message::from_value(value) {
            Ok(message) => message,
            Err(err) => {
                debug!(%peer, error = %err, "dropping non-object message");
                continue;
            }
        };

        let Some(id) = message.id.clone() else {
            debug!(%peer, "dropping reply without id");
            continue;
        };

        match lock_pending(&pending).remove(&id) {
            // The receiver may have timed out meanwhile; a failed send is
            // just a late reply being dropped.
            Some(tx) => {
                let _ = tx.send(message);
            }
            None => debug!(%peer, id, "dropping reply with no pending request"),
        }
    }

    // Dropping the senders fails every blocked request with Disconnected.
    lock_pending(&pending).clear();
}
