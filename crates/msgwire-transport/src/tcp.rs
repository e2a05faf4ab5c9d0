use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// A connected TCP stream — implements Read + Write.
///
/// This is the fundamental I/O type returned by transport operations. The
/// framing layer drives it; the correlation layer never touches it directly.
pub struct WireStream {
    inner: TcpStream,
    peer_addr: SocketAddr,
}

impl WireStream {
    fn from_tcp(stream: TcpStream, peer_addr: SocketAddr) -> Result<Self> {
        // Frames are small JSON messages; coalescing them behind Nagle adds
        // request/response latency for nothing.
        stream.set_nodelay(true)?;
        Ok(Self { inner: stream, peer_addr })
    }

    /// Address of the remote peer.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor).
    ///
    /// Used to split one connection into an owned reader half and an owned
    /// writer half.
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self {
            inner: cloned,
            peer_addr: self.peer_addr,
        })
    }

    /// Shut down both halves of the connection.
    ///
    /// Any clone of this stream blocked in `read` observes EOF afterward.
    pub fn shutdown(&self) -> Result<()> {
        self.inner.shutdown(Shutdown::Both).map_err(Into::into)
    }
}

impl Read for WireStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for WireStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl std::fmt::Debug for WireStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireStream")
            .field("peer", &self.peer_addr)
            .finish()
    }
}

/// TCP listener for framed-message endpoints.
///
/// Provides bind/accept/connect over `host:port` addresses.
pub struct WireListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl WireListener {
    /// Bind and listen on a TCP address such as `"127.0.0.1:3000"`.
    ///
    /// Binding to port 0 picks an ephemeral port; use [`local_addr`] to
    /// discover it.
    ///
    /// [`local_addr`]: WireListener::local_addr
    pub fn bind(addr: impl ToSocketAddrs + ToString) -> Result<Self> {
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let local_addr = listener.local_addr()?;

        info!(%local_addr, "listening on tcp socket");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<WireStream> {
        let (stream, peer_addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer_addr, "accepted connection");
        WireStream::from_tcp(stream, peer_addr)
    }

    /// Connect to a listening endpoint (blocking).
    pub fn connect(addr: impl ToSocketAddrs + ToString) -> Result<WireStream> {
        let stream = TcpStream::connect(&addr).map_err(|e| TransportError::Connect {
            addr: addr.to_string(),
            source: e,
        })?;
        let peer_addr = stream.peer_addr()?;
        debug!(%peer_addr, "connected to tcp socket");
        WireStream::from_tcp(stream, peer_addr)
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn bind_accept_connect() {
        let listener = WireListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr();

        let handle = std::thread::spawn(move || {
            let mut client = WireListener::connect(addr).unwrap();
            client.write_all(b"hello").unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        handle.join().unwrap();
    }

    #[test]
    fn connect_refused_reports_address() {
        // Bind then drop to obtain a port that is very likely closed.
        let addr = {
            let listener = WireListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr()
        };

        let err = WireListener::connect(addr).unwrap_err();
        match err {
            TransportError::Connect { addr: reported, .. } => {
                assert_eq!(reported, addr.to_string());
            }
            other => panic!("expected Connect error, got {other:?}"),
        }
    }

    #[test]
    fn bind_invalid_address_fails() {
        let result = WireListener::bind("256.256.256.256:0");
        assert!(matches!(result, Err(TransportError::Bind { .. })));
    }

    #[test]
    fn try_clone_shares_connection() {
        let listener = WireListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr();

        let handle = std::thread::spawn(move || {
            let client = WireListener::connect(addr).unwrap();
            let mut writer = client.try_clone().unwrap();
            writer.write_all(b"via-clone").unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 9];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"via-clone");

        handle.join().unwrap();
    }

    #[test]
    fn shutdown_unblocks_cloned_reader() {
        let listener = WireListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr();

        let connector = std::thread::spawn(move || WireListener::connect(addr).unwrap());
        let _server = listener.accept().unwrap();
        let client = connector.join().unwrap();

        let mut reader = client.try_clone().unwrap();
        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; 1];
            // EOF or a connection-reset error, but never a hang.
            let _ = reader.read(&mut buf);
        });

        client.shutdown().unwrap();
        handle.join().unwrap();
    }
}
