use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// A connected TCP stream tagged with its peer address.
///
/// The peer address is captured once at connect/accept time so log lines can
/// keep naming the peer after the socket has failed.
pub struct RelayStream {
    inner: TcpStream,
    peer: SocketAddr,
}

impl Read for RelayStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for RelayStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl RelayStream {
    fn from_tcp(inner: TcpStream, peer: SocketAddr) -> Self {
        Self { inner, peer }
    }

    /// Connect to a listening relay (blocking).
    pub fn connect(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let label = addr.to_string();
        let inner = TcpStream::connect(&addr).map_err(|e| TransportError::Connect {
            addr: label.clone(),
            source: e,
        })?;
        let peer = inner.peer_addr().map_err(|e| TransportError::Connect {
            addr: label,
            source: e,
        })?;
        // Records are small and periodic; don't let Nagle batch them.
        inner.set_nodelay(true)?;
        debug!(%peer, "connected");
        Ok(Self::from_tcp(inner, peer))
    }

    /// Address of the remote end.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }
}

impl std::fmt::Debug for RelayStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayStream")
            .field("peer", &self.peer)
            .finish()
    }
}

/// TCP listener accepting producer connections.
pub struct TcpTransport {
    listener: TcpListener,
    local: SocketAddr,
}

impl TcpTransport {
    /// Bind and listen on the given address.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let label = addr.to_string();
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::Bind {
            addr: label.clone(),
            source: e,
        })?;
        let local = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: label,
            source: e,
        })?;

        info!(%local, "listening on tcp");

        Ok(Self { listener, local })
    }

    /// Accept an incoming connection (blocking unless non-blocking mode is set).
    pub fn accept(&self) -> Result<RelayStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        // Some platforms hand back sockets inheriting the listener's O_NONBLOCK.
        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;
        debug!(%peer, "accepted connection");
        Ok(RelayStream::from_tcp(stream, peer))
    }

    /// Accept a connection if one is pending.
    ///
    /// Returns `Ok(None)` when the listener is non-blocking and nothing is queued.
    pub fn try_accept(&self) -> Result<Option<RelayStream>> {
        match self.accept() {
            Ok(stream) => Ok(Some(stream)),
            Err(TransportError::Accept(err)) if err.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Switch the listener between blocking and non-blocking accepts.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.listener
            .set_nonblocking(nonblocking)
            .map_err(Into::into)
    }

    /// Bound local address (useful after binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn accept_and_exchange_bytes() {
        let transport = TcpTransport::bind("127.0.0.1:0").expect("listener should bind");
        let addr = transport.local_addr();

        let client = thread::spawn(move || {
            let mut stream = RelayStream::connect(addr).expect("client should connect");
            stream.write_all(b"ping").expect("write should succeed");
            stream.peer_addr()
        });

        let mut accepted = transport.accept().expect("accept should succeed");
        let mut buf = [0u8; 4];
        accepted.read_exact(&mut buf).expect("read should succeed");
        assert_eq!(&buf, b"ping");

        let seen_by_client = client.join().expect("client thread should finish");
        assert_eq!(seen_by_client, addr);
    }

    #[test]
    fn try_accept_without_pending_connection() {
        let transport = TcpTransport::bind("127.0.0.1:0").expect("listener should bind");
        transport.set_nonblocking(true).expect("nonblocking should apply");

        let accepted = transport.try_accept().expect("try_accept should not fail");
        assert!(accepted.is_none());
    }

    #[test]
    fn connect_refused_reports_address() {
        let transport = TcpTransport::bind("127.0.0.1:0").expect("listener should bind");
        let addr = transport.local_addr();
        drop(transport);

        let err = RelayStream::connect(addr).unwrap_err();
        match err {
            TransportError::Connect { addr: label, .. } => assert_eq!(label, addr.to_string()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
