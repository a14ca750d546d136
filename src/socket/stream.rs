//! Polymorphic socket handling.
//!
//! Connect callbacks may hand back plain TCP, TLS over TCP, TLS over an
//! already-tunnelled stream, or an in-memory duplex pipe. [`StreamSocket`]
//! covers all of them and [`BoxedSocket`] erases the concrete type so the
//! request pipeline sees a single socket type.
//!
//! Chromium equivalent: `net::StreamSocket`.

use std::fmt;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};
use tokio::net::TcpStream;
use tokio_boring::SslStream;

/// A trait for any socket that supports async read/write operations.
pub trait StreamSocket: AsyncRead + AsyncWrite + Unpin + Send + Sync + 'static {
    /// Remote address, when the socket has one.
    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// Whether the socket is encrypted.
    fn is_tls(&self) -> bool {
        false
    }
}

impl StreamSocket for TcpStream {
    fn peer_addr(&self) -> Option<SocketAddr> {
        TcpStream::peer_addr(self).ok()
    }
}

// TLS can wrap any StreamSocket, including another TLS stream.
impl<S: StreamSocket> StreamSocket for SslStream<S> {
    fn peer_addr(&self) -> Option<SocketAddr> {
        self.get_ref().peer_addr()
    }

    fn is_tls(&self) -> bool {
        true
    }
}

impl StreamSocket for DuplexStream {}

/// Type-erased [`StreamSocket`].
pub struct BoxedSocket {
    inner: Pin<Box<dyn StreamSocket>>,
}

impl BoxedSocket {
    /// Create a new BoxedSocket from any StreamSocket.
    pub fn new<S: StreamSocket>(socket: S) -> Self {
        Self {
            inner: Box::pin(socket),
        }
    }

    /// Get a pinned mutable reference to the inner socket.
    pub fn as_mut(&mut self) -> Pin<&mut dyn StreamSocket> {
        self.inner.as_mut()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.peer_addr()
    }

    pub fn is_tls(&self) -> bool {
        self.inner.is_tls()
    }
}

impl fmt::Debug for BoxedSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedSocket")
            .field("peer_addr", &self.peer_addr())
            .field("tls", &self.is_tls())
            .finish()
    }
}

impl AsyncRead for BoxedSocket {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        self.inner.as_mut().poll_read(cx, buf)
    }
}

impl AsyncWrite for BoxedSocket {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        self.inner.as_mut().poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.inner.as_mut().poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.inner.as_mut().poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_boxed_duplex_roundtrip() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut socket = BoxedSocket::new(client);
        assert!(!socket.is_tls());
        assert!(socket.peer_addr().is_none());

        socket.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
    }

    #[tokio::test]
    async fn test_boxed_tcp_reports_peer() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });

        let stream = TcpStream::connect(addr).await.unwrap();
        let socket = BoxedSocket::new(stream);
        assert_eq!(socket.peer_addr(), Some(addr));
        accept.await.unwrap();
    }
}
