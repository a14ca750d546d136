//! Plain and TLS socket connects: DNS -> TCP -> SSL.
//!
//! These are the transport primitives connect callbacks reach for. Agents
//! never call them on their own; a connector decides whether and when to.

use crate::base::context::IoResultExt;
use crate::base::neterror::{BoxError, NetError};
use crate::socket::agent::{Connect, Connection};
use crate::socket::options::{ClientRequest, ConnectOptions};
use crate::socket::stream::{BoxedSocket, StreamSocket};
use boring::ssl::{SslConnector, SslMethod};
use std::net::SocketAddr;
use tokio::net::{TcpSocket, TcpStream};
use tokio_boring::SslStream;

/// Opens sockets for normalized connect options.
/// Roughly equivalent to net::ConnectJob.
///
/// As a [`Connect`] implementation it is the connector behind the default
/// agents: TLS for secure endpoints, plain TCP otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectJob;

impl ConnectJob {
    /// Open a socket matching `opts.secure_endpoint()`.
    pub async fn establish(opts: &ConnectOptions) -> Result<BoxedSocket, NetError> {
        if opts.secure_endpoint() {
            Self::tls(opts).await
        } else {
            Self::tcp(opts).await
        }
    }

    /// Plain TCP connection to `opts.host():opts.port()`.
    pub async fn tcp(opts: &ConnectOptions) -> Result<BoxedSocket, NetError> {
        Ok(BoxedSocket::new(Self::tcp_stream(opts).await?))
    }

    /// TCP connection followed by a TLS handshake.
    pub async fn tls(opts: &ConnectOptions) -> Result<BoxedSocket, NetError> {
        let stream = Self::tcp_stream(opts).await?;
        Ok(BoxedSocket::new(Self::tls_over(stream, opts).await?))
    }

    /// TLS handshake over an already-connected stream (e.g. a tunnel).
    pub async fn tls_over<S: StreamSocket>(
        stream: S,
        opts: &ConnectOptions,
    ) -> Result<SslStream<S>, NetError> {
        let tls = opts.tls().cloned().unwrap_or_default();

        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;
        tls.apply_to_builder(&mut builder)?;
        let connector = builder.build();
        let mut config = connector.configure().map_err(|_| NetError::SslProtocolError)?;

        let domain = match opts.servername() {
            Some(name) => name,
            None => {
                config.set_use_server_name_indication(false);
                config.set_verify_hostname(false);
                opts.host()
            }
        };
        if !tls.verify_peer {
            config.set_verify_hostname(false);
        }

        tracing::trace!(host = %opts.host(), sni = ?opts.servername(), "starting TLS handshake");
        tokio_boring::connect(config, domain, stream).await.map_err(|_| {
            tracing::debug!(host = %opts.host(), port = opts.port(), "TLS handshake failed");
            NetError::SslProtocolError
        })
    }

    async fn tcp_stream(opts: &ConnectOptions) -> Result<TcpStream, NetError> {
        let host = opts.host();

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(opts.socket_addr_string())
            .await
            .dns_context(host)?
            .collect();
        tracing::trace!(host = %host, count = addrs.len(), "resolved target");

        let mut last_err = NetError::NameNotResolved;
        for addr in addrs {
            match Self::connect_addr(addr, opts).await {
                Ok(stream) => {
                    tracing::debug!(host = %host, %addr, "TCP connected");
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::trace!(%addr, error = %e, "TCP connect attempt failed");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    async fn connect_addr(addr: SocketAddr, opts: &ConnectOptions) -> Result<TcpStream, NetError> {
        let Some(local) = opts.local_address() else {
            return TcpStream::connect(addr).await.connection_context(opts.host(), opts.port());
        };

        if local.is_ipv4() != addr.is_ipv4() {
            return Err(NetError::AddressInvalid);
        }
        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .connection_context(opts.host(), opts.port())?;
        socket
            .bind(SocketAddr::new(local, 0))
            .connection_context(opts.host(), opts.port())?;
        socket.connect(addr).await.connection_context(opts.host(), opts.port())
    }
}

impl Connect for ConnectJob {
    fn connect(&self, _req: &ClientRequest, opts: &ConnectOptions) -> Result<Connection, BoxError> {
        let opts = opts.clone();
        Ok(Connection::pending(async move {
            let socket = ConnectJob::establish(&opts).await?;
            Ok::<_, BoxError>(Connection::Socket(socket))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::options::Protocol;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let opts = ConnectOptions::new(Protocol::Http, "127.0.0.1", addr.port());
        let socket = ConnectJob::establish(&opts).await.unwrap();
        assert_eq!(socket.peer_addr(), Some(addr));
        assert!(!socket.is_tls());
    }

    #[tokio::test]
    async fn test_tcp_connect_with_local_address() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap().1 });

        let raw = crate::socket::options::RequestOptions::new()
            .host("127.0.0.1")
            .port(addr.port())
            .local_address(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let opts = ConnectOptions::normalize(&raw, Protocol::Http, None);
        ConnectJob::tcp(&opts).await.unwrap();

        let peer = accept.await.unwrap();
        assert_eq!(peer.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn test_tcp_connect_refused() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let opts = ConnectOptions::new(Protocol::Http, "127.0.0.1", port);
        let err = ConnectJob::tcp(&opts).await.unwrap_err();
        assert!(matches!(
            err,
            NetError::ConnectionRefused | NetError::ConnectionFailedTo { .. }
        ));
    }
}
