use crate::base::neterror::NetError;
use crate::socket::agent::Agent;
use crate::socket::options::{ClientRequest, RequestOptions};
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use tokio::spawn;

/// HTTP/1.1 stream over an agent-provided socket.
/// Equivalent to net::HttpStream.
pub struct HttpStream {
    sender: http1::SendRequest<Full<Bytes>>,
    peer_addr: Option<SocketAddr>,
    is_tls: bool,
}

impl HttpStream {
    /// Remote address of the agent-provided socket, when it has one.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    pub fn is_tls(&self) -> bool {
        self.is_tls
    }

    pub async fn send_request(
        &mut self,
        req: Request<Full<Bytes>>,
    ) -> Result<Response<Incoming>, NetError> {
        self.sender.send_request(req).await.map_err(|e| {
            tracing::debug!(error = %e, "request failed");
            if e.is_parse() {
                NetError::InvalidResponse
            } else if e.is_incomplete_message() {
                NetError::EmptyResponse
            } else {
                NetError::ConnectionClosed
            }
        })
    }
}

/// Turns sockets from an [`Agent`] into HTTP streams.
#[derive(Debug, Clone)]
pub struct HttpStreamFactory {
    agent: Agent,
}

impl HttpStreamFactory {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Value for the `Host` header of a request sent through this factory.
    pub fn host_header(&self, opts: &RequestOptions) -> String {
        self.agent.normalize(opts).host_header()
    }

    pub async fn request_stream(
        &self,
        req: &ClientRequest,
        opts: &RequestOptions,
    ) -> Result<HttpStream, NetError> {
        // 1. Ask the agent for a socket
        let socket = self.agent.connect(req, opts).await?;
        let peer_addr = socket.peer_addr();
        let is_tls = socket.is_tls();

        // 2. Handshake
        let io = TokioIo::new(socket);
        let (sender, conn) = http1::handshake(io).await.map_err(|e| {
            tracing::debug!(error = %e, "HTTP/1.1 handshake failed");
            NetError::ConnectionFailed
        })?;

        // 3. Spawn the connection driver
        spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "connection driver exited");
            }
        });

        Ok(HttpStream {
            sender,
            peer_addr,
            is_tls,
        })
    }
}
