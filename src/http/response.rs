//! HTTP Response with body access.

use crate::base::neterror::NetError;
use crate::http::streamfactory::HttpStream;
use crate::http::ResponseBody;
use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};
use hyper::body::Incoming;
use std::net::SocketAddr;

/// Response read from a socket an agent resolved for the request.
///
/// Besides status, headers and body it records the connection it arrived
/// on: the peer address (absent for in-memory sockets) and whether the
/// socket was TLS.
#[derive(Debug)]
pub struct HttpResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    peer_addr: Option<SocketAddr>,
    is_tls: bool,
    body: Option<ResponseBody>,
}

impl HttpResponse {
    pub fn from_hyper(resp: http::Response<Incoming>, stream: &HttpStream) -> Self {
        let (parts, body) = resp.into_parts();
        Self {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            peer_addr: stream.peer_addr(),
            is_tls: stream.is_tls(),
            body: Some(ResponseBody::new(body)),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Remote address of the socket the agent handed out.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Whether the response came over a TLS socket.
    pub fn is_tls(&self) -> bool {
        self.is_tls
    }

    /// Take the body for streaming. Later calls return `None`, as do the
    /// collecting helpers below.
    pub fn take_body(&mut self) -> Option<ResponseBody> {
        self.body.take()
    }

    pub async fn bytes(mut self) -> Result<Bytes, NetError> {
        self.body.take().ok_or(NetError::HttpBodyError)?.bytes().await
    }

    pub async fn text(mut self) -> Result<String, NetError> {
        self.body.take().ok_or(NetError::HttpBodyError)?.text().await
    }

    #[cfg(feature = "json")]
    pub async fn json<T: serde::de::DeserializeOwned>(mut self) -> Result<T, NetError> {
        self.body.take().ok_or(NetError::HttpBodyError)?.json().await
    }
}
