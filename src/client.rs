//! HTTP Client with builder pattern.
//!
//! Every request gets its socket from an [`Agent`]: the one set on the
//! request, else the client's, else the global agent for the URL's protocol.
//!
//! # Example
//!
//! ```rust,ignore
//! use agentnet::Client;
//!
//! let client = Client::builder()
//!     .timeout(std::time::Duration::from_secs(10))
//!     .build();
//!
//! let resp = client.get("https://example.com")
//!     .send()
//!     .await?;
//! ```

use crate::base::neterror::NetError;
use crate::http::streamfactory::HttpStreamFactory;
use crate::http::HttpResponse;
use crate::socket::agent::Agent;
use crate::socket::global;
use crate::socket::options::{ClientRequest, RequestOptions};
use crate::socket::tls::TlsConfig;
use bytes::Bytes;
use http::header::HOST;
use http::{HeaderMap, HeaderValue, Method, Request};
use http_body_util::Full;
use std::time::Duration;
use url::{Position, Url};

/// HTTP Client for making requests.
///
/// Use [`Client::builder()`] to configure and create a client.
#[derive(Debug, Clone, Default)]
pub struct Client {
    agent: Option<Agent>,
    tls_config: Option<TlsConfig>,
    timeout: Option<Duration>,
}

impl Client {
    /// Client that resolves through the global agents.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn get<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    pub fn put<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    pub fn delete<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    pub fn head<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::HEAD, url)
    }

    pub fn patch<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    /// Start building a request with custom method.
    pub fn request<U: AsRef<str>>(&self, method: Method, url: U) -> RequestBuilder {
        RequestBuilder {
            client: self.clone(),
            method,
            url: url.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: None,
            agent_override: None,
        }
    }
}

/// Builder for creating a [`Client`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    agent: Option<Agent>,
    tls_config: Option<TlsConfig>,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Resolve every request through `agent` instead of the global agent.
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agent = Some(agent);
        self
    }

    /// TLS settings handed to connectors through the connect options.
    pub fn tls_config(mut self, config: TlsConfig) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Upper bound on a whole request, socket resolution included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Client {
        Client {
            agent: self.agent,
            tls_config: self.tls_config,
            timeout: self.timeout,
        }
    }
}

/// Builder for a single request.
pub struct RequestBuilder {
    client: Client,
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    agent_override: Option<Agent>,
}

impl RequestBuilder {
    /// Add a header. Values that are not valid header values are skipped.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: http::header::IntoHeaderName,
        V: TryInto<HeaderValue>,
    {
        if let Ok(val) = value.try_into() {
            self.headers.insert(key, val);
        }
        self
    }

    pub fn body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set JSON body.
    #[cfg(feature = "json")]
    pub fn json<T: serde::Serialize>(mut self, json: &T) -> Self {
        if let Ok(bytes) = serde_json::to_vec(json) {
            self.body = Some(bytes);
            self.headers.insert(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        self
    }

    /// Use `agent` for this request only.
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agent_override = Some(agent);
        self
    }

    /// Send the request.
    pub async fn send(self) -> Result<HttpResponse, NetError> {
        let url = Url::parse(&self.url).map_err(|_| NetError::InvalidUrl)?;
        let mut opts = RequestOptions::from_url(&url)?;
        opts.tls = self.client.tls_config.clone();

        let protocol = opts.protocol.unwrap_or_default();
        let agent = self
            .agent_override
            .or(self.client.agent)
            .unwrap_or_else(|| global::global_agent(protocol));

        let exchange = execute(
            HttpStreamFactory::new(agent),
            self.method,
            url,
            self.headers,
            self.body.unwrap_or_default(),
            opts,
        );

        let Some(limit) = self.client.timeout else {
            return exchange.await;
        };
        match tokio::time::timeout(limit, exchange).await {
            Ok(result) => result,
            Err(_) => Err(NetError::ConnectionTimedOut(
                u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }
}

async fn execute(
    factory: HttpStreamFactory,
    method: Method,
    url: Url,
    mut headers: HeaderMap,
    body: Vec<u8>,
    opts: RequestOptions,
) -> Result<HttpResponse, NetError> {
    if !headers.contains_key(HOST) {
        let host = HeaderValue::from_str(&factory.host_header(&opts))
            .map_err(|_| NetError::InvalidHttpRequest)?;
        headers.insert(HOST, host);
    }

    let target = &url[Position::BeforePath..Position::AfterQuery];
    let mut request = Request::builder()
        .method(method.clone())
        .uri(target)
        .body(Full::new(Bytes::from(body)))
        .map_err(|_| NetError::InvalidHttpRequest)?;
    *request.headers_mut() = headers.clone();

    let req = ClientRequest::new(method, url).with_headers(headers);
    let mut stream = factory.request_stream(&req, &opts).await?;
    tracing::debug!(method = %req.method(), url = %req.url(), "sending request");

    let response = stream.send_request(request).await?;
    Ok(HttpResponse::from_hyper(response, &stream))
}
