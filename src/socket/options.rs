//! Per-request connection options.
//!
//! [`RequestOptions`] is what the request pipeline knows about a target
//! before an agent looks at it. [`ConnectOptions`] is the normalized view an
//! agent builds from it, fresh for every resolution, and hands to its
//! connect callback.

use crate::base::neterror::NetError;
use crate::socket::tls::TlsConfig;
use http::{HeaderMap, Method};
use std::fmt;
use std::net::IpAddr;
use url::Url;

/// Transport protocol of a request target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    /// Plaintext, `"http:"`.
    #[default]
    Http,
    /// TLS, `"https:"`.
    Https,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "http:",
            Protocol::Https => "https:",
        }
    }

    /// Conventional port for the scheme.
    pub fn default_port(self) -> u16 {
        match self {
            Protocol::Http => 80,
            Protocol::Https => 443,
        }
    }

    pub fn is_secure(self) -> bool {
        matches!(self, Protocol::Https)
    }

    /// Parse a URL scheme, with or without the trailing colon.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        let scheme = scheme.strip_suffix(':').unwrap_or(scheme);
        if scheme.eq_ignore_ascii_case("http") {
            Some(Protocol::Http)
        } else if scheme.eq_ignore_ascii_case("https") {
            Some(Protocol::Https)
        } else {
            None
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw options for one request, as supplied by the pipeline or the caller.
///
/// Agents only ever borrow these; normalization builds a separate
/// [`ConnectOptions`].
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub protocol: Option<Protocol>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// TLS server name override.
    pub servername: Option<String>,
    pub tls: Option<TlsConfig>,
    /// Local address to bind before connecting.
    pub local_address: Option<IpAddr>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a request target URL.
    ///
    /// `port` is only set when the URL spells out a non-default port.
    pub fn from_url(url: &Url) -> Result<Self, NetError> {
        let protocol = Protocol::from_scheme(url.scheme()).ok_or(NetError::UnknownUrlScheme)?;
        let host = match url.host().ok_or(NetError::InvalidUrl)? {
            url::Host::Domain(domain) => domain.to_string(),
            url::Host::Ipv4(addr) => addr.to_string(),
            url::Host::Ipv6(addr) => addr.to_string(),
        };
        Ok(Self {
            protocol: Some(protocol),
            host: Some(host),
            port: url.port(),
            ..Self::default()
        })
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn servername(mut self, servername: impl Into<String>) -> Self {
        self.servername = Some(servername.into());
        self
    }

    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn local_address(mut self, addr: IpAddr) -> Self {
        self.local_address = Some(addr);
        self
    }
}

/// Normalized options for one resolution hop.
///
/// `secure_endpoint` is derived from `protocol` and cannot be set on its own.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    protocol: Protocol,
    secure_endpoint: bool,
    host: String,
    port: u16,
    default_port: u16,
    servername: Option<String>,
    tls: Option<TlsConfig>,
    local_address: Option<IpAddr>,
}

impl ConnectOptions {
    /// Options for a bare target, using the scheme's conventional port as
    /// the default port.
    pub fn new(protocol: Protocol, host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            protocol,
            secure_endpoint: protocol.is_secure(),
            servername: default_servername(protocol, &host),
            host,
            port,
            default_port: protocol.default_port(),
            tls: None,
            local_address: None,
        }
    }

    /// Merge raw request options with an agent's protocol and default port.
    ///
    /// Without an explicit default port, the request's scheme picks one.
    pub(crate) fn normalize(
        raw: &RequestOptions,
        agent_protocol: Protocol,
        default_port: Option<u16>,
    ) -> Self {
        let protocol = raw.protocol.unwrap_or(agent_protocol);
        let host = raw.host.clone().unwrap_or_else(|| "localhost".to_string());
        let port = raw.port.unwrap_or(protocol.default_port());

        let mut opts = ConnectOptions::new(protocol, host, port);
        opts.default_port = default_port.unwrap_or(protocol.default_port());
        if raw.servername.is_some() {
            opts.servername = raw.servername.clone();
        }
        opts.tls = raw.tls.clone();
        opts.local_address = raw.local_address;
        opts
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// True iff the target is reached over TLS.
    pub fn secure_endpoint(&self) -> bool {
        self.secure_endpoint
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The resolving agent's default port at the time of normalization.
    pub fn default_port(&self) -> u16 {
        self.default_port
    }

    /// SNI name for TLS connects; `None` for IP literals.
    pub fn servername(&self) -> Option<&str> {
        self.servername.as_deref()
    }

    pub fn tls(&self) -> Option<&TlsConfig> {
        self.tls.as_ref()
    }

    pub fn local_address(&self) -> Option<IpAddr> {
        self.local_address
    }

    /// Value for the `Host` request header.
    ///
    /// The port is left out when it equals the agent's default port.
    pub fn host_header(&self) -> String {
        let host = bracketed(&self.host);
        if self.port == self.default_port {
            host
        } else {
            format!("{}:{}", host, self.port)
        }
    }

    /// `host:port` string suitable for `tokio::net::lookup_host`.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", bracketed(&self.host), self.port)
    }

    /// Point the options at another host, keeping everything else.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self.servername = default_servername(self.protocol, &self.host);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }
}

fn bracketed(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}

fn default_servername(protocol: Protocol, host: &str) -> Option<String> {
    (protocol.is_secure() && TlsConfig::should_set_sni(host)).then(|| host.to_string())
}

/// The in-flight request a socket is being resolved for.
#[derive(Debug, Clone)]
pub struct ClientRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
}

impl ClientRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_from_scheme() {
        assert_eq!(Protocol::from_scheme("http"), Some(Protocol::Http));
        assert_eq!(Protocol::from_scheme("https:"), Some(Protocol::Https));
        assert_eq!(Protocol::from_scheme("HTTPS"), Some(Protocol::Https));
        assert_eq!(Protocol::from_scheme("ftp"), None);
        assert_eq!(Protocol::Https.to_string(), "https:");
    }

    #[test]
    fn test_request_options_from_url() {
        let url = Url::parse("https://example.com:8443/path").unwrap();
        let opts = RequestOptions::from_url(&url).unwrap();
        assert_eq!(opts.protocol, Some(Protocol::Https));
        assert_eq!(opts.host.as_deref(), Some("example.com"));
        assert_eq!(opts.port, Some(8443));

        // Scheme-default ports are not explicit.
        let url = Url::parse("http://example.com:80/").unwrap();
        assert_eq!(RequestOptions::from_url(&url).unwrap().port, None);
    }

    #[test]
    fn test_request_options_from_url_ipv6() {
        let url = Url::parse("http://[::1]:8080/").unwrap();
        let opts = RequestOptions::from_url(&url).unwrap();
        assert_eq!(opts.host.as_deref(), Some("::1"));
    }

    #[test]
    fn test_request_options_unknown_scheme() {
        let url = Url::parse("ftp://example.com/").unwrap();
        assert!(matches!(RequestOptions::from_url(&url), Err(NetError::UnknownUrlScheme)));
    }

    #[test]
    fn test_normalize_secure_endpoint_follows_protocol() {
        let raw = RequestOptions::new().host("example.com");

        let plain = ConnectOptions::normalize(&raw.clone().protocol(Protocol::Http), Protocol::Http, None);
        assert_eq!(plain.protocol(), Protocol::Http);
        assert!(!plain.secure_endpoint());

        let secure = ConnectOptions::normalize(&raw.protocol(Protocol::Https), Protocol::Http, None);
        assert_eq!(secure.protocol(), Protocol::Https);
        assert!(secure.secure_endpoint());
    }

    #[test]
    fn test_normalize_defaults() {
        let opts = ConnectOptions::normalize(&RequestOptions::new(), Protocol::Http, None);
        assert_eq!(opts.protocol(), Protocol::Http);
        assert_eq!(opts.host(), "localhost");
        assert_eq!(opts.port(), 80);
        assert!(opts.servername().is_none());

        let opts = ConnectOptions::normalize(&RequestOptions::new(), Protocol::Https, None);
        assert!(opts.secure_endpoint());
        assert_eq!(opts.port(), 443);
        assert_eq!(opts.servername(), Some("localhost"));
    }

    #[test]
    fn test_normalize_leaves_raw_untouched() {
        let raw = RequestOptions::new().host("example.com");
        let _ = ConnectOptions::normalize(&raw, Protocol::Https, None);
        assert!(raw.protocol.is_none());
        assert!(raw.port.is_none());
        assert!(raw.servername.is_none());
    }

    #[test]
    fn test_host_header_elides_default_port() {
        let raw = RequestOptions::new().host("127.0.0.1").port(5555);

        let opts = ConnectOptions::normalize(&raw, Protocol::Http, None);
        assert_eq!(opts.host_header(), "127.0.0.1:5555");

        let opts = ConnectOptions::normalize(&raw, Protocol::Http, Some(5555));
        assert_eq!(opts.port(), 5555);
        assert_eq!(opts.host_header(), "127.0.0.1");
    }

    #[test]
    fn test_default_port_follows_request_scheme() {
        let raw = RequestOptions::new().host("example.com").protocol(Protocol::Https);
        let opts = ConnectOptions::normalize(&raw, Protocol::Http, None);
        assert_eq!(opts.default_port(), 443);
        assert_eq!(opts.host_header(), "example.com");

        let opts = ConnectOptions::normalize(&raw, Protocol::Http, Some(80));
        assert_eq!(opts.host_header(), "example.com:443");
    }

    #[test]
    fn test_ipv6_formatting() {
        let opts = ConnectOptions::new(Protocol::Http, "::1", 8080);
        assert_eq!(opts.host_header(), "[::1]:8080");
        assert_eq!(opts.socket_addr_string(), "[::1]:8080");
    }

    #[test]
    fn test_servername_override() {
        let raw = RequestOptions::new().host("10.0.0.1").servername("api.internal");
        let opts = ConnectOptions::normalize(&raw, Protocol::Https, None);
        assert_eq!(opts.servername(), Some("api.internal"));
    }

    #[test]
    fn test_with_host_refreshes_servername() {
        let opts = ConnectOptions::new(Protocol::Https, "a.example", 443).with_host("b.example");
        assert_eq!(opts.host(), "b.example");
        assert_eq!(opts.servername(), Some("b.example"));
    }
}
