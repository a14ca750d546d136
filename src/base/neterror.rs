use std::error::Error as StdError;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by connect callbacks.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Shared, cloneable error cause.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Connection Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection aborted")]
    ConnectionAborted,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Connection to {host}:{port} failed: {source}")]
    ConnectionFailedTo {
        host: String,
        port: u16,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Name not resolved for {domain}: {source}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("Address invalid")]
    AddressInvalid,
    #[error("Connection timed out after {0} ms")]
    ConnectionTimedOut(u64),

    // HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Unknown URL scheme")]
    UnknownUrlScheme,
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Empty response")]
    EmptyResponse,
    #[error("Invalid HTTP request")]
    InvalidHttpRequest,
    #[error("HTTP body error")]
    HttpBodyError,
    #[error("Invalid UTF-8 in body")]
    InvalidUtf8,
    #[error("JSON parse error")]
    JsonParseError,

    // Agent Errors
    #[error("Agent has no connect callback configured")]
    ConfigurationError,
    #[error("Connection resolution failed: {source}")]
    ResolutionError {
        #[source]
        source: SharedError,
    },

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    /// Wrap a connect callback failure.
    pub fn resolution(source: BoxError) -> Self {
        NetError::ResolutionError {
            source: Arc::from(source),
        }
    }

    /// Build a `ConnectionFailedTo` from an IO error.
    pub fn connection_failed_to(host: &str, port: u16, source: io::Error) -> Self {
        NetError::ConnectionFailedTo {
            host: host.to_string(),
            port,
            source: Arc::new(source),
        }
    }

    /// Build a `NameNotResolvedFor` from an IO error.
    pub fn dns_failed(domain: &str, source: io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.to_string(),
            source: Arc::new(source),
        }
    }

    /// True for `ResolutionError`.
    pub fn is_resolution(&self) -> bool {
        matches!(self, NetError::ResolutionError { .. })
    }

    /// Walk `ResolutionError` causes down to the innermost `NetError`, if any.
    ///
    /// A failure raised by a transport inside a connect callback arrives
    /// wrapped; this recovers e.g. the `ConnectionFailedTo` underneath.
    pub fn root_net_error(&self) -> &NetError {
        let mut current = self;
        while let NetError::ResolutionError { source } = current {
            match source.downcast_ref::<NetError>() {
                Some(inner) => current = inner,
                None => break,
            }
        }
        current
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::ConnectionClosed => -100,
            NetError::ConnectionReset => -101,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionAborted => -103,
            NetError::ConnectionFailed | NetError::ConnectionFailedTo { .. } => -104,
            NetError::NameNotResolved | NetError::NameNotResolvedFor { .. } => -105,
            NetError::SslProtocolError => -107,
            NetError::AddressInvalid => -108,
            NetError::ConnectionTimedOut(_) => -118,

            NetError::InvalidUrl => -300,
            NetError::UnknownUrlScheme => -302,
            NetError::InvalidResponse => -320,
            NetError::EmptyResponse => -324,
            NetError::InvalidHttpRequest => -370,
            // Custom codes live in the -900 range.
            NetError::HttpBodyError => -905,
            NetError::InvalidUtf8 => -906,
            NetError::JsonParseError => -907,
            NetError::ConfigurationError => -910,
            NetError::ResolutionError { .. } => -911,
            NetError::Unknown(code) => *code,
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -100 => NetError::ConnectionClosed,
            -101 => NetError::ConnectionReset,
            -102 => NetError::ConnectionRefused,
            -103 => NetError::ConnectionAborted,
            -104 => NetError::ConnectionFailed,
            -105 => NetError::NameNotResolved,
            -107 => NetError::SslProtocolError,
            -108 => NetError::AddressInvalid,
            // The code does not carry the elapsed time.
            -118 => NetError::ConnectionTimedOut(0),
            -300 => NetError::InvalidUrl,
            -302 => NetError::UnknownUrlScheme,
            -320 => NetError::InvalidResponse,
            -324 => NetError::EmptyResponse,
            -370 => NetError::InvalidHttpRequest,
            -905 => NetError::HttpBodyError,
            -906 => NetError::InvalidUtf8,
            -907 => NetError::JsonParseError,
            -910 => NetError::ConfigurationError,
            _ => NetError::Unknown(code),
        }
    }
}
