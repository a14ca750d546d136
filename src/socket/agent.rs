//! Pluggable connection resolution.
//!
//! An [`Agent`] decides, per request, where the request's socket comes from.
//! It owns a [`Connect`] implementation (a closure or a user type) and, for
//! every request, builds fresh [`ConnectOptions`], calls the connector and
//! unwraps what it returns:
//!
//! - [`Connection::Socket`]: done,
//! - [`Connection::Pending`]: await it and look at the result again,
//! - [`Connection::Agent`]: start over with the other agent, which
//!   re-normalizes the request under its own protocol and default port.
//!
//! Delegation depth is unbounded. Synchronous connectors never suspend the
//! caller; the only suspension points are awaited pending connections.
//!
//! # Example
//!
//! ```rust,ignore
//! use agentnet::base::neterror::BoxError;
//! use agentnet::socket::agent::{Agent, Connection};
//! use agentnet::socket::connectjob::ConnectJob;
//!
//! let agent = Agent::from_fn(|_req, opts| {
//!     let opts = opts.clone();
//!     Ok(Connection::pending(async move {
//!         Ok::<_, BoxError>(Connection::Socket(ConnectJob::tcp(&opts).await?))
//!     }))
//! });
//! ```

use crate::base::neterror::{BoxError, NetError};
use crate::socket::options::{ClientRequest, ConnectOptions, Protocol, RequestOptions};
use crate::socket::stream::{BoxedSocket, StreamSocket};
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A connection that is still being established.
pub type Pending = BoxFuture<'static, Result<Connection, BoxError>>;

/// What a connector hands back for one request.
///
/// Failures travel in the `Err` arm of the connector's `Result`, both for
/// the synchronous call and for the output of a [`Pending`] future.
pub enum Connection {
    /// A socket ready for the request.
    Socket(BoxedSocket),
    /// A future that yields another `Connection`.
    Pending(Pending),
    /// Hand the request to another agent.
    Agent(Agent),
}

impl Connection {
    /// Box a concrete socket.
    pub fn socket<S: StreamSocket>(socket: S) -> Self {
        Connection::Socket(BoxedSocket::new(socket))
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Connection, BoxError>> + Send + 'static,
    {
        Connection::Pending(Box::pin(future))
    }

    pub fn delegate(agent: Agent) -> Self {
        Connection::Agent(agent)
    }
}

impl From<BoxedSocket> for Connection {
    fn from(socket: BoxedSocket) -> Self {
        Connection::Socket(socket)
    }
}

impl From<Agent> for Connection {
    fn from(agent: Agent) -> Self {
        Connection::Agent(agent)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connection::Socket(socket) => f.debug_tuple("Socket").field(socket).finish(),
            Connection::Pending(_) => f.write_str("Pending"),
            Connection::Agent(agent) => f.debug_tuple("Agent").field(agent).finish(),
        }
    }
}

/// Decides how the socket for a request is obtained.
///
/// Implemented by closures of the matching shape, and by user types that
/// want to carry their own state. The agent calls it once per resolution
/// hop, possibly from many requests at once.
pub trait Connect: Send + Sync + 'static {
    fn connect(&self, req: &ClientRequest, opts: &ConnectOptions) -> Result<Connection, BoxError>;
}

impl<F> Connect for F
where
    F: Fn(&ClientRequest, &ConnectOptions) -> Result<Connection, BoxError> + Send + Sync + 'static,
{
    fn connect(&self, req: &ClientRequest, opts: &ConnectOptions) -> Result<Connection, BoxError> {
        self(req, opts)
    }
}

struct AgentInner {
    connector: Option<Box<dyn Connect>>,
    protocol: Protocol,
    // Explicit default port, 0 when unset. Read once per resolution hop;
    // written rarely, last write wins.
    default_port: AtomicU16,
    timeout: Option<Duration>,
}

/// Connection resolver for outbound requests.
///
/// Cloning is cheap and clones share state, including the default port.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

impl Agent {
    /// Plaintext agent driven by `connector`.
    pub fn new<C: Connect>(connector: C) -> Self {
        Agent::builder().connector(connector).build()
    }

    /// Plaintext agent driven by a closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&ClientRequest, &ConnectOptions) -> Result<Connection, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Agent::builder().connect_fn(f).build()
    }

    pub fn builder() -> AgentBuilder {
        AgentBuilder::default()
    }

    pub fn protocol(&self) -> Protocol {
        self.inner.protocol
    }

    /// Default port for requests that use the agent's own protocol.
    ///
    /// Unless set explicitly, each request gets the conventional port of its
    /// own scheme (see [`default_port_for`](Self::default_port_for)).
    pub fn default_port(&self) -> u16 {
        self.default_port_for(self.inner.protocol)
    }

    /// Default port applied to a request using `protocol`.
    pub fn default_port_for(&self, protocol: Protocol) -> u16 {
        self.explicit_default_port().unwrap_or(protocol.default_port())
    }

    fn explicit_default_port(&self) -> Option<u16> {
        match self.inner.default_port.load(Ordering::Relaxed) {
            0 => None,
            port => Some(port),
        }
    }

    /// Change the default port for every scheme. Applies from the next
    /// resolution on; `0` goes back to the per-scheme defaults.
    pub fn set_default_port(&self, port: u16) {
        self.inner.default_port.store(port, Ordering::Relaxed);
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.inner.timeout
    }

    pub fn has_connector(&self) -> bool {
        self.inner.connector.is_some()
    }

    /// Whether `raw` would resolve to a TLS endpoint through this agent.
    pub fn is_secure_endpoint(&self, raw: &RequestOptions) -> bool {
        raw.protocol.unwrap_or(self.inner.protocol).is_secure()
    }

    /// Build the options this agent would pass to its connector.
    pub fn normalize(&self, raw: &RequestOptions) -> ConnectOptions {
        ConnectOptions::normalize(raw, self.inner.protocol, self.explicit_default_port())
    }

    /// Resolve a socket for `req`.
    ///
    /// Fails with `ConfigurationError` if an agent on the path has no
    /// connector, `ResolutionError` if a connector fails, and
    /// `ConnectionTimedOut` if the agent's timeout elapses first.
    pub async fn connect(
        &self,
        req: &ClientRequest,
        raw: &RequestOptions,
    ) -> Result<BoxedSocket, NetError> {
        let Some(limit) = self.inner.timeout else {
            return self.resolve(req, raw).await;
        };

        match tokio::time::timeout(limit, self.resolve(req, raw)).await {
            Ok(result) => result,
            Err(_) => {
                let millis = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(url = %req.url(), timeout_ms = millis, "no socket before timeout");
                Err(NetError::ConnectionTimedOut(millis))
            }
        }
    }

    async fn resolve(&self, req: &ClientRequest, raw: &RequestOptions) -> Result<BoxedSocket, NetError> {
        let mut agent = self.clone();
        let mut hop = 0usize;

        'hops: loop {
            let opts = agent.normalize(raw);
            let Some(connector) = agent.inner.connector.as_ref() else {
                tracing::warn!(hop, "agent has no connector");
                return Err(NetError::ConfigurationError);
            };

            tracing::debug!(
                hop,
                protocol = %opts.protocol(),
                host = %opts.host(),
                port = opts.port(),
                secure_endpoint = opts.secure_endpoint(),
                "resolving connection"
            );

            let mut result = connector.connect(req, &opts);
            loop {
                match result.map_err(NetError::resolution)? {
                    Connection::Socket(socket) => {
                        tracing::debug!(hop, peer = ?socket.peer_addr(), "connection resolved");
                        return Ok(socket);
                    }
                    Connection::Pending(pending) => {
                        tracing::trace!(hop, "awaiting pending connection");
                        result = pending.await;
                    }
                    Connection::Agent(next) => {
                        tracing::trace!(hop, "delegating to next agent");
                        agent = next;
                        hop += 1;
                        continue 'hops;
                    }
                }
            }
        }
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("protocol", &self.inner.protocol)
            .field("default_port", &self.explicit_default_port())
            .field("timeout", &self.inner.timeout)
            .field("has_connector", &self.has_connector())
            .finish()
    }
}

/// Builder for an [`Agent`].
#[derive(Default)]
pub struct AgentBuilder {
    connector: Option<Box<dyn Connect>>,
    protocol: Protocol,
    default_port: Option<u16>,
    timeout: Option<Duration>,
}

impl AgentBuilder {
    pub fn connector<C: Connect>(mut self, connector: C) -> Self {
        self.connector = Some(Box::new(connector));
        self
    }

    /// Same as [`connector`](Self::connector), with closure argument types
    /// inferred.
    pub fn connect_fn<F>(self, f: F) -> Self
    where
        F: Fn(&ClientRequest, &ConnectOptions) -> Result<Connection, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.connector(f)
    }

    /// Protocol assumed when a request does not name one.
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Fixed default port for every scheme, instead of 80 / 443.
    pub fn default_port(mut self, port: u16) -> Self {
        self.default_port = Some(port);
        self
    }

    /// Upper bound on resolving a socket, across all delegation hops.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Agent {
        Agent {
            inner: Arc::new(AgentInner {
                connector: self.connector,
                protocol: self.protocol,
                default_port: AtomicU16::new(self.default_port.unwrap_or(0)),
                timeout: self.timeout,
            }),
        }
    }
}
