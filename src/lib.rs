//! # agentnet
//!
//! Pluggable socket creation for an HTTP/1.1 client.
//!
//! Requests do not open sockets themselves. They ask an [`Agent`], which
//! calls a user-supplied connector. The connector can return a socket, a
//! future that resolves later, or another agent to delegate to, so proxy
//! chains, tunnels and test doubles are all ordinary connectors.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agentnet::base::neterror::BoxError;
//! use agentnet::socket::connectjob::ConnectJob;
//! use agentnet::{Agent, Client, Connection};
//!
//! #[tokio::main]
//! async fn main() {
//!     let agent = Agent::from_fn(|req, opts| {
//!         tracing::info!(url = %req.url(), "connecting");
//!         let opts = opts.clone();
//!         Ok(Connection::pending(async move {
//!             Ok::<_, BoxError>(Connection::Socket(ConnectJob::establish(&opts).await?))
//!         }))
//!     });
//!
//!     let client = Client::builder().agent(agent).build();
//!     let response = client.get("http://example.com/").send().await.unwrap();
//!     println!("Status: {}", response.status());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions
//! - [`socket`] - Agents, connect options and transports
//! - [`http`] - HTTP/1.1 streams and responses
//! - [`client`] - High-level request API

pub mod base;
pub mod client;
pub mod http;
pub mod socket;

pub use base::neterror::{BoxError, NetError};
pub use client::{Client, ClientBuilder, RequestBuilder};
pub use crate::http::HttpResponse;
pub use socket::agent::{Agent, AgentBuilder, Connect, Connection};
pub use socket::options::{ClientRequest, ConnectOptions, Protocol, RequestOptions};
pub use socket::tls::TlsConfig;
