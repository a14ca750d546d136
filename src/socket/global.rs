//! Process-wide agents used when a request does not bring its own.
//!
//! Each protocol has a slot. An empty slot resolves to a lazily built
//! default agent whose connector is [`ConnectJob`]. [`install`] replaces the
//! slot until the returned guard is dropped.
//!
//! ```rust,ignore
//! use agentnet::socket::{global, options::Protocol};
//!
//! let _guard = global::install(Protocol::Http, my_agent.clone());
//! // Requests without an explicit agent now resolve through `my_agent`.
//! ```

use crate::socket::agent::Agent;
use crate::socket::connectjob::ConnectJob;
use crate::socket::options::Protocol;
use std::sync::{LazyLock, PoisonError, RwLock};

static INSTALLED: RwLock<[Option<Agent>; 2]> = RwLock::new([None, None]);

static DEFAULTS: LazyLock<[Agent; 2]> =
    LazyLock::new(|| [build_default(Protocol::Http), build_default(Protocol::Https)]);

fn build_default(protocol: Protocol) -> Agent {
    Agent::builder().protocol(protocol).connector(ConnectJob).build()
}

fn slot(protocol: Protocol) -> usize {
    match protocol {
        Protocol::Http => 0,
        Protocol::Https => 1,
    }
}

/// The built-in agent for `protocol`, ignoring anything installed.
pub fn default_agent(protocol: Protocol) -> Agent {
    DEFAULTS[slot(protocol)].clone()
}

/// The agent requests for `protocol` use when none is given.
pub fn global_agent(protocol: Protocol) -> Agent {
    let installed = INSTALLED.read().unwrap_or_else(PoisonError::into_inner);
    match &installed[slot(protocol)] {
        Some(agent) => agent.clone(),
        None => default_agent(protocol),
    }
}

/// Make `agent` the global agent for `protocol`.
///
/// The previous agent comes back when the guard is dropped. Guards for the
/// same protocol should be dropped in reverse order of installation.
#[must_use = "the agent is uninstalled when the guard is dropped"]
pub fn install(protocol: Protocol, agent: Agent) -> GlobalAgentGuard {
    let mut installed = INSTALLED.write().unwrap_or_else(PoisonError::into_inner);
    let previous = installed[slot(protocol)].replace(agent);
    tracing::debug!(%protocol, "installed global agent");
    GlobalAgentGuard { protocol, previous }
}

/// Restores the previously installed global agent on drop.
#[derive(Debug)]
pub struct GlobalAgentGuard {
    protocol: Protocol,
    previous: Option<Agent>,
}

impl Drop for GlobalAgentGuard {
    fn drop(&mut self) {
        let mut installed = INSTALLED.write().unwrap_or_else(PoisonError::into_inner);
        installed[slot(self.protocol)] = self.previous.take();
        tracing::debug!(protocol = %self.protocol, "restored global agent");
    }
}
