//! Socket resolution and transport.
//!
//! Mirrors the parts of Chromium's `net/socket/` this crate needs:
//! - [`agent`]: pluggable per-request connection resolution
//! - [`connectjob`]: DNS → TCP → TLS connection flow
//! - [`global`]: process-wide default agents
//! - [`options`]: raw and normalized connect options
//! - [`stream`]: type-erased sockets
//! - [`tls`]: TLS configuration with BoringSSL

pub mod agent;
pub mod connectjob;
pub mod global;
pub mod options;
pub mod stream;
pub mod tls;
