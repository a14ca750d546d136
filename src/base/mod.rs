//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): network error codes following Chromium's
//!   `net_error_list.h`, plus the agent's configuration and resolution errors
//! - [`IoResultExt`](context::IoResultExt): context helpers for IO results

pub mod context;
pub mod neterror;
