//! HTTP/1.1 request pipeline on top of agent-resolved sockets.

pub mod response;
pub mod responsebody;
pub mod streamfactory;

pub use response::HttpResponse;
pub use responsebody::ResponseBody;
pub use streamfactory::{HttpStream, HttpStreamFactory};
