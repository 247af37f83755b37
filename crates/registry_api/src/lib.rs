pub mod http;

pub use http::server::{router, serve, HttpServerConfig};
