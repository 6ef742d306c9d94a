//! Protection Relay Library

pub mod config;
pub mod forward;
pub mod http;
pub mod mock;
pub mod normalize;

pub use config::RelayConfig;
pub use http::HttpServer;
