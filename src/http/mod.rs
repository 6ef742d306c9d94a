//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, routes, middleware)
//!     → request.rs (buffer body, request ID, extraction helpers)
//!     → normalize (canonical key-value mapping)
//!     → forward (routing directive, outbound call)
//!     → response.rs (verbatim relay, error taxonomy)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::{RelayError, UpstreamResponse};
pub use server::HttpServer;
