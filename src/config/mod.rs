//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (PORT)
//!     → RelayConfig (immutable)
//!     → handed to the HTTP server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields have defaults so the relay runs with no config file at all
//! - Environment overrides are applied after file parsing, never before

pub mod loader;
pub mod schema;

pub use schema::RelayConfig;
pub use schema::ForwardConfig;
pub use schema::LimitsConfig;
pub use schema::ListenerConfig;
