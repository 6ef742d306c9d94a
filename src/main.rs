//! Protection Relay
//!
//! A small HTTP relay built with Tokio and Axum. It normalizes inbound
//! request bodies from several possible encodings into one canonical
//! key-value mapping, extracts routing directives (host, port, scheme,
//! base_path) from that mapping, and forwards the remaining fields as JSON
//! to a caller-specified protection service, relaying the upstream response
//! back verbatim.
//!
//! ```text
//!     Client ──▶ normalize ──▶ forward ──▶ Upstream
//!            ◀── verbatim relay / structured error ◀──
//! ```

use std::path::PathBuf;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use protection_relay::config::loader::load_config;
use protection_relay::http::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional config file as the first argument; env overrides always apply.
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;

    // Initialize tracing subscriber; RUST_LOG wins over the configured level.
    let default_filter = format!(
        "protection_relay={},tower_http={}",
        config.observability.log_level, config.observability.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("protection-relay v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        forward_timeout_secs = config.forward.timeout_secs,
        max_body_size = config.limits.max_body_size,
        "Configuration loaded"
    );

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    // Create and run HTTP server
    let server = HttpServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
