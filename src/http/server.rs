//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, inbound timeout, request ID)
//! - Serve the static demo UI
//! - Dispatch proxy requests through normalization into the forwarder
//! - Relay upstream responses and map failures to the error taxonomy

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::{any, post},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeFile,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{LimitsConfig, RelayConfig};
use crate::forward::{Forwarder, Operation};
use crate::http::request::{content_type, read_body, request_id, UuidRequestId};
use crate::mock;
use crate::normalize::{decode_lossy, normalized_body};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub limits: LimitsConfig,
}

/// HTTP server for the protection relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Self {
        let forwarder = Arc::new(Forwarder::new(Duration::from_secs(
            config.forward.timeout_secs,
        )));

        let state = AppState {
            forwarder,
            limits: config.limits.clone(),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all routes and middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let assets = &config.static_files.root;

        Router::new()
            .route("/proxy/v1/protect", post(proxy_protect))
            .route("/proxy/v1/reveal", post(proxy_reveal))
            .route("/proxy/_debug", any(proxy_debug))
            .route("/mock/v1/protect", post(mock::mock_protect))
            .route("/mock/v1/reveal", post(mock::mock_reveal))
            .route_service("/", ServeFile::new(assets.join("index.html")))
            .route_service("/style.css", ServeFile::new(assets.join("style.css")))
            // ES modules need an explicit javascript MIME type.
            .route_service(
                "/app.js",
                ServeFile::new_with_mime(assets.join("app.js"), &mime::TEXT_JAVASCRIPT),
            )
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.limits.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            forward_timeout_secs = self.config.forward.timeout_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

async fn proxy_protect(State(state): State<AppState>, request: Request<Body>) -> Response {
    relay(state, request, Operation::Protect).await
}

async fn proxy_reveal(State(state): State<AppState>, request: Request<Body>) -> Response {
    relay(state, request, Operation::Reveal).await
}

/// Shared proxy handler: normalize the inbound request, forward the payload,
/// relay the upstream response or a structured error.
async fn relay(state: AppState, request: Request<Body>, operation: Operation) -> Response {
    let (parts, bytes) = match read_body(request, state.limits.max_body_size).await {
        Ok(read) => read,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to read request body");
            return err.into_response();
        }
    };
    let request_id = request_id(&parts).to_string();
    let body = normalized_body(&bytes, content_type(&parts), parts.uri.query());

    tracing::debug!(
        request_id = %request_id,
        operation = operation.suffix(),
        fields = body.len(),
        "Relaying request"
    );

    match state.forwarder.forward(operation, body).await {
        Ok(upstream) => upstream.into_response(),
        Err(err) => {
            tracing::warn!(
                request_id = %request_id,
                operation = operation.suffix(),
                kind = err.kind(),
                error = %err,
                "Relay failed"
            );
            err.into_response()
        }
    }
}

/// `GET|POST /proxy/_debug` — echo what normalization sees, for diagnosing
/// client encoding problems.
async fn proxy_debug(State(state): State<AppState>, request: Request<Body>) -> Response {
    let method = request.method().clone();
    let (parts, bytes) = match read_body(request, state.limits.max_body_size).await {
        Ok(read) => read,
        Err(err) => return err.into_response(),
    };
    let content_type = content_type(&parts).map(str::to_string);
    let text = decode_lossy(&bytes, content_type.as_deref());
    let parsed = normalized_body(&bytes, content_type.as_deref(), parts.uri.query());

    Json(json!({
        "method": method.as_str(),
        "content_type": content_type,
        "raw_len": bytes.len(),
        "raw_preview": text.chars().take(256).collect::<String>(),
        "parsed_body": parsed,
    }))
    .into_response()
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("Shutdown signal received");
}
