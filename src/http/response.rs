//! Response handling and error mapping.
//!
//! # Responsibilities
//! - Map relay failures to the fixed error taxonomy and HTTP statuses
//! - Render errors as JSON `{error, message}` bodies
//! - Relay upstream responses verbatim (status, bytes, content type)
//!
//! # Design Decisions
//! - Upstream payloads are never re-parsed or re-serialized
//! - A missing upstream Content-Type defaults to application/json
//! - Normalization failures never reach this layer; forwarding failures
//!   always do

use axum::body::{Body, Bytes};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failure taxonomy for request handling.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Missing or invalid routing directive (host, port, scheme).
    #[error("{0}")]
    InvalidInput(String),

    /// Missing required fields on the mock endpoints.
    #[error("{0}")]
    BadRequest(String),

    /// The outbound call failed at the transport level.
    #[error("{0}")]
    UpstreamRequestFailed(String),

    /// Any other unexpected failure during request handling.
    #[error("{0}")]
    Exception(String),
}

impl RelayError {
    /// Wire-level error tag.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::InvalidInput(_) => "invalid_input",
            RelayError::BadRequest(_) => "bad_request",
            RelayError::UpstreamRequestFailed(_) => "upstream_request_failed",
            RelayError::Exception(_) => "exception",
        }
    }

    /// HTTP status associated with this error kind.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidInput(_) | RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::UpstreamRequestFailed(_) => StatusCode::BAD_GATEWAY,
            RelayError::Exception(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

/// Raw response captured from the upstream call, relayed unmodified.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let built = Response::builder()
            .status(self.status)
            .header(header::CONTENT_TYPE, &self.content_type)
            .body(Body::from(self.body));
        match built {
            Ok(response) => response,
            Err(e) => RelayError::Exception(e.to_string()).into_response(),
        }
    }
}
