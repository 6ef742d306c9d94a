//! Request handling and extraction.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4) for tracing
//! - Buffer the inbound body under the configured size limit
//! - Extract normalization inputs (raw bytes, content type, query string)
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body size limits enforced while reading, before any parsing
//! - Handlers receive the raw request and extract pieces explicitly; no
//!   hidden per-request state

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::response::RelayError;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a fresh UUID v4 request ID for each inbound request.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Split a request and buffer its body up to `limit` bytes.
///
/// A body that cannot be read (oversized, aborted connection) is an
/// unexpected failure, not a normalization input, so it surfaces as
/// [`RelayError::Exception`].
pub async fn read_body(
    request: Request<Body>,
    limit: usize,
) -> Result<(Parts, Bytes), RelayError> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| RelayError::Exception(e.to_string()))?;
    Ok((parts, bytes))
}

/// Content-Type header value of a buffered request, if readable.
pub fn content_type(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

/// Request ID assigned by the middleware layer, for log correlation.
pub fn request_id(parts: &Parts) -> &str {
    parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let mut maker = UuidRequestId;
        let request = Request::builder().body(()).unwrap();
        let a = maker.make_request_id(&request).unwrap();
        let b = maker.make_request_id(&request).unwrap();
        assert_ne!(a.header_value(), b.header_value());
    }

    #[tokio::test]
    async fn test_read_body_buffers_bytes() {
        let request = Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"a":1}"#))
            .unwrap();
        let (parts, bytes) = read_body(request, 1024).await.unwrap();
        assert_eq!(content_type(&parts), Some("application/json"));
        assert_eq!(&bytes[..], br#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_read_body_enforces_limit() {
        let request = Request::builder()
            .body(Body::from(vec![0u8; 64]))
            .unwrap();
        let err = read_body(request, 16).await.unwrap_err();
        assert_eq!(err.kind(), "exception");
    }
}
