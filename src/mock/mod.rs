//! Local mock upstream endpoints.
//!
//! These stand in for a real protection service during development: protect
//! prefixes the data with a marker, reveal strips it again. They share the
//! relay's body normalization pipeline so the same curl invocations work
//! against both.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::http::request::{content_type, read_body};
use crate::http::response::RelayError;
use crate::http::server::AppState;
use crate::normalize::{normalized_body, NormalizedBody};

/// Marker prefix applied by the mock protect operation.
const PROTECTED_PREFIX: &str = "pd:";

/// External version reported by the mock protect operation.
const EXTERNAL_VERSION: &str = "1001002";

/// `POST /mock/v1/protect`
pub async fn mock_protect(State(state): State<AppState>, request: Request<Body>) -> Response {
    match normalize_request(&state, request).await.and_then(|body| protect_response(&body)) {
        Ok(body) => Json(body).into_response(),
        Err(err) => err.into_response(),
    }
}

/// `POST /mock/v1/reveal`
pub async fn mock_reveal(State(state): State<AppState>, request: Request<Body>) -> Response {
    match normalize_request(&state, request).await.and_then(|body| reveal_response(&body)) {
        Ok(body) => Json(body).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn normalize_request(
    state: &AppState,
    request: Request<Body>,
) -> Result<NormalizedBody, RelayError> {
    let (parts, bytes) = read_body(request, state.limits.max_body_size).await?;
    Ok(normalized_body(
        &bytes,
        content_type(&parts),
        parts.uri.query(),
    ))
}

/// Build the mock protect payload, or reject when required fields are absent.
fn protect_response(body: &NormalizedBody) -> Result<Value, RelayError> {
    let policy = body.get("protection_policy_name").filter(|v| is_truthy(v));
    let data = body.get("data").filter(|v| !v.is_null());
    let (Some(_), Some(data)) = (policy, data) else {
        return Err(RelayError::BadRequest(
            "protection_policy_name and data are required".into(),
        ));
    };
    Ok(json!({
        "protected_data": format!("{}{}", PROTECTED_PREFIX, render(data)),
        "external_version": EXTERNAL_VERSION,
    }))
}

/// Build the mock reveal payload, stripping the protect marker when present.
fn reveal_response(body: &NormalizedBody) -> Result<Value, RelayError> {
    let policy = body.get("protection_policy_name").filter(|v| is_truthy(v));
    let protected = body.get("protected_data").filter(|v| !v.is_null());
    let (Some(_), Some(protected)) = (policy, protected) else {
        return Err(RelayError::BadRequest(
            "protection_policy_name and protected_data are required".into(),
        ));
    };
    let data = match protected.as_str() {
        Some(s) => s.strip_prefix(PROTECTED_PREFIX).unwrap_or(s).to_string(),
        None => render(protected),
    };
    Ok(json!({ "data": data }))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(value: Value) -> NormalizedBody {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_protect_round_trips_through_reveal() {
        let protected = protect_response(&body(json!({
            "protection_policy_name": "p1",
            "data": "4111-1111",
        })))
        .unwrap();
        assert_eq!(protected["protected_data"], "pd:4111-1111");
        assert_eq!(protected["external_version"], EXTERNAL_VERSION);

        let revealed = reveal_response(&body(json!({
            "protection_policy_name": "p1",
            "protected_data": protected["protected_data"].clone(),
        })))
        .unwrap();
        assert_eq!(revealed["data"], "4111-1111");
    }

    #[test]
    fn test_protect_requires_policy_and_data() {
        let err = protect_response(&body(json!({"data": "X"}))).unwrap_err();
        assert_eq!(err.kind(), "bad_request");

        let err = protect_response(&body(json!({"protection_policy_name": ""}))).unwrap_err();
        assert_eq!(err.kind(), "bad_request");
    }

    #[test]
    fn test_protect_accepts_empty_data_string() {
        let protected = protect_response(&body(json!({
            "protection_policy_name": "p1",
            "data": "",
        })))
        .unwrap();
        assert_eq!(protected["protected_data"], "pd:");
    }

    #[test]
    fn test_reveal_passes_through_unprefixed_values() {
        let revealed = reveal_response(&body(json!({
            "protection_policy_name": "p1",
            "protected_data": "plain",
        })))
        .unwrap();
        assert_eq!(revealed["data"], "plain");

        let revealed = reveal_response(&body(json!({
            "protection_policy_name": "p1",
            "protected_data": 42,
        })))
        .unwrap();
        assert_eq!(revealed["data"], "42");
    }

    #[test]
    fn test_reveal_requires_protected_data() {
        let err = reveal_response(&body(json!({
            "protection_policy_name": "p1",
            "protected_data": null,
        })))
        .unwrap_err();
        assert_eq!(err.kind(), "bad_request");
    }
}
