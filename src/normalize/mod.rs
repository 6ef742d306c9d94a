//! Body normalization subsystem.
//!
//! # Data Flow
//! ```text
//! raw body bytes + Content-Type + query string
//!     → lossy text decode (charset param or UTF-8)
//!     → strict JSON parse (objects only)
//!     → loose parse for unquoted curl-style bodies {k:v,k:v}
//!     → lenient whole-body fallback (objects only)
//!     → overlay form fields (form wins on collision)
//!     → overlay query params (missing keys only)
//!     → NormalizedBody
//! ```
//!
//! # Design Decisions
//! - Normalization never fails: every stage error degrades to an empty
//!   contribution and the pipeline continues
//! - Each parse stage is a pure function returning an Option, not an error
//! - Non-object JSON (arrays, scalars) is treated as absent, never forwarded
//! - The loose parser splits key/value on the FIRST colon; values containing
//!   colons (URLs) mis-parse and that behavior is intentional

use serde_json::Value;

/// Canonical flat key-value mapping derived from a request.
pub type NormalizedBody = serde_json::Map<String, Value>;

/// Produce the canonical mapping for one request.
///
/// `raw` is the undecoded body, `content_type` the Content-Type header value
/// if any, `query` the raw query string if any.
pub fn normalized_body(
    raw: &[u8],
    content_type: Option<&str>,
    query: Option<&str>,
) -> NormalizedBody {
    let text = decode_lossy(raw, content_type);
    let mut body = parse_body_text(&text);

    // Form fields overlay the JSON-derived base and win on collision.
    if is_form_urlencoded(content_type) {
        for (key, value) in url::form_urlencoded::parse(raw) {
            body.insert(key.into_owned(), Value::String(value.into_owned()));
        }
    }

    // Query parameters are the lowest-precedence source: gap fill only.
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            body.entry(key.into_owned())
                .or_insert_with(|| Value::String(value.into_owned()));
        }
    }

    body
}

/// Decode a request body to text using the request's declared charset, or
/// UTF-8 when none is usable. Undecodable sequences are replaced, never
/// rejected.
pub fn decode_lossy(raw: &[u8], content_type: Option<&str>) -> String {
    match charset_param(content_type) {
        Some(charset) if is_latin1(&charset) => raw.iter().map(|&b| b as char).collect(),
        // UTF-8, unknown or absent charsets all decode leniently as UTF-8.
        _ => String::from_utf8_lossy(raw).into_owned(),
    }
}

/// Run the ordered body parse chain over the decoded text.
fn parse_body_text(text: &str) -> NormalizedBody {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return NormalizedBody::new();
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Some(map) = parse_strict(trimmed) {
            return map;
        }
        if trimmed.starts_with('{') && trimmed.contains(':') {
            if let Some(map) = parse_loose(trimmed) {
                return map;
            }
        }
    }

    // Lenient fallback over the whole body: objects only, else empty.
    parse_strict(trimmed).unwrap_or_default()
}

/// Strict JSON parse; yields a mapping only for top-level objects.
fn parse_strict(text: &str) -> Option<NormalizedBody> {
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Tolerant parse for quasi-JSON written without quoting, e.g. `{a:1, b:2}`
/// as produced by hand-typed curl invocations. All values come out as
/// strings. Yields a mapping only when at least one pair survives.
fn parse_loose(text: &str) -> Option<NormalizedBody> {
    let inner = text.trim_matches(|c| c == '{' || c == '}');
    let mut map = NormalizedBody::new();
    for segment in inner.split(',') {
        let Some((key, value)) = segment.split_once(':') else {
            continue;
        };
        let key = key.trim().trim_matches('"');
        let value = value.trim().trim_matches('"');
        if !key.is_empty() {
            map.insert(key.to_string(), Value::String(value.to_string()));
        }
    }
    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

/// Extract the `charset` parameter from a Content-Type header value.
fn charset_param(content_type: Option<&str>) -> Option<String> {
    let content_type = content_type?;
    for param in content_type.split(';').skip(1) {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("charset") {
            return Some(value.trim().trim_matches('"').to_string());
        }
    }
    None
}

fn is_latin1(charset: &str) -> bool {
    charset.eq_ignore_ascii_case("iso-8859-1")
        || charset.eq_ignore_ascii_case("latin-1")
        || charset.eq_ignore_ascii_case("latin1")
}

/// True when the Content-Type carries form-urlencoded fields.
fn is_form_urlencoded(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
        .unwrap_or(false)
}
