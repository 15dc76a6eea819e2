//! HTTP request handlers.

pub(crate) mod aliases;
pub(crate) mod languages;
pub(crate) mod pages;
pub(crate) mod placeholders;

use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use md5::{Digest, Md5};
use serde::Serialize;

use crate::error::ServerError;
use crate::state::AppState;

/// Methods every API route answers.
pub(crate) const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Handle OPTIONS on any API route.
pub(crate) async fn options() -> impl IntoResponse {
    (StatusCode::OK, [(header::ALLOW, ALLOWED_METHODS)])
}

/// Serialize `payload` as a JSON response with an `ETag`.
///
/// Returns 304 without a body when `If-None-Match` names the tag.
pub(crate) fn json_response<T: Serialize>(
    state: &AppState,
    headers: &HeaderMap,
    payload: &T,
) -> Result<Response, ServerError> {
    let body = serde_json::to_vec(payload).map_err(|e| ServerError::Internal(e.to_string()))?;
    let etag = compute_etag(&state.version, &body);

    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && if_none_match.to_str().is_ok_and(|value| etag_matches(value, &etag))
    {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            ),
            (header::CACHE_CONTROL, HeaderValue::from_static("private, max-age=60")),
        ],
        [(header::ETAG, etag)],
        body,
    )
        .into_response())
}

/// Compute `ETag` from version and body.
///
/// MD5 truncated to 64 bits (16 hex chars).
fn compute_etag(version: &str, body: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(version.as_bytes());
    hasher.update(b":");
    hasher.update(body);
    format!("\"{}\"", &hex::encode(hasher.finalize())[..16])
}

/// Weak comparison of an `If-None-Match` list against `etag`.
///
/// `*` matches any tag and a `W/` prefix is ignored.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etag_matches_exact() {
        assert!(etag_matches("\"abc\"", "\"abc\""));
        assert!(!etag_matches("\"abd\"", "\"abc\""));
    }

    #[test]
    fn test_etag_matches_list_and_weak_tags() {
        assert!(etag_matches("\"x\", \"abc\"", "\"abc\""));
        assert!(etag_matches("W/\"abc\"", "\"abc\""));
        assert!(etag_matches("\"x\",W/\"abc\"", "\"abc\""));
        assert!(!etag_matches("\"x\", W/\"y\"", "\"abc\""));
    }

    #[test]
    fn test_etag_matches_wildcard() {
        assert!(etag_matches("*", "\"abc\""));
        assert!(!etag_matches("", "\"abc\""));
    }

    #[test]
    fn test_compute_etag_includes_version() {
        let etag1 = compute_etag("1.0.0", b"content");
        let etag2 = compute_etag("1.0.1", b"content");

        assert_ne!(etag1, etag2);
    }

    #[test]
    fn test_compute_etag_includes_body() {
        let etag1 = compute_etag("1.0.0", b"content1");
        let etag2 = compute_etag("1.0.0", b"content2");

        assert_ne!(etag1, etag2);
    }

    #[test]
    fn test_compute_etag_format() {
        let etag = compute_etag("1.0.0", b"content");

        assert!(etag.starts_with('"'));
        assert!(etag.ends_with('"'));
        assert_eq!(etag.len(), 18);
    }
}
