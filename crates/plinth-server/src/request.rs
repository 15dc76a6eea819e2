//! Request context extraction.

use std::collections::HashMap;

use axum::http::{HeaderMap, header};
use plinth_site::RequestContext;

use crate::auth::resolve_viewer;
use crate::state::AppState;

/// Build the content API context of a request.
///
/// Links are absolute: scheme (from `X-Forwarded-Proto` when present),
/// `Host` and the API prefix.
pub(crate) fn request_context(state: &AppState, headers: &HeaderMap) -> RequestContext {
    let host = header_str(headers, header::HOST.as_str());
    let scheme = header_str(headers, "x-forwarded-proto")
        .and_then(|proto| proto.split(',').next())
        .map_or(state.scheme.as_str(), str::trim);
    let base_url = match host {
        Some(host) => format!("{scheme}://{host}{}", state.api_prefix),
        None => state.api_prefix.clone(),
    };

    let header_values: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_owned(), v.to_owned()))
        })
        .collect();

    let ctx = RequestContext {
        viewer: resolve_viewer(headers, &state.tokens),
        host: host.map(str::to_owned),
        headers: header_values,
        base_url,
    };
    if state.verbose {
        tracing::info!(
            host = ?ctx.host,
            user = ?ctx.viewer.username,
            staff = ctx.viewer.is_staff,
            "Request context"
        );
    }
    ctx
}

/// Whether the `html` query parameter asks for a live HTML rendering.
pub(crate) fn html_requested(params: &HashMap<String, String>) -> bool {
    params
        .get("html")
        .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true"))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
