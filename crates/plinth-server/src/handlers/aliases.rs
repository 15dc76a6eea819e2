//! Aliases endpoint.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;

use crate::error::ServerError;
use crate::handlers::json_response;
use crate::request::request_context;
use crate::state::AppState;

/// Handle GET /{language}/aliases/.
pub(crate) async fn get_aliases(
    Path(language): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let ctx = request_context(&state, &headers);
    let aliases = state.api.aliases(&ctx, &language)?;
    json_response(&state, &headers, &aliases)
}
