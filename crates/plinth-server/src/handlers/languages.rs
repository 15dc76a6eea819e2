//! Languages endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;

use crate::error::ServerError;
use crate::handlers::json_response;
use crate::request::request_context;
use crate::state::AppState;

/// Handle GET /languages/.
pub(crate) async fn get_languages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let ctx = request_context(&state, &headers);
    let languages = state.api.languages(&ctx)?;
    json_response(&state, &headers, &languages)
}
