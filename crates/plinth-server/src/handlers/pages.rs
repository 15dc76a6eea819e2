//! Page endpoints: tree, root and detail.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;

use crate::error::ServerError;
use crate::handlers::json_response;
use crate::request::request_context;
use crate::state::AppState;

/// Handle GET /{language}/pages-tree/.
pub(crate) async fn get_page_tree(
    Path(language): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let ctx = request_context(&state, &headers);
    let tree = state.api.page_tree(&ctx, &language)?;
    json_response(&state, &headers, &tree)
}

/// Handle GET /{language}/pages-root/.
pub(crate) async fn get_page_root(
    Path(language): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let ctx = request_context(&state, &headers);
    let page = state.api.page_root(&ctx, &language)?;
    json_response(&state, &headers, &page)
}

/// Handle GET /{language}/pages/{path}.
pub(crate) async fn get_page(
    Path((language, path)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let ctx = request_context(&state, &headers);
    let page = state.api.page_detail(&ctx, &language, &path)?;
    json_response(&state, &headers, &page)
}
