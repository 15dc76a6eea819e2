//! Placeholder endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use plinth_store::{ContentTypeId, ObjectId};

use crate::error::ServerError;
use crate::handlers::json_response;
use crate::request::{html_requested, request_context};
use crate::state::AppState;

/// Path segments of a placeholder route.
///
/// Ids are taken as strings so malformed ids answer 404 like any other
/// unknown placeholder.
type PlaceholderPath = (String, String, String, String);

/// Handle GET /{language}/placeholders/{content_type}/{object_id}/{slot}/.
pub(crate) async fn get_placeholder(
    Path((language, content_type, object_id, slot)): Path<PlaceholderPath>,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let (Ok(content_type), Ok(object_id)) = (
        content_type.parse::<ContentTypeId>(),
        object_id.parse::<ObjectId>(),
    ) else {
        return Err(ServerError::NotFound(format!(
            "placeholder {content_type}/{object_id}"
        )));
    };

    let ctx = request_context(&state, &headers);
    let payload = state.api.placeholder(
        &ctx,
        &language,
        content_type,
        object_id,
        &slot,
        html_requested(&params),
    )?;
    json_response(&state, &headers, &payload)
}
