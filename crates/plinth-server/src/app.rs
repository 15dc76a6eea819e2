//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::{MethodRouter, get};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/languages/", read_only(get(handlers::languages::get_languages)))
        .route(
            "/{language}/pages-tree/",
            read_only(get(handlers::pages::get_page_tree)),
        )
        .route(
            "/{language}/pages-root/",
            read_only(get(handlers::pages::get_page_root)),
        )
        .route(
            "/{language}/pages/{*path}",
            read_only(get(handlers::pages::get_page)),
        )
        .route(
            "/{language}/placeholders/{content_type}/{object_id}/{slot}/",
            read_only(get(handlers::placeholders::get_placeholder)),
        )
        .route(
            "/{language}/aliases/",
            read_only(get(handlers::aliases::get_aliases)),
        );

    let router = if state.api_prefix.is_empty() {
        Router::new().merge(api_routes)
    } else {
        Router::new().nest(&state.api_prefix, api_routes)
    };

    router
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(security::csp_layer())
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer()),
        )
        .with_state(state)
}

/// GET (and implicitly HEAD) plus OPTIONS; other methods answer 405.
fn read_only(route: MethodRouter<Arc<AppState>>) -> MethodRouter<Arc<AppState>> {
    route.options(handlers::options)
}

async fn not_found() -> ServerError {
    ServerError::NotFound("route".to_owned())
}
