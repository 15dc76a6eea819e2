//! Application state.
//!
//! Shared state for all request handlers.

use plinth_site::ContentApi;

use crate::auth::ApiToken;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Content API answering every route.
    pub(crate) api: ContentApi,
    /// Static API tokens for viewer resolution.
    pub(crate) tokens: Vec<ApiToken>,
    /// Scheme used in links when the proxy does not say.
    pub(crate) scheme: String,
    /// Normalized API prefix (no trailing slash, empty for root).
    pub(crate) api_prefix: String,
    /// Enable verbose output (log request contexts).
    pub(crate) verbose: bool,
    /// Application version for `ETag` invalidation.
    pub(crate) version: String,
}
