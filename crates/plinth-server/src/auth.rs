//! Viewer resolution from static API tokens.
//!
//! Only `Authorization: Token <value>` headers are recognized. Unknown or
//! malformed credentials resolve to the anonymous viewer, which sees public
//! content only.

use axum::http::{HeaderMap, header};
use plinth_store::Viewer;

/// A static API token and the viewer it authenticates as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiToken {
    /// Token value.
    pub token: String,
    /// Viewer the token stands for.
    pub viewer: Viewer,
}

impl ApiToken {
    /// Create a token for `viewer`.
    #[must_use]
    pub fn new(token: &str, viewer: Viewer) -> Self {
        Self {
            token: token.to_owned(),
            viewer,
        }
    }
}

/// Resolve the viewer of a request.
pub(crate) fn resolve_viewer(headers: &HeaderMap, tokens: &[ApiToken]) -> Viewer {
    let Some(presented) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_token)
    else {
        return Viewer::anonymous();
    };

    match tokens.iter().find(|t| t.token == presented) {
        Some(token) => token.viewer.clone(),
        None => {
            tracing::debug!("Unknown API token, continuing as anonymous");
            Viewer::anonymous()
        }
    }
}

fn parse_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("token") && !token.is_empty()).then_some(token)
}
