//! Content API errors.

use plinth_store::StoreError;

/// Failure of a content API operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unknown language, path, placeholder or source object, or a page the
    /// viewer may not see. Indistinguishable on purpose.
    #[error("not found: {0}")]
    NotFound(String),
    /// The content store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
