//! Content store trait and error type.

use std::path::PathBuf;

use crate::model::{
    ContentTypeId, ObjectId, Page, PageContent, PageId, Placeholder, PlaceholderId, PluginRecord,
    SiteId, SourceObject,
};

/// Failure of the data-access collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend cannot answer right now.
    #[error("content store unavailable: {0}")]
    Unavailable(String),
    /// A content snapshot could not be read.
    #[error("failed to read content snapshot {}: {source}", path.display())]
    Io {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A content snapshot could not be parsed.
    #[error("invalid content snapshot: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// A content snapshot is internally inconsistent.
    #[error("invalid content snapshot: {0}")]
    Invalid(String),
}

/// Read-only access to the host CMS's pages, placeholders and plugins.
///
/// Implementations are shared across requests and must be safe to call
/// concurrently. Every lookup that can legitimately find nothing returns
/// `Ok(None)` or an empty list; `Err` is reserved for backend failures.
pub trait ContentStore: Send + Sync {
    /// All pages of `site` in tree order.
    fn pages(&self, site: SiteId) -> Result<Vec<Page>, StoreError>;

    /// Page by identity.
    fn page(&self, id: PageId) -> Result<Option<Page>, StoreError>;

    /// Page of `site` whose URL path (in any language) equals `path`.
    ///
    /// `""` resolves the home page.
    fn page_by_path(&self, site: SiteId, path: &str) -> Result<Option<Page>, StoreError>;

    /// The content record of `page` in exactly `language`.
    fn page_content(&self, page: PageId, language: &str)
    -> Result<Option<PageContent>, StoreError>;

    /// Content type id under which page contents own placeholders.
    fn page_content_type(&self) -> ContentTypeId;

    /// Placeholders physically attached to an owning object.
    fn placeholders_for(
        &self,
        content_type: ContentTypeId,
        object_id: ObjectId,
    ) -> Result<Vec<Placeholder>, StoreError>;

    /// The placeholder in `slot` of an owning object.
    fn placeholder(
        &self,
        content_type: ContentTypeId,
        object_id: ObjectId,
        slot: &str,
    ) -> Result<Option<Placeholder>, StoreError>;

    /// The object a placeholder points back to, if it still exists.
    fn source_object(
        &self,
        content_type: ContentTypeId,
        object_id: ObjectId,
    ) -> Result<Option<SourceObject>, StoreError>;

    /// Flat plugin rows of a placeholder in `language`.
    fn plugins(
        &self,
        placeholder: PlaceholderId,
        language: &str,
    ) -> Result<Vec<PluginRecord>, StoreError>;
}
