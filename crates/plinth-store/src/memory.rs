//! In-memory content store.
//!
//! [`MemoryStore`] holds an immutable copy of a CMS content tree. It is built
//! either with the builder methods (fixtures) or from a YAML snapshot:
//!
//! ```yaml
//! page_content_type: 5
//! pages:
//!   - { id: 1, site: 1, is_home: true, urls: [{ language: en, path: "" }] }
//!   - { id: 2, site: 1, parent: 1, urls: [{ language: en, path: about }] }
//! page_contents:
//!   - { id: 10, page: 1, language: en, title: Home, template: page.html }
//! placeholders:
//!   - { id: 100, content_type: 5, object_id: 10, slot: content }
//! plugins:
//!   - { id: 1000, placeholder: 100, language: en, plugin_type: TextPlugin,
//!       data: { body: "<p>Hello</p>" } }
//! other_objects:
//!   - { content_type: 7, object_id: 3 }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::model::{
    ContentTypeId, ObjectId, Page, PageContent, PageId, Placeholder, PlaceholderId, PluginRecord,
    SiteId, SourceObject,
};
use crate::store::{ContentStore, StoreError};

/// Content type id used for page contents when none is configured.
const DEFAULT_PAGE_CONTENT_TYPE: ContentTypeId = 1;

/// Owner of placeholders that is not a page content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
struct OtherObject {
    content_type: ContentTypeId,
    object_id: ObjectId,
}

/// On-disk snapshot layout.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Snapshot {
    #[serde(default = "default_page_content_type")]
    page_content_type: ContentTypeId,
    #[serde(default)]
    pages: Vec<Page>,
    #[serde(default)]
    page_contents: Vec<PageContent>,
    #[serde(default)]
    placeholders: Vec<Placeholder>,
    #[serde(default)]
    plugins: Vec<PluginRecord>,
    #[serde(default)]
    other_objects: Vec<OtherObject>,
}

fn default_page_content_type() -> ContentTypeId {
    DEFAULT_PAGE_CONTENT_TYPE
}

/// Immutable in-memory [`ContentStore`].
///
/// Pages are returned in insertion order, which snapshots keep in tree order.
#[derive(Debug)]
pub struct MemoryStore {
    page_content_type: ContentTypeId,
    pages: Vec<Page>,
    contents: Vec<PageContent>,
    placeholders: Vec<Placeholder>,
    plugins: Vec<PluginRecord>,
    other_objects: Vec<OtherObject>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            page_content_type: DEFAULT_PAGE_CONTENT_TYPE,
            pages: Vec::new(),
            contents: Vec::new(),
            placeholders: Vec::new(),
            plugins: Vec::new(),
            other_objects: Vec::new(),
        }
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `content_type` as the owner type of page-content placeholders.
    #[must_use]
    pub fn with_page_content_type(mut self, content_type: ContentTypeId) -> Self {
        self.page_content_type = content_type;
        self
    }

    /// Add a page.
    #[must_use]
    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    /// Add a page content record.
    #[must_use]
    pub fn with_content(mut self, content: PageContent) -> Self {
        self.contents.push(content);
        self
    }

    /// Add a placeholder.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholders.push(placeholder);
        self
    }

    /// Add a placeholder owned by page content `object_id` in `slot`.
    #[must_use]
    pub fn with_page_placeholder(self, id: PlaceholderId, object_id: ObjectId, slot: &str) -> Self {
        let content_type = self.page_content_type;
        self.with_placeholder(Placeholder::new(id, content_type, object_id, slot))
    }

    /// Add a plugin row.
    #[must_use]
    pub fn with_plugin(mut self, plugin: PluginRecord) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Register an owning object that is not a page content.
    #[must_use]
    pub fn with_other_object(mut self, content_type: ContentTypeId, object_id: ObjectId) -> Self {
        self.other_objects.push(OtherObject {
            content_type,
            object_id,
        });
        self
    }

    /// Parse a YAML snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Parse`] on malformed YAML and
    /// [`StoreError::Invalid`] on dangling or duplicate references.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, StoreError> {
        let snapshot: Snapshot = serde_yaml::from_str(yaml)?;
        let store = Self {
            page_content_type: snapshot.page_content_type,
            pages: snapshot.pages,
            contents: snapshot.page_contents,
            placeholders: snapshot.placeholders,
            plugins: snapshot.plugins,
            other_objects: snapshot.other_objects,
        };
        store.validate()?;
        Ok(store)
    }

    /// Read and parse a YAML snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be read, otherwise the
    /// errors of [`MemoryStore::from_yaml_str`].
    pub fn from_yaml_file(path: &Path) -> Result<Self, StoreError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_yaml_str(&yaml)?;
        tracing::info!(
            path = %path.display(),
            pages = store.pages.len(),
            placeholders = store.placeholders.len(),
            plugins = store.plugins.len(),
            "Loaded content snapshot"
        );
        Ok(store)
    }

    fn validate(&self) -> Result<(), StoreError> {
        let mut page_ids = HashSet::new();
        for page in &self.pages {
            if !page_ids.insert(page.id) {
                return Err(StoreError::Invalid(format!("duplicate page id {}", page.id)));
            }
        }
        for content in &self.contents {
            if !page_ids.contains(&content.page) {
                return Err(StoreError::Invalid(format!(
                    "page content {} refers to unknown page {}",
                    content.id, content.page
                )));
            }
        }
        let placeholder_ids: HashSet<_> = self.placeholders.iter().map(|p| p.id).collect();
        for plugin in &self.plugins {
            if !placeholder_ids.contains(&plugin.placeholder) {
                return Err(StoreError::Invalid(format!(
                    "plugin {} refers to unknown placeholder {}",
                    plugin.id, plugin.placeholder
                )));
            }
        }
        Ok(())
    }
}

impl ContentStore for MemoryStore {
    fn pages(&self, site: SiteId) -> Result<Vec<Page>, StoreError> {
        Ok(self
            .pages
            .iter()
            .filter(|page| page.site == site)
            .cloned()
            .collect())
    }

    fn page(&self, id: PageId) -> Result<Option<Page>, StoreError> {
        Ok(self.pages.iter().find(|page| page.id == id).cloned())
    }

    fn page_by_path(&self, site: SiteId, path: &str) -> Result<Option<Page>, StoreError> {
        Ok(self
            .pages
            .iter()
            .find(|page| page.site == site && page.urls.iter().any(|url| url.path == path))
            .cloned())
    }

    fn page_content(
        &self,
        page: PageId,
        language: &str,
    ) -> Result<Option<PageContent>, StoreError> {
        Ok(self
            .contents
            .iter()
            .find(|content| content.page == page && content.language == language)
            .cloned())
    }

    fn page_content_type(&self) -> ContentTypeId {
        self.page_content_type
    }

    fn placeholders_for(
        &self,
        content_type: ContentTypeId,
        object_id: ObjectId,
    ) -> Result<Vec<Placeholder>, StoreError> {
        Ok(self
            .placeholders
            .iter()
            .filter(|p| p.content_type == content_type && p.object_id == object_id)
            .cloned()
            .collect())
    }

    fn placeholder(
        &self,
        content_type: ContentTypeId,
        object_id: ObjectId,
        slot: &str,
    ) -> Result<Option<Placeholder>, StoreError> {
        Ok(self
            .placeholders
            .iter()
            .find(|p| p.content_type == content_type && p.object_id == object_id && p.slot == slot)
            .cloned())
    }

    fn source_object(
        &self,
        content_type: ContentTypeId,
        object_id: ObjectId,
    ) -> Result<Option<SourceObject>, StoreError> {
        if content_type == self.page_content_type {
            return Ok(self
                .contents
                .iter()
                .find(|content| content.id == object_id)
                .cloned()
                .map(SourceObject::PageContent));
        }
        let other = OtherObject {
            content_type,
            object_id,
        };
        Ok(self
            .other_objects
            .contains(&other)
            .then_some(SourceObject::Other {
                content_type,
                object_id,
            }))
    }

    fn plugins(
        &self,
        placeholder: PlaceholderId,
        language: &str,
    ) -> Result<Vec<PluginRecord>, StoreError> {
        let mut rows: Vec<_> = self
            .plugins
            .iter()
            .filter(|p| p.placeholder == placeholder && p.language == language)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.position);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_memory_store_is_send_sync() {
        assert_send_sync::<MemoryStore>();
    }

    fn sample_store() -> MemoryStore {
        MemoryStore::new()
            .with_page_content_type(5)
            .with_page(Page::new(1, 1).home().with_url("en", ""))
            .with_page(Page::new(2, 1).with_parent(1).with_url("en", "about"))
            .with_page(Page::new(3, 2).with_url("en", "elsewhere"))
            .with_content(PageContent::new(10, 1, "en", "Home"))
            .with_content(PageContent::new(20, 2, "en", "About"))
            .with_page_placeholder(100, 10, "content")
            .with_plugin(PluginRecord::new(2, 100, "en", "TextPlugin").at(1))
            .with_plugin(PluginRecord::new(1, 100, "en", "TextPlugin").at(0))
            .with_plugin(PluginRecord::new(3, 100, "de", "TextPlugin"))
            .with_other_object(7, 3)
    }

    #[test]
    fn test_pages_filtered_by_site() {
        let store = sample_store();

        let ids: Vec<_> = store.pages(1).unwrap().iter().map(|p| p.id).collect();

        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_page_by_path_resolves_home_with_empty_path() {
        let store = sample_store();

        assert_eq!(store.page_by_path(1, "").unwrap().unwrap().id, 1);
        assert_eq!(store.page_by_path(1, "about").unwrap().unwrap().id, 2);
        assert!(store.page_by_path(1, "elsewhere").unwrap().is_none());
    }

    #[test]
    fn test_page_content_exact_language() {
        let store = sample_store();

        assert_eq!(store.page_content(1, "en").unwrap().unwrap().title, "Home");
        assert!(store.page_content(1, "de").unwrap().is_none());
    }

    #[test]
    fn test_placeholder_lookup() {
        let store = sample_store();

        assert_eq!(store.placeholder(5, 10, "content").unwrap().unwrap().id, 100);
        assert!(store.placeholder(5, 10, "sidebar").unwrap().is_none());
        assert_eq!(store.placeholders_for(5, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_source_object_kinds() {
        let store = sample_store();

        assert!(matches!(
            store.source_object(5, 10).unwrap(),
            Some(SourceObject::PageContent(content)) if content.title == "Home"
        ));
        assert_eq!(
            store.source_object(7, 3).unwrap(),
            Some(SourceObject::Other {
                content_type: 7,
                object_id: 3
            })
        );
        assert!(store.source_object(7, 4).unwrap().is_none());
        assert!(store.source_object(5, 99).unwrap().is_none());
    }

    #[test]
    fn test_plugins_sorted_by_position_and_filtered_by_language() {
        let store = sample_store();

        let ids: Vec<_> = store.plugins(100, "en").unwrap().iter().map(|p| p.id).collect();

        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
page_content_type: 5
pages:
  - { id: 1, site: 1, is_home: true, urls: [{ language: en, path: "" }] }
  - { id: 2, site: 1, parent: 1, languages: [en], urls: [{ language: en, path: about }] }
page_contents:
  - { id: 10, page: 1, language: en, title: Home, template: page.html }
placeholders:
  - { id: 100, content_type: 5, object_id: 10, slot: content }
plugins:
  - { id: 1000, placeholder: 100, language: en, plugin_type: TextPlugin, data: { body: "<p>Hello</p>" } }
"#;
        let store = MemoryStore::from_yaml_str(yaml).unwrap();

        assert_eq!(store.page_content_type(), 5);
        assert_eq!(store.pages(1).unwrap().len(), 2);
        let plugins = store.plugins(100, "en").unwrap();
        assert_eq!(plugins[0].data.as_ref().unwrap()["body"], "<p>Hello</p>");
    }

    #[test]
    fn test_from_yaml_str_rejects_dangling_content() {
        let yaml = "page_contents:\n  - { id: 10, page: 9, language: en, title: Lost }\n";

        let err = MemoryStore::from_yaml_str(yaml).unwrap_err();

        assert!(matches!(err, StoreError::Invalid(msg) if msg.contains("unknown page 9")));
    }

    #[test]
    fn test_from_yaml_str_rejects_duplicate_pages() {
        let yaml = "pages:\n  - { id: 1, site: 1 }\n  - { id: 1, site: 1 }\n";

        assert!(matches!(
            MemoryStore::from_yaml_str(yaml),
            Err(StoreError::Invalid(_))
        ));
    }

    #[test]
    fn test_from_yaml_file_missing() {
        let tmp = tempfile::tempdir().unwrap();

        let err = MemoryStore::from_yaml_file(&tmp.path().join("missing.yaml")).unwrap_err();

        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_from_yaml_file_reads_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("content.yaml");
        std::fs::write(&path, "pages:\n  - { id: 1, site: 1 }\n").unwrap();

        let store = MemoryStore::from_yaml_file(&path).unwrap();

        assert_eq!(store.pages(1).unwrap().len(), 1);
    }
}
