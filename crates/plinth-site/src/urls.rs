//! Link building for API routes and public page URLs.

use plinth_store::{ContentTypeId, ObjectId};

/// Reverses API routes into fully-qualified links.
///
/// `base` is scheme, host and API prefix (e.g., `https://example.com/api`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiUrls {
    base: String,
}

impl ApiUrls {
    /// Create a link builder rooted at `base`.
    #[must_use]
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_owned(),
        }
    }

    /// Link to the language list.
    #[must_use]
    pub fn languages(&self) -> String {
        format!("{}/languages/", self.base)
    }

    /// Link to the page tree of `language`.
    #[must_use]
    pub fn pages_tree(&self, language: &str) -> String {
        format!("{}/{language}/pages-tree/", self.base)
    }

    /// Link to the home page detail of `language`.
    #[must_use]
    pub fn pages_root(&self, language: &str) -> String {
        format!("{}/{language}/pages-root/", self.base)
    }

    /// Link to the detail of the page at `path`.
    #[must_use]
    pub fn page(&self, language: &str, path: &str) -> String {
        format!("{}/{language}/pages/{path}/", self.base)
    }

    /// Link to a placeholder's content.
    #[must_use]
    pub fn placeholder(
        &self,
        language: &str,
        content_type: ContentTypeId,
        object_id: ObjectId,
        slot: &str,
    ) -> String {
        format!(
            "{}/{language}/placeholders/{content_type}/{object_id}/{slot}/",
            self.base
        )
    }
}

/// Public URL of a page path in `language` (`/en/about/`, `/en/` for home).
#[must_use]
pub fn absolute_url(language: &str, path: &str) -> String {
    let path = path.trim_matches('/');
    if path.is_empty() {
        format!("/{language}/")
    } else {
        format!("/{language}/{path}/")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_api_links() {
        let urls = ApiUrls::new("https://example.com/api/");

        assert_eq!(urls.languages(), "https://example.com/api/languages/");
        assert_eq!(urls.pages_tree("en"), "https://example.com/api/en/pages-tree/");
        assert_eq!(urls.pages_root("de"), "https://example.com/api/de/pages-root/");
        assert_eq!(
            urls.page("en", "about/team"),
            "https://example.com/api/en/pages/about/team/"
        );
        assert_eq!(
            urls.placeholder("en", 5, 10, "content"),
            "https://example.com/api/en/placeholders/5/10/content/"
        );
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(absolute_url("en", ""), "/en/");
        assert_eq!(absolute_url("en", "about"), "/en/about/");
        assert_eq!(absolute_url("de", "/ueber/uns/"), "/de/ueber/uns/");
    }
}
