//! Page metadata payloads and placeholder links.

use std::collections::BTreeMap;

use plinth_store::{ContentStore, Page, PageContent, PermissionPolicy, StoreError, Viewer};
use serde::Serialize;

use crate::settings::{ApiSettings, SiteSettings};
use crate::urls::{ApiUrls, absolute_url};

/// Page payload used by the tree (without placeholders) and detail routes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PagePayload {
    /// Title.
    pub title: String,
    /// Title for the `<title>` element.
    pub page_title: String,
    /// Title for menus.
    pub menu_title: String,
    /// Meta description.
    pub meta_description: String,
    /// Redirect target.
    pub redirect: String,
    /// Public URL of the page.
    pub absolute_url: String,
    /// API link to the page detail.
    pub path: String,
    /// Whether the page is the site's home page.
    pub is_home: bool,
    /// Whether the page shows up in navigation.
    pub in_navigation: bool,
    /// Whether the page starts a navigation root.
    pub soft_root: bool,
    /// Template name.
    pub template: String,
    /// X-Frame-Options policy name.
    pub xframe_options: String,
    /// Whether menu visibility is limited.
    pub limit_visibility_in_menu: bool,
    /// Requested language.
    pub language: String,
    /// Languages the page has content in.
    pub languages: Vec<String>,
    /// Slot name to placeholder link (detail payloads only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholders: Option<BTreeMap<String, String>>,
}

/// Combines page metadata, URLs and placeholder links.
pub struct ContentAssembler<'a> {
    store: &'a dyn ContentStore,
    policy: &'a dyn PermissionPolicy,
    settings: &'a ApiSettings,
}

impl<'a> ContentAssembler<'a> {
    /// Create an assembler over the given collaborators.
    #[must_use]
    pub fn new(
        store: &'a dyn ContentStore,
        policy: &'a dyn PermissionPolicy,
        settings: &'a ApiSettings,
    ) -> Self {
        Self {
            store,
            policy,
            settings,
        }
    }

    /// Whether `viewer` may see `page`.
    ///
    /// Anonymous viewers never see `login_required` pages, whatever the
    /// policy says.
    #[must_use]
    pub fn can_view(&self, viewer: &Viewer, page: &Page) -> bool {
        if page.login_required && !viewer.is_authenticated() {
            return false;
        }
        self.policy.can_view(viewer, page)
    }

    /// Content of `page` in `language`, else in the first fallback that has one.
    pub fn content_for(
        &self,
        page: &Page,
        site: &SiteSettings,
        language: &str,
    ) -> Result<Option<PageContent>, StoreError> {
        if let Some(content) = self.store.page_content(page.id, language)? {
            return Ok(Some(content));
        }
        let fallbacks = site
            .language(language)
            .map(|l| l.fallbacks.as_slice())
            .unwrap_or_default();
        for fallback in fallbacks {
            if let Some(content) = self.store.page_content(page.id, fallback)? {
                return Ok(Some(content));
            }
        }
        Ok(None)
    }

    /// Metadata payload of `page` without placeholders.
    ///
    /// Language-bound fields follow the content, which may be in a fallback
    /// language. Missing content yields empty strings and `false` flags.
    #[must_use]
    pub fn page_payload(
        &self,
        page: &Page,
        content: Option<&PageContent>,
        language: &str,
        urls: &ApiUrls,
    ) -> PagePayload {
        let language = content.map_or(language, |c| c.language.as_str());
        let path = page
            .path(language)
            .or_else(|| page.urls.first().map(|u| u.path.as_str()))
            .unwrap_or_default();
        let api_path = if page.is_home {
            urls.pages_root(language)
        } else {
            urls.page(language, path)
        };

        let text = |value: Option<&String>| value.cloned().unwrap_or_default();
        let title = text(content.map(|c| &c.title));
        let or_title = |value: String| if value.is_empty() { title.clone() } else { value };

        PagePayload {
            page_title: or_title(text(content.map(|c| &c.page_title))),
            menu_title: or_title(text(content.map(|c| &c.menu_title))),
            meta_description: text(content.map(|c| &c.meta_description)),
            redirect: text(content.map(|c| &c.redirect)),
            absolute_url: absolute_url(language, path),
            path: api_path,
            is_home: page.is_home,
            in_navigation: content.is_some_and(|c| c.in_navigation),
            soft_root: content.is_some_and(|c| c.soft_root),
            template: text(content.map(|c| &c.template)),
            xframe_options: text(content.map(|c| &c.xframe_options)),
            limit_visibility_in_menu: content.is_some_and(|c| c.limit_visibility_in_menu),
            language: language.to_owned(),
            languages: page.languages.clone(),
            placeholders: None,
            title,
        }
    }

    /// Page detail payload, `None` when `viewer` may not see the page.
    pub fn assemble(
        &self,
        page: &Page,
        site: &SiteSettings,
        language: &str,
        viewer: &Viewer,
        urls: &ApiUrls,
    ) -> Result<Option<PagePayload>, StoreError> {
        if !self.can_view(viewer, page) {
            return Ok(None);
        }

        let content = self.content_for(page, site, language)?;
        let mut payload = self.page_payload(page, content.as_ref(), language, urls);
        let placeholders = match &content {
            Some(content) => self.placeholder_links(page, content, urls)?,
            None => BTreeMap::new(),
        };
        payload.placeholders = Some(placeholders);
        Ok(Some(payload))
    }

    /// Template in effect for `content`, resolving `INHERIT` up the tree.
    ///
    /// Falls back to the default template when no ancestor names one.
    pub fn effective_template(
        &self,
        page: &Page,
        content: &PageContent,
    ) -> Result<Option<String>, StoreError> {
        if content.template != PageContent::INHERIT {
            return Ok(Some(content.template.clone()));
        }

        let mut parent = page.parent;
        while let Some(id) = parent {
            let Some(ancestor) = self.store.page(id)? else {
                break;
            };
            if let Some(ancestor_content) = self.store.page_content(id, &content.language)?
                && ancestor_content.template != PageContent::INHERIT
            {
                return Ok(Some(ancestor_content.template));
            }
            parent = ancestor.parent;
        }

        Ok(self.settings.default_template().map(str::to_owned))
    }

    /// Links to the placeholders both declared by the template and attached
    /// to `content`, in the content's language.
    fn placeholder_links(
        &self,
        page: &Page,
        content: &PageContent,
        urls: &ApiUrls,
    ) -> Result<BTreeMap<String, String>, StoreError> {
        let Some(template) = self.effective_template(page, content)? else {
            return Ok(BTreeMap::new());
        };
        let Some(declared) = self.settings.template_slots(&template) else {
            tracing::debug!(template = %template, "Unknown template, no placeholders exposed");
            return Ok(BTreeMap::new());
        };

        let content_type = self.store.page_content_type();
        Ok(self
            .store
            .placeholders_for(content_type, content.id)?
            .into_iter()
            .filter(|placeholder| declared.contains(&placeholder.slot))
            .map(|placeholder| {
                let link = urls.placeholder(
                    &content.language,
                    content_type,
                    content.id,
                    &placeholder.slot,
                );
                (placeholder.slot, link)
            })
            .collect())
    }
}
