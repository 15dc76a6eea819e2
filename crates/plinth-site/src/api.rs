//! Content API facade used by the HTTP layer.

use std::collections::HashMap;
use std::sync::Arc;

use plinth_cache::Cache;
use plinth_store::{
    ContentStore, ContentTypeId, ObjectId, Page, PageContent, PageId, PermissionPolicy,
    SourceObject, Viewer,
};
use serde::Serialize;

use crate::cache_keys::CacheKeyStore;
use crate::content::{ContentAssembler, PagePayload};
use crate::error::ApiError;
use crate::languages::{LanguagePayload, language_payloads};
use crate::placeholder::{PlaceholderPayload, PlaceholderRenderer};
use crate::plugins::PluginRegistry;
use crate::settings::{ApiSettings, SiteSettings};
use crate::tree::{PageTree, TreeRecord};
use crate::urls::{ApiUrls, absolute_url};

/// Request data the content API depends on.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    /// Who the request is made as.
    pub viewer: Viewer,
    /// `Host` header, used to pick the current site.
    pub host: Option<String>,
    /// Request headers keyed by lower-case name.
    pub headers: HashMap<String, String>,
    /// Scheme, host and API prefix for links.
    pub base_url: String,
}

impl RequestContext {
    /// Create an anonymous request context linking below `base_url`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
            ..Self::default()
        }
    }

    /// Set the viewer.
    #[must_use]
    pub fn with_viewer(mut self, viewer: Viewer) -> Self {
        self.viewer = viewer;
        self
    }

    /// Set the `Host` header.
    #[must_use]
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.to_owned());
        self
    }

    /// Add a request header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_owned());
        self
    }
}

/// Node of the page tree payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageTreeNode {
    /// Page metadata.
    #[serde(flatten)]
    pub page: PagePayload,
    /// Child pages (empty for leaves).
    pub children: Vec<PageTreeNode>,
}

/// A URL a page answers to in one language.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AliasPayload {
    /// Stored page path, without language prefix or slashes.
    pub url: String,
    /// Public URL of the page in the language.
    pub redirect_to: String,
    /// Language code.
    pub language: String,
    /// Whether the page has content in the language.
    pub is_active: bool,
}

/// Page and the content chosen for it, as fed to the tree builder.
struct TreeEntry {
    page: Page,
    content: PageContent,
}

impl TreeRecord for TreeEntry {
    fn node_id(&self) -> PageId {
        self.page.id
    }

    fn parent_id(&self) -> Option<PageId> {
        self.page.parent
    }
}

/// Read-only content API over a content store and a placeholder cache.
///
/// Constructed once per process and shared across requests.
pub struct ContentApi {
    store: Arc<dyn ContentStore>,
    policy: Arc<dyn PermissionPolicy>,
    settings: ApiSettings,
    registry: PluginRegistry,
    keys: CacheKeyStore,
}

impl ContentApi {
    /// Create the API.
    #[must_use]
    pub fn new(
        store: Arc<dyn ContentStore>,
        policy: Arc<dyn PermissionPolicy>,
        cache: &dyn Cache,
        settings: ApiSettings,
        registry: PluginRegistry,
    ) -> Self {
        let keys = CacheKeyStore::new(cache, &settings.cache.prefix);
        Self {
            store,
            policy,
            settings,
            registry,
            keys,
        }
    }

    /// Settings the API was created with.
    #[must_use]
    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    fn assembler(&self) -> ContentAssembler<'_> {
        ContentAssembler::new(self.store.as_ref(), self.policy.as_ref(), &self.settings)
    }

    fn renderer(&self) -> PlaceholderRenderer<'_> {
        PlaceholderRenderer::new(
            self.store.as_ref(),
            &self.registry,
            &self.keys,
            &self.settings.cache,
        )
    }

    fn site(&self, ctx: &RequestContext) -> Result<&SiteSettings, ApiError> {
        self.settings
            .site_for_host(ctx.host.as_deref())
            .ok_or_else(|| ApiError::not_found("site"))
    }

    fn site_with_language(
        &self,
        ctx: &RequestContext,
        language: &str,
    ) -> Result<&SiteSettings, ApiError> {
        let site = self.site(ctx)?;
        if site.language(language).is_none() {
            return Err(ApiError::not_found(format!("language {language}")));
        }
        Ok(site)
    }

    /// Languages of the current site.
    pub fn languages(&self, ctx: &RequestContext) -> Result<Vec<LanguagePayload>, ApiError> {
        let site = self.site(ctx)?;
        Ok(language_payloads(site, &ApiUrls::new(&ctx.base_url)))
    }

    /// Nested tree of the pages `ctx.viewer` may see in `language`.
    ///
    /// Pages without content in the language or a fallback are left out,
    /// together with their descendants.
    pub fn page_tree(
        &self,
        ctx: &RequestContext,
        language: &str,
    ) -> Result<Vec<PageTreeNode>, ApiError> {
        let site = self.site_with_language(ctx, language)?;
        let assembler = self.assembler();
        let urls = ApiUrls::new(&ctx.base_url);

        let mut entries = Vec::new();
        for page in self.store.pages(site.id)? {
            if !assembler.can_view(&ctx.viewer, &page) {
                continue;
            }
            if let Some(content) = assembler.content_for(&page, site, language)? {
                entries.push(TreeEntry { page, content });
            }
        }

        let tree = PageTree::build(entries);
        tracing::debug!(site = site.id, language = %language, pages = tree.len(), "Built page tree");
        Ok(tree.project(|entry, children| PageTreeNode {
            page: assembler.page_payload(&entry.page, Some(&entry.content), language, &urls),
            children,
        }))
    }

    /// Detail of the current site's home page.
    pub fn page_root(&self, ctx: &RequestContext, language: &str) -> Result<PagePayload, ApiError> {
        let site = self.site_with_language(ctx, language)?;
        let home = self
            .store
            .pages(site.id)?
            .into_iter()
            .find(|page| page.is_home)
            .ok_or_else(|| ApiError::not_found("home page"))?;
        self.detail(ctx, site, &home, language)
    }

    /// Detail of the page at `path`.
    pub fn page_detail(
        &self,
        ctx: &RequestContext,
        language: &str,
        path: &str,
    ) -> Result<PagePayload, ApiError> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return self.page_root(ctx, language);
        }

        let site = self.site_with_language(ctx, language)?;
        let page = self
            .store
            .page_by_path(site.id, path)?
            .ok_or_else(|| ApiError::not_found(format!("page {path}")))?;
        self.detail(ctx, site, &page, language)
    }

    fn detail(
        &self,
        ctx: &RequestContext,
        site: &SiteSettings,
        page: &Page,
        language: &str,
    ) -> Result<PagePayload, ApiError> {
        self.assembler()
            .assemble(page, site, language, &ctx.viewer, &ApiUrls::new(&ctx.base_url))?
            .ok_or_else(|| ApiError::not_found(format!("page {}", page.id)))
    }

    /// Rendered content of the placeholder in `slot` of an owning object.
    ///
    /// With `html` set, a live HTML rendering and its asset blocks are added.
    pub fn placeholder(
        &self,
        ctx: &RequestContext,
        language: &str,
        content_type: ContentTypeId,
        object_id: ObjectId,
        slot: &str,
        html: bool,
    ) -> Result<PlaceholderPayload, ApiError> {
        let site = self.site_with_language(ctx, language)?;
        let placeholder = self
            .store
            .placeholder(content_type, object_id, slot)?
            .ok_or_else(|| ApiError::not_found(format!("placeholder {slot}")))?;

        match self.store.source_object(content_type, object_id)? {
            None => {
                return Err(ApiError::not_found(format!(
                    "source object {content_type}/{object_id}"
                )));
            }
            Some(SourceObject::PageContent(content)) => {
                let visible = self
                    .store
                    .page(content.page)?
                    .is_some_and(|page| self.assembler().can_view(&ctx.viewer, &page));
                if !visible {
                    return Err(ApiError::not_found(format!("page {}", content.page)));
                }
            }
            Some(SourceObject::Other { .. }) => {}
        }

        let renderer = self.renderer();
        let content = renderer.render(
            &placeholder,
            language,
            site.id,
            &ctx.viewer,
            &ctx.headers,
            true,
        )?;

        let mut html_fields = if html {
            renderer.render_html(&placeholder, language)?
        } else {
            Default::default()
        };
        for reserved in ["slot", "label", "language", "content"] {
            html_fields.remove(reserved);
        }

        Ok(PlaceholderPayload {
            label: self.settings.placeholder_label(&placeholder.slot),
            slot: placeholder.slot,
            language: language.to_owned(),
            content,
            html: html_fields,
        })
    }

    /// URLs of the visible pages in `language`.
    pub fn aliases(
        &self,
        ctx: &RequestContext,
        language: &str,
    ) -> Result<Vec<AliasPayload>, ApiError> {
        let site = self.site_with_language(ctx, language)?;
        let assembler = self.assembler();

        let mut aliases = Vec::new();
        for page in self.store.pages(site.id)? {
            if !assembler.can_view(&ctx.viewer, &page) {
                continue;
            }
            let Some(path) = page.path(language) else {
                continue;
            };
            let is_active = self.store.page_content(page.id, language)?.is_some();
            aliases.push(AliasPayload {
                url: path.to_owned(),
                redirect_to: absolute_url(language, path),
                language: language.to_owned(),
                is_active,
            });
        }
        Ok(aliases)
    }
}

#[cfg(test)]
mod tests {
    use plinth_cache::{MemoryCache, NullCache};
    use plinth_store::{DefaultPolicy, MemoryStore, PluginRecord};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::*;
    use crate::plugins::{BuiltinKind, RenderStyle};
    use crate::settings::Language;

    static_assertions::assert_impl_all!(ContentApi: Send, Sync);

    const BASE: &str = "http://example.com/api";

    fn settings() -> ApiSettings {
        ApiSettings::new(
            SiteSettings::new(1, "example.com")
                .with_language(Language::new("en", "English").with_fallbacks(&["de"]))
                .with_language(Language::new("de", "Deutsch")),
        )
        .with_site(
            SiteSettings::new(2, "other.example.com").with_language(Language::new("fr", "Français")),
        )
        .with_template("page.html", &["content"])
        .with_placeholder_label("content", "Main content")
    }

    fn store() -> MemoryStore {
        let mut moved = PageContent::new(40, 4, "en", "Moved");
        moved.redirect = "/en/elsewhere/".to_owned();

        MemoryStore::new()
            .with_page_content_type(5)
            .with_page(Page::new(1, 1).home().with_url("en", "").with_url("de", ""))
            .with_page(Page::new(2, 1).with_parent(1).with_url("en", "about"))
            .with_page(Page::new(3, 1).with_parent(2).with_url("en", "about/team"))
            .with_page(
                Page::new(4, 1)
                    .with_parent(1)
                    .with_url("en", "moved")
                    .login_required(),
            )
            .with_page(Page::new(5, 1).with_parent(1).with_url("de", "nur-deutsch"))
            .with_page(Page::new(6, 2).home().with_url("fr", ""))
            .with_content(PageContent::new(10, 1, "en", "Home").with_template("page.html"))
            .with_content(PageContent::new(11, 1, "de", "Start").with_template("page.html"))
            .with_content(PageContent::new(20, 2, "en", "About"))
            .with_content(PageContent::new(30, 3, "en", "Team"))
            .with_content(moved)
            .with_content(PageContent::new(50, 5, "de", "Nur Deutsch"))
            .with_content(PageContent::new(60, 6, "fr", "Accueil"))
            .with_page_placeholder(100, 10, "content")
            .with_plugin(
                PluginRecord::new(1, 100, "en", "TextPlugin").with_field("body", "<p>Hi</p>"),
            )
            .with_placeholder(plinth_store::Placeholder::new(200, 9, 1, "footer"))
            .with_other_object(9, 1)
            .with_placeholder(plinth_store::Placeholder::new(300, 9, 2, "content"))
    }

    fn api() -> ContentApi {
        let registry = PluginRegistry::new().with_kind(
            "TextPlugin",
            BuiltinKind::new(RenderStyle::Text).with_js("<script src=\"t.js\"></script>"),
        );
        ContentApi::new(
            Arc::new(store()),
            Arc::new(DefaultPolicy),
            &MemoryCache::new(),
            settings(),
            registry,
        )
    }

    fn ids(nodes: &[PageTreeNode]) -> Value {
        Value::Array(
            nodes
                .iter()
                .map(|n| json!({"title": n.page.title, "children": ids(&n.children)}))
                .collect(),
        )
    }

    #[test]
    fn test_languages_of_current_site() {
        let api = api();

        let main = api.languages(&RequestContext::new(BASE)).unwrap();
        let other = api
            .languages(&RequestContext::new(BASE).with_host("other.example.com"))
            .unwrap();

        assert_eq!(
            main.iter().map(|l| l.code.as_str()).collect::<Vec<_>>(),
            vec!["en", "de"]
        );
        assert_eq!(other[0].code, "fr");
        assert_eq!(other[0].pages, "http://example.com/api/fr/pages-tree/");
    }

    #[test]
    fn test_page_tree_for_anonymous_viewer() {
        let tree = api().page_tree(&RequestContext::new(BASE), "en").unwrap();

        // "Moved" needs a login, "Nur Deutsch" falls back to German content
        assert_eq!(
            ids(&tree),
            json!([{
                "title": "Home",
                "children": [
                    {"title": "About", "children": [{"title": "Team", "children": []}]},
                    {"title": "Nur Deutsch", "children": []},
                ],
            }])
        );
    }

    #[test]
    fn test_page_tree_for_signed_in_viewer() {
        let ctx = RequestContext::new(BASE).with_viewer(Viewer::user("ann"));

        let tree = api().page_tree(&ctx, "en").unwrap();

        let titles: Vec<&str> = tree[0].children.iter().map(|n| n.page.title.as_str()).collect();
        assert_eq!(titles, vec!["About", "Moved", "Nur Deutsch"]);
    }

    #[test]
    fn test_page_tree_prunes_pages_without_content() {
        // German has no fallbacks: About has no content, so Team disappears too
        let tree = api().page_tree(&RequestContext::new(BASE), "de").unwrap();

        assert_eq!(
            ids(&tree),
            json!([{"title": "Start", "children": [{"title": "Nur Deutsch", "children": []}]}])
        );
    }

    #[test]
    fn test_page_tree_serializes_flattened_nodes() {
        let tree = api().page_tree(&RequestContext::new(BASE), "en").unwrap();
        let json = serde_json::to_value(&tree).unwrap();

        assert_eq!(json[0]["title"], "Home");
        assert_eq!(json[0]["path"], "http://example.com/api/en/pages-root/");
        assert!(json[0].get("placeholders").is_none());
        assert_eq!(json[0]["children"][0]["children"][0]["children"], json!([]));
    }

    #[test]
    fn test_unknown_language_is_not_found() {
        let api = api();
        let ctx = RequestContext::new(BASE);

        assert!(matches!(api.page_tree(&ctx, "fr"), Err(ApiError::NotFound(_))));
        assert!(matches!(api.page_root(&ctx, "xx"), Err(ApiError::NotFound(_))));
        assert!(matches!(api.aliases(&ctx, "fr"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_page_root_and_detail() {
        let api = api();
        let ctx = RequestContext::new(BASE);

        let root = api.page_root(&ctx, "en").unwrap();
        let team = api.page_detail(&ctx, "en", "/about/team/").unwrap();

        assert_eq!(root.title, "Home");
        assert_eq!(
            root.placeholders.unwrap()["content"],
            "http://example.com/api/en/placeholders/5/10/content/"
        );
        assert_eq!(team.title, "Team");
        assert_eq!(team.absolute_url, "/en/about/team/");
    }

    #[test]
    fn test_page_detail_empty_path_is_root() {
        let root = api().page_detail(&RequestContext::new(BASE), "en", "").unwrap();

        assert!(root.is_home);
    }

    #[test]
    fn test_page_detail_unknown_path_is_not_found() {
        let result = api().page_detail(&RequestContext::new(BASE), "en", "nope");

        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_page_detail_denied_is_not_found() {
        let api = api();

        let anonymous = api.page_detail(&RequestContext::new(BASE), "en", "moved");
        let user = api.page_detail(
            &RequestContext::new(BASE).with_viewer(Viewer::user("ann")),
            "en",
            "moved",
        );

        assert!(matches!(anonymous, Err(ApiError::NotFound(_))));
        assert_eq!(user.unwrap().redirect, "/en/elsewhere/");
    }

    #[test]
    fn test_placeholder_payload() {
        let payload = api()
            .placeholder(&RequestContext::new(BASE), "en", 5, 10, "content", false)
            .unwrap();

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "slot": "content",
                "label": "Main content",
                "language": "en",
                "content": [{"plugin_type": "TextPlugin", "body": "<p>Hi</p>"}],
            })
        );
    }

    #[test]
    fn test_placeholder_html_mode() {
        let payload = api()
            .placeholder(&RequestContext::new(BASE), "en", 5, 10, "content", true)
            .unwrap();

        assert_eq!(payload.html["html"], "<p>Hi</p>");
        assert_eq!(payload.html["js"], "<script src=\"t.js\"></script>");
        assert!(!payload.html.contains_key("css"));
    }

    #[test]
    fn test_placeholder_of_other_owner() {
        let payload = api()
            .placeholder(&RequestContext::new(BASE), "en", 9, 1, "footer", false)
            .unwrap();

        assert_eq!(payload.label, "Footer");
        assert!(payload.content.is_empty());
    }

    #[test]
    fn test_placeholder_without_source_object_is_not_found() {
        let result = api().placeholder(&RequestContext::new(BASE), "en", 9, 2, "content", false);

        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_missing_placeholder_is_not_found() {
        let result = api().placeholder(&RequestContext::new(BASE), "en", 5, 10, "sidebar", false);

        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_placeholder_on_hidden_page_is_not_found() {
        let store = store().with_page_placeholder(400, 40, "content");
        let api = ContentApi::new(
            Arc::new(store),
            Arc::new(DefaultPolicy),
            &NullCache,
            settings(),
            PluginRegistry::new(),
        );

        let anonymous = api.placeholder(&RequestContext::new(BASE), "en", 5, 40, "content", false);
        let staff = api.placeholder(
            &RequestContext::new(BASE).with_viewer(Viewer::staff("ed")),
            "en",
            5,
            40,
            "content",
            false,
        );

        assert!(matches!(anonymous, Err(ApiError::NotFound(_))));
        assert!(staff.is_ok());
    }

    #[test]
    fn test_fallback_page_links_to_its_content_language() {
        let store = store().with_page_placeholder(500, 50, "content").with_plugin(
            PluginRecord::new(2, 500, "de", "TextPlugin").with_field("body", "<p>Hallo</p>"),
        );
        let api = ContentApi::new(
            Arc::new(store),
            Arc::new(DefaultPolicy),
            &MemoryCache::new(),
            settings(),
            PluginRegistry::new().with_kind("TextPlugin", BuiltinKind::new(RenderStyle::Text)),
        );
        let ctx = RequestContext::new(BASE);

        let page = api.page_detail(&ctx, "en", "nur-deutsch").unwrap();

        assert_eq!(page.language, "de");
        assert_eq!(page.absolute_url, "/de/nur-deutsch/");
        assert_eq!(page.path, "http://example.com/api/de/pages/nur-deutsch/");
        let link = &page.placeholders.unwrap()["content"];
        assert_eq!(link, "http://example.com/api/de/placeholders/5/50/content/");

        let placeholder = api.placeholder(&ctx, "de", 5, 50, "content", false).unwrap();
        assert_eq!(
            serde_json::to_value(&placeholder.content).unwrap(),
            json!([{"plugin_type": "TextPlugin", "body": "<p>Hallo</p>"}])
        );
    }

    #[test]
    fn test_aliases() {
        let aliases = api().aliases(&RequestContext::new(BASE), "en").unwrap();

        assert_eq!(
            aliases,
            vec![
                AliasPayload {
                    url: String::new(),
                    redirect_to: "/en/".to_owned(),
                    language: "en".to_owned(),
                    is_active: true,
                },
                AliasPayload {
                    url: "about".to_owned(),
                    redirect_to: "/en/about/".to_owned(),
                    language: "en".to_owned(),
                    is_active: true,
                },
                AliasPayload {
                    url: "about/team".to_owned(),
                    redirect_to: "/en/about/team/".to_owned(),
                    language: "en".to_owned(),
                    is_active: true,
                },
            ]
        );
    }
}
