//! Placeholder rendering with the versioned JSON cache.
//!
//! Each call runs `CACHE_CHECK -> HIT | MISS -> RENDER -> CACHE_WRITE?`.
//! The cache is consulted only when the placeholder is cacheable, the global
//! switch is on and the viewer is not staff. Staff always see live content.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use plinth_store::{ContentStore, Placeholder, SiteId, StoreError, Viewer};
use serde::Serialize;
use serde_json::Value;

use crate::cache_keys::{CacheKeyStore, CacheScope, vary_signature};
use crate::html::render_html;
use crate::plugins::{PluginNode, PluginRegistry, resolve_plugins};
use crate::settings::CacheSettings;

/// Placeholder payload: slot, label, language and rendered plugins.
///
/// In HTML mode `html` holds the rendered markup and each non-empty asset
/// block is added under its own name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlaceholderPayload {
    /// Slot name.
    pub slot: String,
    /// Human-readable label.
    pub label: String,
    /// Requested language.
    pub language: String,
    /// Rendered plugin payloads.
    pub content: Vec<Value>,
    /// HTML and asset blocks, present in HTML mode only.
    #[serde(flatten)]
    pub html: BTreeMap<String, String>,
}

/// Cache behaviour derived from the plugins a rendering contains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachePolicy {
    /// Whether every contained plugin allows caching.
    pub cacheable: bool,
    /// Smallest plugin expiration, if any plugin sets one.
    pub expiration: Option<Duration>,
    /// Sorted, de-duplicated, lower-case vary-on header names.
    pub vary_on: Vec<String>,
}

impl CachePolicy {
    /// Derive the policy of resolved `nodes`.
    #[must_use]
    pub fn of(nodes: &[PluginNode], registry: &PluginRegistry) -> Self {
        let mut policy = Self {
            cacheable: true,
            expiration: None,
            vary_on: Vec::new(),
        };
        let mut visit = |node: &PluginNode| {
            let Some(kind) = registry.get(&node.plugin_type) else {
                return;
            };
            policy.cacheable &= kind.cacheable();
            if let Some(expiration) = kind.cache_expiration() {
                policy.expiration = Some(
                    policy
                        .expiration
                        .map_or(expiration, |current| current.min(expiration)),
                );
            }
            policy
                .vary_on
                .extend(kind.vary_on().iter().map(|h| h.to_ascii_lowercase()));
        };
        for node in nodes {
            node.walk(&mut visit);
        }
        policy.vary_on.sort_unstable();
        policy.vary_on.dedup();
        policy
    }

    /// Cache lifetime bounded by the global content duration.
    #[must_use]
    pub fn ttl(&self, content_duration: Duration) -> Duration {
        self.expiration
            .map_or(content_duration, |expiration| expiration.min(content_duration))
    }
}

/// Renders placeholder plugin trees, reading and writing the JSON cache.
pub struct PlaceholderRenderer<'a> {
    store: &'a dyn ContentStore,
    registry: &'a PluginRegistry,
    keys: &'a CacheKeyStore,
    cache: &'a CacheSettings,
}

impl<'a> PlaceholderRenderer<'a> {
    /// Create a renderer over the given collaborators.
    #[must_use]
    pub fn new(
        store: &'a dyn ContentStore,
        registry: &'a PluginRegistry,
        keys: &'a CacheKeyStore,
        cache: &'a CacheSettings,
    ) -> Self {
        Self {
            store,
            registry,
            keys,
            cache,
        }
    }

    /// Whether `placeholder` may be served from and written to the cache.
    #[must_use]
    pub fn cache_eligible(&self, placeholder: &Placeholder, viewer: &Viewer) -> bool {
        placeholder.cache_placeholder && self.cache.enabled && !viewer.is_staff
    }

    /// Rendered plugin payloads of `placeholder` in `language`.
    ///
    /// `headers` are the request headers keyed by lower-case name; they
    /// select the cached variant.
    pub fn render(
        &self,
        placeholder: &Placeholder,
        language: &str,
        site: SiteId,
        viewer: &Viewer,
        headers: &HashMap<String, String>,
        use_cache: bool,
    ) -> Result<Vec<Value>, StoreError> {
        let use_cache = use_cache && self.cache_eligible(placeholder, viewer);
        let scope = CacheScope {
            placeholder: placeholder.id,
            language,
            site,
        };

        if use_cache {
            let version = self.keys.get_version(&scope);
            let signature = vary_signature(&version.vary_on, headers);
            if let Some(content) = self.keys.get::<Vec<Value>>(&scope, version.version, &signature) {
                tracing::debug!(placeholder = placeholder.id, language = %language, "Placeholder cache hit");
                return Ok(content);
            }
            tracing::debug!(placeholder = placeholder.id, language = %language, "Placeholder cache miss");
        }

        let nodes = self.resolve(placeholder, language)?;
        let content: Vec<Value> = nodes.iter().map(PluginNode::to_json).collect();

        if use_cache {
            self.write_cache(&scope, &nodes, &content, headers);
        }

        Ok(content)
    }

    /// Live HTML rendering: `html` plus every non-empty asset block.
    pub fn render_html(
        &self,
        placeholder: &Placeholder,
        language: &str,
    ) -> Result<BTreeMap<String, String>, StoreError> {
        let nodes = self.resolve(placeholder, language)?;
        let (html, assets) = render_html(&nodes, self.registry);

        let mut out = BTreeMap::new();
        out.insert("html".to_owned(), html);
        for (block, joined) in assets.rendered() {
            out.entry(block).or_insert(joined);
        }
        Ok(out)
    }

    fn resolve(
        &self,
        placeholder: &Placeholder,
        language: &str,
    ) -> Result<Vec<PluginNode>, StoreError> {
        let rows = self.store.plugins(placeholder.id, language)?;
        Ok(resolve_plugins(&rows, self.registry))
    }

    fn write_cache(
        &self,
        scope: &CacheScope<'_>,
        nodes: &[PluginNode],
        content: &[Value],
        headers: &HashMap<String, String>,
    ) {
        let policy = CachePolicy::of(nodes, self.registry);
        if !policy.cacheable {
            tracing::debug!(placeholder = scope.placeholder, "Placeholder holds uncacheable plugins");
            return;
        }

        let ttl = policy.ttl(self.cache.content_duration);
        let signature = vary_signature(&policy.vary_on, headers);
        // Read-then-write without a lock: concurrent writers may replace each
        // other's version record.
        let version = self.keys.get_version(scope).version;
        self.keys.set(scope, version, &signature, &content, Some(ttl));
        self.keys
            .set_version(scope, version, &policy.vary_on, Some(ttl));
        tracing::debug!(placeholder = scope.placeholder, language = %scope.language, ttl_secs = ttl.as_secs(), "Cached placeholder content");
    }
}
