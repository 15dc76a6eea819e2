//! Translation of `plinth.toml` into server and content API settings.

use std::time::Duration;

use plinth_config::{CacheBackend, Config, PluginConfig, PluginKindConfig};
use plinth_site::{
    ApiSettings, BuiltinKind, CacheSettings, Language, PluginRegistry, RenderStyle, SiteSettings,
    Template,
};
use plinth_store::Viewer;

use crate::auth::ApiToken;
use crate::{CacheStore, ServerConfig};

/// Create server configuration from Plinth config.
///
/// # Arguments
///
/// * `config` - Loaded configuration
/// * `version` - Application version
/// * `verbose` - Enable verbose output
#[must_use]
pub fn server_config_from_config(config: &Config, version: String, verbose: bool) -> ServerConfig {
    let cache = match config.cache.backend {
        CacheBackend::Memory => CacheStore::Memory,
        CacheBackend::File => CacheStore::File(config.content_resolved.cache_dir()),
        CacheBackend::None => CacheStore::None,
    };

    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        scheme: config.server.scheme.clone(),
        api_prefix: config.server.api_prefix.clone(),
        snapshot: config.content_resolved.snapshot.clone(),
        cache,
        settings: api_settings(config),
        plugins: plugin_registry(config),
        tokens: config
            .auth
            .tokens
            .iter()
            .map(|t| {
                let viewer = Viewer {
                    username: Some(t.user.clone()),
                    is_staff: t.staff,
                    groups: t.groups.clone(),
                };
                ApiToken::new(&t.token, viewer)
            })
            .collect(),
        verbose,
        version,
    }
}

fn api_settings(config: &Config) -> ApiSettings {
    let sites = config
        .sites
        .iter()
        .map(|site| SiteSettings {
            id: site.id,
            domain: site.domain.clone(),
            languages: site
                .languages
                .iter()
                .map(|l| Language {
                    code: l.code.clone(),
                    name: l.name.clone(),
                    public: l.public,
                    fallbacks: l.fallbacks.clone(),
                    redirect_on_fallback: l.redirect_on_fallback,
                    hide_untranslated: l.hide_untranslated,
                })
                .collect(),
        })
        .collect();

    ApiSettings {
        sites,
        default_site: config.content_resolved.default_site,
        templates: config
            .templates
            .iter()
            .map(|t| Template {
                name: t.name.clone(),
                slots: t.placeholders.clone(),
            })
            .collect(),
        placeholder_labels: config
            .placeholders
            .iter()
            .filter_map(|(slot, p)| p.name.clone().map(|name| (slot.clone(), name)))
            .collect(),
        cache: CacheSettings {
            enabled: config.cache.enabled,
            content_duration: Duration::from_secs(config.cache.content_duration),
            prefix: config.cache.prefix.clone(),
        },
    }
}

/// Build the plugin registry declared under `[plugins]`.
#[must_use]
pub fn plugin_registry(config: &Config) -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    for (name, plugin) in &config.plugins {
        registry.register(name, builtin_kind(plugin));
    }
    registry
}

fn builtin_kind(plugin: &PluginConfig) -> BuiltinKind {
    let style = match plugin.kind {
        PluginKindConfig::Text => RenderStyle::Text,
        PluginKindConfig::Link => RenderStyle::Link,
        PluginKindConfig::Container => RenderStyle::Container,
        PluginKindConfig::Fields => RenderStyle::Fields,
    };

    let mut kind = BuiltinKind::new(style);
    if !plugin.cache {
        kind = kind.uncached();
    }
    if let Some(seconds) = plugin.cache_expiration {
        kind = kind.with_cache_expiration(Duration::from_secs(seconds));
    }
    if !plugin.vary_on.is_empty() {
        let headers: Vec<&str> = plugin.vary_on.iter().map(String::as_str).collect();
        kind = kind.with_vary_on(&headers);
    }
    if let Some(tag) = &plugin.tag {
        kind = kind.with_tag(tag);
    }
    if let Some(css) = &plugin.css {
        kind = kind.with_css(css);
    }
    if let Some(js) = &plugin.js {
        kind = kind.with_js(js);
    }
    kind
}
