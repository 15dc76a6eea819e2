//! Configuration management for Plinth.
//!
//! Parses `plinth.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `content.snapshot`
//! - `auth.tokens[].token`

mod expand;

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override content snapshot path.
    pub snapshot: Option<PathBuf>,
    /// Override placeholder cache enabled flag.
    pub cache_enabled: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "plinth.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Placeholder cache configuration.
    pub cache: CacheConfig,
    /// Content source configuration (paths are relative strings from TOML).
    content: ContentConfigRaw,
    /// Sites as parsed from TOML (language defaults not yet applied).
    #[serde(rename = "sites")]
    sites_raw: Vec<SiteConfigRaw>,
    /// Page templates and the placeholder slots they declare.
    pub templates: Vec<TemplateConfig>,
    /// Per-slot placeholder settings.
    pub placeholders: BTreeMap<String, PlaceholderConfig>,
    /// Plugin type registrations keyed by plugin type name.
    pub plugins: BTreeMap<String, PluginConfig>,
    /// API token configuration.
    pub auth: AuthConfig,

    /// Resolved content configuration (set after loading).
    #[serde(skip)]
    pub content_resolved: ContentConfig,
    /// Resolved sites with language defaults applied (set after loading).
    #[serde(skip)]
    pub sites: Vec<SiteConfig>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    #[allow(clippy::derivable_impls)]
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Scheme used in absolute API links when the proxy does not say.
    pub scheme: String,
    /// Path prefix the JSON routes are mounted under.
    pub api_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
            scheme: "http".to_owned(),
            api_prefix: "/api".to_owned(),
        }
    }
}

/// Cache backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process memory cache.
    Memory,
    /// File cache under the project directory.
    File,
    /// No cache store at all.
    None,
}

/// Longest accepted `cache.content_duration`: one year, in seconds.
pub const MAX_CONTENT_DURATION: u64 = 365 * 24 * 60 * 60;

/// Placeholder cache configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Global placeholder cache switch.
    pub enabled: bool,
    /// Cache store backend.
    pub backend: CacheBackend,
    /// Upper bound for cached content lifetime, in seconds.
    pub content_duration: u64,
    /// Prefix for every cache key.
    pub prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::Memory,
            content_duration: 60,
            prefix: "plinth".to_owned(),
        }
    }
}

/// Raw content configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ContentConfigRaw {
    snapshot: Option<String>,
    default_site: Option<u64>,
}

/// Resolved content configuration with absolute paths.
#[derive(Debug, Default)]
pub struct ContentConfig {
    /// YAML content snapshot to serve.
    pub snapshot: PathBuf,
    /// Site used when the request host matches no configured domain.
    pub default_site: u64,
    /// Project directory for plinth data (`.plinth/`).
    pub project_dir: PathBuf,
}

impl ContentConfig {
    /// Cache directory path (`.plinth/cache/`).
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.project_dir.join("cache")
    }
}

/// Raw site entry as parsed from TOML.
#[derive(Debug, Deserialize)]
struct SiteConfigRaw {
    id: u64,
    domain: String,
    #[serde(default)]
    languages: Vec<LanguageConfigRaw>,
}

/// Raw language entry; unset options take the CMS defaults on resolution.
#[derive(Debug, Deserialize)]
struct LanguageConfigRaw {
    code: String,
    name: Option<String>,
    public: Option<bool>,
    fallbacks: Option<Vec<String>>,
    redirect_on_fallback: Option<bool>,
    hide_untranslated: Option<bool>,
}

/// A site served by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Site identity in the content store.
    pub id: u64,
    /// Host name requests for this site arrive on.
    pub domain: String,
    /// Languages in display order.
    pub languages: Vec<LanguageConfig>,
}

/// One configured language of a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Language code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Whether the language is public.
    pub public: bool,
    /// Languages to fall back to, in order.
    pub fallbacks: Vec<String>,
    /// Whether to redirect to the fallback language.
    pub redirect_on_fallback: bool,
    /// Whether untranslated pages are hidden.
    pub hide_untranslated: bool,
}

/// A page template and the placeholder slots it declares.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    /// Template name as stored on page contents.
    pub name: String,
    /// Declared slot names.
    #[serde(default)]
    pub placeholders: Vec<String>,
}

/// Settings for placeholders in one slot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    /// Human-readable label.
    pub name: Option<String>,
}

/// Rendering strategy of a plugin type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKindConfig {
    /// Rich text with a `body` HTML field.
    Text,
    /// Link with `name` and `url` fields.
    Link,
    /// Wrapper around child plugins.
    Container,
    /// Generic field dump.
    Fields,
}

/// Registration of one plugin type.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    /// Rendering strategy.
    pub kind: PluginKindConfig,
    /// Whether placeholders holding this plugin may be cached.
    #[serde(default = "default_true")]
    pub cache: bool,
    /// Maximum cache lifetime in seconds.
    #[serde(default)]
    pub cache_expiration: Option<u64>,
    /// Request headers the rendered output varies on.
    #[serde(default)]
    pub vary_on: Vec<String>,
    /// HTML element wrapping container and field plugins.
    #[serde(default)]
    pub tag: Option<String>,
    /// Fragment added to the `css` asset block.
    #[serde(default)]
    pub css: Option<String>,
    /// Fragment added to the `js` asset block.
    #[serde(default)]
    pub js: Option<String>,
}

fn default_true() -> bool {
    true
}

/// API token configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Static API tokens.
    pub tokens: Vec<TokenConfig>,
}

/// A static API token and the viewer it stands for.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Token value sent as `Authorization: Token <value>`.
    pub token: String,
    /// User name.
    pub user: String,
    /// Whether the user is staff.
    #[serde(default)]
    pub staff: bool,
    /// Group memberships.
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`server.host`").
        field: String,
        /// Error message (e.g., "${`PLINTH_HOST`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// The site used when no configuration file declares any.
fn default_site() -> SiteConfig {
    SiteConfig {
        id: 1,
        domain: "localhost".to_owned(),
        languages: vec![LanguageConfig {
            code: "en".to_owned(),
            name: "English".to_owned(),
            public: true,
            fallbacks: Vec::new(),
            redirect_on_fallback: true,
            hide_untranslated: true,
        }],
    }
}

impl SiteConfigRaw {
    /// Apply language defaults: every other site language becomes a fallback.
    fn resolve(&self) -> SiteConfig {
        let codes: Vec<&str> = self.languages.iter().map(|l| l.code.as_str()).collect();
        let languages = self
            .languages
            .iter()
            .map(|raw| LanguageConfig {
                code: raw.code.clone(),
                name: raw.name.clone().unwrap_or_else(|| raw.code.clone()),
                public: raw.public.unwrap_or(true),
                fallbacks: raw.fallbacks.clone().unwrap_or_else(|| {
                    codes
                        .iter()
                        .filter(|&&c| c != raw.code)
                        .map(|&c| c.to_owned())
                        .collect()
                }),
                redirect_on_fallback: raw.redirect_on_fallback.unwrap_or(true),
                hide_untranslated: raw.hide_untranslated.unwrap_or(true),
            })
            .collect();
        SiteConfig {
            id: self.id,
            domain: self.domain.clone(),
            languages,
        }
    }
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `plinth.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(snapshot) = &settings.snapshot {
            self.content_resolved.snapshot.clone_from(snapshot);
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.cache.enabled = cache_enabled;
        }
    }

    /// Declared placeholder slots of `template`, if the template is known.
    #[must_use]
    pub fn template_slots(&self, template: &str) -> Option<&[String]> {
        self.templates
            .iter()
            .find(|t| t.name == template)
            .map(|t| t.placeholders.as_slice())
    }

    /// Site configuration by id.
    #[must_use]
    pub fn site(&self, id: u64) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.id == id)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            content: ContentConfigRaw::default(),
            sites_raw: Vec::new(),
            templates: Vec::new(),
            placeholders: BTreeMap::new(),
            plugins: BTreeMap::new(),
            auth: AuthConfig::default(),
            content_resolved: ContentConfig {
                snapshot: base.join("content.yaml"),
                default_site: 1,
                project_dir: base.join(".plinth"),
            },
            sites: vec![default_site()],
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve(config_dir);
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading and resolution
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are properly set and contain valid values.
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_cache()?;
        self.validate_sites()?;
        self.validate_auth()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 is technically valid (OS assigns a random port), but it's
        // unlikely to be intentional in a config file
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        if !matches!(self.server.scheme.as_str(), "http" | "https") {
            return Err(ConfigError::Validation(
                "server.scheme must be http or https".to_owned(),
            ));
        }

        if !self.server.api_prefix.starts_with('/') {
            return Err(ConfigError::Validation(
                "server.api_prefix must start with /".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate cache configuration.
    fn validate_cache(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.cache.prefix, "cache.prefix")?;
        if self.cache.content_duration == 0 {
            return Err(ConfigError::Validation(
                "cache.content_duration must be greater than 0".to_owned(),
            ));
        }
        if self.cache.content_duration > MAX_CONTENT_DURATION {
            return Err(ConfigError::Validation(format!(
                "cache.content_duration must be at most {MAX_CONTENT_DURATION} seconds"
            )));
        }
        Ok(())
    }

    /// Validate sites and their languages.
    fn validate_sites(&self) -> Result<(), ConfigError> {
        if self.sites.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[sites]] entry is required".to_owned(),
            ));
        }

        let mut site_ids = HashSet::new();
        for site in &self.sites {
            if !site_ids.insert(site.id) {
                return Err(ConfigError::Validation(format!(
                    "duplicate site id {}",
                    site.id
                )));
            }
            require_non_empty(&site.domain, "sites.domain")?;
            if site.languages.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "site {} must declare at least one language",
                    site.id
                )));
            }

            let mut codes = HashSet::new();
            for language in &site.languages {
                require_non_empty(&language.code, "sites.languages.code")?;
                if !codes.insert(language.code.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "duplicate language {} in site {}",
                        language.code, site.id
                    )));
                }
            }
            for language in &site.languages {
                if let Some(unknown) = language
                    .fallbacks
                    .iter()
                    .find(|f| !codes.contains(f.as_str()))
                {
                    return Err(ConfigError::Validation(format!(
                        "language {} of site {} falls back to unknown language {unknown}",
                        language.code, site.id
                    )));
                }
            }
        }

        if !site_ids.contains(&self.content_resolved.default_site) {
            return Err(ConfigError::Validation(format!(
                "content.default_site {} is not a configured site",
                self.content_resolved.default_site
            )));
        }

        Ok(())
    }

    /// Validate API tokens.
    fn validate_auth(&self) -> Result<(), ConfigError> {
        for token in &self.auth.tokens {
            require_non_empty(&token.token, "auth.tokens.token")?;
            require_non_empty(&token.user, "auth.tokens.user")?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref snapshot) = self.content.snapshot {
            self.content.snapshot = Some(expand::expand_env(snapshot, "content.snapshot")?);
        }

        for token in &mut self.auth.tokens {
            token.token = expand::expand_env(&token.token, "auth.tokens.token")?;
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory and apply
    /// language defaults.
    fn resolve(&mut self, config_dir: &Path) {
        self.content_resolved = ContentConfig {
            snapshot: config_dir.join(self.content.snapshot.as_deref().unwrap_or("content.yaml")),
            default_site: self
                .content
                .default_site
                .or_else(|| self.sites_raw.first().map(|s| s.id))
                .unwrap_or(1),
            project_dir: config_dir.join(".plinth"),
        };

        self.sites = if self.sites_raw.is_empty() {
            vec![default_site()]
        } else {
            self.sites_raw.iter().map(SiteConfigRaw::resolve).collect()
        };
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(toml: &str) -> Config {
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve(Path::new("/project"));
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7979);
        assert_eq!(config.server.api_prefix, "/api");
        assert_eq!(
            config.content_resolved.snapshot,
            PathBuf::from("/test/content.yaml")
        );
        assert_eq!(
            config.content_resolved.cache_dir(),
            PathBuf::from("/test/.plinth/cache")
        );
        assert!(config.cache.enabled);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.content_duration, 60);
        assert_eq!(config.sites.len(), 1);
        assert_eq!(config.sites[0].languages[0].code, "en");
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = parse("");
        assert_eq!(config.server.port, 7979);
        assert_eq!(config.sites[0].id, 1);
        assert_eq!(config.content_resolved.default_site, 1);
    }

    #[test]
    fn test_parse_server_config() {
        let config = parse(
            r#"
[server]
host = "0.0.0.0"
port = 9000
scheme = "https"
api_prefix = "/cms-api"
"#,
        );
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.scheme, "https");
        assert_eq!(config.server.api_prefix, "/cms-api");
    }

    #[test]
    fn test_parse_cache_config() {
        let config = parse(
            r#"
[cache]
enabled = false
backend = "file"
content_duration = 120
prefix = "site-a"
"#,
        );
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.backend, CacheBackend::File);
        assert_eq!(config.cache.content_duration, 120);
        assert_eq!(config.cache.prefix, "site-a");
    }

    #[test]
    fn test_language_defaults_fall_back_to_other_languages() {
        let config = parse(
            r#"
[[sites]]
id = 3
domain = "example.com"

[[sites.languages]]
code = "en"
name = "English"

[[sites.languages]]
code = "de"
name = "Deutsch"
hide_untranslated = false

[[sites.languages]]
code = "fr"
fallbacks = []
"#,
        );

        let site = &config.sites[0];
        assert_eq!(site.id, 3);
        assert_eq!(config.content_resolved.default_site, 3);
        assert_eq!(site.languages[0].fallbacks, vec!["de".to_owned(), "fr".to_owned()]);
        assert_eq!(site.languages[1].fallbacks, vec!["en".to_owned(), "fr".to_owned()]);
        assert!(site.languages[2].fallbacks.is_empty());
        assert_eq!(site.languages[2].name, "fr");
        assert!(site.languages[0].hide_untranslated);
        assert!(!site.languages[1].hide_untranslated);
        assert!(site.languages[0].public);
        assert!(site.languages[0].redirect_on_fallback);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_templates_placeholders_and_plugins() {
        let config = parse(
            r#"
[[templates]]
name = "page.html"
placeholders = ["content", "sidebar"]

[placeholders.content]
name = "Main content"

[plugins.TextPlugin]
kind = "text"

[plugins.LinkPlugin]
kind = "link"
cache = false
cache_expiration = 30
vary_on = ["Accept-Language"]
css = "<link rel=\"stylesheet\" href=\"/link.css\">"
"#,
        );

        assert_eq!(
            config.template_slots("page.html"),
            Some(&["content".to_owned(), "sidebar".to_owned()][..])
        );
        assert!(config.template_slots("missing.html").is_none());
        assert_eq!(
            config.placeholders["content"].name.as_deref(),
            Some("Main content")
        );
        let text = &config.plugins["TextPlugin"];
        assert_eq!(text.kind, PluginKindConfig::Text);
        assert!(text.cache);
        let link = &config.plugins["LinkPlugin"];
        assert!(!link.cache);
        assert_eq!(link.cache_expiration, Some(30));
        assert_eq!(link.vary_on, vec!["Accept-Language".to_owned()]);
        assert!(link.css.as_deref().unwrap().contains("link.css"));
    }

    #[test]
    fn test_parse_unknown_plugin_kind_fails() {
        let result: Result<Config, _> = toml::from_str(
            r#"
[plugins.Odd]
kind = "carousel"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_snapshot_relative_to_config_dir() {
        let config = parse(
            r#"
[content]
snapshot = "data/site.yaml"
"#,
        );
        assert_eq!(
            config.content_resolved.snapshot,
            PathBuf::from("/project/data/site.yaml")
        );
        assert_eq!(
            config.content_resolved.project_dir,
            PathBuf::from("/project/.plinth")
        );
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            host: Some("0.0.0.0".to_owned()),
            port: Some(9000),
            snapshot: Some(PathBuf::from("/data/content.yaml")),
            cache_enabled: Some(false),
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.content_resolved.snapshot,
            PathBuf::from("/data/content.yaml")
        );
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7979);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_expand_env_vars_tokens() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("PLINTH_TEST_EDITOR_TOKEN", "s3cret");
        }

        let mut config: Config = toml::from_str(
            r#"
[[auth.tokens]]
token = "${PLINTH_TEST_EDITOR_TOKEN}"
user = "editor"
staff = true
"#,
        )
        .unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(config.auth.tokens[0].token, "s3cret");
        assert!(config.auth.tokens[0].staff);

        unsafe {
            std::env::remove_var("PLINTH_TEST_EDITOR_TOKEN");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("PLINTH_TEST_MISSING_HOST");
        }

        let mut config: Config = toml::from_str(
            r#"
[server]
host = "${PLINTH_TEST_MISSING_HOST}"
"#,
        )
        .unwrap();
        let err = config.expand_env_vars().unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("server.host"));
    }

    #[test]
    fn test_validate_server_port_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_server_scheme() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.scheme = "ftp".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.scheme"));
    }

    #[test]
    fn test_validate_api_prefix() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.api_prefix = "api".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_content_duration_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.cache.content_duration = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("content_duration"));
    }

    #[test]
    fn test_validate_content_duration_upper_bound() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.cache.content_duration = MAX_CONTENT_DURATION;
        assert!(config.validate().is_ok());

        config.cache.content_duration = 9_223_372_036_854_775_807;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at most 31536000 seconds"));
    }

    #[test]
    fn test_validate_duplicate_language() {
        let config = parse(
            r#"
[[sites]]
id = 1
domain = "example.com"
languages = [{ code = "en" }, { code = "en" }]
"#,
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate language en"));
    }

    #[test]
    fn test_validate_unknown_fallback() {
        let config = parse(
            r#"
[[sites]]
id = 1
domain = "example.com"
languages = [{ code = "en", fallbacks = ["xx"] }]
"#,
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown language xx"));
    }

    #[test]
    fn test_validate_default_site_must_exist() {
        let config = parse(
            r#"
[content]
default_site = 9

[[sites]]
id = 1
domain = "example.com"
languages = [{ code = "en" }]
"#,
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_site 9"));
    }

    #[test]
    fn test_validate_site_without_languages() {
        let config = parse(
            r#"
[[sites]]
id = 1
domain = "example.com"
"#,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/plinth.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_from_file_resolves_and_validates() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[content]
snapshot = "content.yaml"

[[sites]]
id = 2
domain = "example.com"
languages = [{ code = "en", name = "English" }]
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.config_path, Some(path));
        assert_eq!(config.content_resolved.default_site, 2);
        assert_eq!(
            config.content_resolved.snapshot,
            tmp.path().join("content.yaml")
        );
        assert_eq!(config.site(2).unwrap().domain, "example.com");
    }
}
