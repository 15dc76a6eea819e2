//! Site, language, template and cache settings consumed by the content API.

use std::collections::HashMap;
use std::time::Duration;

use plinth_store::SiteId;

/// A language configured for a site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Language {
    /// Language code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Whether the language is public.
    pub public: bool,
    /// Languages to fall back to when content is missing, in order.
    pub fallbacks: Vec<String>,
    /// Whether clients should redirect to the fallback language.
    pub redirect_on_fallback: bool,
    /// Whether untranslated pages are hidden.
    pub hide_untranslated: bool,
}

impl Language {
    /// Create a public language without fallbacks.
    #[must_use]
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_owned(),
            name: name.to_owned(),
            public: true,
            fallbacks: Vec::new(),
            redirect_on_fallback: true,
            hide_untranslated: true,
        }
    }

    /// Set the fallback chain.
    #[must_use]
    pub fn with_fallbacks(mut self, fallbacks: &[&str]) -> Self {
        self.fallbacks = fallbacks.iter().map(|&f| f.to_owned()).collect();
        self
    }
}

/// A site served by the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteSettings {
    /// Site identity in the content store.
    pub id: SiteId,
    /// Host name requests for this site arrive on.
    pub domain: String,
    /// Languages in display order.
    pub languages: Vec<Language>,
}

impl SiteSettings {
    /// Create a site without languages.
    #[must_use]
    pub fn new(id: SiteId, domain: &str) -> Self {
        Self {
            id,
            domain: domain.to_owned(),
            languages: Vec::new(),
        }
    }

    /// Add a language.
    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.languages.push(language);
        self
    }

    /// Language by code.
    #[must_use]
    pub fn language(&self, code: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.code == code)
    }
}

/// A page template and the placeholder slots it declares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    /// Template name as stored on page contents.
    pub name: String,
    /// Declared slot names.
    pub slots: Vec<String>,
}

/// Placeholder cache settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheSettings {
    /// Global placeholder cache switch.
    pub enabled: bool,
    /// Upper bound for the lifetime of cached content.
    pub content_duration: Duration,
    /// Prefix for every cache key.
    pub prefix: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            content_duration: Duration::from_secs(60),
            prefix: "plinth".to_owned(),
        }
    }
}

/// Everything the content API needs to know about the host CMS setup.
#[derive(Clone, Debug)]
pub struct ApiSettings {
    /// Served sites.
    pub sites: Vec<SiteSettings>,
    /// Site used when the request host matches no site domain.
    pub default_site: SiteId,
    /// Templates; the first one is the default for pages inheriting from nothing.
    pub templates: Vec<Template>,
    /// Human-readable placeholder labels by slot.
    pub placeholder_labels: HashMap<String, String>,
    /// Placeholder cache settings.
    pub cache: CacheSettings,
}

impl ApiSettings {
    /// Create settings serving a single site.
    #[must_use]
    pub fn new(site: SiteSettings) -> Self {
        Self {
            default_site: site.id,
            sites: vec![site],
            templates: Vec::new(),
            placeholder_labels: HashMap::new(),
            cache: CacheSettings::default(),
        }
    }

    /// Serve an additional site.
    #[must_use]
    pub fn with_site(mut self, site: SiteSettings) -> Self {
        self.sites.push(site);
        self
    }

    /// Declare a template with its slots.
    #[must_use]
    pub fn with_template(mut self, name: &str, slots: &[&str]) -> Self {
        self.templates.push(Template {
            name: name.to_owned(),
            slots: slots.iter().map(|&s| s.to_owned()).collect(),
        });
        self
    }

    /// Set the label of placeholders in `slot`.
    #[must_use]
    pub fn with_placeholder_label(mut self, slot: &str, label: &str) -> Self {
        self.placeholder_labels
            .insert(slot.to_owned(), label.to_owned());
        self
    }

    /// Replace the cache settings.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheSettings) -> Self {
        self.cache = cache;
        self
    }

    /// Site by identity.
    #[must_use]
    pub fn site(&self, id: SiteId) -> Option<&SiteSettings> {
        self.sites.iter().find(|s| s.id == id)
    }

    /// Site matching the request `Host` header, else the default site.
    #[must_use]
    pub fn site_for_host(&self, host: Option<&str>) -> Option<&SiteSettings> {
        let domain = host.map(|h| h.split(':').next().unwrap_or(h));
        domain
            .and_then(|d| self.sites.iter().find(|s| s.domain.eq_ignore_ascii_case(d)))
            .or_else(|| self.site(self.default_site))
    }

    /// Declared slots of `template`, `None` for unknown templates.
    #[must_use]
    pub fn template_slots(&self, template: &str) -> Option<&[String]> {
        self.templates
            .iter()
            .find(|t| t.name == template)
            .map(|t| t.slots.as_slice())
    }

    /// Name of the default template.
    #[must_use]
    pub fn default_template(&self) -> Option<&str> {
        self.templates.first().map(|t| t.name.as_str())
    }

    /// Label of placeholders in `slot`.
    ///
    /// Falls back to the slot name with underscores as spaces, title-cased.
    #[must_use]
    pub fn placeholder_label(&self, slot: &str) -> String {
        if let Some(label) = self.placeholder_labels.get(slot) {
            return label.clone();
        }
        slot.split(['_', ' '])
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                })
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn settings() -> ApiSettings {
        ApiSettings::new(
            SiteSettings::new(1, "example.com").with_language(Language::new("en", "English")),
        )
        .with_site(SiteSettings::new(2, "other.example.com"))
        .with_template("page.html", &["content", "sidebar"])
        .with_template("landing.html", &["hero"])
        .with_placeholder_label("content", "Main content")
    }

    #[test]
    fn test_site_for_host_matches_domain_ignoring_port() {
        let settings = settings();

        assert_eq!(settings.site_for_host(Some("other.example.com:8080")).unwrap().id, 2);
        assert_eq!(settings.site_for_host(Some("EXAMPLE.com")).unwrap().id, 1);
    }

    #[test]
    fn test_site_for_host_falls_back_to_default_site() {
        let settings = settings();

        assert_eq!(settings.site_for_host(Some("unknown.org")).unwrap().id, 1);
        assert_eq!(settings.site_for_host(None).unwrap().id, 1);
    }

    #[test]
    fn test_template_slots() {
        let settings = settings();

        assert_eq!(
            settings.template_slots("landing.html"),
            Some(&["hero".to_owned()][..])
        );
        assert_eq!(settings.template_slots("missing.html"), None);
        assert_eq!(settings.default_template(), Some("page.html"));
    }

    #[test]
    fn test_placeholder_label_configured() {
        assert_eq!(settings().placeholder_label("content"), "Main content");
    }

    #[test]
    fn test_placeholder_label_derived_from_slot() {
        let settings = settings();

        assert_eq!(settings.placeholder_label("sidebar"), "Sidebar");
        assert_eq!(settings.placeholder_label("footer_left_column"), "Footer Left Column");
        assert_eq!(settings.placeholder_label("HERO"), "Hero");
    }

    #[test]
    fn test_language_lookup() {
        let site = SiteSettings::new(1, "example.com")
            .with_language(Language::new("en", "English").with_fallbacks(&["de"]))
            .with_language(Language::new("de", "Deutsch"));

        assert_eq!(site.language("en").unwrap().fallbacks, vec!["de".to_owned()]);
        assert!(site.language("fr").is_none());
    }
}
