//! Language list payloads.

use serde::Serialize;

use crate::settings::SiteSettings;
use crate::urls::ApiUrls;

/// One configured language of the current site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LanguagePayload {
    /// Language code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Whether the language is public.
    pub public: bool,
    /// Fallback chain.
    pub fallbacks: Vec<String>,
    /// Whether clients should redirect to the fallback language.
    pub redirect_on_fallback: bool,
    /// Whether untranslated pages are hidden.
    pub hide_untranslated: bool,
    /// Link to the language's page tree.
    pub pages: String,
}

/// Payloads of every language of `site`, in configured order.
#[must_use]
pub fn language_payloads(site: &SiteSettings, urls: &ApiUrls) -> Vec<LanguagePayload> {
    site.languages
        .iter()
        .map(|language| LanguagePayload {
            code: language.code.clone(),
            name: language.name.clone(),
            public: language.public,
            fallbacks: language.fallbacks.clone(),
            redirect_on_fallback: language.redirect_on_fallback,
            hide_untranslated: language.hide_untranslated,
            pages: urls.pages_tree(&language.code),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::settings::Language;

    #[test]
    fn test_language_payloads() {
        let mut german = Language::new("de", "Deutsch").with_fallbacks(&["en"]);
        german.hide_untranslated = false;
        let site = SiteSettings::new(1, "example.com")
            .with_language(Language::new("en", "English"))
            .with_language(german);

        let payloads = language_payloads(&site, &ApiUrls::new("http://example.com/api"));

        assert_eq!(
            serde_json::to_value(&payloads).unwrap(),
            json!([
                {
                    "code": "en",
                    "name": "English",
                    "public": true,
                    "fallbacks": [],
                    "redirect_on_fallback": true,
                    "hide_untranslated": true,
                    "pages": "http://example.com/api/en/pages-tree/",
                },
                {
                    "code": "de",
                    "name": "Deutsch",
                    "public": true,
                    "fallbacks": ["en"],
                    "redirect_on_fallback": true,
                    "hide_untranslated": false,
                    "pages": "http://example.com/api/de/pages-tree/",
                },
            ])
        );
    }
}
