//! Page tree assembly and placeholder rendering for Plinth.
//!
//! This crate provides:
//! - [`PageTree`]: nested page tree from flat, parent-referencing records
//! - [`ContentAssembler`]: page metadata payloads with placeholder links
//! - [`PlaceholderRenderer`]: plugin tree rendering with a versioned cache
//! - [`CacheKeyStore`]: placeholder cache versions and content keys
//! - [`ContentApi`]: the read-only API facade the HTTP layer calls
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use plinth_cache::NullCache;
//! use plinth_site::{ApiSettings, ContentApi, Language, PluginRegistry, RequestContext, SiteSettings};
//! use plinth_store::{DefaultPolicy, MemoryStore, Page, PageContent};
//!
//! let store = MemoryStore::new()
//!     .with_page(Page::new(1, 1).home().with_url("en", ""))
//!     .with_content(PageContent::new(10, 1, "en", "Home"));
//! let settings = ApiSettings::new(
//!     SiteSettings::new(1, "example.com").with_language(Language::new("en", "English")),
//! );
//! let api = ContentApi::new(
//!     Arc::new(store),
//!     Arc::new(DefaultPolicy),
//!     &NullCache,
//!     settings,
//!     PluginRegistry::new(),
//! );
//!
//! let tree = api.page_tree(&RequestContext::new("http://example.com/api"), "en").unwrap();
//! assert_eq!(tree[0].page.title, "Home");
//! ```

mod api;
mod cache_keys;
mod content;
mod error;
mod html;
mod languages;
mod placeholder;
mod plugins;
mod settings;
mod tree;
mod urls;

pub use api::{AliasPayload, ContentApi, PageTreeNode, RequestContext};
pub use cache_keys::{CacheKeyStore, CacheScope, CacheVersion, vary_signature};
pub use content::{ContentAssembler, PagePayload};
pub use error::ApiError;
pub use html::{AssetBlocks, render_html};
pub use languages::{LanguagePayload, language_payloads};
pub use placeholder::{CachePolicy, PlaceholderPayload, PlaceholderRenderer};
pub use plugins::{
    BuiltinKind, EXCLUDED_FIELDS, PluginKind, PluginNode, PluginRegistry, RenderStyle,
    resolve_plugins,
};
pub use settings::{ApiSettings, CacheSettings, Language, SiteSettings, Template};
pub use tree::{PageTree, TreeRecord};
pub use urls::{ApiUrls, absolute_url};
