//! Read-only record views materialized from the host CMS.
//!
//! None of these records are persisted by the content API. They are plain
//! data, cloned out of the store per request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Site identity.
pub type SiteId = u64;
/// Page identity (the tree node a page occupies).
pub type PageId = u64;
/// Identity of a model type, used by polymorphic placeholder owners.
pub type ContentTypeId = u64;
/// Primary key of an owning object.
pub type ObjectId = u64;
/// Placeholder identity.
pub type PlaceholderId = u64;
/// Plugin instance identity.
pub type PluginId = u64;

/// URL path of a page in one language.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageUrl {
    /// Language code.
    pub language: String,
    /// Path without leading or trailing slash (`""` for the home page).
    pub path: String,
}

/// A position in the page hierarchy.
///
/// The parent relation is acyclic by construction of the host tree and is
/// never re-validated here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page identity.
    pub id: PageId,
    /// Site the page belongs to.
    pub site: SiteId,
    /// Parent page, `None` for roots.
    #[serde(default)]
    pub parent: Option<PageId>,
    /// Whether this page is the site's home page.
    #[serde(default)]
    pub is_home: bool,
    /// Anonymous viewers may not see this page.
    #[serde(default)]
    pub login_required: bool,
    /// Groups allowed to view the page (empty means everyone).
    #[serde(default)]
    pub view_groups: Vec<String>,
    /// Language codes the page has content in, in display order.
    #[serde(default)]
    pub languages: Vec<String>,
    /// URL path per language.
    #[serde(default)]
    pub urls: Vec<PageUrl>,
}

impl Page {
    /// Create a root page on `site` with no URLs.
    #[must_use]
    pub fn new(id: PageId, site: SiteId) -> Self {
        Self {
            id,
            site,
            parent: None,
            is_home: false,
            login_required: false,
            view_groups: Vec::new(),
            languages: Vec::new(),
            urls: Vec::new(),
        }
    }

    /// Attach the page below `parent`.
    #[must_use]
    pub fn with_parent(mut self, parent: PageId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Mark the page as the site's home page.
    #[must_use]
    pub fn home(mut self) -> Self {
        self.is_home = true;
        self
    }

    /// Require a signed-in viewer.
    #[must_use]
    pub fn login_required(mut self) -> Self {
        self.login_required = true;
        self
    }

    /// Restrict viewing to members of `groups`.
    #[must_use]
    pub fn with_view_groups(mut self, groups: &[&str]) -> Self {
        self.view_groups = groups.iter().map(|&g| g.to_owned()).collect();
        self
    }

    /// Add a URL path for `language`, registering the language if new.
    #[must_use]
    pub fn with_url(mut self, language: &str, path: &str) -> Self {
        if !self.languages.iter().any(|l| l == language) {
            self.languages.push(language.to_owned());
        }
        self.urls.push(PageUrl {
            language: language.to_owned(),
            path: path.to_owned(),
        });
        self
    }

    /// URL path of the page in `language`.
    #[must_use]
    pub fn path(&self, language: &str) -> Option<&str> {
        self.urls
            .iter()
            .find(|url| url.language == language)
            .map(|url| url.path.as_str())
    }
}

/// Per-language materialization of a page.
///
/// Identified by `(page, language)`; `id` is the object id placeholders use to
/// refer back to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    /// Object id of this content record.
    pub id: ObjectId,
    /// Page the content belongs to.
    pub page: PageId,
    /// Language code.
    pub language: String,
    /// Title.
    pub title: String,
    /// Title for the `<title>` element (empty means "use `title`").
    #[serde(default)]
    pub page_title: String,
    /// Title for menus (empty means "use `title`").
    #[serde(default)]
    pub menu_title: String,
    /// Meta description.
    #[serde(default)]
    pub meta_description: String,
    /// Redirect target.
    #[serde(default)]
    pub redirect: String,
    /// Whether the page shows up in navigation.
    #[serde(default = "default_true")]
    pub in_navigation: bool,
    /// Whether the page starts a navigation root.
    #[serde(default)]
    pub soft_root: bool,
    /// Template name, `INHERIT` to use the parent's template.
    #[serde(default = "default_template")]
    pub template: String,
    /// X-Frame-Options policy name.
    #[serde(default = "default_xframe_options")]
    pub xframe_options: String,
    /// Whether menu visibility is limited.
    #[serde(default)]
    pub limit_visibility_in_menu: bool,
}

fn default_true() -> bool {
    true
}

fn default_template() -> String {
    PageContent::INHERIT.to_owned()
}

fn default_xframe_options() -> String {
    "inherit".to_owned()
}

impl PageContent {
    /// Template marker meaning "use the parent page's template".
    pub const INHERIT: &'static str = "INHERIT";

    /// Create a content record with default flags and an inherited template.
    #[must_use]
    pub fn new(id: ObjectId, page: PageId, language: &str, title: &str) -> Self {
        Self {
            id,
            page,
            language: language.to_owned(),
            title: title.to_owned(),
            page_title: String::new(),
            menu_title: String::new(),
            meta_description: String::new(),
            redirect: String::new(),
            in_navigation: true,
            soft_root: false,
            template: default_template(),
            xframe_options: default_xframe_options(),
            limit_visibility_in_menu: false,
        }
    }

    /// Set the template name.
    #[must_use]
    pub fn with_template(mut self, template: &str) -> Self {
        template.clone_into(&mut self.template);
        self
    }
}

/// A named content slot attached to an owning object.
///
/// `(content_type, object_id)` is a polymorphic back-reference: the
/// placeholder does not own its source object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    /// Placeholder identity.
    pub id: PlaceholderId,
    /// Model type of the owning object.
    pub content_type: ContentTypeId,
    /// Primary key of the owning object.
    pub object_id: ObjectId,
    /// Slot name.
    pub slot: String,
    /// Whether the rendered plugin tree may be cached.
    ///
    /// Maintained by the host CMS: false as soon as any plugin in the
    /// placeholder opts out of caching.
    #[serde(default = "default_true")]
    pub cache_placeholder: bool,
}

impl Placeholder {
    /// Create a cacheable placeholder.
    #[must_use]
    pub fn new(id: PlaceholderId, content_type: ContentTypeId, object_id: ObjectId, slot: &str) -> Self {
        Self {
            id,
            content_type,
            object_id,
            slot: slot.to_owned(),
            cache_placeholder: true,
        }
    }

    /// Mark the placeholder as not cacheable.
    #[must_use]
    pub fn uncached(mut self) -> Self {
        self.cache_placeholder = false;
        self
    }
}

/// One row of a placeholder's plugin tree.
///
/// Rows are flat; the tree is rebuilt from `parent` and `position`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PluginRecord {
    /// Plugin identity.
    pub id: PluginId,
    /// Placeholder the plugin lives in.
    pub placeholder: PlaceholderId,
    /// Language code.
    pub language: String,
    /// Plugin type name (e.g., `TextPlugin`).
    pub plugin_type: String,
    /// Parent plugin, `None` for top-level plugins.
    #[serde(default)]
    pub parent: Option<PluginId>,
    /// Order among siblings.
    #[serde(default)]
    pub position: u32,
    /// Creation timestamp.
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
    /// Last change timestamp.
    #[serde(default)]
    pub changed_date: Option<DateTime<Utc>>,
    /// Concrete instance fields, `None` when the instance row is missing.
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

impl PluginRecord {
    /// Create a top-level plugin row with an empty concrete instance.
    #[must_use]
    pub fn new(id: PluginId, placeholder: PlaceholderId, language: &str, plugin_type: &str) -> Self {
        Self {
            id,
            placeholder,
            language: language.to_owned(),
            plugin_type: plugin_type.to_owned(),
            parent: None,
            position: 0,
            creation_date: None,
            changed_date: None,
            data: Some(Map::new()),
        }
    }

    /// Nest the plugin below `parent`.
    #[must_use]
    pub fn with_parent(mut self, parent: PluginId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the sibling position.
    #[must_use]
    pub fn at(mut self, position: u32) -> Self {
        self.position = position;
        self
    }

    /// Set one concrete instance field.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.data
            .get_or_insert_with(Map::new)
            .insert(name.to_owned(), value.into());
        self
    }

    /// Drop the concrete instance, leaving an orphaned row.
    #[must_use]
    pub fn orphaned(mut self) -> Self {
        self.data = None;
        self
    }
}

/// The object a placeholder points back to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceObject {
    /// A page content record (subject to page view permissions).
    PageContent(PageContent),
    /// Any other owner (static placeholders, aliases, app models).
    Other {
        /// Model type of the owner.
        content_type: ContentTypeId,
        /// Primary key of the owner.
        object_id: ObjectId,
    },
}

/// The identity a request is made as.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Viewer {
    /// User name, `None` for anonymous viewers.
    pub username: Option<String>,
    /// Staff viewers see live, unfiltered content.
    pub is_staff: bool,
    /// Group memberships.
    pub groups: Vec<String>,
}

impl Viewer {
    /// An anonymous viewer.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A signed-in, non-staff viewer.
    #[must_use]
    pub fn user(username: &str) -> Self {
        Self {
            username: Some(username.to_owned()),
            ..Self::default()
        }
    }

    /// A signed-in staff viewer.
    #[must_use]
    pub fn staff(username: &str) -> Self {
        Self {
            is_staff: true,
            ..Self::user(username)
        }
    }

    /// Whether the viewer is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }
}
