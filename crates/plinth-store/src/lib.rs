//! CMS content access contract for Plinth.
//!
//! This crate describes what the content API consumes from the host CMS,
//! without owning any of it:
//!
//! - **Records** ([`Page`], [`PageContent`], [`Placeholder`], [`PluginRecord`])
//!   materialized per request as read-only views
//! - [`ContentStore`]: lookups by site, path, owner and slot
//! - [`PermissionPolicy`]: the `can_view(viewer, page)` check
//!
//! Two implementations ship with the crate:
//! - [`MemoryStore`]: immutable in-memory store, built in code or loaded from
//!   a YAML content snapshot
//! - [`DefaultPolicy`]: staff see everything, `login_required` needs a signed-in
//!   viewer, `view_groups` restricts to group members
//!
//! # Example
//!
//! ```
//! use plinth_store::{ContentStore, MemoryStore, Page, PageContent};
//!
//! let store = MemoryStore::new()
//!     .with_page(Page::new(1, 1).home().with_url("en", ""))
//!     .with_content(PageContent::new(10, 1, "en", "Home"));
//!
//! let page = store.page_by_path(1, "").unwrap().unwrap();
//! assert!(page.is_home);
//! ```

mod memory;
mod model;
mod permissions;
mod store;

pub use memory::MemoryStore;
pub use model::{
    ContentTypeId, ObjectId, Page, PageContent, PageId, PageUrl, Placeholder, PlaceholderId,
    PluginId, PluginRecord, SiteId, SourceObject, Viewer,
};
pub use permissions::{DefaultPolicy, PermissionPolicy};
pub use store::{ContentStore, StoreError};
