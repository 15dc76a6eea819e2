//! Page view permissions.

use crate::model::{Page, Viewer};

/// The host CMS's page view check.
///
/// Only the calling contract matters to the content API: a page that fails
/// the check is treated exactly like a page that does not exist.
pub trait PermissionPolicy: Send + Sync {
    /// Whether `viewer` may see `page`.
    fn can_view(&self, viewer: &Viewer, page: &Page) -> bool;
}

/// Permission rules matching a CMS without per-page permissions configured.
///
/// - staff viewers see every page
/// - `login_required` pages need a signed-in viewer
/// - pages with `view_groups` need a viewer in one of those groups
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPolicy;

impl PermissionPolicy for DefaultPolicy {
    fn can_view(&self, viewer: &Viewer, page: &Page) -> bool {
        if viewer.is_staff {
            return true;
        }
        if page.login_required && !viewer.is_authenticated() {
            return false;
        }
        page.view_groups.is_empty() || viewer.groups.iter().any(|g| page.view_groups.contains(g))
    }
}
