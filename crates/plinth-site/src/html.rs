//! Live HTML rendering of plugin trees with named asset blocks.

use crate::plugins::{PluginNode, PluginRegistry};

/// Named asset blocks collected while rendering (`css`, `js`, ...).
///
/// Fragments are kept once per block, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetBlocks {
    blocks: Vec<(String, Vec<String>)>,
}

impl AssetBlocks {
    /// Create empty blocks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `fragment` to `block` unless already present.
    pub fn add(&mut self, block: &str, fragment: &str) {
        let idx = if let Some(idx) = self.blocks.iter().position(|(name, _)| name == block) {
            idx
        } else {
            self.blocks.push((block.to_owned(), Vec::new()));
            self.blocks.len() - 1
        };
        let fragments = &mut self.blocks[idx].1;
        if !fragments.iter().any(|f| f == fragment) {
            fragments.push(fragment.to_owned());
        }
    }

    /// Non-empty blocks joined into single strings, in first-seen order.
    #[must_use]
    pub fn rendered(&self) -> Vec<(String, String)> {
        self.blocks
            .iter()
            .map(|(name, fragments)| (name.clone(), fragments.concat()))
            .filter(|(_, joined)| !joined.is_empty())
            .collect()
    }
}

/// Render resolved plugin nodes to HTML, collecting asset blocks.
#[must_use]
pub fn render_html(nodes: &[PluginNode], registry: &PluginRegistry) -> (String, AssetBlocks) {
    let mut assets = AssetBlocks::new();
    let mut html = String::new();
    for node in nodes {
        render_node(node, registry, &mut assets, &mut html);
    }
    (html, assets)
}

fn render_node(
    node: &PluginNode,
    registry: &PluginRegistry,
    assets: &mut AssetBlocks,
    out: &mut String,
) {
    let Some(kind) = registry.get(&node.plugin_type) else {
        return;
    };
    for (block, fragment) in kind.assets() {
        assets.add(block, fragment);
    }

    let mut children_html = String::new();
    for child in &node.children {
        render_node(child, registry, assets, &mut children_html);
    }

    out.push_str(&kind.render_html(node, &children_html));
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use plinth_store::PluginRecord;

    use super::*;
    use crate::plugins::{BuiltinKind, RenderStyle, resolve_plugins};

    #[test]
    fn test_asset_blocks_dedupe_in_first_seen_order() {
        let mut assets = AssetBlocks::new();
        assets.add("js", "<script src=\"a.js\"></script>");
        assets.add("css", "<link href=\"a.css\">");
        assets.add("js", "<script src=\"b.js\"></script>");
        assets.add("js", "<script src=\"a.js\"></script>");
        assets.add("empty", "");

        assert_eq!(
            assets.rendered(),
            vec![
                (
                    "js".to_owned(),
                    "<script src=\"a.js\"></script><script src=\"b.js\"></script>".to_owned()
                ),
                ("css".to_owned(), "<link href=\"a.css\">".to_owned()),
            ]
        );
    }

    #[test]
    fn test_render_html_nested_with_assets() {
        let registry = PluginRegistry::new()
            .with_kind(
                "GridPlugin",
                BuiltinKind::new(RenderStyle::Container).with_css("<link href=\"grid.css\">"),
            )
            .with_kind(
                "TextPlugin",
                BuiltinKind::new(RenderStyle::Text).with_js("<script src=\"text.js\"></script>"),
            );
        let rows = vec![
            PluginRecord::new(1, 100, "en", "GridPlugin"),
            PluginRecord::new(2, 100, "en", "TextPlugin")
                .with_parent(1)
                .with_field("body", "<p>One</p>"),
            PluginRecord::new(3, 100, "en", "TextPlugin")
                .with_parent(1)
                .at(1)
                .with_field("body", "<p>Two</p>"),
        ];
        let nodes = resolve_plugins(&rows, &registry);

        let (html, assets) = render_html(&nodes, &registry);

        assert_eq!(
            html,
            "<div class=\"plugin-gridplugin\"><p>One</p><p>Two</p></div>"
        );
        assert_eq!(
            assets.rendered(),
            vec![
                ("css".to_owned(), "<link href=\"grid.css\">".to_owned()),
                ("js".to_owned(), "<script src=\"text.js\"></script>".to_owned()),
            ]
        );
    }

    #[test]
    fn test_render_html_empty() {
        let (html, assets) = render_html(&[], &PluginRegistry::new());

        assert_eq!(html, "");
        assert!(assets.rendered().is_empty());
    }
}
