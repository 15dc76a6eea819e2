//! Plugin type registry and plugin tree resolution.
//!
//! Plugin rows arrive flat from the store. [`resolve_plugins`] rebuilds the
//! tree from `parent` references and resolves every row against the
//! [`PluginRegistry`]. Rows whose type is not registered, or whose concrete
//! instance is missing, produce no node and take their subtree with them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use plinth_store::{PluginId, PluginRecord};
use serde_json::{Map, Value};

/// Bookkeeping fields never exposed in plugin payloads.
pub const EXCLUDED_FIELDS: [&str; 7] = [
    "id",
    "placeholder",
    "language",
    "position",
    "creation_date",
    "changed_date",
    "parent",
];

/// Behaviour of one registered plugin type.
pub trait PluginKind: Send + Sync {
    /// Payload fields of a concrete instance.
    ///
    /// The default keeps every instance field except bookkeeping.
    fn fields(&self, data: &Map<String, Value>) -> Map<String, Value> {
        data.iter()
            .filter(|(name, _)| !EXCLUDED_FIELDS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// HTML of `node`, given the already rendered HTML of its children.
    fn render_html(&self, node: &PluginNode, children_html: &str) -> String;

    /// Asset block fragments (`(block, fragment)`) the plugin contributes.
    fn assets(&self) -> Vec<(&str, &str)> {
        Vec::new()
    }

    /// Whether output containing this plugin may be cached.
    fn cacheable(&self) -> bool {
        true
    }

    /// Maximum lifetime of cached output containing this plugin.
    fn cache_expiration(&self) -> Option<Duration> {
        None
    }

    /// Request headers the plugin output varies on.
    fn vary_on(&self) -> &[String] {
        &[]
    }
}

/// HTML rendering strategy of a [`BuiltinKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStyle {
    /// Trusted HTML from the `body` field, followed by children.
    Text,
    /// Anchor built from the `url` and `name` fields.
    Link,
    /// Wrapper element around the children.
    Container,
    /// Wrapper element listing every field value.
    Fields,
}

/// Plugin kind configured from settings rather than code.
#[derive(Clone, Debug)]
pub struct BuiltinKind {
    style: RenderStyle,
    cache: bool,
    cache_expiration: Option<Duration>,
    vary_on: Vec<String>,
    tag: Option<String>,
    css: Option<String>,
    js: Option<String>,
}

impl BuiltinKind {
    /// Create a cacheable kind rendering in `style`.
    #[must_use]
    pub fn new(style: RenderStyle) -> Self {
        Self {
            style,
            cache: true,
            cache_expiration: None,
            vary_on: Vec::new(),
            tag: None,
            css: None,
            js: None,
        }
    }

    /// Opt out of caching.
    #[must_use]
    pub fn uncached(mut self) -> Self {
        self.cache = false;
        self
    }

    /// Cap the lifetime of cached output.
    #[must_use]
    pub fn with_cache_expiration(mut self, expiration: Duration) -> Self {
        self.cache_expiration = Some(expiration);
        self
    }

    /// Vary cached output on request headers.
    #[must_use]
    pub fn with_vary_on(mut self, headers: &[&str]) -> Self {
        self.vary_on = headers.iter().map(|&h| h.to_owned()).collect();
        self
    }

    /// Use `tag` as the wrapper element.
    #[must_use]
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_owned());
        self
    }

    /// Contribute `fragment` to the `css` block.
    #[must_use]
    pub fn with_css(mut self, fragment: &str) -> Self {
        self.css = Some(fragment.to_owned());
        self
    }

    /// Contribute `fragment` to the `js` block.
    #[must_use]
    pub fn with_js(mut self, fragment: &str) -> Self {
        self.js = Some(fragment.to_owned());
        self
    }

    fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or("div")
    }
}

impl PluginKind for BuiltinKind {
    fn render_html(&self, node: &PluginNode, children_html: &str) -> String {
        match self.style {
            RenderStyle::Text => {
                format!("{}{children_html}", node.field_str("body").unwrap_or_default())
            }
            RenderStyle::Link => {
                let url = node.field_str("url").unwrap_or_default();
                let name = node.field_str("name").unwrap_or(url);
                format!(
                    "<a href=\"{}\">{}</a>{children_html}",
                    html_escape::encode_double_quoted_attribute(url),
                    html_escape::encode_text(name)
                )
            }
            RenderStyle::Container => {
                let tag = self.tag();
                format!(
                    "<{tag} class=\"plugin-{}\">{children_html}</{tag}>",
                    html_escape::encode_double_quoted_attribute(&node.plugin_type.to_lowercase())
                )
            }
            RenderStyle::Fields => {
                let tag = self.tag();
                let mut html = format!(
                    "<{tag} data-plugin=\"{}\">",
                    html_escape::encode_double_quoted_attribute(&node.plugin_type)
                );
                for (name, value) in &node.fields {
                    if name == "plugin_type" {
                        continue;
                    }
                    let text = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    html.push_str(&format!(
                        "<span data-field=\"{}\">{}</span>",
                        html_escape::encode_double_quoted_attribute(name),
                        html_escape::encode_text(&text)
                    ));
                }
                html.push_str(children_html);
                html.push_str(&format!("</{tag}>"));
                html
            }
        }
    }

    fn assets(&self) -> Vec<(&str, &str)> {
        let mut assets = Vec::new();
        if let Some(css) = &self.css {
            assets.push(("css", css.as_str()));
        }
        if let Some(js) = &self.js {
            assets.push(("js", js.as_str()));
        }
        assets
    }

    fn cacheable(&self) -> bool {
        self.cache
    }

    fn cache_expiration(&self) -> Option<Duration> {
        self.cache_expiration
    }

    fn vary_on(&self) -> &[String] {
        &self.vary_on
    }
}

/// Registry mapping plugin type names to their kinds.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    kinds: HashMap<String, Arc<dyn PluginKind>>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("PluginRegistry").field("kinds", &names).finish()
    }
}

impl PluginRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `kind` under the type name `name`.
    pub fn register<K: PluginKind + 'static>(&mut self, name: &str, kind: K) {
        self.kinds.insert(name.to_owned(), Arc::new(kind));
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with_kind<K: PluginKind + 'static>(mut self, name: &str, kind: K) -> Self {
        self.register(name, kind);
        self
    }

    /// Kind registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn PluginKind> {
        self.kinds.get(name).map(AsRef::as_ref)
    }
}

/// A resolved plugin with its payload fields and resolved children.
#[derive(Clone, Debug, PartialEq)]
pub struct PluginNode {
    /// Plugin identity.
    pub id: PluginId,
    /// Registered type name.
    pub plugin_type: String,
    /// Payload fields, including `plugin_type`.
    pub fields: Map<String, Value>,
    /// Resolved children in position order.
    pub children: Vec<PluginNode>,
}

impl PluginNode {
    /// String value of a payload field.
    #[must_use]
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// JSON payload: the fields plus a `children` list when there are any.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = self.fields.clone();
        if !self.children.is_empty() {
            object.insert(
                "children".to_owned(),
                Value::Array(self.children.iter().map(Self::to_json).collect()),
            );
        }
        Value::Object(object)
    }

    /// Visit this node and all descendants in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a PluginNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Rebuild and resolve the plugin tree of flat `rows`.
///
/// Siblings are ordered by `position`, ties keep row order. Rows whose
/// parent is not among `rows` are unreachable and dropped.
#[must_use]
pub fn resolve_plugins(rows: &[PluginRecord], registry: &PluginRegistry) -> Vec<PluginNode> {
    let mut groups: HashMap<Option<PluginId>, Vec<usize>> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        groups.entry(row.parent).or_default().push(idx);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|&idx| rows[idx].position);
    }

    groups.get(&None).map_or_else(Vec::new, |roots| {
        roots
            .iter()
            .filter_map(|&idx| resolve_node(idx, rows, &groups, registry))
            .collect()
    })
}

fn resolve_node(
    idx: usize,
    rows: &[PluginRecord],
    groups: &HashMap<Option<PluginId>, Vec<usize>>,
    registry: &PluginRegistry,
) -> Option<PluginNode> {
    let row = &rows[idx];
    let Some(kind) = registry.get(&row.plugin_type) else {
        tracing::warn!(plugin = row.id, plugin_type = %row.plugin_type, "Skipping plugin of unregistered type");
        return None;
    };
    let Some(data) = &row.data else {
        tracing::warn!(plugin = row.id, plugin_type = %row.plugin_type, "Skipping plugin without concrete instance");
        return None;
    };

    let mut fields = Map::new();
    fields.insert(
        "plugin_type".to_owned(),
        Value::String(row.plugin_type.clone()),
    );
    fields.extend(kind.fields(data));

    let children = groups.get(&Some(row.id)).map_or_else(Vec::new, |group| {
        group
            .iter()
            .filter_map(|&child| resolve_node(child, rows, groups, registry))
            .collect()
    });

    Some(PluginNode {
        id: row.id,
        plugin_type: row.plugin_type.clone(),
        fields,
        children,
    })
}
