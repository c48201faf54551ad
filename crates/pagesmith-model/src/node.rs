//! Component-tree nodes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::loader::ModelError;

/// Free-form property map attached to a node or custom component.
pub type Props = Map<String, Value>;

/// camelCase CSS property name to CSS value.
pub type StyleMap = Map<String, Value>;

/// The kind of a component node.
///
/// Unknown type tags are preserved in [`ComponentKind::Other`] so that
/// snapshots containing content from newer editors still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentKind {
    Text,
    Heading,
    Button,
    Image,
    Container,
    Grid,
    Form,
    Input,
    Textarea,
    Select,
    Checkbox,
    Radio,
    Card,
    Modal,
    Tabs,
    Accordion,
    Slider,
    Gallery,
    Video,
    Map,
    Chart,
    List,
    Table,
    Navbar,
    Footer,
    Sidebar,
    Hero,
    Cta,
    Other(String),
}

impl ComponentKind {
    /// Every member of the known enumeration, in editor palette order.
    pub const KNOWN: [ComponentKind; 28] = [
        ComponentKind::Text,
        ComponentKind::Heading,
        ComponentKind::Button,
        ComponentKind::Image,
        ComponentKind::Container,
        ComponentKind::Grid,
        ComponentKind::Form,
        ComponentKind::Input,
        ComponentKind::Textarea,
        ComponentKind::Select,
        ComponentKind::Checkbox,
        ComponentKind::Radio,
        ComponentKind::Card,
        ComponentKind::Modal,
        ComponentKind::Tabs,
        ComponentKind::Accordion,
        ComponentKind::Slider,
        ComponentKind::Gallery,
        ComponentKind::Video,
        ComponentKind::Map,
        ComponentKind::Chart,
        ComponentKind::List,
        ComponentKind::Table,
        ComponentKind::Navbar,
        ComponentKind::Footer,
        ComponentKind::Sidebar,
        ComponentKind::Hero,
        ComponentKind::Cta,
    ];

    /// The type tag as it appears in snapshots.
    pub fn as_str(&self) -> &str {
        match self {
            ComponentKind::Text => "text",
            ComponentKind::Heading => "heading",
            ComponentKind::Button => "button",
            ComponentKind::Image => "image",
            ComponentKind::Container => "container",
            ComponentKind::Grid => "grid",
            ComponentKind::Form => "form",
            ComponentKind::Input => "input",
            ComponentKind::Textarea => "textarea",
            ComponentKind::Select => "select",
            ComponentKind::Checkbox => "checkbox",
            ComponentKind::Radio => "radio",
            ComponentKind::Card => "card",
            ComponentKind::Modal => "modal",
            ComponentKind::Tabs => "tabs",
            ComponentKind::Accordion => "accordion",
            ComponentKind::Slider => "slider",
            ComponentKind::Gallery => "gallery",
            ComponentKind::Video => "video",
            ComponentKind::Map => "map",
            ComponentKind::Chart => "chart",
            ComponentKind::List => "list",
            ComponentKind::Table => "table",
            ComponentKind::Navbar => "navbar",
            ComponentKind::Footer => "footer",
            ComponentKind::Sidebar => "sidebar",
            ComponentKind::Hero => "hero",
            ComponentKind::Cta => "cta",
            ComponentKind::Other(tag) => tag,
        }
    }

    /// Whether this kind belongs to the known enumeration.
    pub fn is_known(&self) -> bool {
        !matches!(self, ComponentKind::Other(_))
    }
}

impl From<&str> for ComponentKind {
    fn from(tag: &str) -> Self {
        ComponentKind::KNOWN
            .iter()
            .find(|kind| kind.as_str() == tag)
            .cloned()
            .unwrap_or_else(|| ComponentKind::Other(tag.to_string()))
    }
}

impl From<String> for ComponentKind {
    fn from(tag: String) -> Self {
        ComponentKind::from(tag.as_str())
    }
}

impl From<ComponentKind> for String {
    fn from(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed UI node in a page's component tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode {
    /// Stable identifier, unique within a page
    #[serde(default)]
    pub id: String,

    /// Component type tag
    #[serde(rename = "type")]
    pub kind: ComponentKind,

    /// Per-type properties
    #[serde(default)]
    pub props: Props,

    /// camelCase CSS properties applied inline
    #[serde(default)]
    pub styles: StyleMap,

    /// Ordered children (rendered by container-like kinds only)
    #[serde(default)]
    pub children: Vec<ComponentNode>,
}

impl ComponentNode {
    /// Create a node of the given kind with no props, styles or children.
    pub fn new(id: impl Into<String>, kind: impl Into<ComponentKind>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            props: Props::new(),
            styles: StyleMap::new(),
            children: Vec::new(),
        }
    }

    /// Set a property, builder style.
    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }

    /// Set a style declaration, builder style.
    pub fn with_style(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.styles.insert(key.to_string(), value.into());
        self
    }

    /// Append a child, builder style.
    pub fn with_child(mut self, child: ComponentNode) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ComponentNode::node_count).sum::<usize>()
    }

    /// Reject kinds outside the known enumeration.
    ///
    /// Intended for mutation APIs; emission accepts any kind.
    pub fn validate_kind(&self) -> Result<(), ModelError> {
        if let ComponentKind::Other(tag) = &self.kind {
            return Err(ModelError::UnknownComponentType {
                id: self.id.clone(),
                kind: tag.clone(),
            });
        }
        self.children.iter().try_for_each(ComponentNode::validate_kind)
    }

    /// Read a scalar prop as text. Numbers and booleans use their JSON
    /// text; missing, null and structured values are absent.
    pub fn prop_text(&self, key: &str) -> Option<String> {
        match self.props.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_known_and_unknown_kinds() {
        assert_eq!(ComponentKind::from("heading"), ComponentKind::Heading);
        assert_eq!(ComponentKind::from("cta"), ComponentKind::Cta);
        assert_eq!(
            ComponentKind::from("mystery"),
            ComponentKind::Other("mystery".to_string())
        );
        assert!(!ComponentKind::from("mystery").is_known());
    }

    #[test]
    fn deserializes_node_with_missing_fields() {
        let node: ComponentNode = serde_json::from_str(r#"{"type":"button"}"#).unwrap();

        assert_eq!(node.kind, ComponentKind::Button);
        assert!(node.id.is_empty());
        assert!(node.props.is_empty());
        assert!(node.children.is_empty());
    }

    #[test]
    fn unknown_kind_round_trips_through_json() {
        let node: ComponentNode =
            serde_json::from_str(r#"{"id":"n1","type":"mystery"}"#).unwrap();
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(json["type"], "mystery");
    }

    #[test]
    fn counts_nested_nodes() {
        let tree = ComponentNode::new("root", "container")
            .with_child(ComponentNode::new("a", "text"))
            .with_child(
                ComponentNode::new("b", "grid").with_child(ComponentNode::new("c", "image")),
            );

        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn validate_kind_rejects_nested_unknown() {
        let tree = ComponentNode::new("root", "container")
            .with_child(ComponentNode::new("x", "mystery"));

        let err = tree.validate_kind().unwrap_err();

        assert!(matches!(
            err,
            ModelError::UnknownComponentType { ref id, ref kind } if id == "x" && kind == "mystery"
        ));
    }

    #[test]
    fn prop_text_reads_scalars_only() {
        let node = ComponentNode::new("n", "text")
            .with_prop("label", "Buy")
            .with_prop("count", 3)
            .with_prop("on", true)
            .with_prop("items", serde_json::json!([1, 2]));

        assert_eq!(node.prop_text("label").as_deref(), Some("Buy"));
        assert_eq!(node.prop_text("count").as_deref(), Some("3"));
        assert_eq!(node.prop_text("on").as_deref(), Some("true"));
        assert_eq!(node.prop_text("items"), None);
        assert_eq!(node.prop_text("missing"), None);
    }
}
