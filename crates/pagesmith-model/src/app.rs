//! App, page, custom component and function records.

use serde::{Deserialize, Serialize};

use crate::node::{ComponentNode, Props, StyleMap};

/// Visual theme applied to the generated app shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[serde(default = "default_font_family")]
    pub font_family: String,

    #[serde(default = "default_background_color")]
    pub background_color: String,

    #[serde(default = "default_text_color")]
    pub text_color: String,

    #[serde(default = "default_primary_color")]
    pub primary_color: String,
}

fn default_font_family() -> String {
    "Inter, system-ui, sans-serif".to_string()
}
fn default_background_color() -> String {
    "#ffffff".to_string()
}
fn default_text_color() -> String {
    "#111827".to_string()
}
fn default_primary_color() -> String {
    "#3b82f6".to_string()
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            background_color: default_background_color(),
            text_color: default_text_color(),
            primary_color: default_primary_color(),
        }
    }
}

/// An application owning pages, custom components and functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    /// Persistence identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Display name (required)
    pub name: String,

    /// Hosting subdomain, also used as the package name
    #[serde(default)]
    pub subdomain: Option<String>,

    #[serde(default)]
    pub theme: Theme,
}

impl App {
    /// Create an app with the default theme.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            subdomain: None,
            theme: Theme::default(),
        }
    }

    /// Identifier used to group deployments, falling back to the name.
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

/// Search metadata for a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seo {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// The authored content of a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// Root-level nodes, implicitly wrapped by the page container
    #[serde(default)]
    pub components: Vec<ComponentNode>,

    /// Layout preset name, passed through untouched
    #[serde(default)]
    pub layout: Option<String>,

    /// Page-level CSS declarations
    #[serde(default)]
    pub styles: StyleMap,

    #[serde(default)]
    pub seo: Seo,
}

/// A routed page of an app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub id: Option<String>,

    /// Display name (required)
    pub name: String,

    /// URL path
    #[serde(default = "default_path")]
    pub path: String,

    /// Whether this page is the app's landing page
    #[serde(default)]
    pub is_home: bool,

    /// Position among sibling pages when loaded from a project directory
    #[serde(default)]
    pub order: Option<i32>,

    #[serde(default)]
    pub content: PageContent,
}

fn default_path() -> String {
    "/".to_string()
}

impl Page {
    /// Create an empty page.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            path: path.into(),
            is_home: false,
            order: None,
            content: PageContent::default(),
        }
    }

    /// Total number of component nodes on the page.
    pub fn node_count(&self) -> usize {
        self.content
            .components
            .iter()
            .map(ComponentNode::node_count)
            .sum()
    }
}

/// A user-authored component with a verbatim template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomComponent {
    pub name: String,

    /// Raw markup, injected without parsing or escaping
    #[serde(default)]
    pub template: String,

    #[serde(default)]
    pub props: Props,

    #[serde(default)]
    pub styles: StyleMap,
}

/// A serverless function carried along as metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,

    #[serde(default)]
    pub trigger: String,

    #[serde(default)]
    pub code: String,

    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Everything the export pipeline needs about one app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSnapshot {
    pub app: App,

    #[serde(default)]
    pub pages: Vec<Page>,

    #[serde(default)]
    pub components: Vec<CustomComponent>,

    #[serde(default)]
    pub functions: Vec<FunctionRecord>,
}

impl AppSnapshot {
    /// Create a snapshot with no pages, components or functions.
    pub fn new(app: App) -> Self {
        Self {
            app,
            pages: Vec::new(),
            components: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Functions that should ship with an export.
    pub fn active_functions(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.functions.iter().filter(|f| f.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_snapshot_with_defaults() {
        let json = r##"{
            "app": { "name": "Shop", "theme": { "backgroundColor": "#000" } },
            "pages": [
                { "name": "Home", "isHome": true, "content": { "components": [] } },
                { "name": "About", "path": "/about" }
            ]
        }"##;

        let snapshot: AppSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.app.theme.background_color, "#000");
        assert_eq!(snapshot.app.theme.text_color, "#111827");
        assert_eq!(snapshot.pages[0].path, "/");
        assert!(snapshot.pages[0].is_home);
        assert_eq!(snapshot.pages[1].path, "/about");
        assert!(snapshot.components.is_empty());
    }

    #[test]
    fn page_without_name_is_rejected() {
        let result: Result<Page, _> = serde_json::from_str(r#"{"path":"/x"}"#);

        assert!(result.is_err());
    }

    #[test]
    fn filters_inactive_functions() {
        let json = r#"{
            "app": { "name": "Shop" },
            "functions": [
                { "name": "a", "trigger": "http" },
                { "name": "b", "trigger": "cron", "active": false }
            ]
        }"#;

        let snapshot: AppSnapshot = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = snapshot.active_functions().map(|f| f.name.as_str()).collect();

        assert_eq!(names, vec!["a"]);
    }
}
