//! Page emitter: component tree to Vue single-file component.

use serde_json::Value;

use pagesmith_model::{ComponentKind, ComponentNode, Page};

use crate::escape::{escape_attribute, escape_comment, escape_js_string, escape_text};
use crate::naming::{identifier, scope_class};
use crate::style::{inline_styles, serialize_styles};

/// Marker emitted for pages without components.
pub const EMPTY_PAGE_MARKER: &str = "empty-page";

/// App-level data the emitter needs for every page.
#[derive(Debug, Clone)]
pub struct AppMeta {
    /// App display name, appended to document titles
    pub name: String,
}

impl AppMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Options controlling emission.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// HTML-escape interpolated prop values (off splices them verbatim)
    pub escape_text: bool,

    /// Deepest nesting level rendered before a node is replaced by a comment
    pub max_depth: usize,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            escape_text: true,
            max_depth: 32,
        }
    }
}

/// Errors that can occur during emission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    #[error("Structural error: {0}")]
    Structural(String),
}

/// Emit the source of one page.
///
/// The page identifier (used as component name and CSS scope) is the page
/// name with whitespace removed.
pub fn emit_page(page: &Page, app: &AppMeta, options: &EmitOptions) -> Result<String, EmitError> {
    let id = identifier(&page.name)?;
    Ok(emit_page_as(page, &id, app, options))
}

/// Emit the source of one page under an already allocated identifier.
pub fn emit_page_as(page: &Page, page_id: &str, app: &AppMeta, options: &EmitOptions) -> String {
    let scope = scope_class("page", page_id);

    let mut markup = Markup::new(options);
    markup.render_nodes(&page.content.components, 0, 2);
    let body = if page.content.components.is_empty() {
        format!(
            "    <div class=\"{}\">This page is empty</div>\n",
            EMPTY_PAGE_MARKER
        )
    } else {
        markup.finish()
    };

    let layout_attr = page
        .content
        .layout
        .as_deref()
        .filter(|l| !l.is_empty())
        .map(|l| format!(" data-layout=\"{}\"", escape_attribute(l)))
        .unwrap_or_default();

    let template = format!(
        "<template>\n  <div class=\"{scope}\"{layout_attr}>\n{body}  </div>\n</template>\n"
    );

    let script = page_script(page, page_id, app);

    let declarations = serialize_styles(Some(&page.content.styles));
    let style = if declarations.is_empty() {
        format!("<style scoped>\n.{scope} {{}}\n</style>\n")
    } else {
        format!(
            "<style scoped>\n.{scope} {{\n{}\n}}\n</style>\n",
            indent_lines(&declarations, 2)
        )
    };

    format!("{template}\n{script}\n{style}")
}

/// The `<script>` block: document title and description metadata on mount,
/// plus the click handler stub wired to buttons.
fn page_script(page: &Page, page_id: &str, app: &AppMeta) -> String {
    let seo = &page.content.seo;
    let title = seo
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(&page.name);
    let document_title = format!("{} - {}", title, app.name);

    let description = seo
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(|d| {
            format!(
                r#"
    let meta = document.querySelector('meta[name="description"]');
    if (!meta) {{
      meta = document.createElement('meta');
      meta.setAttribute('name', 'description');
      document.head.appendChild(meta);
    }}
    meta.setAttribute('content', '{}');"#,
                escape_js_string(d)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<script>
export default {{
  name: '{name}',
  mounted() {{
    document.title = '{title}';{description}
  }},
  methods: {{
    handleClick(id) {{
      this.$emit('component-click', id);
    }}
  }}
}};
</script>
"#,
        name = escape_js_string(page_id),
        title = escape_js_string(&document_title),
        description = description,
    )
}

/// Accumulates template markup for a component tree.
struct Markup<'a> {
    options: &'a EmitOptions,
    out: String,
}

impl<'a> Markup<'a> {
    fn new(options: &'a EmitOptions) -> Self {
        Self {
            options,
            out: String::new(),
        }
    }

    fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, indent: usize, text: &str) {
        for _ in 0..indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn render_nodes(&mut self, nodes: &[ComponentNode], depth: usize, indent: usize) {
        for node in nodes {
            self.render_node(node, depth, indent);
        }
    }

    fn render_node(&mut self, node: &ComponentNode, depth: usize, indent: usize) {
        if depth >= self.options.max_depth {
            tracing::warn!(
                "Nesting limit of {} reached at node '{}', skipping subtree",
                self.options.max_depth,
                node.id
            );
            let comment = format!(
                "<!-- nesting limit reached at node {} -->",
                escape_comment(&node.id)
            );
            self.line(indent, &comment);
            return;
        }

        let style = style_attribute(node, None);

        match &node.kind {
            ComponentKind::Heading => {
                let level = int_prop(node, "level").unwrap_or(1).clamp(1, 6);
                let text = self.text(&node.prop_text("text").unwrap_or_default());
                self.line(indent, &format!("<h{level}{style}>{text}</h{level}>"));
            }

            ComponentKind::Text => {
                let content = self.text(&node.prop_text("content").unwrap_or_default());
                self.line(indent, &format!("<p{style}>{content}</p>"));
            }

            ComponentKind::Button => {
                let label = non_empty_prop(node, "text").unwrap_or_else(|| "Button".to_string());
                let label = self.text(&label);
                let handler = click_handler(&node.id);
                self.line(
                    indent,
                    &format!("<button type=\"button\"{style} @click=\"{handler}\">{label}</button>"),
                );
            }

            ComponentKind::Image => {
                let src = self.attr(&node.prop_text("src").unwrap_or_default());
                let alt = self.attr(&node.prop_text("alt").unwrap_or_default());
                self.line(indent, &format!("<img src=\"{src}\" alt=\"{alt}\"{style} />"));
            }

            ComponentKind::Container => {
                let class = self.attr(&node.prop_text("className").unwrap_or_default());
                let open = format!("<div class=\"{class}\"{style}>");
                self.wrap_children(node, &open, "</div>", depth, indent);
            }

            ComponentKind::Grid => {
                let columns = int_prop(node, "columns").unwrap_or(1).max(1);
                let gap = non_empty_prop(node, "gap").unwrap_or_else(|| "1rem".to_string());
                let layout = format!(
                    "display: grid; grid-template-columns: repeat({columns}, 1fr); gap: {gap};"
                );
                let style = style_attribute(node, Some(&layout));
                let open = format!("<div class=\"grid\"{style}>");
                self.wrap_children(node, &open, "</div>", depth, indent);
            }

            ComponentKind::Hero => {
                let title = self.text(&node.prop_text("title").unwrap_or_default());
                let subtitle = self.text(&node.prop_text("subtitle").unwrap_or_default());
                self.line(indent, &format!("<section class=\"hero\"{style}>"));
                self.line(indent + 1, &format!("<h1>{title}</h1>"));
                self.line(indent + 1, &format!("<p>{subtitle}</p>"));
                if let Some(cta) = non_empty_prop(node, "buttonText") {
                    let cta = self.text(&cta);
                    let handler = click_handler(&node.id);
                    self.line(
                        indent + 1,
                        &format!(
                            "<button type=\"button\" class=\"hero-cta\" @click=\"{handler}\">{cta}</button>"
                        ),
                    );
                }
                self.line(indent, "</section>");
            }

            ComponentKind::Card => {
                let title = self.text(&node.prop_text("title").unwrap_or_default());
                let description = self.text(&node.prop_text("description").unwrap_or_default());
                self.line(indent, &format!("<div class=\"card\"{style}>"));
                self.line(indent + 1, &format!("<h3>{title}</h3>"));
                self.line(indent + 1, &format!("<p>{description}</p>"));
                self.line(indent, "</div>");
            }

            other => {
                tracing::debug!("Rendering placeholder for component type '{}'", other);
                let tag = other.as_str();
                self.line(
                    indent,
                    &format!(
                        "<div class=\"{}\"{style}><!-- {} component not implemented --></div>",
                        escape_attribute(tag),
                        escape_comment(tag)
                    ),
                );
            }
        }
    }

    fn wrap_children(
        &mut self,
        node: &ComponentNode,
        open: &str,
        close: &str,
        depth: usize,
        indent: usize,
    ) {
        if node.children.is_empty() {
            self.line(indent, &format!("{open}{close}"));
            return;
        }
        self.line(indent, open);
        self.render_nodes(&node.children, depth + 1, indent + 1);
        self.line(indent, close);
    }

    fn text(&self, value: &str) -> String {
        if self.options.escape_text {
            escape_text(value)
        } else {
            value.to_string()
        }
    }

    fn attr(&self, value: &str) -> String {
        if self.options.escape_text {
            escape_attribute(value)
        } else {
            value.to_string()
        }
    }
}

/// ` style="..."` for a node's inline styles, with optional leading
/// declarations, or nothing when there are none.
fn style_attribute(node: &ComponentNode, leading: Option<&str>) -> String {
    let own = inline_styles(Some(&node.styles));
    let combined = match (leading, own.is_empty()) {
        (Some(lead), true) => lead.to_string(),
        (Some(lead), false) => format!("{} {}", lead, own),
        (None, _) => own,
    };
    if combined.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_attribute(&combined))
    }
}

fn click_handler(id: &str) -> String {
    escape_attribute(&format!("handleClick('{}')", escape_js_string(id)))
}

fn non_empty_prop(node: &ComponentNode, key: &str) -> Option<String> {
    node.prop_text(key).filter(|s| !s.is_empty())
}

fn int_prop(node: &ComponentNode, key: &str) -> Option<i64> {
    match node.props.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn indent_lines(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines()
        .map(|l| format!("{pad}{l}"))
        .collect::<Vec<_>>()
        .join("\n")
}
