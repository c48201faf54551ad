//! Application assembler.
//!
//! Combines emitted pages, custom components, shell files and the package
//! manifest into a flat file map. Pure: nothing is written or sent anywhere.

use std::collections::BTreeMap;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use pagesmith_emit::escape::escape_js_string;
use pagesmith_emit::{
    emit_page_as, identifier, normalize_route_path, scope_class, serialize_styles, slugify,
    AppMeta, EmitError, EmitOptions, IdentifierAllocator,
};
use pagesmith_model::{AppSnapshot, CustomComponent, Page};

use crate::assets::AssetPipeline;
use crate::templates::{
    ComponentContext, ComponentEntry, RouteEntry, ShellContext, TemplateEngine, SHELL_FILES,
};

/// Virtual path to file content, ordered by path.
pub type FileMap = BTreeMap<String, String>;

/// Configuration for assembling an app.
#[derive(Debug, Clone)]
pub struct AssembleConfig {
    /// Page emission options
    pub emit: EmitOptions,

    /// Minify the theme stylesheet
    pub minify: bool,

    /// Base URL the exported app is served from
    pub base_url: String,
}

impl Default for AssembleConfig {
    fn default() -> Self {
        Self {
            emit: EmitOptions::default(),
            minify: true,
            base_url: "/".to_string(),
        }
    }
}

/// Counts and measurements describing an export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    /// Number of pages emitted
    pub pages: usize,

    /// Number of custom components emitted
    pub components: usize,

    /// Number of component-tree nodes across all pages
    pub nodes: usize,

    /// Number of active functions shipped
    pub functions: usize,

    /// Number of files in the file map
    pub files: usize,

    /// Total size of all files in bytes
    pub size_bytes: usize,
}

/// The result of assembling an app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedApp {
    pub files: FileMap,
    pub summary: ExportSummary,
}

/// Errors that can occur during assembly.
#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("Failed to emit page '{page}': {source}")]
    Emit {
        page: String,
        #[source]
        source: EmitError,
    },

    #[error("Failed to emit component '{component}': {source}")]
    Component {
        component: String,
        #[source]
        source: EmitError,
    },

    #[error("Failed to render template {name}: {message}")]
    Template { name: String, message: String },

    #[error("Failed to serialize manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// A page paired with its allocated identifier.
struct PagePlan<'a> {
    page: &'a Page,
    id: String,
    route: String,
}

/// Assembles exported apps.
pub struct AppAssembler {
    config: AssembleConfig,
    templates: TemplateEngine,
}

impl AppAssembler {
    /// Create a new assembler.
    pub fn new(config: AssembleConfig) -> Self {
        Self {
            config,
            templates: TemplateEngine::new(),
        }
    }

    /// Assemble the full file map for a snapshot.
    ///
    /// Either every file is produced or an error is returned; there is no
    /// partial output.
    pub fn assemble(&self, snapshot: &AppSnapshot) -> Result<ExportedApp, AssembleError> {
        let start = Instant::now();
        let app = &snapshot.app;

        let plans = plan_pages(&snapshot.pages)?;
        let components = plan_components(&snapshot.components)?;

        let meta = AppMeta::new(app.name.clone());
        let emit_options = &self.config.emit;

        // Emit pages in parallel; collect keeps page order
        let views: Vec<(String, String)> = plans
            .par_iter()
            .map(|plan| {
                tracing::debug!("Emitting page '{}' as {}", plan.page.name, plan.id);
                (
                    format!("src/views/{}.vue", plan.id),
                    emit_page_as(plan.page, &plan.id, &meta, emit_options),
                )
            })
            .collect();

        let mut files = FileMap::new();
        files.extend(views);

        for (component, id) in &components {
            let source = self.render_component(component, id)?;
            files.insert(format!("src/components/{}.vue", id), source);
        }

        let shell = ShellContext {
            app_name: app.name.clone(),
            base_url: self.config.base_url.clone(),
            routes: plans
                .iter()
                .map(|p| RouteEntry {
                    path: p.route.clone(),
                    name: p.id.clone(),
                })
                .collect(),
            home_redirect: home_redirect(&plans),
            components: component_entries(&components),
            font_family: app.theme.font_family.clone(),
            background_color: app.theme.background_color.clone(),
            text_color: app.theme.text_color.clone(),
        };

        for name in SHELL_FILES {
            let source = self
                .templates
                .render_shell(name, &shell)
                .map_err(|e| AssembleError::Template {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
            files.insert(name.to_string(), source);
        }

        files.insert("src/styles/theme.css".to_string(), self.theme_css(snapshot));
        files.insert("package.json".to_string(), package_manifest(snapshot)?);

        let functions: Vec<Value> = snapshot
            .active_functions()
            .map(|f| json!({ "name": f.name, "trigger": f.trigger, "code": f.code }))
            .collect();
        if !functions.is_empty() {
            files.insert(
                "functions.json".to_string(),
                serde_json::to_string_pretty(&functions)?,
            );
        }

        let summary = ExportSummary {
            pages: plans.len(),
            components: components.len(),
            nodes: snapshot.pages.iter().map(Page::node_count).sum(),
            functions: functions.len(),
            files: files.len(),
            size_bytes: files.values().map(String::len).sum(),
        };

        tracing::info!(
            "Assembled '{}': {} pages, {} components, {} files ({} bytes) in {}ms",
            app.name,
            summary.pages,
            summary.components,
            summary.files,
            summary.size_bytes,
            start.elapsed().as_millis()
        );

        Ok(ExportedApp { files, summary })
    }

    /// Render a custom component shell around its verbatim template.
    fn render_component(
        &self,
        component: &CustomComponent,
        id: &str,
    ) -> Result<String, AssembleError> {
        let ctx = ComponentContext {
            id: id.to_string(),
            scope: scope_class("component", id),
            template: component.template.clone(),
            props: props_definition(component)?,
            styles: indent(&serialize_styles(Some(&component.styles))),
        };

        self.templates
            .render_component(&ctx)
            .map_err(|e| AssembleError::Template {
                name: format!("component {}", id),
                message: e.to_string(),
            })
    }

    fn theme_css(&self, snapshot: &AppSnapshot) -> String {
        let css = AssetPipeline::theme_css(&snapshot.app.theme);
        if !self.config.minify {
            return css;
        }
        match AssetPipeline::minify_css(&css) {
            Ok(minified) => minified,
            Err(e) => {
                tracing::warn!("Keeping unminified theme stylesheet: {}", e);
                css
            }
        }
    }
}

impl Default for AppAssembler {
    fn default() -> Self {
        Self::new(AssembleConfig::default())
    }
}

/// Assemble a snapshot with the default configuration.
pub fn assemble_app(snapshot: &AppSnapshot) -> Result<ExportedApp, AssembleError> {
    AppAssembler::default().assemble(snapshot)
}

/// Allocate page identifiers and routes in page order.
fn plan_pages(pages: &[Page]) -> Result<Vec<PagePlan<'_>>, AssembleError> {
    let mut ids = IdentifierAllocator::new();

    pages
        .iter()
        .map(|page| -> Result<PagePlan<'_>, AssembleError> {
            let base = identifier(&page.name).map_err(|source| AssembleError::Emit {
                page: page.name.clone(),
                source,
            })?;
            let id = ids.allocate(&base);
            if id != base {
                tracing::warn!(
                    "Page '{}' collides with an earlier page, exporting it as {}",
                    page.name,
                    id
                );
            }
            Ok(PagePlan {
                page,
                id,
                route: normalize_route_path(&page.path),
            })
        })
        .collect()
}

/// Allocate custom component identifiers in input order.
fn plan_components(
    components: &[CustomComponent],
) -> Result<Vec<(&CustomComponent, String)>, AssembleError> {
    let mut ids = IdentifierAllocator::new();

    components
        .iter()
        .map(|component| -> Result<(&CustomComponent, String), AssembleError> {
            let base = identifier(&component.name).map_err(|source| AssembleError::Component {
                component: component.name.clone(),
                source,
            })?;
            let id = ids.allocate(&base);
            if id != base {
                tracing::warn!(
                    "Component '{}' collides with an earlier component, exporting it as {}",
                    component.name,
                    id
                );
            }
            Ok((component, id))
        })
        .collect()
}

/// Where `/` should redirect, if the home page is not already served there.
///
/// The first page flagged `isHome` wins; without one, the first page is home.
fn home_redirect(plans: &[PagePlan<'_>]) -> Option<String> {
    let homes: Vec<&PagePlan<'_>> = plans.iter().filter(|p| p.page.is_home).collect();
    if homes.len() > 1 {
        tracing::warn!(
            "{} pages are marked as home, using '{}'",
            homes.len(),
            homes[0].page.name
        );
    }

    let home = homes.first().copied().or_else(|| plans.first())?;
    let root_taken = plans.iter().any(|p| p.route == "/");
    if home.route == "/" || root_taken {
        None
    } else {
        Some(home.route.clone())
    }
}

/// The body of a component's `props` object: one entry per declared prop,
/// with the authored value as its default.
fn props_definition(component: &CustomComponent) -> Result<String, AssembleError> {
    let mut lines = Vec::with_capacity(component.props.len());
    for (key, value) in &component.props {
        let default = script_safe(&serde_json::to_string(value)?);
        let default = match value {
            // Vue requires factories for object and array defaults
            Value::Object(_) | Value::Array(_) => format!("() => ({})", default),
            _ => default,
        };
        lines.push(format!(
            "    '{}': {{ default: {} }},",
            escape_js_string(key),
            default
        ));
    }
    Ok(lines.join("\n"))
}

/// `package.json` for the exported app.
fn package_manifest(snapshot: &AppSnapshot) -> Result<String, AssembleError> {
    let name = snapshot
        .app
        .subdomain
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(slugify)
        .unwrap_or_else(|| slugify(&snapshot.app.name));

    let manifest = json!({
        "name": name,
        "private": true,
        "version": "0.1.0",
        "type": "module",
        "scripts": {
            "dev": "vite",
            "build": "vite build",
            "preview": "vite preview"
        },
        "dependencies": {
            "vue": "^3.4.0",
            "vue-router": "^4.3.0"
        },
        "devDependencies": {
            "@vitejs/plugin-vue": "^5.0.0",
            "vite": "^5.2.0"
        }
    });

    Ok(serde_json::to_string_pretty(&manifest)?)
}

/// Names `src/main.js` declares itself, plus JavaScript reserved words.
const RESERVED_BINDINGS: &[&str] = &[
    "App", "app", "router", "createApp", "arguments", "await", "break", "case", "catch",
    "class", "const", "continue", "debugger", "default", "delete", "do", "else", "enum",
    "eval", "export", "extends", "false", "finally", "for", "function", "if", "implements",
    "import", "in", "instanceof", "interface", "let", "new", "null", "package", "private",
    "protected", "public", "return", "static", "super", "switch", "this", "throw", "true",
    "try", "typeof", "undefined", "var", "void", "while", "with", "yield",
];

/// Import entries for `src/main.js`, one distinct binding per component.
fn component_entries(components: &[(&CustomComponent, String)]) -> Vec<ComponentEntry> {
    let mut bindings = IdentifierAllocator::with_reserved(RESERVED_BINDINGS.iter().copied());

    components
        .iter()
        .map(|(_, id)| ComponentEntry {
            id: id.clone(),
            binding: bindings.allocate(&js_binding(id)),
        })
        .collect()
}

/// A JavaScript identifier for importing a component.
fn js_binding(id: &str) -> String {
    let mut binding: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if binding.starts_with(|c: char| c.is_ascii_digit()) {
        binding.insert(0, '_');
    }
    binding
}

/// JSON is valid JavaScript, but `</` could still close the `<script>` block.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("  {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}
