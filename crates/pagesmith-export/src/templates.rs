//! Templates for the shared shell files of an exported app.

use minijinja::{context, AutoEscape, Environment};
use serde::Serialize;

use pagesmith_emit::escape::escape_js_string;

/// A route in the generated router table.
#[derive(Debug, Clone, Serialize)]
pub struct RouteEntry {
    /// URL path, always starting with `/`
    pub path: String,
    /// Route name, also the view file stem
    pub name: String,
}

/// A custom component registered globally in `main.js`.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentEntry {
    /// Component identifier, also the file stem
    pub id: String,
    /// JavaScript binding used for the import
    pub binding: String,
}

/// Context for rendering the shell templates.
#[derive(Debug, Clone, Serialize)]
pub struct ShellContext {
    /// App display name
    pub app_name: String,
    /// Base URL the app is served from
    pub base_url: String,
    /// Routes in page order
    pub routes: Vec<RouteEntry>,
    /// Path `/` redirects to, when the home page lives elsewhere
    pub home_redirect: Option<String>,
    /// Custom components to register
    pub components: Vec<ComponentEntry>,
    pub font_family: String,
    pub background_color: String,
    pub text_color: String,
}

/// Context for rendering a custom component shell.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentContext {
    pub id: String,
    pub scope: String,
    /// Verbatim user markup
    pub template: String,
    /// Pre-rendered `props` object body
    pub props: String,
    /// Pre-rendered CSS declarations
    pub styles: String,
}

/// Template engine using minijinja.
///
/// Auto-escaping is off for every template: the outputs are JavaScript, Vue
/// and HTML files, so each interpolation picks its escaping explicitly
/// (`js` for string literals, `e` for HTML).
pub struct TemplateEngine {
    env: Environment<'static>,
}

/// Shell templates, keyed by the path they render to.
pub const SHELL_FILES: [&str; 5] = [
    "index.html",
    "vite.config.js",
    "src/main.js",
    "src/router.js",
    "src/App.vue",
];

impl TemplateEngine {
    /// Create a new template engine with the built-in templates.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_filter("js", |value: String| escape_js_string(&value));

        for (name, source) in [
            ("index.html", INDEX_TEMPLATE),
            ("vite.config.js", VITE_CONFIG_TEMPLATE),
            ("src/main.js", MAIN_TEMPLATE),
            ("src/router.js", ROUTER_TEMPLATE),
            ("src/App.vue", APP_TEMPLATE),
            ("component.vue", COMPONENT_TEMPLATE),
        ] {
            env.add_template_owned(name.to_string(), source.to_string())
                .expect("built-in template is valid");
        }

        Self { env }
    }

    /// Render one of the [`SHELL_FILES`].
    pub fn render_shell(&self, name: &str, ctx: &ShellContext) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(name)?;

        tmpl.render(context! {
            app_name => &ctx.app_name,
            base_url => &ctx.base_url,
            routes => &ctx.routes,
            home_redirect => &ctx.home_redirect,
            components => &ctx.components,
            font_family => &ctx.font_family,
            background_color => &ctx.background_color,
            text_color => &ctx.text_color,
        })
    }

    /// Render a custom component file.
    pub fn render_component(&self, ctx: &ComponentContext) -> Result<String, minijinja::Error> {
        self.env.get_template("component.vue")?.render(ctx)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const INDEX_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ app_name | e }}</title>
</head>
<body>
  <div id="app"></div>
  <script type="module" src="/src/main.js"></script>
</body>
</html>
"##;

const VITE_CONFIG_TEMPLATE: &str = r##"import { defineConfig } from 'vite';
import vue from '@vitejs/plugin-vue';

export default defineConfig({
  plugins: [vue()],
  base: '{{ base_url | js }}',
});
"##;

const MAIN_TEMPLATE: &str = r##"import { createApp } from 'vue';
import App from './App.vue';
import router from './router.js';
import './styles/theme.css';
{% for c in components %}import {{ c.binding }} from './components/{{ c.id | js }}.vue';
{% endfor %}
const app = createApp(App);
app.use(router);
{% for c in components %}app.component('{{ c.id | js }}', {{ c.binding }});
{% endfor %}app.mount('#app');
"##;

const ROUTER_TEMPLATE: &str = r##"import { createRouter, createWebHistory } from 'vue-router';

const routes = [
{% if home_redirect %}  { path: '/', redirect: '{{ home_redirect | js }}' },
{% endif %}{% for r in routes %}  { path: '{{ r.path | js }}', name: '{{ r.name | js }}', component: () => import('./views/{{ r.name | js }}.vue') },
{% endfor %}];

export default createRouter({
  history: createWebHistory(),
  routes,
});
"##;

const APP_TEMPLATE: &str = r##"<template>
  <div id="app-root">
    <router-view />
  </div>
</template>

<script>
export default {
  name: 'App',
};
</script>

<style>
#app-root {
  min-height: 100vh;
  font-family: {{ font_family }};
  background-color: {{ background_color }};
  color: {{ text_color }};
}
</style>
"##;

const COMPONENT_TEMPLATE: &str = r##"<template>
  <div class="{{ scope }}">
{{ template }}
  </div>
</template>

<script>
export default {
  name: '{{ id | js }}',
  props: {
{{ props }}
  },
};
</script>

<style scoped>
.{{ scope }} {
{{ styles }}
}
</style>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    fn shell() -> ShellContext {
        ShellContext {
            app_name: "Tom & Jerry's".to_string(),
            base_url: "/".to_string(),
            routes: vec![
                RouteEntry {
                    path: "/home".to_string(),
                    name: "Home".to_string(),
                },
                RouteEntry {
                    path: "/about".to_string(),
                    name: "AboutUs".to_string(),
                },
            ],
            home_redirect: Some("/home".to_string()),
            components: vec![ComponentEntry {
                id: "PriceTag".to_string(),
                binding: "PriceTag".to_string(),
            }],
            font_family: "Inter, sans-serif".to_string(),
            background_color: "#fff".to_string(),
            text_color: "#000".to_string(),
        }
    }

    #[test]
    fn renders_router_in_order_with_redirect() {
        let engine = TemplateEngine::new();

        let js = engine.render_shell("src/router.js", &shell()).unwrap();

        let redirect = js.find("{ path: '/', redirect: '/home' }").unwrap();
        let home = js.find("name: 'Home'").unwrap();
        let about = js.find("component: () => import('./views/AboutUs.vue')").unwrap();
        assert!(redirect < home && home < about);
    }

    #[test]
    fn escapes_title_in_index() {
        let engine = TemplateEngine::new();

        let html = engine.render_shell("index.html", &shell()).unwrap();

        assert!(html.contains("<title>Tom &amp; Jerry&#x27;s</title>"));
        assert!(html.contains("<div id=\"app\"></div>"));
    }

    #[test]
    fn registers_components_in_main() {
        let engine = TemplateEngine::new();

        let js = engine.render_shell("src/main.js", &shell()).unwrap();

        assert!(js.contains("import PriceTag from './components/PriceTag.vue';"));
        assert!(js.contains("app.component('PriceTag', PriceTag);"));
        assert!(js.contains("app.mount('#app');"));
    }

    #[test]
    fn app_shell_uses_theme() {
        let engine = TemplateEngine::new();

        let vue = engine.render_shell("src/App.vue", &shell()).unwrap();

        assert!(vue.contains("font-family: Inter, sans-serif;"));
        assert!(vue.contains("background-color: #fff;"));
        assert!(vue.contains("<router-view />"));
    }
}
