//! Scaffold a sample project.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(yes: bool) -> Result<()> {
    tracing::info!("Initializing pagesmith project...");

    let created = scaffold(Path::new("."), yes)?;
    for path in &created {
        tracing::info!("Created {}", path.display());
    }

    if created.is_empty() {
        tracing::warn!("Project files already exist. Use --yes to overwrite.");
        return Ok(());
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'pagesmith export' to generate the Vue project.");

    Ok(())
}

/// Write the sample project under `root`, returning the files written.
/// Existing files are left alone unless `overwrite` is set.
pub fn scaffold(root: &Path, overwrite: bool) -> Result<Vec<PathBuf>> {
    let files = [
        ("pagesmith.toml", DEFAULT_CONFIG),
        ("app.json", DEFAULT_APP),
        ("pages/home.json", DEFAULT_HOME),
        ("pages/about.yaml", DEFAULT_ABOUT),
        ("components/Badge.json", DEFAULT_BADGE),
        ("functions/contact.json", DEFAULT_FUNCTION),
    ];

    let mut created = Vec::new();
    for (relative, content) in files {
        let path = root.join(relative);
        if path.exists() && !overwrite {
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", relative))?;
        created.push(PathBuf::from(relative));
    }

    Ok(created)
}

const DEFAULT_CONFIG: &str = r#"# Pagesmith Configuration

[project]
# Snapshot file or project directory
dir = "."

[export]
# Output directory for the generated Vue project
output = "dist"

# Minify the theme stylesheet
minify = true

# HTML-escape prop values in generated markup
escape_text = true

# Base URL the app is served from
base_url = "/"

[deploy]
# Deployments are written to {root}/{app}/{deployment-id}
root = "deployments"

[server]
host = "127.0.0.1"
port = 7878
"#;

const DEFAULT_APP: &str = r##"{
  "id": "my-app",
  "name": "My App",
  "subdomain": "my-app",
  "theme": {
    "fontFamily": "Inter, sans-serif",
    "backgroundColor": "#ffffff",
    "textColor": "#1f2937",
    "primaryColor": "#6366f1"
  }
}
"##;

const DEFAULT_HOME: &str = r##"{
  "name": "Home",
  "path": "/",
  "isHome": true,
  "order": 1,
  "content": {
    "seo": {
      "title": "Welcome",
      "description": "Built with pagesmith"
    },
    "components": [
      {
        "id": "hero",
        "type": "hero",
        "props": {
          "title": "Welcome to My App",
          "subtitle": "Exported as a Vue project",
          "buttonText": "Get started"
        }
      },
      {
        "id": "features",
        "type": "grid",
        "props": { "columns": 2 },
        "children": [
          {
            "id": "fast",
            "type": "card",
            "props": { "title": "Fast", "description": "Pages emitted in parallel." }
          },
          {
            "id": "simple",
            "type": "card",
            "props": { "title": "Simple", "description": "One view per page." }
          }
        ]
      }
    ]
  }
}
"##;

const DEFAULT_ABOUT: &str = r#"name: About
path: /about
order: 2
content:
  styles:
    padding: 2rem
  components:
    - id: title
      type: heading
      props:
        level: 1
        text: About us
    - id: intro
      type: text
      props:
        content: We build apps visually.
      styles:
        fontSize: 1.125rem
"#;

const DEFAULT_BADGE: &str = r#"{
  "name": "Badge",
  "template": "<span class=\"badge\">{{ label }}</span>",
  "props": { "label": "New" },
  "styles": { "padding": "0.25rem 0.5rem", "borderRadius": "9999px" }
}
"#;

const DEFAULT_FUNCTION: &str = r#"{
  "name": "contact",
  "trigger": "http",
  "code": "export default async (req) => new Response('ok')",
  "active": true
}
"#;
