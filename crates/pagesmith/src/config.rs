//! Configuration file (pagesmith.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pagesmith_emit::EmitOptions;
use pagesmith_export::AssembleConfig;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub project: ProjectSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub deploy: DeploySettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize)]
pub struct ProjectSettings {
    /// Snapshot file or project directory
    #[serde(default = "default_project_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_true")]
    pub minify: bool,
    #[serde(default = "default_true")]
    pub escape_text: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct DeploySettings {
    #[serde(default = "default_deploy_root")]
    pub root: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_project_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_output() -> PathBuf {
    PathBuf::from("dist")
}
fn default_true() -> bool {
    true
}
fn default_base_url() -> String {
    "/".to_string()
}
fn default_deploy_root() -> PathBuf {
    PathBuf::from("deployments")
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    7878
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            dir: default_project_dir(),
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output: default_output(),
            minify: true,
            escape_text: true,
            base_url: default_base_url(),
        }
    }
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            root: default_deploy_root(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ConfigFile {
    /// Load configuration from `path` if it exists.
    /// Returns an error if the config file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());

        Ok(config)
    }

    /// Assembly settings derived from the `[export]` section.
    pub fn assemble_config(&self) -> AssembleConfig {
        AssembleConfig {
            emit: EmitOptions {
                escape_text: self.export.escape_text,
                ..EmitOptions::default()
            },
            minify: self.export.minify,
            base_url: self.export.base_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();

        let config = ConfigFile::load(&temp.path().join("pagesmith.toml")).unwrap();

        assert_eq!(config.project.dir, PathBuf::from("."));
        assert_eq!(config.export.output, PathBuf::from("dist"));
        assert!(config.export.minify);
        assert!(config.export.escape_text);
        assert_eq!(config.deploy.root, PathBuf::from("deployments"));
        assert_eq!(config.server.port, 7878);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("pagesmith.toml");
        fs::write(
            &path,
            "[export]\nminify = false\nescape_text = false\n\n[server]\nport = 9000\n",
        )
        .unwrap();

        let config = ConfigFile::load(&path).unwrap();

        assert!(!config.export.minify);
        assert_eq!(config.export.output, PathBuf::from("dist"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");

        let assemble = config.assemble_config();
        assert!(!assemble.minify);
        assert!(!assemble.emit.escape_text);
        assert_eq!(assemble.emit.max_depth, EmitOptions::default().max_depth);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("pagesmith.toml");
        fs::write(&path, "[export\nminify = ").unwrap();

        assert!(ConfigFile::load(&path).is_err());
    }
}
