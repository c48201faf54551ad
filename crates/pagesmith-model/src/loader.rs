//! Snapshot loading from files and project directories.
//!
//! A snapshot is either a single JSON/YAML document shaped like
//! [`AppSnapshot`], or a project directory:
//!
//! ```text
//! my-app/
//! ├── app.json          # App record
//! ├── pages/*.json      # one Page per file
//! ├── components/*.json # one CustomComponent per file
//! └── functions/*.json  # one FunctionRecord per file
//! ```
//!
//! YAML (`.yaml`/`.yml`) is accepted anywhere JSON is.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use walkdir::WalkDir;

use crate::app::{App, AppSnapshot, CustomComponent, FunctionRecord, Page};

/// Errors that can occur when loading or validating model data.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {message}")]
    Json { path: String, message: String },

    #[error("Invalid YAML in {path}: {message}")]
    Yaml { path: String, message: String },

    #[error("No app.json, app.yaml or app.yml found in {0}")]
    MissingApp(String),

    #[error("Unsupported snapshot format: {0}")]
    UnsupportedFormat(String),

    #[error("Unknown component type '{kind}' on node '{id}'")]
    UnknownComponentType { id: String, kind: String },
}

/// Snapshot document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Format::Json),
            Some("yaml") | Some("yml") => Some(Format::Yaml),
            _ => None,
        }
    }
}

/// Parse a document of the given format.
pub fn parse_document<T: DeserializeOwned>(
    source: &str,
    format: Format,
    origin: &str,
) -> Result<T, ModelError> {
    match format {
        Format::Json => serde_json::from_str(source).map_err(|e| ModelError::Json {
            path: origin.to_string(),
            message: e.to_string(),
        }),
        Format::Yaml => serde_yaml::from_str(source).map_err(|e| ModelError::Yaml {
            path: origin.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Load a snapshot from a file or a project directory.
pub fn load_snapshot(path: &Path) -> Result<AppSnapshot, ModelError> {
    if path.is_dir() {
        load_project(path)
    } else {
        read_document(path)
    }
}

/// Files the snapshot at `path` is made of, for change detection.
pub fn snapshot_sources(path: &Path) -> Vec<PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }

    WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && Format::from_path(e.path()).is_some())
        .map(|e| e.into_path())
        .collect()
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let format = Format::from_path(path)
        .ok_or_else(|| ModelError::UnsupportedFormat(path.display().to_string()))?;

    let source = fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.display().to_string(),
        source,
    })?;

    parse_document(&source, format, &path.display().to_string())
}

fn load_project(dir: &Path) -> Result<AppSnapshot, ModelError> {
    let app_path = ["app.json", "app.yaml", "app.yml"]
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
        .ok_or_else(|| ModelError::MissingApp(dir.display().to_string()))?;

    let app: App = read_document(&app_path)?;

    let mut pages: Vec<Page> = read_all(&dir.join("pages"))?;
    // Unordered pages go last; stable sort keeps their file order
    pages.sort_by_key(|p| (p.order.is_none(), p.order));

    let components: Vec<CustomComponent> = read_all(&dir.join("components"))?;
    let functions: Vec<FunctionRecord> = read_all(&dir.join("functions"))?;

    Ok(AppSnapshot {
        app,
        pages,
        components,
        functions,
    })
}

fn read_all<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, ModelError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && Format::from_path(e.path()).is_some())
        .map(|e| read_document(e.path()))
        .collect()
}
