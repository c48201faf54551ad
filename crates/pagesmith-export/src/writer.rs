//! Persisting a file map to disk.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::assembler::FileMap;

/// Errors that can occur when writing a file map.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Refusing to write outside the output directory: {0}")]
    UnsafePath(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve a virtual path under `root`, rejecting absolute paths and `..`.
pub fn resolve(root: &Path, virtual_path: &str) -> Result<PathBuf, WriteError> {
    let relative = Path::new(virtual_path);
    let safe = !virtual_path.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return Err(WriteError::UnsafePath(virtual_path.to_string()));
    }
    Ok(root.join(relative))
}

/// Write every file of `files` under `root`, creating directories as needed.
///
/// All paths are validated before anything is written. Returns the number of
/// files written.
pub fn write_file_map(root: &Path, files: &FileMap) -> Result<usize, WriteError> {
    let targets = files
        .iter()
        .map(|(path, content)| Ok((resolve(root, path)?, content)))
        .collect::<Result<Vec<_>, WriteError>>()?;

    for (target, content) in &targets {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| WriteError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        fs::write(target, content).map_err(|source| WriteError::Io {
            path: target.display().to_string(),
            source,
        })?;
    }

    tracing::debug!("Wrote {} files to {}", targets.len(), root.display());

    Ok(targets.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_nested_files() {
        let temp = tempdir().unwrap();
        let mut files = FileMap::new();
        files.insert("index.html".to_string(), "<html></html>".to_string());
        files.insert("src/views/Home.vue".to_string(), "<template/>".to_string());

        let count = write_file_map(temp.path(), &files).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            fs::read_to_string(temp.path().join("src/views/Home.vue")).unwrap(),
            "<template/>"
        );
    }

    #[test]
    fn rejects_traversal_before_writing_anything() {
        let temp = tempdir().unwrap();
        let mut files = FileMap::new();
        files.insert("a.txt".to_string(), "ok".to_string());
        files.insert("src/views/../../../evil.vue".to_string(), "x".to_string());

        let result = write_file_map(temp.path(), &files);

        assert!(matches!(result, Err(WriteError::UnsafePath(_))));
        assert!(!temp.path().join("a.txt").exists());
    }

    #[test]
    fn rejects_absolute_paths() {
        let temp = tempdir().unwrap();

        assert!(resolve(temp.path(), "/etc/passwd").is_err());
        assert!(resolve(temp.path(), "").is_err());
        assert!(resolve(temp.path(), "src/main.js").is_ok());
    }
}
