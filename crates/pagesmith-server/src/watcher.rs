//! Watching snapshot sources for re-export.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use pagesmith_model::Format;
use tokio::sync::mpsc as async_mpsc;

/// Changes to snapshot documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A document was created or modified
    Changed(PathBuf),

    /// A document was removed
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Changed(path) | WatchEvent::Removed(path) => path,
        }
    }
}

/// Watches a snapshot file or project directory.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Start watching `paths`. Directories are watched recursively.
    ///
    /// Returns the watcher and a channel of debounced events. Dropping the
    /// watcher closes the channel.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if !path.exists() {
                tracing::warn!("Not watching missing path {}", path.display());
                continue;
            }
            let mode = if path.is_dir() {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            // Events then carry absolute, canonical paths
            let path = path.canonicalize()?;
            watcher.watch(&path, mode).map_err(std::io::Error::other)?;
        }

        std::thread::spawn(move || {
            let debounce = Duration::from_millis(100);
            let mut last: Option<(PathBuf, Instant)> = None;

            while let Ok(event) = sync_rx.recv() {
                for path in event.paths {
                    let Some(watch_event) = classify_event(&path, &event.kind) else {
                        continue;
                    };

                    // Editors often emit several writes per save
                    let now = Instant::now();
                    if let Some((previous, at)) = &last {
                        if previous == &path && now.duration_since(*at) < debounce {
                            continue;
                        }
                    }
                    last = Some((path, now));

                    if async_tx.blocking_send(watch_event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Whether a path holds a snapshot document.
pub fn is_snapshot_document(path: &Path) -> bool {
    Format::from_path(path).is_some()
}

fn classify_event(path: &Path, kind: &EventKind) -> Option<WatchEvent> {
    if !is_snapshot_document(path) {
        return None;
    }

    match kind {
        EventKind::Create(_) | EventKind::Modify(_) => Some(WatchEvent::Changed(path.to_path_buf())),
        EventKind::Remove(_) => Some(WatchEvent::Removed(path.to_path_buf())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn only_snapshot_documents_are_reported() {
        let kind = EventKind::Create(notify::event::CreateKind::File);

        assert_eq!(
            classify_event(Path::new("pages/home.yaml"), &kind),
            Some(WatchEvent::Changed(PathBuf::from("pages/home.yaml")))
        );
        assert_eq!(classify_event(Path::new("notes.txt"), &kind), None);
        assert_eq!(classify_event(Path::new(".app.json.swp"), &kind), None);
    }

    #[test]
    fn removals_are_distinguished() {
        let kind = EventKind::Remove(notify::event::RemoveKind::File);

        let event = classify_event(Path::new("app.json"), &kind).unwrap();

        assert_eq!(event, WatchEvent::Removed(PathBuf::from("app.json")));
        assert_eq!(event.path(), Path::new("app.json"));
    }

    #[tokio::test]
    async fn watches_document_changes() {
        let temp = tempdir().unwrap();
        let app_file = temp.path().join("app.json");

        let (watcher, mut rx) = FileWatcher::new(&[temp.path().to_path_buf()]).unwrap();

        // Give inotify time to set up
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(&app_file, r#"{ "name": "Shop" }"#).unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;

        drop(watcher);

        assert!(event.is_ok(), "timeout waiting for file watch event");
        let event = event.unwrap().expect("channel should not be closed");
        assert!(event.path().is_absolute());
    }
}
