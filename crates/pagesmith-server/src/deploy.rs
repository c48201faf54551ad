//! Deployments as background tasks.
//!
//! A deployment starts in `building`, assembles the app on the blocking pool,
//! hands the file map to a [`DeploymentSink`], and ends in `success` or
//! `failed`. Terminal states are final: there is no retry, and any further
//! transition is rejected.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use uuid::Uuid;

use pagesmith_emit::slugify;
use pagesmith_export::{write_file_map, AppAssembler, ExportSummary, ExportedApp, FileMap};
use pagesmith_model::AppSnapshot;

use crate::events::{DeploymentEvent, DeploymentHub};

/// Lifecycle state of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Building,
    Success,
    Failed,
}

impl DeploymentStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, DeploymentStatus::Success | DeploymentStatus::Failed)
    }

    /// Validate a transition, returning the new state.
    pub fn transition(self, next: DeploymentStatus) -> Result<DeploymentStatus, DeployError> {
        match (self, next) {
            (DeploymentStatus::Building, DeploymentStatus::Success)
            | (DeploymentStatus::Building, DeploymentStatus::Failed) => Ok(next),
            (from, to) => Err(DeployError::InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeploymentStatus::Building => "building",
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A record of one deployment attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: Uuid,
    pub app_id: String,
    pub status: DeploymentStatus,

    /// Export summary, set on success
    pub summary: Option<ExportSummary>,

    /// Failure message, set on failure
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,

    /// Measured wall time from start to terminal state
    pub duration_ms: Option<u64>,

    /// The deployment whose files this one re-published
    pub rollback_of: Option<Uuid>,

    /// Deployed files, kept for rollbacks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<FileMap>,
}

impl Deployment {
    fn building(app_id: String, rollback_of: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            app_id,
            status: DeploymentStatus::Building,
            summary: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
            duration_ms: None,
            rollback_of,
            files: None,
        }
    }

    /// A copy without the file set, for listings.
    pub fn without_files(&self) -> Self {
        Self {
            files: None,
            ..self.clone()
        }
    }
}

/// Errors that can occur when managing deployments.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("Deployment not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid deployment transition from {from} to {to}")]
    InvalidTransition {
        from: DeploymentStatus,
        to: DeploymentStatus,
    },

    #[error("Deployment {0} has no successful file set to roll back to")]
    NothingToRollback(Uuid),

    #[error("Deployment event stream closed")]
    Closed,
}

/// Destination for the files of a successful build.
pub trait DeploymentSink: Send + Sync + 'static {
    /// Publish a file set. Called on the blocking pool.
    fn publish(&self, deployment: &Deployment, files: &FileMap) -> Result<(), String>;
}

/// Writes each deployment to `{root}/{app-slug}/{deployment-id}/`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory a deployment is written to.
    pub fn deployment_dir(&self, deployment: &Deployment) -> PathBuf {
        self.root
            .join(slugify(&deployment.app_id))
            .join(deployment.id.to_string())
    }
}

impl DeploymentSink for DirectorySink {
    fn publish(&self, deployment: &Deployment, files: &FileMap) -> Result<(), String> {
        let dir = self.deployment_dir(deployment);
        let count = write_file_map(&dir, files).map_err(|e| e.to_string())?;
        tracing::info!("Published {} files to {}", count, dir.display());
        Ok(())
    }
}

/// Keeps published file sets in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    published: Mutex<HashMap<Uuid, FileMap>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files published for a deployment.
    pub fn files(&self, id: Uuid) -> Option<FileMap> {
        self.published
            .lock()
            .ok()
            .and_then(|published| published.get(&id).cloned())
    }
}

impl DeploymentSink for MemorySink {
    fn publish(&self, deployment: &Deployment, files: &FileMap) -> Result<(), String> {
        let mut published = self
            .published
            .lock()
            .map_err(|_| "memory sink poisoned".to_string())?;
        published.insert(deployment.id, files.clone());
        Ok(())
    }
}

/// Creates deployments and drives them to a terminal state.
#[derive(Clone)]
pub struct DeploymentManager {
    assembler: Arc<AppAssembler>,
    sink: Arc<dyn DeploymentSink>,
    records: Arc<RwLock<HashMap<Uuid, Deployment>>>,
    events: DeploymentHub,
    retained_file_sets: usize,
}

/// Successful file sets kept per app for rollbacks.
pub const DEFAULT_RETAINED_FILE_SETS: usize = 5;

impl DeploymentManager {
    /// Create a manager publishing through `sink`.
    pub fn new(assembler: Arc<AppAssembler>, sink: Arc<dyn DeploymentSink>) -> Self {
        Self {
            assembler,
            sink,
            records: Arc::new(RwLock::new(HashMap::new())),
            events: DeploymentHub::new(),
            retained_file_sets: DEFAULT_RETAINED_FILE_SETS,
        }
    }

    /// Keep the file sets of only the latest `count` successful deployments
    /// of each app. Older records stay listed but can no longer be rolled
    /// back to.
    pub fn with_retained_file_sets(mut self, count: usize) -> Self {
        self.retained_file_sets = count.max(1);
        self
    }

    /// The event hub deployments report to.
    pub fn events(&self) -> &DeploymentHub {
        &self.events
    }

    /// Start a deployment of `snapshot`.
    ///
    /// Returns the `building` record immediately; the build runs in the
    /// background.
    pub async fn deploy(&self, snapshot: AppSnapshot) -> Deployment {
        let record = self.start(snapshot.app.key().to_string(), None).await;

        let manager = self.clone();
        let pending = record.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let assembler = Arc::clone(&manager.assembler);
            let sink = Arc::clone(&manager.sink);
            let id = pending.id;

            let outcome = tokio::task::spawn_blocking(move || -> Result<ExportedApp, String> {
                let exported = assembler.assemble(&snapshot).map_err(|e| e.to_string())?;
                sink.publish(&pending, &exported.files)?;
                Ok(exported)
            })
            .await
            .unwrap_or_else(|e| Err(format!("build task failed: {}", e)));

            manager.finish(id, outcome, started.elapsed()).await;
        });

        record
    }

    /// Re-publish the files of a successful deployment as a new deployment.
    pub async fn rollback(&self, target: Uuid) -> Result<Deployment, DeployError> {
        let source = self.get(target).await.ok_or(DeployError::NotFound(target))?;
        let files = match (&source.status, &source.files) {
            (DeploymentStatus::Success, Some(files)) => files.clone(),
            _ => return Err(DeployError::NothingToRollback(target)),
        };
        let summary = source.summary.clone().unwrap_or_default();

        let record = self.start(source.app_id.clone(), Some(target)).await;
        tracing::info!(
            "Rolling back app '{}' to deployment {} as {}",
            record.app_id,
            target,
            record.id
        );

        let manager = self.clone();
        let pending = record.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let sink = Arc::clone(&manager.sink);
            let id = pending.id;

            let outcome = tokio::task::spawn_blocking(move || -> Result<ExportedApp, String> {
                sink.publish(&pending, &files)?;
                Ok(ExportedApp { files, summary })
            })
            .await
            .unwrap_or_else(|e| Err(format!("rollback task failed: {}", e)));

            manager.finish(id, outcome, started.elapsed()).await;
        });

        Ok(record)
    }

    /// Look up a deployment.
    pub async fn get(&self, id: Uuid) -> Option<Deployment> {
        self.records.read().await.get(&id).cloned()
    }

    /// List deployments, newest first, without their file sets.
    pub async fn list(&self, app_id: Option<&str>) -> Vec<Deployment> {
        let records = self.records.read().await;
        let mut deployments: Vec<Deployment> = records
            .values()
            .filter(|d| app_id.map_or(true, |app| d.app_id == app))
            .map(Deployment::without_files)
            .collect();
        deployments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        deployments
    }

    /// Wait until a deployment reaches a terminal state.
    pub async fn wait(&self, id: Uuid) -> Result<Deployment, DeployError> {
        // Subscribe before checking so no transition slips between the two
        let mut rx = self.events.subscribe();
        loop {
            let current = self.get(id).await.ok_or(DeployError::NotFound(id))?;
            if current.status.is_terminal() {
                return Ok(current);
            }
            match rx.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return Err(DeployError::Closed),
            }
        }
    }

    async fn start(&self, app_id: String, rollback_of: Option<Uuid>) -> Deployment {
        let record = Deployment::building(app_id, rollback_of);
        self.records
            .write()
            .await
            .insert(record.id, record.clone());

        tracing::info!("Deployment {} of '{}' is building", record.id, record.app_id);
        self.events.send(DeploymentEvent::Started {
            id: record.id,
            app_id: record.app_id.clone(),
            rollback_of,
        });

        record
    }

    /// Move a building deployment to its terminal state.
    async fn finish(&self, id: Uuid, outcome: Result<ExportedApp, String>, elapsed: Duration) {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(&id) else {
            tracing::warn!("Finished deployment {} is no longer tracked", id);
            return;
        };

        let next = if outcome.is_ok() {
            DeploymentStatus::Success
        } else {
            DeploymentStatus::Failed
        };
        match record.status.transition(next) {
            Ok(status) => record.status = status,
            Err(e) => {
                tracing::warn!("Ignoring completion of deployment {}: {}", id, e);
                return;
            }
        }

        match outcome {
            Ok(exported) => {
                record.summary = Some(exported.summary);
                record.files = Some(exported.files);
                tracing::info!("Deployment {} succeeded", id);
            }
            Err(message) => {
                tracing::warn!("Deployment {} failed: {}", id, message);
                record.error = Some(message);
            }
        }
        record.completed_at = Some(Utc::now());
        record.duration_ms = Some(elapsed.as_millis() as u64);

        let event = DeploymentEvent::Finished {
            id,
            app_id: record.app_id.clone(),
            status: record.status,
            error: record.error.clone(),
        };
        if record.status == DeploymentStatus::Success {
            let app_id = record.app_id.clone();
            prune_file_sets(&mut records, &app_id, self.retained_file_sets);
        }
        drop(records);

        self.events.send(event);
    }
}

/// Drop file sets beyond the newest `keep` successful deployments of an app.
fn prune_file_sets(records: &mut HashMap<Uuid, Deployment>, app_id: &str, keep: usize) {
    let mut holders: Vec<(Option<DateTime<Utc>>, DateTime<Utc>, Uuid)> = records
        .values()
        .filter(|d| d.app_id == app_id && d.files.is_some())
        .map(|d| (d.completed_at, d.created_at, d.id))
        .collect();
    holders.sort_by(|a, b| b.cmp(a));

    for (_, _, id) in holders.into_iter().skip(keep) {
        if let Some(record) = records.get_mut(&id) {
            tracing::debug!("Releasing file set of deployment {}", id);
            record.files = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagesmith_model::{App, ComponentNode, Page};
    use tempfile::tempdir;

    struct FailingSink;

    impl DeploymentSink for FailingSink {
        fn publish(&self, _deployment: &Deployment, _files: &FileMap) -> Result<(), String> {
            Err("disk full".to_string())
        }
    }

    fn snapshot(name: &str) -> AppSnapshot {
        let mut app = App::new(name);
        app.id = Some(format!("{}-id", name.to_lowercase()));
        let mut home = Page::new("Home", "/");
        home.is_home = true;
        home.content.components = vec![ComponentNode::new("h", "heading").with_prop("text", "Hi")];
        let mut snapshot = AppSnapshot::new(app);
        snapshot.pages = vec![home];
        snapshot
    }

    fn manager_with(sink: Arc<dyn DeploymentSink>) -> DeploymentManager {
        DeploymentManager::new(Arc::new(AppAssembler::default()), sink)
    }

    #[test]
    fn only_building_can_transition() {
        use DeploymentStatus::*;

        assert_eq!(Building.transition(Success).unwrap(), Success);
        assert_eq!(Building.transition(Failed).unwrap(), Failed);
        assert!(Success.transition(Failed).is_err());
        assert!(Failed.transition(Success).is_err());
        assert!(Building.transition(Building).is_err());
        assert!(!Building.is_terminal());
    }

    #[tokio::test]
    async fn successful_deployment_publishes_files() {
        let sink = Arc::new(MemorySink::new());
        let manager = manager_with(sink.clone());

        let started = manager.deploy(snapshot("Shop")).await;
        assert_eq!(started.status, DeploymentStatus::Building);
        assert_eq!(started.app_id, "shop-id");

        let done = manager.wait(started.id).await.unwrap();

        assert_eq!(done.status, DeploymentStatus::Success);
        assert_eq!(done.summary.as_ref().unwrap().pages, 1);
        assert!(done.completed_at.is_some());
        assert!(done.duration_ms.is_some());
        let published = sink.files(started.id).unwrap();
        assert!(published.contains_key("src/views/Home.vue"));
        assert_eq!(done.files.unwrap(), published);
    }

    #[tokio::test]
    async fn structural_error_fails_deployment() {
        let manager = manager_with(Arc::new(MemorySink::new()));
        let mut snap = snapshot("Shop");
        snap.pages.push(Page::new("   ", "/blank"));

        let started = manager.deploy(snap).await;
        let done = manager.wait(started.id).await.unwrap();

        assert_eq!(done.status, DeploymentStatus::Failed);
        assert!(done.error.unwrap().contains("Structural"));
        assert!(done.files.is_none());
    }

    #[tokio::test]
    async fn sink_failure_is_terminal() {
        let manager = manager_with(Arc::new(FailingSink));

        let started = manager.deploy(snapshot("Shop")).await;
        let done = manager.wait(started.id).await.unwrap();

        assert_eq!(done.status, DeploymentStatus::Failed);
        assert_eq!(done.error.as_deref(), Some("disk full"));
    }

    #[tokio::test]
    async fn rollback_republishes_previous_files() {
        let sink = Arc::new(MemorySink::new());
        let manager = manager_with(sink.clone());

        let first = manager.deploy(snapshot("Shop")).await;
        let first = manager.wait(first.id).await.unwrap();

        let rollback = manager.rollback(first.id).await.unwrap();
        assert_eq!(rollback.rollback_of, Some(first.id));
        assert_ne!(rollback.id, first.id);

        let done = manager.wait(rollback.id).await.unwrap();
        assert_eq!(done.status, DeploymentStatus::Success);
        assert_eq!(sink.files(rollback.id), first.files);
        assert_eq!(done.summary, first.summary);
    }

    #[tokio::test]
    async fn cannot_roll_back_to_failed_or_unknown_deployment() {
        let manager = manager_with(Arc::new(FailingSink));

        let failed = manager.deploy(snapshot("Shop")).await;
        manager.wait(failed.id).await.unwrap();

        assert!(matches!(
            manager.rollback(failed.id).await,
            Err(DeployError::NothingToRollback(_))
        ));
        assert!(matches!(
            manager.rollback(Uuid::new_v4()).await,
            Err(DeployError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn lists_by_app_without_files() {
        let manager = manager_with(Arc::new(MemorySink::new()));

        let a = manager.deploy(snapshot("Shop")).await;
        let b = manager.deploy(snapshot("Blog")).await;
        manager.wait(a.id).await.unwrap();
        manager.wait(b.id).await.unwrap();

        let shop = manager.list(Some("shop-id")).await;
        assert_eq!(shop.len(), 1);
        assert_eq!(shop[0].id, a.id);
        assert!(shop[0].files.is_none());
        assert_eq!(manager.list(None).await.len(), 2);
    }

    #[tokio::test]
    async fn publishes_start_and_finish_events() {
        let manager = manager_with(Arc::new(MemorySink::new()));
        let mut rx = manager.events().subscribe();

        let started = manager.deploy(snapshot("Shop")).await;
        manager.wait(started.id).await.unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(first, DeploymentEvent::Started { id, .. } if id == started.id));
        assert!(matches!(
            second,
            DeploymentEvent::Finished { status: DeploymentStatus::Success, .. }
        ));
    }

    #[tokio::test]
    async fn directory_sink_writes_per_deployment() {
        let temp = tempdir().unwrap();
        let sink = Arc::new(DirectorySink::new(temp.path()));
        let manager = manager_with(sink.clone());

        let started = manager.deploy(snapshot("Shop")).await;
        let done = manager.wait(started.id).await.unwrap();

        let dir = sink.deployment_dir(&done);
        assert!(dir.starts_with(temp.path().join("shop-id")));
        assert!(dir.join("index.html").exists());
        assert!(dir.join("src/views/Home.vue").exists());
    }

    #[tokio::test]
    async fn keeps_only_latest_file_sets_per_app() {
        let manager = manager_with(Arc::new(MemorySink::new())).with_retained_file_sets(2);

        let mut ids = Vec::new();
        for _ in 0..3 {
            let pending = manager.deploy(snapshot("Shop")).await;
            manager.wait(pending.id).await.unwrap();
            ids.push(pending.id);
        }
        let other = manager.deploy(snapshot("Blog")).await;
        manager.wait(other.id).await.unwrap();

        assert!(manager.get(ids[0]).await.unwrap().files.is_none());
        assert!(manager.get(ids[1]).await.unwrap().files.is_some());
        assert!(manager.get(ids[2]).await.unwrap().files.is_some());
        assert!(manager.get(other.id).await.unwrap().files.is_some());

        assert!(matches!(
            manager.rollback(ids[0]).await,
            Err(DeployError::NothingToRollback(_))
        ));
        assert_eq!(manager.list(Some("shop-id")).await.len(), 3);
    }
}
