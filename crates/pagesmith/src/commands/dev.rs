//! Watch-and-export command.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use pagesmith_export::AppAssembler;
use pagesmith_model::snapshot_sources;
use pagesmith_server::FileWatcher;

use super::export::export_project;
use crate::config::ConfigFile;

/// Export once, then re-export on every change to the project.
pub async fn run(config: &ConfigFile, project: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let project = project.unwrap_or_else(|| config.project.dir.clone());
    let output = output.unwrap_or_else(|| config.export.output.clone());
    let assembler = Arc::new(AppAssembler::new(config.assemble_config()));

    // The output directory may sit inside the project
    let output_abs = resolve_output(&output)?;

    rebuild(&assembler, &project, &output).await;

    let (_watcher, mut rx) =
        FileWatcher::new(&[project.clone()]).context("Failed to watch project")?;
    tracing::info!(
        "Watching {} ({} documents) for changes",
        project.display(),
        snapshot_sources(&project).len()
    );

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                if is_output_event(event.path(), &output_abs) {
                    continue;
                }
                tracing::info!("Changed: {}", event.path().display());
                rebuild(&assembler, &project, &output).await;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping");
                break;
            }
        }
    }

    Ok(())
}

/// Canonical output directory, created first so this works before any
/// export has succeeded. Watch events carry canonical paths.
fn resolve_output(output: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    output
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", output.display()))
}

/// Whether a change comes from our own export output.
fn is_output_event(path: &Path, output: &Path) -> bool {
    path.starts_with(output)
}

/// Export failures are logged; the watch loop keeps running.
async fn rebuild(assembler: &Arc<AppAssembler>, project: &Path, output: &Path) {
    let assembler = Arc::clone(assembler);
    let project = project.to_path_buf();
    let output = output.to_path_buf();

    let result = tokio::task::spawn_blocking(move || export_project(&assembler, &project, &output)).await;

    match result {
        Ok(Ok(summary)) => tracing::info!(
            "Exported {} pages, {} files",
            summary.pages,
            summary.files
        ),
        Ok(Err(e)) => tracing::warn!("Export failed: {:#}", e),
        Err(e) => tracing::warn!("Export task failed: {}", e),
    }
}
