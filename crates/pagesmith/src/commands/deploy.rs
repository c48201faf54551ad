//! Deploy command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use pagesmith_export::AppAssembler;
use pagesmith_model::load_snapshot;
use pagesmith_server::{DeploymentManager, DeploymentStatus, DirectorySink};

use crate::config::ConfigFile;

/// Run the deploy command: start a deployment and wait for it to finish.
pub async fn run(config: &ConfigFile, project: Option<PathBuf>, root: Option<PathBuf>) -> Result<()> {
    let project = project.unwrap_or_else(|| config.project.dir.clone());
    let root = root.unwrap_or_else(|| config.deploy.root.clone());

    let snapshot = load_snapshot(&project)
        .with_context(|| format!("Failed to load snapshot from {}", project.display()))?;

    let assembler = Arc::new(AppAssembler::new(config.assemble_config()));
    let sink = Arc::new(DirectorySink::new(&root));
    let manager = DeploymentManager::new(assembler, sink.clone());

    let pending = manager.deploy(snapshot).await;
    let deployment = manager
        .wait(pending.id)
        .await
        .context("Lost track of deployment")?;

    match deployment.status {
        DeploymentStatus::Success => {
            if let Some(summary) = &deployment.summary {
                tracing::info!(
                    "Deployed {} pages, {} files in {}ms",
                    summary.pages,
                    summary.files,
                    deployment.duration_ms.unwrap_or_default()
                );
            }
            tracing::info!("Output: {}", sink.deployment_dir(&deployment).display());
            Ok(())
        }
        _ => anyhow::bail!(
            "Deployment {} failed: {}",
            deployment.id,
            deployment.error.as_deref().unwrap_or("unknown error")
        ),
    }
}
