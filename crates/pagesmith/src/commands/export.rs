//! Export command.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use pagesmith_export::{AppAssembler, ExportSummary};
use pagesmith_model::load_snapshot;

use crate::config::ConfigFile;

/// Run the export command.
pub async fn run(config: &ConfigFile, project: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let project = project.unwrap_or_else(|| config.project.dir.clone());
    let output = output.unwrap_or_else(|| config.export.output.clone());
    let assembler = AppAssembler::new(config.assemble_config());

    tracing::info!("Exporting {}...", project.display());
    let start = Instant::now();

    let summary = tokio::task::spawn_blocking(move || export_project(&assembler, &project, &output))
        .await
        .context("Export task failed")??;

    tracing::info!(
        "Exported {} pages, {} components, {} files ({} bytes) in {}ms",
        summary.pages,
        summary.components,
        summary.files,
        summary.size_bytes,
        start.elapsed().as_millis()
    );

    Ok(())
}

/// Load, assemble and write a project in one pass.
pub fn export_project(
    assembler: &AppAssembler,
    project: &Path,
    output: &Path,
) -> Result<ExportSummary> {
    let snapshot = load_snapshot(project)
        .with_context(|| format!("Failed to load snapshot from {}", project.display()))?;

    let exported = assembler
        .assemble(&snapshot)
        .with_context(|| format!("Failed to assemble '{}'", snapshot.app.name))?;

    pagesmith_export::write_file_map(output, &exported.files)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!("Output: {}", output.display());

    Ok(exported.summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn exports_project_directory() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("shop");
        fs::create_dir_all(project.join("pages")).unwrap();
        fs::write(project.join("app.json"), r#"{ "name": "Shop" }"#).unwrap();
        fs::write(
            project.join("pages/home.yaml"),
            "name: Home\nisHome: true\ncontent:\n  components:\n    - id: t\n      type: text\n      props:\n        content: Welcome\n",
        )
        .unwrap();
        let output = temp.path().join("dist");

        let summary = export_project(&AppAssembler::default(), &project, &output).unwrap();

        assert_eq!(summary.pages, 1);
        let view = fs::read_to_string(output.join("src/views/Home.vue")).unwrap();
        assert!(view.contains("<p>Welcome</p>"));
        assert!(output.join("package.json").is_file());
    }

    #[test]
    fn missing_project_is_an_error() {
        let temp = tempdir().unwrap();

        let result = export_project(
            &AppAssembler::default(),
            &temp.path().join("nope.json"),
            &temp.path().join("dist"),
        );

        assert!(result.is_err());
        assert!(!temp.path().join("dist").exists());
    }
}
