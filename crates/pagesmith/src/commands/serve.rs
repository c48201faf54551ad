//! API server command.

use anyhow::Result;
use pagesmith_server::{ApiServer, ServerConfig};

use crate::config::ConfigFile;

/// Run the export and deployment API.
pub async fn run(config: &ConfigFile, port: Option<u16>, open: bool) -> Result<()> {
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: port.unwrap_or(config.server.port),
        deploy_root: config.deploy.root.clone(),
        assemble: config.assemble_config(),
    };

    if open {
        let url = format!("http://{}:{}/health", server_config.host, server_config.port);
        let _ = open::that(&url);
    }

    ApiServer::new(server_config).start().await?;

    Ok(())
}
