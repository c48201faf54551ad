//! Pagesmith CLI - export and deploy visually authored apps as Vue projects.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

use config::ConfigFile;

#[derive(Parser)]
#[command(name = "pagesmith")]
#[command(about = "Export and deploy visually authored apps as Vue projects")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to pagesmith.toml config file
    #[arg(short, long, default_value = "pagesmith.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a sample project in the current directory
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Export a snapshot as a Vue project
    Export {
        /// Snapshot file or project directory (defaults to config)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Output directory (defaults to config or "dist")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip minification
        #[arg(long)]
        no_minify: bool,

        /// Splice prop values into markup without escaping
        #[arg(long)]
        no_escape: bool,
    },

    /// Deploy a snapshot and wait for the result
    Deploy {
        /// Snapshot file or project directory (defaults to config)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Deployment root (defaults to config or "deployments")
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Run the export and deployment API
    Serve {
        /// Port to listen on (defaults to config or 7878)
        #[arg(short, long)]
        port: Option<u16>,

        /// Open the health endpoint in a browser
        #[arg(long)]
        open: bool,
    },

    /// Re-export whenever the project changes
    Dev {
        /// Snapshot file or project directory (defaults to config)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Output directory (defaults to config or "dist")
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let config = ConfigFile::load(&cli.config)?;

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(yes).await?;
        }
        Commands::Export {
            project,
            output,
            no_minify,
            no_escape,
        } => {
            let mut config = config;
            if no_minify {
                config.export.minify = false;
            }
            if no_escape {
                config.export.escape_text = false;
            }
            commands::export::run(&config, project, output).await?;
        }
        Commands::Deploy { project, root } => {
            commands::deploy::run(&config, project, root).await?;
        }
        Commands::Serve { port, open } => {
            commands::serve::run(&config, port, open).await?;
        }
        Commands::Dev { project, output } => {
            commands::dev::run(&config, project, output).await?;
        }
    }

    Ok(())
}
