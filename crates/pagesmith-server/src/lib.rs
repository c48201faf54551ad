//! Deployments and the HTTP API for pagesmith exports.
//!
//! Deployments run in the background and move from `building` to `success`
//! or `failed`. Status changes are broadcast to WebSocket subscribers.

pub mod deploy;
pub mod events;
pub mod http_error;
pub mod server;
pub mod watcher;

pub use deploy::{
    DeployError, Deployment, DeploymentManager, DeploymentSink, DeploymentStatus, DirectorySink,
    MemorySink,
};
pub use events::{DeploymentEvent, DeploymentHub};
pub use http_error::HttpError;
pub use server::{router, ApiServer, AppState, ServerConfig, ServerError};
pub use watcher::{is_snapshot_document, FileWatcher, WatchEvent};
