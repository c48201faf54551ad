//! HTTP API over export and deployments.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use uuid::Uuid;

use pagesmith_export::{AppAssembler, AssembleConfig, ExportedApp};
use pagesmith_model::AppSnapshot;

use crate::deploy::{Deployment, DeploymentManager, DirectorySink};
use crate::http_error::HttpError;

/// Configuration for the API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Directory deployments are written to and served from
    pub deploy_root: PathBuf,

    /// Assembly settings for exports and deployments
    pub assemble: AssembleConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            deploy_root: PathBuf::from("deployments"),
            assemble: AssembleConfig::default(),
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub assembler: Arc<AppAssembler>,
    pub deployments: DeploymentManager,
}

impl AppState {
    /// State whose deployments are written under `deploy_root`.
    pub fn new(config: &ServerConfig) -> Self {
        let assembler = Arc::new(AppAssembler::new(config.assemble.clone()));
        let sink = Arc::new(DirectorySink::new(&config.deploy_root));
        Self {
            deployments: DeploymentManager::new(Arc::clone(&assembler), sink),
            assembler,
        }
    }
}

/// The API server.
pub struct ApiServer {
    config: ServerConfig,
}

impl ApiServer {
    /// Create a new API server.
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Bind and serve until the process is stopped.
    pub async fn start(self) -> Result<(), ServerError> {
        let raw = format!("{}:{}", self.config.host, self.config.port);
        let addr: SocketAddr = raw
            .parse()
            .map_err(|_| ServerError::InvalidAddress(raw.clone()))?;

        let state = AppState::new(&self.config);
        let app = router(state, Some(&self.config.deploy_root));

        tracing::info!("Serving pagesmith API at http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}

/// Build the API router. Deployed sites are served under `/sites` when a
/// deploy root is given.
pub fn router(state: AppState, deploy_root: Option<&PathBuf>) -> Router {
    let api = Router::new()
        .route("/health", get(health_handler))
        .route("/api/export", post(export_handler))
        .route(
            "/api/deployments",
            get(list_deployments_handler).post(create_deployment_handler),
        )
        .route("/api/deployments/events", get(events_handler))
        .route("/api/deployments/{id}", get(get_deployment_handler))
        .route("/api/deployments/{id}/rollback", post(rollback_handler))
        .with_state(state);

    let api = match deploy_root {
        Some(root) => api.nest_service("/sites", ServeDir::new(root)),
        None => api,
    };

    api.layer(CorsLayer::permissive())
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Assemble a snapshot and return its file map.
async fn export_handler(
    State(state): State<AppState>,
    payload: Result<Json<AppSnapshot>, JsonRejection>,
) -> Result<Json<ExportedApp>, HttpError> {
    let Json(snapshot) = payload?;
    let assembler = Arc::clone(&state.assembler);
    let exported = tokio::task::spawn_blocking(move || assembler.assemble(&snapshot))
        .await
        .map_err(|e| HttpError::new(e.to_string(), "INTERNAL_ERROR"))??;

    Ok(Json(exported))
}

async fn create_deployment_handler(
    State(state): State<AppState>,
    payload: Result<Json<AppSnapshot>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(snapshot) = payload?;
    let deployment = state.deployments.deploy(snapshot).await;
    Ok((StatusCode::ACCEPTED, Json(deployment)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    app_id: Option<String>,
}

async fn list_deployments_handler(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Deployment>>, HttpError> {
    let Query(query) = query?;
    Ok(Json(state.deployments.list(query.app_id.as_deref()).await))
}

async fn get_deployment_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Deployment>, HttpError> {
    let Path(id) = id?;
    state
        .deployments
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| HttpError::new(format!("Deployment not found: {}", id), "NOT_FOUND"))
}

async fn rollback_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Path(id) = id?;
    let deployment = state.deployments.rollback(id).await?;
    Ok((StatusCode::ACCEPTED, Json(deployment)))
}

/// Stream deployment events over a WebSocket.
async fn events_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: AppState) {
    let mut rx = state.deployments.events().subscribe();

    while let Ok(event) = rx.recv().await {
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize deployment event: {}", e);
                continue;
            }
        };
        if socket.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}
