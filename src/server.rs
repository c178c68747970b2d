//! HTTP surface: axum router under `/api` over a shared [`FileStore`].

use std::sync::Arc;

use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::filestore::{FileStore, StorageRoot};

pub mod params;
pub mod files;
pub mod markdown;
pub mod git;
pub mod workspaces;
pub mod search;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FileStore>,
}

impl AppState {
    pub fn new(store: FileStore) -> Self {
        Self { store: Arc::new(store) }
    }
}

async fn welcome() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": "Hello World from TurboMe",
        "message": "Welcome to the TurboMe API",
    }))
}

async fn health() -> Json<Value> {
    params::ok(json!({ "status": "ok", "timestamp": chrono::Utc::now().to_rfc3339() }))
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        .route("/files", get(files::read_files).put(files::save_files).delete(files::delete_files))
        .route("/search", get(search::search_files))
        .route("/v1/files/blob", get(files::read_blobs))
        .route("/v1/files/markdown", get(markdown::read_markdowns).put(markdown::save_markdowns))
        .route(
            "/v1/files/markdown/frontmatter",
            put(markdown::update_frontmatters).delete(markdown::delete_frontmatters),
        )
        .route("/v1/git/commits", get(git::commits))
        .route("/v1/git/commits/{sha}/stats", get(git::commit_stats))
        .route("/v1/git/config", get(git::config))
        .route("/v1/git/status", get(git::status))
        .route("/v1/git/branches", get(git::branches))
        .route("/v1/workspaces", get(workspaces::list));
    Router::new().nest("/api", api).with_state(state)
}

/// Serve on an already bound listener until the task is dropped or the server fails.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub async fn build_state(cfg: &ServerConfig) -> anyhow::Result<AppState> {
    let root = StorageRoot::new(&cfg.storage_dir)?;
    let store = FileStore::new(root, cfg.filestore.clone());
    if cfg.init_git {
        store.git().init_if_absent().await?;
    }
    Ok(AppState::new(store))
}

pub async fn run_with_config(cfg: ServerConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let root = state.store.root().path().display().to_string();
    let is_repo = state.store.git().is_repository().await;
    info!(target: "startup", mode = cfg.mode.as_str(), storage_dir = %root, git = is_repo, "storage root ready");
    if !is_repo {
        info!(target: "startup", "storage root is not a git repository; writes will not be committed");
    }

    let listener = TcpListener::bind(cfg.addr).await?;
    info!(target: "startup", "HTTP listening on http://{}/api", listener.local_addr()?);
    serve(listener, state).await
}
