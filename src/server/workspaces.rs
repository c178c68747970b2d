use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};

use super::params::{self, Pairs};
use super::AppState;
use crate::error::AppResult;
use crate::filestore::{list_workspaces, WorkspaceListing, WorkspaceQuery};

pub async fn list(State(state): State<AppState>, Query(pairs): Query<Pairs>) -> AppResult<Json<Value>> {
    let query = WorkspaceQuery {
        limit: params::number(&pairs, "limit")?,
        include_hidden: params::flag(&pairs, "include_hidden"),
        file_types: params::csv_list(&pairs, "file_types")?,
    };
    let root = state.store.root().path().to_path_buf();
    let cfg = state.store.config().clone();
    match tokio::task::spawn_blocking(move || list_workspaces(&root, &query, &cfg)).await {
        Ok(listing) => Ok(params::ok(listing)),
        Err(e) => {
            tracing::error!(target: "server", error = %e, "workspace scan failed");
            Ok(Json(json!({
                "success": false,
                "data": WorkspaceListing::default(),
                "message": format!("Failed to list workspaces: {}", e),
            })))
        }
    }
}
