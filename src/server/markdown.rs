use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use super::files::{require_items, SaveBatch};
use super::params::{self, Pairs};
use super::AppState;
use crate::error::AppResult;
use crate::filestore::{FrontmatterDeleteRequest, FrontmatterUpdateRequest};

#[derive(Debug, Deserialize)]
pub struct FrontmatterUpdateBatch {
    #[serde(default)]
    pub files: Vec<FrontmatterUpdateRequest>,
}

#[derive(Debug, Deserialize)]
pub struct FrontmatterDeleteBatch {
    #[serde(default)]
    pub files: Vec<FrontmatterDeleteRequest>,
}

pub async fn read_markdowns(State(state): State<AppState>, Query(pairs): Query<Pairs>) -> AppResult<Json<Value>> {
    let paths = params::file_paths(&pairs)?;
    let outcome = state.store.get_markdowns(&paths).await;
    Ok(params::batch(outcome, "markdowns", "files"))
}

pub async fn save_markdowns(State(state): State<AppState>, Json(body): Json<SaveBatch>) -> AppResult<Json<Value>> {
    require_items(&body.files)?;
    let outcome = state.store.save_markdowns(&body.files).await;
    Ok(params::batch(outcome, "results", "files"))
}

pub async fn update_frontmatters(
    State(state): State<AppState>,
    Json(body): Json<FrontmatterUpdateBatch>,
) -> AppResult<Json<Value>> {
    require_items(&body.files)?;
    let outcome = state.store.update_frontmatters(&body.files).await;
    Ok(params::batch(outcome, "results", "frontmatter updates"))
}

pub async fn delete_frontmatters(
    State(state): State<AppState>,
    Json(body): Json<FrontmatterDeleteBatch>,
) -> AppResult<Json<Value>> {
    require_items(&body.files)?;
    let outcome = state.store.delete_frontmatters(&body.files).await;
    Ok(params::batch(outcome, "results", "frontmatter deletions"))
}
