use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use super::params::{self, Pairs};
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::filestore::{CommitOptions, Encoding, SaveRequest};

#[derive(Debug, Deserialize)]
pub struct SaveBatch {
    #[serde(default)]
    pub files: Vec<SaveRequest>,
}

pub(crate) fn commit_options(pairs: &Pairs) -> CommitOptions {
    let get = |k: &str| params::first(pairs, k).map(str::to_string);
    CommitOptions {
        commit_message: get("commit_message"),
        author_name: get("author_name"),
        author_email: get("author_email"),
    }
}

pub(crate) fn require_items<T>(items: &[T]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::user("missing_files", "Please provide at least one file"));
    }
    Ok(())
}

pub async fn read_files(State(state): State<AppState>, Query(pairs): Query<Pairs>) -> AppResult<Json<Value>> {
    let paths = params::file_paths(&pairs)?;
    let encoding = Encoding::parse_opt(params::first(&pairs, "encoding"))?;
    let metadata_only = params::flag(&pairs, "metadata_only");
    let outcome = state.store.read_many(&paths, encoding, metadata_only).await;
    Ok(params::batch(outcome, "files", "files"))
}

pub async fn read_blobs(State(state): State<AppState>, Query(pairs): Query<Pairs>) -> AppResult<Json<Value>> {
    let paths = params::file_paths(&pairs)?;
    let outcome = state.store.read_many(&paths, None, true).await;
    Ok(params::batch(outcome, "blobs", "files"))
}

pub async fn save_files(State(state): State<AppState>, Json(body): Json<SaveBatch>) -> AppResult<Json<Value>> {
    require_items(&body.files)?;
    let outcome = state.store.save_many(&body.files).await;
    Ok(params::batch(outcome, "results", "files"))
}

pub async fn delete_files(State(state): State<AppState>, Query(pairs): Query<Pairs>) -> AppResult<Json<Value>> {
    let paths = params::file_paths(&pairs)?;
    let opts = commit_options(&pairs);
    let outcome = state.store.delete_many(&paths, &opts).await;
    Ok(params::batch(outcome, "results", "files"))
}
