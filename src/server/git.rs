use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::{json, Value};

use super::params::{self, Pairs};
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::filestore::git::log::DEFAULT_PER_PAGE;
use crate::filestore::{validate_relative_path, GitError, LogQuery};

fn not_a_repository(data: Value) -> Json<Value> {
    Json(json!({ "success": false, "data": data, "message": GitError::NotARepository.to_string() }))
}

pub(crate) fn log_query(pairs: &Pairs) -> AppResult<LogQuery> {
    let text = |k: &str| params::first(pairs, k).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
    let query = LogQuery {
        page: params::number(pairs, "page")?.unwrap_or(1),
        per_page: params::number(pairs, "per_page")?.unwrap_or(DEFAULT_PER_PAGE),
        ref_name: text("ref_name"),
        since: text("since"),
        until: text("until"),
        path: text("path"),
        author: text("author"),
        search: text("search"),
    };
    query.validate()?;
    if let Some(path) = query.path.as_deref() {
        validate_relative_path(path)?;
    }
    Ok(query)
}

fn page_body(commits: Value, total: u64, q: &LogQuery) -> Value {
    let seen = u64::from(q.page) * u64::from(q.per_page);
    json!({
        "commits": commits,
        "total_count": total,
        "page": q.page,
        "per_page": q.per_page,
        "has_next_page": seen < total,
        "has_prev_page": q.page > 1,
    })
}

pub async fn commits(State(state): State<AppState>, Query(pairs): Query<Pairs>) -> AppResult<Json<Value>> {
    let q = log_query(&pairs)?;
    let git = state.store.git();
    if !git.is_repository().await {
        return Ok(not_a_repository(page_body(json!([]), 0, &q)));
    }
    let (commits, total) = git.log(&q).await?;
    Ok(params::ok(page_body(json!(commits), total, &q)))
}

pub async fn commit_stats(State(state): State<AppState>, Path(sha): Path<String>) -> AppResult<Json<Value>> {
    let git = state.store.git();
    if !git.is_repository().await {
        return Ok(not_a_repository(Value::Null));
    }
    let stats = git.commit_stats(&sha).await?;
    Ok(params::ok(json!({ "id": sha, "stats": stats })))
}

/// Full `git config --list` map, or a single value with `?key=`.
pub async fn config(State(state): State<AppState>, Query(pairs): Query<Pairs>) -> AppResult<Json<Value>> {
    let git = state.store.git();
    if !git.is_repository().await {
        return Ok(not_a_repository(json!({})));
    }
    match params::first(&pairs, "key").map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => {
            if key.starts_with('-') {
                return Err(AppError::user("invalid_config_key", format!("invalid config key '{}'", key)));
            }
            let value = git
                .config_value(key)
                .await?
                .ok_or_else(|| AppError::not_found("config_key_not_found", format!("Config key '{}' is not set", key)))?;
            Ok(params::ok(json!({ "key": key, "value": value })))
        }
        None => Ok(params::ok(git.config().await?)),
    }
}

pub async fn status(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let git = state.store.git();
    if !git.is_repository().await {
        return Ok(not_a_repository(json!({ "branch": null, "head": null, "entries": [] })));
    }
    let entries = git.status().await?;
    Ok(params::ok(json!({
        "branch": git.current_branch().await,
        "head": git.head_commit().await,
        "clean": entries.is_empty(),
        "entries": entries,
    })))
}

pub async fn branches(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let git = state.store.git();
    if !git.is_repository().await {
        return Ok(not_a_repository(json!({ "branches": [], "current": null })));
    }
    let branches = git.branches().await?;
    Ok(params::ok(json!({ "branches": branches, "current": git.current_branch().await })))
}
