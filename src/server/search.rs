use axum::extract::{Query, State};
use axum::Json;
use serde_json::Value;

use super::params::{self, Pairs};
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::filestore::{search, SearchQuery, SearchType};

pub(crate) fn search_query(pairs: &Pairs) -> AppResult<SearchQuery> {
    Ok(SearchQuery {
        q: params::first(pairs, "q").unwrap_or_default().to_string(),
        search_type: SearchType::parse(params::first(pairs, "type"))?,
        limit: params::number(pairs, "limit")?,
        include_hidden: params::flag(pairs, "include_hidden"),
        file_types: params::csv_list(pairs, "file_types")?,
    })
}

pub async fn search_files(State(state): State<AppState>, Query(pairs): Query<Pairs>) -> AppResult<Json<Value>> {
    let query = search_query(&pairs)?;
    let cfg = state.store.config().clone();
    query.validate(&cfg)?;
    let root = state.store.root().path().to_path_buf();
    let outcome = tokio::task::spawn_blocking(move || search(&root, &query, &cfg))
        .await
        .map_err(|e| AppError::internal("search_failed", e.to_string()))??;
    Ok(params::ok(outcome))
}
