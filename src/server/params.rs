//! Query-string helpers and the shared `{success, data, message}` envelope.

use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::filestore::BatchOutcome;

/// Raw query pairs; repeated keys are kept in order.
pub type Pairs = Vec<(String, String)>;

pub fn first<'a>(pairs: &'a Pairs, key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn all<'a>(pairs: &'a Pairs, key: &str) -> impl Iterator<Item = &'a str> + 'a {
    let bracketed = format!("{}[]", key);
    let key = key.to_string();
    pairs
        .iter()
        .filter(move |(k, _)| *k == key || *k == bracketed)
        .map(|(_, v)| v.as_str())
}

/// A list parameter given as a JSON array string, a plain value, or repeated keys.
pub fn list(pairs: &Pairs, key: &str) -> AppResult<Vec<String>> {
    let mut out = Vec::new();
    for raw in all(pairs, key) {
        let trimmed = raw.trim();
        if trimmed.starts_with('[') {
            let parsed: Vec<String> = serde_json::from_str(trimmed).map_err(|e| {
                AppError::user("invalid_parameter", format!("{} must be a JSON array of strings: {}", key, e))
            })?;
            out.extend(parsed);
        } else if !trimmed.is_empty() {
            out.push(raw.to_string());
        }
    }
    Ok(out)
}

/// Like [`list`], additionally splitting plain values on commas (`file_types=md,txt`).
pub fn csv_list(pairs: &Pairs, key: &str) -> AppResult<Vec<String>> {
    Ok(list(pairs, key)?
        .into_iter()
        .flat_map(|v| v.split(',').map(|s| s.trim().to_string()).collect::<Vec<_>>())
        .filter(|s| !s.is_empty())
        .collect())
}

pub fn file_paths(pairs: &Pairs) -> AppResult<Vec<String>> {
    let paths = list(pairs, "file_paths")?;
    if paths.is_empty() {
        return Err(AppError::user("missing_file_paths", "Please provide at least one file path"));
    }
    Ok(paths)
}

pub fn flag(pairs: &Pairs, key: &str) -> bool {
    matches!(first(pairs, key).map(|v| v.trim().to_ascii_lowercase()).as_deref(), Some("true") | Some("1") | Some("yes"))
}

pub fn number<T: std::str::FromStr>(pairs: &Pairs, key: &str) -> AppResult<Option<T>> {
    match first(pairs, key).map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::user("invalid_parameter", format!("{} must be a number, got '{}'", key, v))),
    }
}

pub fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// Batch envelope. `items_key` names the result list (`files`, `results`, ...).
pub fn batch<T: Serialize>(outcome: BatchOutcome<T>, items_key: &str, noun: &str) -> Json<Value> {
    let message = outcome.summary(noun);
    let success = outcome.success();
    let mut data = serde_json::Map::new();
    data.insert(items_key.to_string(), json!(outcome.results));
    data.insert("total_count".into(), json!(outcome.total_count()));
    data.insert("success_count".into(), json!(outcome.success_count()));
    data.insert("error_count".into(), json!(outcome.error_count()));
    if !outcome.errors.is_empty() {
        data.insert("errors".into(), json!(outcome.errors));
    }
    Json(json!({ "success": success, "data": data, "message": message }))
}
