//! Markdown documents on top of [`FileStore`]: frontmatter-aware read, save, rename and
//! partial frontmatter edits. Plain file CRUD is the same thing with no frontmatter.

use serde_json::Value;

use super::frontmatter::{self, Frontmatter};
use super::ops::{modified_utc, FileStore};
use super::paths::{file_name, is_markdown, validate_relative_path, Encoding};
use super::types::{
    present, BatchOutcome, CommitOptions, FrontmatterDeleteRequest, FrontmatterDeleteResult, FrontmatterUpdateRequest,
    FrontmatterUpdateResult, MarkdownDocument, SaveRequest, SaveResult,
};
use crate::error::{AppError, AppResult};

fn ensure_markdown(path: &str) -> AppResult<()> {
    validate_relative_path(path)?;
    if !is_markdown(path) {
        return Err(AppError::user("not_markdown", format!("File '{}' is not a markdown file", path)));
    }
    Ok(())
}

fn as_object(v: &Value, field: &str) -> AppResult<Frontmatter> {
    v.as_object()
        .cloned()
        .ok_or_else(|| AppError::user("invalid_frontmatter", format!("{} must be an object with key-value pairs", field)))
}

fn as_key_list(v: &Value) -> AppResult<Vec<String>> {
    let invalid = || AppError::user(
        "invalid_frontmatter_keys",
        "frontmatter_keys must be a non-empty array. Use [\"*\"] to delete all frontmatter.",
    );
    let arr = v.as_array().filter(|a| !a.is_empty()).ok_or_else(invalid)?;
    arr.iter().map(|k| k.as_str().map(str::to_string).ok_or_else(invalid)).collect()
}

impl FileStore {
    async fn read_text(&self, path: &str) -> AppResult<String> {
        let rec = self.read(path, Some(Encoding::Text)).await?;
        Ok(rec.content.unwrap_or_default())
    }

    pub async fn get_markdown(&self, path: &str) -> AppResult<MarkdownDocument> {
        ensure_markdown(path)?;
        let (abs, meta) = self.stat_file(path).await?;
        let bytes = tokio::fs::read(&abs).await?;
        let (fm, body) = frontmatter::parse(&String::from_utf8_lossy(&bytes));
        Ok(MarkdownDocument {
            file_path: path.to_string(),
            file_name: file_name(path),
            size: meta.len(),
            last_modified: modified_utc(&meta),
            content: body,
            frontmatter: fm,
        })
    }

    pub async fn get_markdowns(&self, paths: &[String]) -> BatchOutcome<MarkdownDocument> {
        let mut out = BatchOutcome::default();
        for p in paths {
            match self.get_markdown(p).await {
                Ok(doc) => out.push_ok(doc),
                Err(e) => out.push_err(p.clone(), e.batch_code("READ_ERROR"), e.message()),
            }
        }
        out
    }

    pub async fn save_markdown(&self, path: &str, body: &str, fm: Option<&Frontmatter>, opts: &CommitOptions) -> AppResult<SaveResult> {
        ensure_markdown(path)?;
        self.write(path, &frontmatter::serialize(fm, body), Some(Encoding::Text), opts).await
    }

    pub async fn rename_markdown(&self, old_path: &str, new_path: &str, body: &str, fm: Option<&Frontmatter>, opts: &CommitOptions) -> AppResult<SaveResult> {
        ensure_markdown(old_path)?;
        ensure_markdown(new_path)?;
        self.rename(old_path, new_path, &frontmatter::serialize(fm, body), Some(Encoding::Text), opts).await
    }

    pub async fn save_markdowns(&self, items: &[SaveRequest]) -> BatchOutcome<SaveResult> {
        let mut out = BatchOutcome::default();
        for item in items {
            let (Some(path), Some(body), Some(_)) = (present(&item.file_path), item.content.as_deref(), present(&item.commit.commit_message)) else {
                out.push_err(
                    present(&item.file_path).unwrap_or("unknown"),
                    "VALIDATION_ERROR",
                    "Missing required fields: file_path, content, commit_message",
                );
                continue;
            };
            let fm = match item.frontmatter.as_ref().filter(|v| !v.is_null()).map(|v| as_object(v, "frontmatter")).transpose() {
                Ok(fm) => fm,
                Err(e) => {
                    out.push_err(path, e.batch_code("SAVE_ERROR"), e.message());
                    continue;
                }
            };
            let res = match present(&item.previous_path).filter(|prev| *prev != path) {
                Some(prev) => self.rename_markdown(prev, path, body, fm.as_ref(), &item.commit).await,
                None => self.save_markdown(path, body, fm.as_ref(), &item.commit).await,
            };
            match res {
                Ok(r) => out.push_ok(r),
                Err(e) => out.push_err(path, e.batch_code("SAVE_ERROR"), e.message()),
            }
        }
        out
    }

    /// Merge `updates` over the current frontmatter and rewrite the file.
    pub async fn update_frontmatter(&self, path: &str, updates: &Frontmatter, opts: &CommitOptions) -> AppResult<FrontmatterUpdateResult> {
        ensure_markdown(path)?;
        let (current, body) = frontmatter::parse(&self.read_text(path).await?);
        let merged = frontmatter::merge(current.as_ref(), updates);
        let written = self.write_bytes(path, frontmatter::serialize(Some(&merged), &body).as_bytes()).await?;
        let committed = self
            .commit_best_effort(&[path.to_string()], &[], opts, &format!("Update frontmatter in {}", path))
            .await;
        tracing::info!(target: "filestore", path, keys = updates.len(), committed, "frontmatter updated");
        Ok(FrontmatterUpdateResult {
            file_path: path.to_string(),
            size: written.meta.len(),
            last_modified: modified_utc(&written.meta),
            updated_keys: updates.keys().cloned().collect(),
            current_frontmatter: merged,
            committed,
        })
    }

    /// Remove frontmatter keys; `["*"]` drops the whole block and leaves the body untouched.
    pub async fn delete_frontmatter(&self, path: &str, keys: &[String], opts: &CommitOptions) -> AppResult<FrontmatterDeleteResult> {
        ensure_markdown(path)?;
        let (current, body) = frontmatter::parse(&self.read_text(path).await?);
        let current = current
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::user("no_frontmatter", format!("File '{}' has no frontmatter to delete", path)))?;
        let removal = frontmatter::remove_keys(&current, keys, path)?;
        let written = self.write_bytes(path, frontmatter::serialize(Some(&removal.remaining), &body).as_bytes()).await?;
        let committed = self
            .commit_best_effort(&[path.to_string()], &[], opts, &format!("Delete frontmatter in {}", path))
            .await;
        tracing::info!(target: "filestore", path, deleted = removal.deleted.len(), committed, "frontmatter keys deleted");
        Ok(FrontmatterDeleteResult {
            file_path: path.to_string(),
            size: written.meta.len(),
            last_modified: modified_utc(&written.meta),
            deleted_keys: removal.deleted,
            remaining_frontmatter: removal.remaining,
            committed,
        })
    }

    pub async fn update_frontmatters(&self, items: &[FrontmatterUpdateRequest]) -> BatchOutcome<FrontmatterUpdateResult> {
        let mut out = BatchOutcome::default();
        for item in items {
            let (Some(path), Some(updates), Some(_)) = (present(&item.file_path), item.frontmatter_updates.as_ref(), present(&item.commit.commit_message)) else {
                out.push_err(
                    present(&item.file_path).unwrap_or("unknown"),
                    "VALIDATION_ERROR",
                    "Missing required fields: file_path, frontmatter_updates, commit_message",
                );
                continue;
            };
            let res = match as_object(updates, "frontmatter_updates") {
                Ok(updates) => self.update_frontmatter(path, &updates, &item.commit).await,
                Err(e) => Err(e),
            };
            match res {
                Ok(r) => out.push_ok(r),
                Err(e) => out.push_err(path, e.batch_code("UPDATE_ERROR"), e.message()),
            }
        }
        out
    }

    pub async fn delete_frontmatters(&self, items: &[FrontmatterDeleteRequest]) -> BatchOutcome<FrontmatterDeleteResult> {
        let mut out = BatchOutcome::default();
        for item in items {
            let (Some(path), Some(keys), Some(_)) = (present(&item.file_path), item.frontmatter_keys.as_ref(), present(&item.commit.commit_message)) else {
                out.push_err(
                    present(&item.file_path).unwrap_or("unknown"),
                    "VALIDATION_ERROR",
                    "Missing required fields: file_path, frontmatter_keys, commit_message",
                );
                continue;
            };
            let res = match as_key_list(keys) {
                Ok(keys) => self.delete_frontmatter(path, &keys, &item.commit).await,
                Err(e) => Err(e),
            };
            match res {
                Ok(r) => out.push_ok(r),
                Err(e) => out.push_err(path, e.batch_code("DELETE_ERROR"), e.message()),
            }
        }
        out
    }
}
