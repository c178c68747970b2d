//! Core filestore operations over the storage root: read, write, rename, delete.
//! Git staging and commits are a best-effort side effect; the filesystem result is authoritative.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::path::PathBuf;

use super::config::EffectiveConfig;
use super::git::cli::GitTimeouts;
use super::git::GitRepo;
use super::paths::{file_name, is_binary, mime_type, Encoding};
use super::root::StorageRoot;
use super::types::{
    present, BatchOutcome, CommitOptions, DeleteResult, FileRecord, SaveOperation, SaveRequest, SaveResult,
};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct FileStore {
    root: StorageRoot,
    git: GitRepo,
    cfg: EffectiveConfig,
}

pub(crate) fn modified_utc(meta: &Metadata) -> DateTime<Utc> {
    meta.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now())
}

/// Outcome of writing bytes to disk, before any git work.
pub(crate) struct Written {
    pub meta: Metadata,
    pub created: bool,
}

impl FileStore {
    pub fn new(root: StorageRoot, cfg: EffectiveConfig) -> Self {
        let git = GitRepo::new(root.path().to_path_buf(), GitTimeouts::from_config(&cfg));
        Self { root, git, cfg }
    }

    pub fn root(&self) -> &StorageRoot {
        &self.root
    }

    pub fn git(&self) -> &GitRepo {
        &self.git
    }

    pub fn config(&self) -> &EffectiveConfig {
        &self.cfg
    }

    /// Resolve and stat a path that must be an existing regular file.
    pub(crate) async fn stat_file(&self, path: &str) -> AppResult<(PathBuf, Metadata)> {
        let abs = self.root.resolve(path)?;
        let meta = match tokio::fs::metadata(&abs).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::not_found("not_found", format!("File '{}' does not exist", path)));
            }
            Err(e) => return Err(e.into()),
        };
        if !meta.is_file() {
            return Err(AppError::user("not_a_file", format!("Path '{}' is not a file", path)));
        }
        Ok((abs, meta))
    }

    /// Metadata only; encoding reports what a full read would use.
    pub async fn blob(&self, path: &str) -> AppResult<FileRecord> {
        let (_, meta) = self.stat_file(path).await?;
        let encoding = if is_binary(path) { Encoding::Base64 } else { Encoding::Text };
        Ok(FileRecord {
            file_path: path.to_string(),
            file_name: file_name(path),
            size: meta.len(),
            last_modified: modified_utc(&meta),
            mime_type: mime_type(path).to_string(),
            encoding,
            content: None,
        })
    }

    pub async fn read(&self, path: &str, encoding: Option<Encoding>) -> AppResult<FileRecord> {
        let (abs, meta) = self.stat_file(path).await?;
        let encoding = if is_binary(path) {
            if encoding == Some(Encoding::Text) {
                return Err(AppError::user(
                    "binary_as_text",
                    format!("File '{}' is binary and cannot be read as text", path),
                ));
            }
            Encoding::Base64
        } else {
            encoding.unwrap_or(Encoding::Text)
        };
        let bytes = tokio::fs::read(&abs).await?;
        let content = match encoding {
            Encoding::Text => String::from_utf8_lossy(&bytes).into_owned(),
            Encoding::Base64 => STANDARD.encode(&bytes),
        };
        Ok(FileRecord {
            file_path: path.to_string(),
            file_name: file_name(path),
            size: meta.len(),
            last_modified: modified_utc(&meta),
            mime_type: mime_type(path).to_string(),
            encoding,
            content: Some(content),
        })
    }

    pub async fn read_many(&self, paths: &[String], encoding: Option<Encoding>, metadata_only: bool) -> BatchOutcome<FileRecord> {
        let mut out = BatchOutcome::default();
        for p in paths {
            let res = if metadata_only { self.blob(p).await } else { self.read(p, encoding).await };
            match res {
                Ok(rec) => out.push_ok(rec),
                Err(e) => out.push_err(p.clone(), e.batch_code("READ_ERROR"), e.message()),
            }
        }
        out
    }

    /// Write bytes, creating parent directories. `created` reflects the state before the write.
    pub(crate) async fn write_bytes(&self, path: &str, bytes: &[u8]) -> AppResult<Written> {
        let abs = self.root.resolve(path)?;
        let created = match tokio::fs::metadata(&abs).await {
            Ok(m) if m.is_dir() => {
                return Err(AppError::conflict("path_is_directory", format!("Path '{}' is a directory", path)));
            }
            Ok(_) => false,
            Err(_) => true,
        };
        if let Some(parent) = abs.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    AppError::conflict("parent_not_directory", format!("A parent of '{}' is a file", path))
                }
                _ => e.into(),
            })?;
        }
        tokio::fs::write(&abs, bytes).await?;
        let meta = tokio::fs::metadata(&abs).await?;
        Ok(Written { meta, created })
    }

    /// Stage and commit when the root is a repository. Failures are logged, never returned.
    pub(crate) async fn commit_best_effort(&self, add: &[String], remove: &[String], opts: &CommitOptions, default_message: &str) -> bool {
        if !self.git.is_repository().await {
            tracing::debug!(target: "filestore", "not a git repository, skipping git operations");
            return false;
        }
        match self.git.commit_paths(add, remove, opts, default_message).await {
            Ok(committed) => committed,
            Err(e) => {
                tracing::warn!(target: "filestore", error = %e, ?add, ?remove, "git commit failed; file change kept");
                false
            }
        }
    }

    fn decode(path: &str, content: &str, encoding: Option<Encoding>) -> AppResult<(Vec<u8>, Encoding)> {
        let encoding = encoding.unwrap_or(if is_binary(path) { Encoding::Base64 } else { Encoding::Text });
        let bytes = match encoding {
            Encoding::Text => content.as_bytes().to_vec(),
            Encoding::Base64 => STANDARD
                .decode(content.trim())
                .map_err(|e| AppError::user("invalid_content", format!("Content for '{}' is not valid base64: {}", path, e)))?,
        };
        Ok((bytes, encoding))
    }

    pub async fn write(&self, path: &str, content: &str, encoding: Option<Encoding>, opts: &CommitOptions) -> AppResult<SaveResult> {
        let (bytes, encoding) = Self::decode(path, content, encoding)?;
        let written = self.write_bytes(path, &bytes).await?;
        let committed = self.commit_best_effort(&[path.to_string()], &[], opts, &format!("Update {}", path)).await;
        tracing::info!(target: "filestore", path, size = written.meta.len(), created = written.created, committed, "file saved");
        Ok(SaveResult {
            file_path: path.to_string(),
            size: written.meta.len(),
            encoding,
            last_modified: modified_utc(&written.meta),
            created: written.created,
            operation: SaveOperation::Save,
            renamed_from: None,
            committed,
        })
    }

    /// Move `old_path` to `new_path` with new content. The old file is removed even when git fails.
    pub async fn rename(&self, old_path: &str, new_path: &str, content: &str, encoding: Option<Encoding>, opts: &CommitOptions) -> AppResult<SaveResult> {
        let (old_abs, _) = self.stat_file(old_path).await?;
        self.root.resolve(new_path)?;
        if old_path == new_path {
            return self.write(new_path, content, encoding, opts).await;
        }
        let (bytes, encoding) = Self::decode(new_path, content, encoding)?;
        let written = self.write_bytes(new_path, &bytes).await?;
        let committed = self
            .commit_best_effort(
                &[new_path.to_string()],
                &[old_path.to_string()],
                opts,
                &format!("Rename {} to {}", old_path, new_path),
            )
            .await;
        remove_if_present(&old_abs).await?;
        tracing::info!(target: "filestore", from = old_path, to = new_path, committed, "file renamed");
        Ok(SaveResult {
            file_path: new_path.to_string(),
            size: written.meta.len(),
            encoding,
            last_modified: modified_utc(&written.meta),
            created: written.created,
            operation: SaveOperation::Rename,
            renamed_from: Some(old_path.to_string()),
            committed,
        })
    }

    pub async fn delete(&self, path: &str, opts: &CommitOptions) -> AppResult<DeleteResult> {
        let (abs, _) = self.stat_file(path).await?;
        tokio::fs::remove_file(&abs).await?;
        let committed = self.commit_best_effort(&[], &[path.to_string()], opts, &format!("Delete {}", path)).await;
        tracing::info!(target: "filestore", path, committed, "file deleted");
        Ok(DeleteResult { file_path: path.to_string(), committed })
    }

    pub async fn save_many(&self, items: &[SaveRequest]) -> BatchOutcome<SaveResult> {
        let mut out = BatchOutcome::default();
        for item in items {
            let (Some(path), Some(content), Some(_)) = (present(&item.file_path), item.content.as_deref(), present(&item.commit.commit_message)) else {
                out.push_err(
                    present(&item.file_path).unwrap_or("unknown"),
                    "VALIDATION_ERROR",
                    "Missing required fields: file_path, content, commit_message",
                );
                continue;
            };
            let res = match Encoding::parse_opt(item.encoding.as_deref()) {
                Err(e) => Err(e),
                Ok(enc) => match present(&item.previous_path).filter(|prev| *prev != path) {
                    Some(prev) => self.rename(prev, path, content, enc, &item.commit).await,
                    None => self.write(path, content, enc, &item.commit).await,
                },
            };
            match res {
                Ok(r) => out.push_ok(r),
                Err(e) => out.push_err(path, e.batch_code("SAVE_ERROR"), e.message()),
            }
        }
        out
    }

    pub async fn delete_many(&self, paths: &[String], opts: &CommitOptions) -> BatchOutcome<DeleteResult> {
        let mut out = BatchOutcome::default();
        for p in paths {
            match self.delete(p, opts).await {
                Ok(r) => out.push_ok(r),
                Err(e) => out.push_err(p.clone(), e.batch_code("DELETE_ERROR"), e.message()),
            }
        }
        out
    }
}

pub(crate) async fn remove_if_present(abs: &std::path::Path) -> AppResult<()> {
    match tokio::fs::remove_file(abs).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "ops_tests.rs"]
mod ops_tests;
