//! Filestore data contracts returned by operations and serialized by the API layer.
//! Keep this module purely about types/serde and light helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::frontmatter::Frontmatter;
use super::paths::Encoding;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
    pub file_path: String,
    pub file_name: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub mime_type: String,
    pub encoding: Encoding,
    /// Absent for blobs (metadata only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkdownDocument {
    pub file_path: String,
    pub file_name: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub content: String,
    pub frontmatter: Option<Frontmatter>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SaveOperation {
    Save,
    Rename,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveResult {
    pub file_path: String,
    pub size: u64,
    pub encoding: Encoding,
    pub last_modified: DateTime<Utc>,
    pub created: bool,
    pub operation: SaveOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renamed_from: Option<String>,
    /// Whether the best-effort git commit went through.
    pub committed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteResult {
    pub file_path: String,
    pub committed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrontmatterUpdateResult {
    pub file_path: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub updated_keys: Vec<String>,
    pub current_frontmatter: Frontmatter,
    pub committed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrontmatterDeleteResult {
    pub file_path: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub deleted_keys: Vec<String>,
    pub remaining_frontmatter: Frontmatter,
    pub committed: bool,
}

/// Commit metadata carried by every mutating request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitOptions {
    #[serde(default)]
    pub commit_message: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
}

impl CommitOptions {
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.commit_message.as_deref().map(str::trim).filter(|m| !m.is_empty()).unwrap_or(fallback)
    }
}

/// One item of a batch save. Fields stay optional so missing ones become per-item errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SaveRequest {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub previous_path: Option<String>,
    #[serde(default)]
    pub frontmatter: Option<serde_json::Value>,
    #[serde(flatten)]
    pub commit: CommitOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FrontmatterUpdateRequest {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub frontmatter_updates: Option<serde_json::Value>,
    #[serde(flatten)]
    pub commit: CommitOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FrontmatterDeleteRequest {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub frontmatter_keys: Option<serde_json::Value>,
    #[serde(flatten)]
    pub commit: CommitOptions,
}

/// Non-empty trimmed value of an optional request field.
pub fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchError {
    pub file_path: String,
    pub error_code: String,
    pub message: String,
}

/// Per-item results of a batch call. Items never fail the batch as a whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchOutcome<T> {
    pub results: Vec<T>,
    pub errors: Vec<BatchError>,
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self { results: Vec::new(), errors: Vec::new() }
    }
}

impl<T> BatchOutcome<T> {
    pub fn push_ok(&mut self, item: T) {
        self.results.push(item);
    }

    pub fn push_err(&mut self, file_path: impl Into<String>, error_code: impl Into<String>, message: impl Into<String>) {
        self.errors.push(BatchError { file_path: file_path.into(), error_code: error_code.into(), message: message.into() });
    }

    pub fn success_count(&self) -> usize {
        self.results.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn total_count(&self) -> usize {
        self.results.len() + self.errors.len()
    }

    pub fn success(&self) -> bool {
        self.success_count() > 0
    }

    /// "All N files processed successfully" / "N files processed successfully, M files failed".
    pub fn summary(&self, noun: &str) -> String {
        if self.errors.is_empty() {
            format!("All {} {} processed successfully", self.success_count(), noun)
        } else {
            format!("{} {} processed successfully, {} files failed", self.success_count(), noun, self.error_count())
        }
    }
}
