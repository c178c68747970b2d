//! Filestore: markdown files in a git working tree on local disk.
//! Path validation, frontmatter codec, git adapter, file operations, workspace and search indexes.

pub mod paths;
pub mod root;
pub mod config;
pub mod types;
pub mod frontmatter;
pub mod git;
pub mod ops;
pub mod markdown;
pub mod walk;
pub mod workspace;
pub mod search;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export common types for callers
pub use config::{EffectiveConfig, FilestoreConfig, GlobalFilestoreConfig};
pub use frontmatter::Frontmatter;
pub use git::{CommitRecord, CommitStats, GitError, GitRepo, GitStatusEntry, LogQuery};
pub use ops::FileStore;
pub use paths::{is_binary, is_markdown, is_safe_path, mime_type, validate_relative_path, Encoding};
pub use root::StorageRoot;
pub use search::{search, SearchOutcome, SearchQuery, SearchType};
pub use types::{
    BatchError, BatchOutcome, CommitOptions, FileRecord, FrontmatterDeleteRequest, FrontmatterUpdateRequest,
    MarkdownDocument, SaveRequest, SaveResult,
};
pub use workspace::{list_workspaces, WorkspaceListing, WorkspaceQuery};
