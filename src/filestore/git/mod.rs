//! Git side of the filestore: a thin adapter over the `git` binary.
//! Every call spawns `git` with an argument vector (no shell) inside the storage root.

pub mod cli;
pub mod log;

pub use cli::GitRepo;
pub use log::{CommitRecord, CommitStats, LogQuery};

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("Not a git repository")]
    NotARepository,
    #[error("{0}")]
    InvalidQuery(String),
    #[error("git {args} failed (status {status}): {stderr}")]
    Failed { args: String, status: i32, stderr: String },
    #[error("failed to spawn git: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("git {args} timed out after {after:?}")]
    Timeout { args: String, after: Duration },
}

pub type GitResult<T> = Result<T, GitError>;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct GitStatusEntry {
    /// Two-letter porcelain code, e.g. ` M`, `??`, `A `.
    pub code: String,
    pub path: String,
}

/// Parse `git status --porcelain` output. Renames (`R  old -> new`) report the new path.
pub fn parse_porcelain(out: &str) -> Vec<GitStatusEntry> {
    out.lines()
        .filter(|l| l.len() > 3)
        .map(|l| {
            let code = l[..2].to_string();
            let rest = &l[3..];
            let path = match rest.split_once(" -> ") {
                Some((_, new)) => new,
                None => rest,
            };
            GitStatusEntry { code, path: path.trim_matches('"').to_string() }
        })
        .collect()
}

/// Parse `git config --list`: split on the first `=`, skipping lines without one or with an empty key.
pub fn parse_config_list(out: &str) -> serde_json::Map<String, serde_json::Value> {
    let mut map = serde_json::Map::new();
    for line in out.lines() {
        let Some((k, v)) = line.split_once('=') else { continue; };
        let k = k.trim();
        if k.is_empty() {
            continue;
        }
        map.insert(k.to_string(), serde_json::Value::String(v.to_string()));
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn porcelain_entries() {
        let out = " M notes/a.md\n?? new.md\nR  old.md -> renamed.md\nA  \"with space.md\"\n";
        let entries = parse_porcelain(out);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0], GitStatusEntry { code: " M".into(), path: "notes/a.md".into() });
        assert_eq!(entries[1].code, "??");
        assert_eq!(entries[2].path, "renamed.md");
        assert_eq!(entries[3].path, "with space.md");
    }

    #[test]
    fn config_list_splits_on_first_equals() {
        let out = "user.name=Ada\nalias.lg=log --format=%h\nbroken-line\n=novalue\ncore.bare=false\n";
        let map = parse_config_list(out);
        assert_eq!(map.len(), 3);
        assert_eq!(map["alias.lg"], "log --format=%h");
        assert_eq!(map["user.name"], "Ada");
        assert!(!map.contains_key(""));
    }

    #[test]
    fn error_messages() {
        assert_eq!(GitError::NotARepository.to_string(), "Not a git repository");
        let e = GitError::Failed { args: "commit".into(), status: 1, stderr: "boom".into() };
        assert!(e.to_string().contains("boom"));
    }
}
