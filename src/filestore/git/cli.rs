//! `GitRepo`: async wrapper over the `git` binary rooted at the storage directory.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::Mutex;

use super::log::{count_hashes, parse_log, parse_numstat, CommitRecord, CommitStats, LogQuery};
use super::{parse_config_list, parse_porcelain, GitError, GitResult, GitStatusEntry};
use crate::filestore::config::EffectiveConfig;
use crate::filestore::types::CommitOptions;

const UNKNOWN_EMAIL: &str = "unknown@example.com";
const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Clone, Copy)]
pub struct GitTimeouts {
    pub probe: Duration,
    pub default: Duration,
    pub commit: Duration,
}

impl GitTimeouts {
    pub fn from_config(eff: &EffectiveConfig) -> Self {
        Self {
            probe: Duration::from_millis(eff.git_probe_timeout_ms),
            default: Duration::from_millis(eff.git_timeout_ms),
            commit: Duration::from_millis(eff.git_commit_timeout_ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
    timeouts: GitTimeouts,
    // add/rm/commit sequences from concurrent requests must not interleave on one index
    write_lock: Arc<Mutex<()>>,
}

/// Build the `--author` value, filling whichever half is missing.
pub fn author_arg(name: Option<&str>, email: Option<&str>) -> Option<String> {
    let name = name.map(str::trim).filter(|s| !s.is_empty());
    let email = email.map(str::trim).filter(|s| !s.is_empty());
    match (name, email) {
        (None, None) => None,
        (Some(n), Some(e)) => Some(format!("{} <{}>", n, e)),
        (Some(n), None) => Some(format!("{} <{}>", n, UNKNOWN_EMAIL)),
        (None, Some(e)) => Some(format!("{} <{}>", UNKNOWN_NAME, e)),
    }
}

impl GitRepo {
    pub fn new(root: impl Into<PathBuf>, timeouts: GitTimeouts) -> Self {
        Self { root: root.into(), timeouts, write_lock: Arc::new(Mutex::new(())) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn run<S: AsRef<OsStr>>(&self, args: &[S], limit: Duration) -> GitResult<String> {
        let printable = args.iter().map(|a| a.as_ref().to_string_lossy().into_owned()).collect::<Vec<_>>().join(" ");
        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(&self.root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        let output = match tokio::time::timeout(limit, cmd.output()).await {
            Ok(res) => res?,
            Err(_) => {
                tracing::warn!(target: "git", args = %printable, ?limit, "git timed out");
                return Err(GitError::Timeout { args: printable, after: limit });
            }
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(target: "git", args = %printable, %stderr, "git exited with failure");
            return Err(GitError::Failed { args: printable, status: output.status.code().unwrap_or(-1), stderr });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    pub async fn is_repository(&self) -> bool {
        self.run(&["rev-parse", "--git-dir"], self.timeouts.probe).await.is_ok()
    }

    /// `git init` when the root is not a repository yet; HEAD is pointed at `main` best-effort.
    pub async fn init_if_absent(&self) -> GitResult<bool> {
        if self.is_repository().await {
            return Ok(false);
        }
        self.run(&["init", "-q"], self.timeouts.default).await?;
        if let Err(e) = self.run(&["symbolic-ref", "HEAD", "refs/heads/main"], self.timeouts.default).await {
            tracing::warn!(target: "git", error = %e, "could not point HEAD at main");
        }
        tracing::info!(target: "git", root = %self.root.display(), "initialized git repository");
        Ok(true)
    }

    async fn add_unlocked(&self, paths: &[String]) -> Vec<String> {
        let mut ok = Vec::with_capacity(paths.len());
        for p in paths {
            match self.run(&["add", "--", p.as_str()], self.timeouts.default).await {
                Ok(_) => ok.push(p.clone()),
                Err(e) => tracing::warn!(target: "git", path = %p, error = %e, "git add failed"),
            }
        }
        ok
    }

    async fn remove_unlocked(&self, paths: &[String]) -> Vec<String> {
        let mut ok = Vec::with_capacity(paths.len());
        for p in paths {
            match self.run(&["rm", "-f", "-q", "--ignore-unmatch", "--", p.as_str()], self.timeouts.default).await {
                Ok(_) => ok.push(p.clone()),
                Err(e) => tracing::warn!(target: "git", path = %p, error = %e, "git rm failed"),
            }
        }
        ok
    }

    pub async fn add_paths(&self, paths: &[String]) -> Vec<String> {
        let _guard = self.write_lock.lock().await;
        self.add_unlocked(paths).await
    }

    pub async fn remove_paths(&self, paths: &[String]) -> Vec<String> {
        let _guard = self.write_lock.lock().await;
        self.remove_unlocked(paths).await
    }

    pub async fn has_staged_changes(&self) -> GitResult<bool> {
        let out = self.run(&["diff", "--cached", "--name-only"], self.timeouts.default).await?;
        Ok(!out.trim().is_empty())
    }

    async fn commit_unlocked(&self, message: &str, author_name: Option<&str>, author_email: Option<&str>) -> GitResult<bool> {
        if !self.has_staged_changes().await? {
            tracing::info!(target: "git", "nothing to commit");
            return Ok(false);
        }
        let mut args = vec!["commit".to_string(), "-q".to_string()];
        if let Some(author) = author_arg(author_name, author_email) {
            args.push(format!("--author={}", author));
        }
        args.push("-m".to_string());
        args.push(message.to_string());
        self.run(&args, self.timeouts.commit).await?;
        tracing::info!(target: "git", %message, "committed");
        Ok(true)
    }

    pub async fn commit(&self, message: &str, author_name: Option<&str>, author_email: Option<&str>) -> GitResult<bool> {
        let _guard = self.write_lock.lock().await;
        self.commit_unlocked(message, author_name, author_email).await
    }

    /// Stage additions and removals then commit, holding the write lock for the whole sequence.
    pub async fn commit_paths(&self, add: &[String], remove: &[String], opts: &CommitOptions, default_message: &str) -> GitResult<bool> {
        let _guard = self.write_lock.lock().await;
        self.add_unlocked(add).await;
        self.remove_unlocked(remove).await;
        let message = opts.message_or(default_message);
        self.commit_unlocked(message, opts.author_name.as_deref(), opts.author_email.as_deref()).await
    }

    /// Page of commits plus the unpaginated total for the same filters.
    pub async fn log(&self, query: &LogQuery) -> GitResult<(Vec<CommitRecord>, u64)> {
        query.validate()?;
        let out = match self.run(&query.page_args(), self.timeouts.default).await {
            Ok(out) => out,
            Err(GitError::Failed { stderr, .. }) if is_unborn(&stderr, query) => {
                tracing::debug!(target: "git", "branch has no commits yet");
                return Ok((Vec::new(), 0));
            }
            Err(e) => return Err(e),
        };
        let commits = parse_log(&out);
        let total = count_hashes(&self.run(&query.count_args(), self.timeouts.default).await?);
        Ok((commits, total))
    }

    pub async fn config(&self) -> GitResult<serde_json::Map<String, serde_json::Value>> {
        let out = self.run(&["config", "--list"], self.timeouts.default).await?;
        Ok(parse_config_list(&out))
    }

    pub async fn config_value(&self, key: &str) -> GitResult<Option<String>> {
        match self.run(&["config", "--get", key], self.timeouts.default).await {
            Ok(out) => Ok(Some(out.trim().to_string())),
            Err(GitError::Failed { status: 1, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn status(&self) -> GitResult<Vec<GitStatusEntry>> {
        let out = self.run(&["status", "--porcelain"], self.timeouts.default).await?;
        Ok(parse_porcelain(&out))
    }

    pub async fn head_commit(&self) -> Option<String> {
        self.run(&["rev-parse", "--verify", "-q", "HEAD"], self.timeouts.probe)
            .await
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub async fn current_branch(&self) -> Option<String> {
        self.run(&["symbolic-ref", "--short", "-q", "HEAD"], self.timeouts.probe)
            .await
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub async fn branches(&self) -> GitResult<Vec<String>> {
        let out = self.run(&["branch", "--format=%(refname:short)"], self.timeouts.default).await?;
        Ok(out.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect())
    }

    pub async fn commit_stats(&self, rev: &str) -> GitResult<CommitStats> {
        let rev = rev.trim();
        if rev.is_empty() || rev.starts_with('-') || !rev.chars().all(|c| c.is_ascii_alphanumeric() || "/._~^".contains(c)) {
            return Err(GitError::InvalidQuery(format!("invalid revision '{}'", rev)));
        }
        let out = self.run(&["show", "--numstat", "--format=", rev], self.timeouts.default).await?;
        Ok(parse_numstat(&out))
    }
}

fn is_unborn(stderr: &str, query: &LogQuery) -> bool {
    stderr.contains("does not have any commits yet")
        || (query.ref_name() == "HEAD" && stderr.contains("unknown revision"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_defaults() {
        assert_eq!(author_arg(None, None), None);
        assert_eq!(author_arg(Some("Ada"), Some("ada@x.io")).as_deref(), Some("Ada <ada@x.io>"));
        assert_eq!(author_arg(Some("Ada"), None).as_deref(), Some("Ada <unknown@example.com>"));
        assert_eq!(author_arg(Some(" "), Some("ada@x.io")).as_deref(), Some("Unknown <ada@x.io>"));
    }

    #[test]
    fn unborn_detection() {
        let q = LogQuery::default();
        assert!(is_unborn("fatal: your current branch 'main' does not have any commits yet", &q));
        assert!(is_unborn("fatal: ambiguous argument 'HEAD': unknown revision or path", &q));
        let q = LogQuery { ref_name: Some("feature".into()), ..Default::default() };
        assert!(!is_unborn("fatal: ambiguous argument 'feature': unknown revision or path", &q));
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod cli_tests;
