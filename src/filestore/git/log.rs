//! `git log` query building and output parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{GitError, GitResult};

const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

/// Pretty format: fields joined by the unit separator, records ended by the record separator.
pub const LOG_FORMAT: &str = "--format=%H%x1f%h%x1f%s%x1f%an%x1f%ae%x1f%aI%x1f%cn%x1f%ce%x1f%cI%x1f%P%x1e";

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitRecord {
    pub id: String,
    pub short_id: String,
    pub title: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub authored_date: String,
    pub committer_name: String,
    pub committer_email: String,
    pub committed_date: String,
    pub created_at: String,
    pub parent_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitStats {
    pub additions: u64,
    pub deletions: u64,
    pub total: u64,
    pub files: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogQuery {
    pub page: u32,
    pub per_page: u32,
    pub ref_name: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub path: Option<String>,
    pub author: Option<String>,
    pub search: Option<String>,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            ref_name: None,
            since: None,
            until: None,
            path: None,
            author: None,
            search: None,
        }
    }
}

fn is_iso_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl LogQuery {
    pub fn validate(&self) -> GitResult<()> {
        if self.page < 1 {
            return Err(GitError::InvalidQuery("page must be >= 1".into()));
        }
        if self.per_page < 1 || self.per_page > MAX_PER_PAGE {
            return Err(GitError::InvalidQuery(format!("per_page must be between 1 and {}", MAX_PER_PAGE)));
        }
        for (name, v) in [("since", &self.since), ("until", &self.until)] {
            if let Some(d) = non_empty(v) {
                if !is_iso_date(d) {
                    return Err(GitError::InvalidQuery(format!("{} must be an ISO 8601 date, got '{}'", name, d)));
                }
            }
        }
        if let Some(r) = non_empty(&self.ref_name) {
            if r.starts_with('-') {
                return Err(GitError::InvalidQuery(format!("invalid ref_name '{}'", r)));
            }
        }
        Ok(())
    }

    pub fn ref_name(&self) -> &str {
        non_empty(&self.ref_name).unwrap_or("HEAD")
    }

    /// Filters shared by the paged listing and the total count.
    pub fn filter_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(s) = non_empty(&self.since) {
            args.push(format!("--since={}", s));
        }
        if let Some(u) = non_empty(&self.until) {
            args.push(format!("--until={}", u));
        }
        if let Some(a) = non_empty(&self.author) {
            args.push(format!("--author={}", a));
        }
        if let Some(g) = non_empty(&self.search) {
            args.push(format!("--grep={}", g));
        }
        args.push(self.ref_name().to_string());
        if let Some(p) = non_empty(&self.path) {
            args.push("--".to_string());
            args.push(p.to_string());
        }
        args
    }

    pub fn skip(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.per_page as u64
    }

    pub fn page_args(&self) -> Vec<String> {
        let mut args = vec!["log".to_string(), LOG_FORMAT.to_string()];
        args.push(format!("--skip={}", self.skip()));
        args.push(format!("--max-count={}", self.per_page));
        args.extend(self.filter_args());
        args
    }

    pub fn count_args(&self) -> Vec<String> {
        let mut args = vec!["log".to_string(), "--format=%H".to_string()];
        args.extend(self.filter_args());
        args
    }
}

pub fn parse_log(out: &str) -> Vec<CommitRecord> {
    out.split(RECORD_SEP)
        .map(|r| r.trim_matches(|c| c == '\n' || c == '\r'))
        .filter(|r| !r.is_empty())
        .filter_map(parse_record)
        .collect()
}

fn parse_record(rec: &str) -> Option<CommitRecord> {
    let f: Vec<&str> = rec.split(FIELD_SEP).collect();
    if f.len() < 10 {
        tracing::warn!(target: "git", fields = f.len(), "skipping malformed log record");
        return None;
    }
    Some(CommitRecord {
        id: f[0].to_string(),
        short_id: f[1].to_string(),
        title: f[2].to_string(),
        message: f[2].to_string(),
        author_name: f[3].to_string(),
        author_email: f[4].to_string(),
        authored_date: f[5].to_string(),
        committer_name: f[6].to_string(),
        committer_email: f[7].to_string(),
        committed_date: f[8].to_string(),
        created_at: f[5].to_string(),
        parent_ids: f[9].split_whitespace().map(str::to_string).collect(),
    })
}

/// Count non-empty lines of `git log --format=%H`.
pub fn count_hashes(out: &str) -> u64 {
    out.lines().filter(|l| !l.trim().is_empty()).count() as u64
}

/// Sum `--numstat` lines (`added<TAB>deleted<TAB>path`). Binary entries (`-`) count as a file only.
pub fn parse_numstat(out: &str) -> CommitStats {
    let mut stats = CommitStats::default();
    for line in out.lines() {
        let mut parts = line.splitn(3, '\t');
        let (Some(a), Some(d), Some(_)) = (parts.next(), parts.next(), parts.next()) else { continue; };
        stats.files += 1;
        stats.additions += a.parse::<u64>().unwrap_or(0);
        stats.deletions += d.parse::<u64>().unwrap_or(0);
    }
    stats.total = stats.additions + stats.deletions;
    stats
}
