//! Filename and content search over the storage root with simple relevance scoring.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::config::EffectiveConfig;
use super::walk::walk_files;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Filename,
    Content,
    #[default]
    Both,
}

impl SearchType {
    pub fn parse(raw: Option<&str>) -> AppResult<Self> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None | Some("both") => Ok(SearchType::Both),
            Some("filename") => Ok(SearchType::Filename),
            Some("content") => Ok(SearchType::Content),
            Some(other) => Err(AppError::user(
                "invalid_search_type",
                format!("type must be one of filename, content, both (got '{}')", other),
            )),
        }
    }

    fn filenames(self) -> bool {
        matches!(self, SearchType::Filename | SearchType::Both)
    }

    fn contents(self) -> bool {
        matches!(self, SearchType::Content | SearchType::Both)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchQuery {
    pub q: String,
    pub search_type: SearchType,
    pub limit: Option<usize>,
    pub include_hidden: bool,
    pub file_types: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HitKind {
    File,
    Content,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    #[serde(rename = "type")]
    pub kind: HitKind,
    pub path: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "matchedText", default, skip_serializing_if = "Option::is_none")]
    pub matched_text: Option<String>,
    pub score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchOutcome {
    pub results: Vec<SearchHit>,
    /// Hit count before truncation to the limit.
    pub total_count: usize,
    pub query: String,
    pub search_type: SearchType,
}

impl SearchQuery {
    /// Trimmed query and a limit within bounds.
    pub fn validate(&self, cfg: &EffectiveConfig) -> AppResult<usize> {
        if self.q.trim().is_empty() {
            return Err(AppError::user("missing_query", "Search query is required"));
        }
        let limit = self.limit.unwrap_or(cfg.search_default_limit);
        if limit < 1 || limit > cfg.search_max_limit {
            return Err(AppError::user(
                "invalid_limit",
                format!("limit must be between 1 and {}", cfg.search_max_limit),
            ));
        }
        Ok(limit)
    }
}

fn lower_chars(s: &str) -> Vec<char> {
    s.chars().map(|c| c.to_lowercase().next().unwrap_or(c)).collect()
}

/// Char index of the first case-insensitive occurrence of `needle`.
fn find_ci(hay: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > hay.len() {
        return None;
    }
    hay.windows(needle.len()).position(|w| w == needle)
}

fn count_ci(hay: &[char], needle: &[char]) -> usize {
    if needle.is_empty() {
        return 0;
    }
    let mut n = 0;
    let mut i = 0;
    while i + needle.len() <= hay.len() {
        if hay[i..i + needle.len()] == *needle {
            n += 1;
            i += needle.len();
        } else {
            i += 1;
        }
    }
    n
}

fn contains_ci(hay: &str, needle: &str) -> bool {
    find_ci(&lower_chars(hay), &lower_chars(needle)).is_some()
}

/// Exact 100, prefix 80, substring 60; shorter names get up to 50 more.
pub fn filename_score(filename: &str, query: &str) -> i64 {
    let name = lower_chars(filename);
    let q = lower_chars(query);
    let mut score = if name == q {
        100
    } else if name.starts_with(&q) {
        80
    } else if find_ci(&name, &q).is_some() {
        60
    } else {
        0
    };
    score += 50i64.saturating_sub(filename.chars().count() as i64).max(0);
    score
}

/// 20 per occurrence, +30 when the file name matches, +15 for a space-delimited match, -5 for long lines.
pub fn content_score(line: &str, query: &str, filename: &str) -> i64 {
    let lower = lower_chars(line);
    let q = lower_chars(query);
    let mut score = 20 * count_ci(&lower, &q) as i64;
    if contains_ci(filename, query) {
        score += 30;
    }
    let mut spaced = vec![' '];
    spaced.extend_from_slice(&q);
    spaced.push(' ');
    if find_ci(&lower, &spaced).is_some() {
        score += 15;
    }
    if line.chars().count() > 200 {
        score -= 5;
    }
    score
}

/// The first match with `context` chars on either side; `...` marks a truncated side.
pub fn matched_text(line: &str, query: &str, context: usize) -> String {
    let chars: Vec<char> = line.chars().collect();
    let Some(idx) = find_ci(&lower_chars(line), &lower_chars(query)) else {
        return chars.iter().take(100).collect();
    };
    let q_len = query.chars().count();
    let start = idx.saturating_sub(context);
    let end = (idx + q_len + context).min(chars.len());
    let mut out = String::new();
    if start > 0 {
        out.push_str("...");
    }
    out.extend(&chars[start..end]);
    if end < chars.len() {
        out.push_str("...");
    }
    out
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .map(|p| p.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join("/"))
        .unwrap_or_else(|_| path.to_string_lossy().into_owned())
}

fn search_filenames(root: &Path, query: &SearchQuery, q: &str, cfg: &EffectiveConfig) -> Vec<SearchHit> {
    let needle = lower_chars(q);
    walk_files(root, query.include_hidden, &query.file_types)
        .filter_map(|p| {
            let filename = p.file_name()?.to_string_lossy().into_owned();
            find_ci(&lower_chars(&filename), &needle)?;
            Some(SearchHit {
                kind: HitKind::File,
                path: relative(root, &p),
                score: filename_score(&filename, q),
                filename,
                line: None,
                content: None,
                matched_text: None,
            })
        })
        .take(cfg.search_max_filename_candidates)
        .collect()
}

fn search_contents(root: &Path, query: &SearchQuery, q: &str, cfg: &EffectiveConfig) -> Vec<SearchHit> {
    let needle = lower_chars(q);
    let mut hits = Vec::new();
    'files: for p in walk_files(root, query.include_hidden, &query.file_types) {
        let Ok(file) = File::open(&p) else { continue; };
        let filename = p.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let rel = relative(root, &p);
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            // stop at the first non-UTF-8 line; binary files fall out here
            let Ok(line) = line else { break; };
            if find_ci(&lower_chars(&line), &needle).is_none() {
                continue;
            }
            hits.push(SearchHit {
                kind: HitKind::Content,
                path: rel.clone(),
                filename: filename.clone(),
                line: Some(idx + 1),
                content: Some(line.trim().to_string()),
                matched_text: Some(matched_text(&line, q, cfg.search_context_chars)),
                score: content_score(&line, q, &filename),
            });
            if hits.len() >= cfg.search_max_content_matches {
                break 'files;
            }
        }
    }
    hits
}

/// Run a validated search. Results are sorted by score (stable) and cut to the limit.
pub fn search(root: &Path, query: &SearchQuery, cfg: &EffectiveConfig) -> AppResult<SearchOutcome> {
    let limit = query.validate(cfg)?;
    let q = query.q.trim();
    let mut results = Vec::new();
    if query.search_type.filenames() {
        results.extend(search_filenames(root, query, q, cfg));
    }
    if query.search_type.contents() {
        results.extend(search_contents(root, query, q, cfg));
    }
    results.sort_by(|a, b| b.score.cmp(&a.score));
    let total_count = results.len();
    results.truncate(limit);
    tracing::debug!(target: "filestore", query = q, total_count, "search finished");
    Ok(SearchOutcome { results, total_count, query: q.to_string(), search_type: query.search_type })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn q(text: &str, t: SearchType) -> SearchQuery {
        SearchQuery { q: text.to_string(), search_type: t, ..Default::default() }
    }

    #[test]
    fn filename_scoring_order() {
        assert_eq!(filename_score("notes.md", "notes.md"), 100 + 42);
        assert_eq!(filename_score("Notes-2024.md", "notes"), 80 + 37);
        assert_eq!(filename_score("my-notes.md", "notes"), 60 + 39);
        assert!(filename_score("plan.md", "PLAN.MD") > filename_score("plan.md.bak", "plan.md"));
        let long = "x".repeat(60);
        assert_eq!(filename_score(&long, "zzz"), 0);
    }

    #[test]
    fn content_scoring() {
        assert_eq!(content_score("todo,TODO.", "todo", "a.md"), 40);
        assert_eq!(content_score("a todo b", "todo", "todo.md"), 20 + 30 + 15);
        let long = format!("todo {}", "y".repeat(250));
        assert_eq!(content_score(&long, "todo", "a.md"), 15);
    }

    #[test]
    fn context_window_ellipses() {
        assert_eq!(matched_text("short match here", "match", 30), "short match here");
        let line = format!("{}needle{}", "a".repeat(40), "b".repeat(40));
        let m = matched_text(&line, "NEEDLE", 30);
        assert_eq!(m, format!("...{}needle{}...", "a".repeat(30), "b".repeat(30)));
        let m = matched_text(&format!("needle{}", "b".repeat(40)), "needle", 30);
        assert!(!m.starts_with("..."));
        assert!(m.ends_with("..."));
        assert_eq!(matched_text("ünïcödé needle", "NEEDLE", 3), "...dé needle");
    }

    #[test]
    fn validation() {
        let cfg = EffectiveConfig::default();
        assert!(q("  ", SearchType::Both).validate(&cfg).is_err());
        assert_eq!(q("x", SearchType::Both).validate(&cfg).unwrap(), 20);
        let mut big = q("x", SearchType::Both);
        big.limit = Some(51);
        assert!(big.validate(&cfg).is_err());
        big.limit = Some(0);
        assert!(big.validate(&cfg).is_err());
        assert_eq!(SearchType::parse(Some("content")).unwrap(), SearchType::Content);
        assert!(SearchType::parse(Some("regex")).is_err());
    }

    #[test]
    fn exact_filename_outranks_substring() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("roadmap"), "x").unwrap();
        fs::write(tmp.path().join("old-roadmap-archive.md"), "x").unwrap();
        let out = search(tmp.path(), &q("ROADMAP", SearchType::Filename), &EffectiveConfig::default()).unwrap();
        assert_eq!(out.total_count, 2);
        assert_eq!(out.results[0].path, "roadmap");
        assert!(out.results[0].score > out.results[1].score);
    }

    #[test]
    fn content_hits_and_limit() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("docs")).unwrap();
        fs::write(tmp.path().join("docs/a.md"), "intro\nthe deploy step\nnothing\nDeploy again\n").unwrap();
        fs::write(tmp.path().join("logo.png"), [0xffu8, 0xfe, 0x00, b'd']).unwrap();
        let out = search(tmp.path(), &q("deploy", SearchType::Content), &EffectiveConfig::default()).unwrap();
        assert_eq!(out.total_count, 2);
        let first = &out.results[0];
        assert_eq!(first.kind, HitKind::Content);
        assert_eq!(first.path, "docs/a.md");
        assert_eq!(first.line, Some(2));
        assert_eq!(first.content.as_deref(), Some("the deploy step"));

        let mut limited = q("deploy", SearchType::Both);
        limited.limit = Some(1);
        let out = search(tmp.path(), &limited, &EffectiveConfig::default()).unwrap();
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.total_count, 2);
    }

    #[test]
    fn hit_serializes_with_type_and_matched_text() {
        let hit = SearchHit {
            kind: HitKind::Content,
            path: "a.md".into(),
            filename: "a.md".into(),
            line: Some(3),
            content: Some("x".into()),
            matched_text: Some("x".into()),
            score: 20,
        };
        let v = serde_json::to_value(&hit).unwrap();
        assert_eq!(v["type"], "content");
        assert_eq!(v["matchedText"], "x");
        let file = SearchHit { kind: HitKind::File, line: None, content: None, matched_text: None, ..hit };
        let v = serde_json::to_value(&file).unwrap();
        assert!(v.get("line").is_none());
    }
}
