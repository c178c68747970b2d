//! Workspace index: files grouped by a `workspace:` line near the top of the file.
//! Derived on every call; nothing is cached.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::config::EffectiveConfig;
use super::paths::file_name;
use super::walk::walk_files;

static WORKSPACE_LINE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^workspace:\s*(.+)$").ok());

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceQuery {
    pub limit: Option<usize>,
    pub include_hidden: bool,
    pub file_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceFile {
    pub path: String,
    pub filename: String,
    pub workspace: String,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceGroup {
    pub workspace: String,
    pub files: Vec<WorkspaceFile>,
    /// Group size before the per-group limit.
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceListing {
    pub workspaces: Vec<WorkspaceGroup>,
    pub total_workspaces: usize,
    pub total_files: usize,
}

fn strip_one_quote_layer(v: &str) -> &str {
    for q in ['"', '\'', '`'] {
        if v.len() >= 2 && v.starts_with(q) && v.ends_with(q) {
            return &v[1..v.len() - 1];
        }
    }
    v
}

/// Workspace name declared in one line, if any.
pub fn workspace_of_line(line: &str) -> Option<String> {
    let caps = WORKSPACE_LINE.as_ref()?.captures(line.trim_end_matches('\r'))?;
    let name = strip_one_quote_layer(caps.get(1)?.as_str().trim()).trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// First `workspace:` declaration within the first `max_lines` lines, with its 1-based line number.
fn scan_file(path: &Path, max_lines: usize) -> Option<(String, usize)> {
    let file = File::open(path).ok()?;
    for (idx, line) in BufReader::new(file).lines().take(max_lines).enumerate() {
        // non-UTF-8 content ends the scan for this file
        let line = line.ok()?;
        if let Some(ws) = workspace_of_line(&line) {
            return Some((ws, idx + 1));
        }
    }
    None
}

pub fn list_workspaces(root: &Path, query: &WorkspaceQuery, cfg: &EffectiveConfig) -> WorkspaceListing {
    let limit = query.limit.unwrap_or(cfg.workspace_default_limit);
    let mut matched: Vec<WorkspaceFile> = Vec::new();
    for path in walk_files(root, query.include_hidden, &query.file_types) {
        if matched.len() >= cfg.workspace_max_matches {
            tracing::debug!(target: "filestore", cap = cfg.workspace_max_matches, "workspace match cap reached");
            break;
        }
        let Some((workspace, line)) = scan_file(&path, cfg.workspace_scan_lines) else { continue; };
        let rel = path
            .strip_prefix(root)
            .map(|p| p.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join("/"))
            .unwrap_or_else(|_| path.to_string_lossy().into_owned());
        matched.push(WorkspaceFile { filename: file_name(&rel), path: rel, workspace, line });
    }

    let total_files = matched.len();
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<WorkspaceFile>> = HashMap::new();
    for f in matched {
        if !groups.contains_key(&f.workspace) {
            order.push(f.workspace.clone());
        }
        groups.entry(f.workspace.clone()).or_default().push(f);
    }
    let mut workspaces: Vec<WorkspaceGroup> = order
        .into_iter()
        .filter_map(|name| {
            let mut files = groups.remove(&name)?;
            let count = files.len();
            files.truncate(limit);
            Some(WorkspaceGroup { workspace: name, files, count })
        })
        .collect();
    // stable: ties keep first-seen order
    workspaces.sort_by(|a, b| b.count.cmp(&a.count));

    WorkspaceListing { total_workspaces: workspaces.len(), total_files, workspaces }
}
