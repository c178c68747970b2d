use serde::{Deserialize, Serialize};

/// Global filestore settings applied unless an override is supplied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalFilestoreConfig {
    pub git_probe_timeout_ms: u64,
    pub git_timeout_ms: u64,
    pub git_commit_timeout_ms: u64,

    /// Only the first N lines of a file are scanned for `workspace:`.
    pub workspace_scan_lines: usize,
    /// Cap on total workspace matches across the tree.
    pub workspace_max_matches: usize,
    pub workspace_default_limit: usize,

    pub search_default_limit: usize,
    pub search_max_limit: usize,
    pub search_max_filename_candidates: usize,
    pub search_max_content_matches: usize,
    /// Characters kept on each side of a content match.
    pub search_context_chars: usize,
}

impl Default for GlobalFilestoreConfig {
    fn default() -> Self {
        Self {
            git_probe_timeout_ms: 5_000,
            git_timeout_ms: 10_000,
            git_commit_timeout_ms: 15_000,

            workspace_scan_lines: 10,
            workspace_max_matches: 500,
            workspace_default_limit: 100,

            search_default_limit: 20,
            search_max_limit: 50,
            search_max_filename_candidates: 50,
            search_max_content_matches: 100,
            search_context_chars: 30,
        }
    }
}

/// Per-deployment overrides. Unspecified values inherit from Global.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilestoreConfig {
    pub git_probe_timeout_ms: Option<u64>,
    pub git_timeout_ms: Option<u64>,
    pub git_commit_timeout_ms: Option<u64>,
    pub workspace_max_matches: Option<usize>,
    pub search_max_content_matches: Option<usize>,
}

/// Fully resolved config used during execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EffectiveConfig {
    pub git_probe_timeout_ms: u64,
    pub git_timeout_ms: u64,
    pub git_commit_timeout_ms: u64,

    pub workspace_scan_lines: usize,
    pub workspace_max_matches: usize,
    pub workspace_default_limit: usize,

    pub search_default_limit: usize,
    pub search_max_limit: usize,
    pub search_max_filename_candidates: usize,
    pub search_max_content_matches: usize,
    pub search_context_chars: usize,
}

impl EffectiveConfig {
    pub fn from_layers(global: &GlobalFilestoreConfig, fs: &FilestoreConfig) -> Self {
        Self {
            git_probe_timeout_ms: fs.git_probe_timeout_ms.unwrap_or(global.git_probe_timeout_ms),
            git_timeout_ms: fs.git_timeout_ms.unwrap_or(global.git_timeout_ms),
            git_commit_timeout_ms: fs.git_commit_timeout_ms.unwrap_or(global.git_commit_timeout_ms),
            workspace_scan_lines: global.workspace_scan_lines,
            workspace_max_matches: fs.workspace_max_matches.unwrap_or(global.workspace_max_matches),
            workspace_default_limit: global.workspace_default_limit,
            search_default_limit: global.search_default_limit,
            search_max_limit: global.search_max_limit,
            search_max_filename_candidates: global.search_max_filename_candidates,
            search_max_content_matches: fs.search_max_content_matches.unwrap_or(global.search_max_content_matches),
            search_context_chars: global.search_context_chars,
        }
    }
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self::from_layers(&GlobalFilestoreConfig::default(), &FilestoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_global() {
        let eff = EffectiveConfig::default();
        assert_eq!(eff.git_probe_timeout_ms, 5_000);
        assert_eq!(eff.git_commit_timeout_ms, 15_000);
        assert_eq!(eff.workspace_scan_lines, 10);
        assert_eq!(eff.search_max_limit, 50);
    }

    #[test]
    fn overrides_win() {
        let fs = FilestoreConfig { git_timeout_ms: Some(1_000), workspace_max_matches: Some(3), ..Default::default() };
        let eff = EffectiveConfig::from_layers(&GlobalFilestoreConfig::default(), &fs);
        assert_eq!(eff.git_timeout_ms, 1_000);
        assert_eq!(eff.workspace_max_matches, 3);
        assert_eq!(eff.git_commit_timeout_ms, 15_000);
    }
}
