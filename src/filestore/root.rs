use anyhow::{bail, Result};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

use super::paths::validate_relative_path;
use crate::error::{AppError, AppResult};

/// The directory (and git working tree) every relative path resolves against.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    abs: PathBuf,
}

/// Normalize a host path to an absolute path without resolving symlinks.
pub fn normalize_abs_path(p: &Path) -> Result<PathBuf> {
    Ok(p.absolutize()?.to_path_buf())
}

impl StorageRoot {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let abs = normalize_abs_path(dir.as_ref())?;
        if !abs.is_dir() {
            bail!("storage directory '{}' does not exist or is not a directory", abs.display());
        }
        Ok(Self { abs })
    }

    pub fn path(&self) -> &Path {
        &self.abs
    }

    /// Join a validated relative path onto the root.
    pub fn resolve(&self, rel: &str) -> AppResult<PathBuf> {
        validate_relative_path(rel)?;
        let joined = self.abs.join(rel);
        let normalized = normalize_abs_path(&joined).map_err(|e| AppError::user("invalid_path", e.to_string()))?;
        // component-wise, so /data/x never matches /data2
        if !normalized.starts_with(&self.abs) {
            return Err(AppError::user("invalid_path", format!("Path '{}' escapes the storage root", rel)));
        }
        Ok(normalized)
    }

    /// Relative, '/'-separated form of a path under the root.
    pub fn relative(&self, abs: &Path) -> Option<String> {
        let rel = abs.strip_prefix(&self.abs).ok()?;
        let parts: Vec<String> = rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }
}
