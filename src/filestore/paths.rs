use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppError, AppResult};

const BINARY_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "pdf", "zip", "exe", "bin"];
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Validate a repository-relative path:
/// - not empty, no NUL
/// - not absolute (leading '/' or '\\', or a drive prefix such as `C:`)
/// - no segment equal to '..' (both '/' and '\\' count as separators)
pub fn is_safe_path(path: &str) -> bool {
    if path.is_empty() || path.contains('\u{0000}') {
        return false;
    }
    if path.starts_with('/') || path.starts_with('\\') || Path::new(path).is_absolute() {
        return false;
    }
    if has_drive_prefix(path) {
        return false;
    }
    !path.split(|c| c == '/' || c == '\\').any(|seg| seg == "..")
}

fn has_drive_prefix(path: &str) -> bool {
    let b = path.as_bytes();
    b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1] == b':'
}

/// Same rule as [`is_safe_path`], surfaced as a client error.
pub fn validate_relative_path(path: &str) -> AppResult<()> {
    if is_safe_path(path) {
        Ok(())
    } else {
        Err(AppError::user(
            "invalid_path",
            format!("Invalid file path '{}': must be relative and must not contain '..' segments", path),
        ))
    }
}

fn extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn mime_type(path: &str) -> &'static str {
    match extension(path).as_deref() {
        Some("json") => "application/json",
        Some("txt") | Some("log") => "text/plain",
        Some("md") | Some("markdown") => "text/markdown",
        Some("js") => "application/javascript",
        Some("ts") => "application/typescript",
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("xml") => "application/xml",
        Some("csv") => "text/csv",
        Some("yaml") | Some("yml") => "application/x-yaml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

pub fn is_binary(path: &str) -> bool {
    extension(path).map(|e| BINARY_EXTENSIONS.contains(&e.as_str())).unwrap_or(false)
}

pub fn is_markdown(path: &str) -> bool {
    extension(path).map(|e| MARKDOWN_EXTENSIONS.contains(&e.as_str())).unwrap_or(false)
}

/// Base name of a relative path, falling back to the path itself.
pub fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// True when the extension (without dot, case-insensitive) is in `file_types`.
/// An empty filter accepts everything.
pub fn matches_file_types(path: &Path, file_types: &[String]) -> bool {
    if file_types.is_empty() {
        return true;
    }
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else { return false; };
    file_types
        .iter()
        .any(|t| t.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Text,
    Base64,
}

impl Encoding {
    /// Parse the `encoding` request field. `None`, empty and `auto` mean
    /// "choose from the file type".
    pub fn parse_opt(raw: Option<&str>) -> AppResult<Option<Encoding>> {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("auto") => Ok(None),
            Some("text") => Ok(Some(Encoding::Text)),
            Some("base64") => Ok(Some(Encoding::Base64)),
            Some(other) => Err(AppError::user(
                "invalid_encoding",
                format!("Unsupported encoding '{}': use text or base64", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Text => "text",
            Encoding::Base64 => "base64",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_relative_paths() {
        assert!(is_safe_path("notes/today.md"));
        assert!(is_safe_path("a.md"));
        assert!(is_safe_path("./a.md"));
        assert!(is_safe_path("dir/..hidden/file.txt"));
        assert!(is_safe_path("研发/📚Docs/RFC-1.md"));
    }

    #[test]
    fn traversal_and_absolute_rejected() {
        assert!(!is_safe_path(""));
        assert!(!is_safe_path(".."));
        assert!(!is_safe_path("../etc/passwd"));
        assert!(!is_safe_path("a/../../b"));
        assert!(!is_safe_path("a\\..\\b"));
        assert!(!is_safe_path("/etc/passwd"));
        assert!(!is_safe_path("\\server\\share"));
        assert!(!is_safe_path("C:/Windows"));
        assert!(!is_safe_path("a\u{0000}b"));
        assert!(validate_relative_path("../x").is_err());
        assert_eq!(validate_relative_path("../x").unwrap_err().code_str(), "invalid_path");
    }

    #[test]
    fn mime_lookup() {
        assert_eq!(mime_type("README.MD"), "text/markdown");
        assert_eq!(mime_type("a/b.yml"), "application/x-yaml");
        assert_eq!(mime_type("logo.png"), "image/png");
        assert_eq!(mime_type("archive.tar.gz"), "application/octet-stream");
        assert_eq!(mime_type("Makefile"), "application/octet-stream");
    }

    #[test]
    fn binary_and_markdown_classification() {
        assert!(is_binary("photo.JPG"));
        assert!(is_binary("tool.exe"));
        assert!(!is_binary("notes.md"));
        assert!(!is_binary("image.svg"));
        assert!(is_markdown("a.markdown"));
        assert!(is_markdown("A.MD"));
        assert!(!is_markdown("a.txt"));
    }

    #[test]
    fn file_type_filter() {
        let types = vec!["md".to_string(), ".TXT".to_string()];
        assert!(matches_file_types(Path::new("a/b.md"), &types));
        assert!(matches_file_types(Path::new("b.txt"), &types));
        assert!(!matches_file_types(Path::new("b.rs"), &types));
        assert!(!matches_file_types(Path::new("README"), &types));
        assert!(matches_file_types(Path::new("README"), &[]));
    }

    #[test]
    fn encoding_parse() {
        assert_eq!(Encoding::parse_opt(None).unwrap(), None);
        assert_eq!(Encoding::parse_opt(Some("auto")).unwrap(), None);
        assert_eq!(Encoding::parse_opt(Some("BASE64")).unwrap(), Some(Encoding::Base64));
        assert_eq!(Encoding::parse_opt(Some("text")).unwrap(), Some(Encoding::Text));
        assert!(Encoding::parse_opt(Some("utf16")).is_err());
    }
}
