use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::paths::matches_file_types;

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}

/// Regular files under `root` in file-name order. `.git` is never entered; other
/// dot-entries are skipped unless `include_hidden`. Unreadable entries are logged and skipped.
pub fn walk_files<'a>(root: &'a Path, include_hidden: bool, file_types: &'a [String]) -> impl Iterator<Item = PathBuf> + 'a {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |e| {
            if e.depth() == 0 {
                return true;
            }
            if e.file_name() == ".git" {
                return false;
            }
            include_hidden || !is_hidden(e)
        })
        .filter_map(|res| match res {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::debug!(target: "filestore", error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(move |e| matches_file_types(e.path(), file_types))
        .map(DirEntry::into_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn skips_git_and_hidden() {
        let tmp = tempfile::tempdir().unwrap();
        let r = tmp.path();
        fs::create_dir_all(r.join(".git/objects")).unwrap();
        fs::create_dir_all(r.join(".hidden")).unwrap();
        fs::create_dir_all(r.join("notes")).unwrap();
        fs::write(r.join(".git/HEAD"), "ref").unwrap();
        fs::write(r.join(".hidden/a.md"), "x").unwrap();
        fs::write(r.join(".dotfile.md"), "x").unwrap();
        fs::write(r.join("notes/b.md"), "x").unwrap();
        fs::write(r.join("a.txt"), "x").unwrap();

        let names = |hidden: bool, types: &[String]| -> Vec<String> {
            walk_files(r, hidden, types)
                .map(|p| p.strip_prefix(r).unwrap().to_string_lossy().replace('\\', "/"))
                .collect()
        };
        assert_eq!(names(false, &[]), vec!["a.txt", "notes/b.md"]);
        assert_eq!(names(true, &[]), vec![".dotfile.md", ".hidden/a.md", "a.txt", "notes/b.md"]);
        assert_eq!(names(false, &["md".to_string()]), vec!["notes/b.md"]);
    }
}
