//! Input file discovery.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::EngineError;

/// Recursively collects every file under `root`, depth-unbounded, sorted
/// for a stable submission order. Symlinks are followed; walkdir's ancestor
/// check stops cycles. Unreadable entries are logged and skipped. A missing
/// or non-directory root is an error, while an empty directory is a valid
/// empty result.
pub fn discover_instances(root: &Path) -> Result<Vec<PathBuf>, EngineError> {
    if !root.is_dir() {
        return Err(EngineError::InputRoot(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        match entry {
            Ok(e) if e.file_type().is_file() => files.push(e.into_path()),
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable entry under {}: {}", root.display(), e),
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn finds_nested_files_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub/deep")).unwrap();
        fs::write(dir.path().join("b.txt"), "x").unwrap();
        fs::write(dir.path().join("sub/a.txt"), "x").unwrap();
        fs::write(dir.path().join("sub/deep/c.txt"), "x").unwrap();

        let files = discover_instances(dir.path()).unwrap();
        assert_eq!(files.len(), 3);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn directories_are_not_listed() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("only/dirs/here")).unwrap();
        let files = discover_instances(dir.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn empty_root_is_valid() {
        let dir = TempDir::new().unwrap();
        assert!(discover_instances(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = discover_instances(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, EngineError::InputRoot(_)), "got: {err}");
    }

    #[test]
    fn file_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        let err = discover_instances(&file).unwrap_err();
        assert!(matches!(err, EngineError::InputRoot(_)), "got: {err}");
    }
}
