use std::fs;
use std::path::Path;

use crate::instance::{LoadError, ProblemInstance};

/// Turns a raw input file into an in-memory [`ProblemInstance`].
///
/// The produced instance is treated as read-only by everything downstream.
pub trait InstanceLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<ProblemInstance, LoadError>;
}

/// Default loader for the edge-list text format, naming the instance after
/// the file stem.
#[derive(Debug, Default, Clone)]
pub struct EdgeListLoader;

impl InstanceLoader for EdgeListLoader {
    fn load(&self, path: &Path) -> Result<ProblemInstance, LoadError> {
        let text = fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        ProblemInstance::parse(name, &text)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;

    fn write_instance(dir: &TempDir, file: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(file);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(text.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_and_names_after_stem() {
        let dir = TempDir::new().unwrap();
        let path = write_instance(&dir, "tiny.txt", "p 2 1\ne 1 2\n");
        let inst = EdgeListLoader.load(&path).unwrap();
        assert_eq!(inst.name(), "tiny");
        assert_eq!(inst.edge_count(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = EdgeListLoader.load(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)), "got: {err}");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_instance(&dir, "bad.txt", "p 2 1\ne 1 nine\n");
        let err = EdgeListLoader.load(&path).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }), "got: {err}");
    }
}
