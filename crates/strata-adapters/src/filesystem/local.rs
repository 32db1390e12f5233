//! Local filesystem adapter using std::fs.

use std::io;
use std::path::Path;

use strata_core::application::{ApplicationError, ports::Filesystem};
use strata_core::error::{StrataError, StrataResult};
use tracing::trace;

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

impl Filesystem for LocalFilesystem {
    fn create_dir_all(&self, path: &Path) -> StrataResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn write_file(&self, path: &Path, content: &str) -> StrataResult<()> {
        trace!(path = %path.display(), bytes = content.len(), "Writing file");
        std::fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_dir_all(&self, path: &Path) -> StrataResult<()> {
        std::fs::remove_dir_all(path).map_err(|e| map_io_error(path, e, "remove directory"))
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> StrataError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {operation}: {e}"),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_nested_files() {
        let root = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        let dir = root.path().join("internal/entities");
        fs.create_dir_all(&dir).unwrap();
        fs.write_file(&dir.join("tag.go"), "package entities\n").unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.join("tag.go")).unwrap(),
            "package entities\n"
        );
        assert!(fs.exists(&dir));
    }

    #[test]
    fn write_into_missing_directory_names_the_path() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("missing/tag.go");
        let err = LocalFilesystem::new().write_file(&path, "").unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn remove_clears_the_tree() {
        let root = TempDir::new().unwrap();
        let out = root.path().join("out");
        let fs = LocalFilesystem::new();
        fs.create_dir_all(&out.join("sdk")).unwrap();
        fs.write_file(&out.join("sdk/client.ts"), "").unwrap();
        fs.remove_dir_all(&out).unwrap();
        assert!(!fs.exists(&out));
    }
}
