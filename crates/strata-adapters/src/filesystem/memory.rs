//! In-memory filesystem adapter for testing and dry runs.

use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use strata_core::application::{ApplicationError, ports::Filesystem};
use strata_core::error::StrataResult;

/// In-memory filesystem. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, String>,
    directories: HashSet<PathBuf>,
    /// Writes under these paths fail.
    read_only: Vec<PathBuf>,
}

fn poisoned(path: &Path) -> ApplicationError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: "in-memory filesystem lock poisoned".into(),
    }
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes under `path` fail, to exercise rollback.
    pub fn deny_writes_under(&self, path: impl Into<PathBuf>) {
        if let Ok(mut inner) = self.inner.write() {
            inner.read_only.push(path.into());
        }
    }

    pub fn read_file(&self, path: &Path) -> Option<String> {
        let inner = self.inner.read().ok()?;
        inner.files.get(path).cloned()
    }

    /// Every file, sorted by path.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Filesystem for MemoryFilesystem {
    fn create_dir_all(&self, path: &Path) -> StrataResult<()> {
        let mut inner = self.inner.write().map_err(|_| poisoned(path))?;
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            inner.directories.insert(current.clone());
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, content: &str) -> StrataResult<()> {
        let mut inner = self.inner.write().map_err(|_| poisoned(path))?;

        if inner.read_only.iter().any(|p| path.starts_with(p)) {
            return Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "Permission denied".into(),
            }
            .into());
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !inner.directories.contains(parent) {
                return Err(ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "Parent directory does not exist".into(),
                }
                .into());
            }
        }

        inner.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.read().is_ok_and(|inner| {
            inner.files.contains_key(path) || inner.directories.contains(path)
        })
    }

    fn remove_dir_all(&self, path: &Path) -> StrataResult<()> {
        let mut inner = self.inner.write().map_err(|_| poisoned(path))?;
        inner.directories.retain(|p| !p.starts_with(path));
        inner.files.retain(|p, _| !p.starts_with(path));
        Ok(())
    }
}
