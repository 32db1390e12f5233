//! Driven (output) ports - implemented by infrastructure.

use std::path::{Path, PathBuf};

use crate::error::StrataResult;
use crate::ir::Dialect;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `strata_adapters::filesystem::LocalFilesystem` (production)
/// - `strata_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> StrataResult<()>;

    /// Write content to a file, replacing it.
    fn write_file(&self, path: &Path, content: &str) -> StrataResult<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Remove a directory and all contents.
    fn remove_dir_all(&self, path: &Path) -> StrataResult<()>;
}

/// Port for source formatters.
///
/// `files` are relative to `root` and all belong to `dialect`.
#[cfg_attr(test, mockall::automock)]
pub trait CodeFormatter: Send + Sync {
    fn format(&self, root: &Path, files: &[PathBuf], dialect: Dialect) -> StrataResult<()>;
}
