//! Application layer errors.
//!
//! These errors represent failures in orchestration, not in the declaration.
//! Declaration errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;
use crate::ir::Dialect;

#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// The output root exists and overwriting was not requested.
    #[error("Output directory already exists: {path}")]
    OutputExists { path: PathBuf },

    /// Best-effort cleanup after a failed write failed as well.
    #[error("Rollback failed for {path}: {reason}")]
    RollbackFailed { path: PathBuf, reason: String },

    /// An external formatter exited unsuccessfully or could not start.
    #[error("{dialect} formatter '{command}' failed: {reason}")]
    FormatterFailed {
        dialect: Dialect,
        command: String,
        reason: String,
    },

    /// A declaration file could not be read or parsed.
    #[error("Cannot load declarations from {path}: {reason}")]
    DeclarationLoad { path: PathBuf, reason: String },
}

impl ApplicationError {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::OutputExists { path } => vec![
                format!("Directory already exists: {}", path.display()),
                "Use --force to overwrite the generated files".into(),
                "Or pick another directory with --output".into(),
            ],
            Self::RollbackFailed { path, .. } => vec![format!(
                "Remove {} by hand before generating again",
                path.display()
            )],
            Self::FormatterFailed { command, .. } => vec![
                format!("Check that '{command}' is installed and on PATH"),
                "Use --no-format to skip formatting".into(),
            ],
            Self::DeclarationLoad { .. } => vec![
                "Declarations are TOML or JSON, chosen by file extension".into(),
                "Run 'strata sample' for a working example".into(),
            ],
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FilesystemError { .. } | Self::RollbackFailed { .. } => ErrorCategory::Internal,
            Self::OutputExists { .. } | Self::DeclarationLoad { .. } => ErrorCategory::Validation,
            Self::FormatterFailed { .. } => ErrorCategory::Configuration,
        }
    }
}
