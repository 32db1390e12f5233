//! Unified error handling for Strata Core.
//!
//! [`StrataError`] wraps the per-layer errors so callers handle a single type
//! and still get a category and suggestions for every failure.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::builder::BuildError;
use crate::domain::DomainError;
use crate::emit::EmitError;

/// Root error type for Strata Core operations.
#[derive(Debug, Error, Clone)]
pub enum StrataError {
    // ========================================================================
    // Declaration and pipeline errors
    // ========================================================================
    /// A declaration broke a schema rule outside the builder.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// The builder pipeline stopped.
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// A node could not be rendered.
    #[error("Emit error: {0}")]
    Emit(#[from] EmitError),

    // ========================================================================
    // Orchestration errors
    // ========================================================================
    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl StrataError {
    /// User-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Build(e) => e.suggestions(),
            Self::Emit(_) => vec![
                "The generated IR contains a node this target cannot express".into(),
                "Run with --no-sdk to skip the TypeScript output".into(),
            ],
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {message}"),
                "Run 'strata config list' to see the effective values".into(),
            ],
            Self::Internal { .. } => vec![
                "This appears to be a bug in Strata".into(),
                "Please report it with the declaration that triggered it".into(),
            ],
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => e.category().into(),
            Self::Build(e) => e
                .domain_error()
                .map_or(ErrorCategory::Internal, |d| d.category().into()),
            Self::Emit(_) => ErrorCategory::Internal,
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// The declaration error underneath, however deep.
    pub fn domain_error(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(e) => Some(e),
            Self::Build(e) => e.domain_error(),
            _ => None,
        }
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Compatibility,
    NotFound,
    Configuration,
    Internal,
}

impl From<crate::domain::ErrorCategory> for ErrorCategory {
    fn from(category: crate::domain::ErrorCategory) -> Self {
        match category {
            crate::domain::ErrorCategory::Validation => Self::Validation,
            crate::domain::ErrorCategory::Compatibility => Self::Compatibility,
            crate::domain::ErrorCategory::NotFound => Self::NotFound,
            crate::domain::ErrorCategory::Internal => Self::Internal,
        }
    }
}

pub type StrataResult<T> = Result<T, StrataError>;

/// Extension trait for adding context to foreign errors.
pub trait Context<T> {
    fn context(self, msg: impl Into<String>) -> StrataResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> StrataResult<T> {
        self.map_err(|e| StrataError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildPhase;

    #[test]
    fn build_errors_take_the_category_of_their_cause() {
        let err: StrataError = BuildError::Phase {
            phase: BuildPhase::Registration,
            context: "registering relation 'invoice belongsTo ghost'".into(),
            source: DomainError::UnknownEntity {
                name: "ghost".into(),
                context: "relation".into(),
            },
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(matches!(err.domain_error(), Some(DomainError::UnknownEntity { .. })));
    }

    #[test]
    fn ordering_errors_are_internal() {
        let err: StrataError = BuildError::OutOfOrder {
            current: BuildPhase::Registration,
            requested: BuildPhase::Entities,
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn context_wraps_foreign_errors() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::other("disk on fire"));
        let err = result.context("writing the tree").unwrap_err();
        assert!(err.to_string().contains("writing the tree: disk on fire"));
    }
}
