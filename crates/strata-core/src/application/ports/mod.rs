//! Application ports (traits) for external dependencies.
//!
//! Driven ports only: the application calls them and `strata-adapters`
//! implements them.
//!
//! - `Filesystem`: writing the generated tree
//! - `CodeFormatter`: running `gofmt` and friends over it

pub mod output;

pub use output::{CodeFormatter, Filesystem};

#[cfg(test)]
pub use output::{MockCodeFormatter, MockFilesystem};
