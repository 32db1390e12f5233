//! Infrastructure adapters for Strata.
//!
//! Implements the ports defined in `strata_core::application::ports` and
//! holds everything that touches the disk or spawns processes.

pub mod declaration_loader;
pub mod filesystem;
pub mod formatter;
pub mod samples;

pub use declaration_loader::{DeclarationFormat, DeclarationLoader};
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use formatter::{CommandFormatter, FormatCommand, NoopFormatter};
