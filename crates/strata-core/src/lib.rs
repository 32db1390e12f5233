//! Strata Core - schema-driven backend and SDK compiler.
//!
//! Turns a domain declaration into a Go backend (entities, repositories,
//! use cases, gorm adapter, HTTP controllers) and a TypeScript SDK.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           strata-cli (CLI)              │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │   (GenerateService, InspectService)     │
//! └──────────────────┬──────────────────────┘
//!                    │ drives
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │   Builder → IR → Emitters (Go, TS)      │
//! └──────────────────┬──────────────────────┘
//!                    │ reads
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │   Domain (declarations, relation graph) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Filesystem and formatter access go through the ports in
//! [`application::ports`]; `strata-adapters` implements them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use strata_core::prelude::*;
//!
//! let declaration = DomainDeclaration {
//!     entities: vec![EntityDeclaration::new("tag")],
//!     repositories: vec![RepositoryDeclaration::new("tag")],
//!     cruds: vec![CrudDeclaration::all("tag")],
//!     ..DomainDeclaration::default()
//! };
//! let built = DomainBuilder::build(BuildConfig::default(), declaration).unwrap();
//! for file in built.render().unwrap() {
//!     println!("{}", file.path);
//! }
//! ```

pub mod arena;
pub mod domain;
pub mod ir;
pub mod emit;
pub mod builder;

pub mod application;

pub mod error;

pub mod prelude {
    pub use crate::application::{
        GenerateOptions, GenerateService, GeneratedTree, GenerationPlan, GenerationReport,
        GraphReport, InspectService,
        ports::{CodeFormatter, Filesystem},
    };
    pub use crate::builder::{BuildConfig, BuildError, BuildPhase, BuiltDomain, DomainBuilder, Route};
    pub use crate::domain::{
        CrudDeclaration, CrudRelationDeclaration, CustomUsecaseDeclaration, DomainDeclaration,
        DomainError, EntityDeclaration, FieldDeclaration, RelationDeclaration, RelationKind,
        RepositoryDeclaration,
    };
    pub use crate::emit::{EmitError, RenderedFile};
    pub use crate::error::{StrataError, StrataResult};
    pub use crate::ir::Dialect;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
