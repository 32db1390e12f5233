//! Application layer for Strata.
//!
//! - **Services**: use case orchestration (`GenerateService`, `InspectService`)
//! - **Ports**: traits for the outside world, implemented in `strata-adapters`
//! - **Errors**: orchestration failures
//!
//! The builder decides what gets generated; this layer only decides where it
//! goes and what happens around the write.

pub mod error;
pub mod ports;
pub mod services;

pub use services::{
    GenerateOptions, GenerateService, GeneratedTree, GenerationPlan, GenerationReport, GraphLink,
    GraphNode, GraphReport, InspectService,
};

pub use ports::{CodeFormatter, Filesystem};

pub use error::ApplicationError;
