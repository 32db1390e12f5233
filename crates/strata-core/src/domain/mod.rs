// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Strata.
//!
//! This module contains the declaration model and the relation graph. It is
//! pure logic: no I/O, no logging, no knowledge of the IR or of any target
//! language.
//!
//! - **Declarations**: what the user wrote (`entities`)
//! - **Registry**: arena ids and name lookup for registered declarations
//! - **Relation graph**: typed links and the derived dependency properties
//! - **Naming**: the pure functions every generated identifier comes from

pub mod entities;
pub mod error;
pub mod graph;
pub mod naming;
pub mod registry;
pub mod value_objects;

mod validation;

pub use entities::{
    CrudDeclaration, CrudRelationDeclaration, CustomUsecaseDeclaration, DomainDeclaration,
    EntityDeclaration, FieldDeclaration, ProjectDeclaration, RelationDeclaration,
    RepositoryDeclaration, RuleDeclaration,
};
pub use error::{DomainError, ErrorCategory};
pub use graph::{JoinPath, JoinStep, RelationGraph, RelationNode, RelationNodeLink};
pub use registry::{
    CrudId, DeclarationRegistry, EntityId, RelationEnds, RelationId, RepositoryId, UsecaseId,
};
pub use validation::{DEFAULT_FIELDS, DeclarationValidator};
pub use value_objects::{
    FieldType, LinkDirection, LinkType, Multiplicity, RelationKind, RuleValue, ScalarType,
    ValidationRule,
};
