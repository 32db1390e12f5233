//! Declaration entities.
//!
//! Declarations are the immutable input of a generator run. They are
//! registered once, assigned an arena id, and never mutated afterwards.

pub mod declaration;

pub use declaration::{
    CrudDeclaration, CrudRelationDeclaration, CustomUsecaseDeclaration, DomainDeclaration,
    EntityDeclaration, FieldDeclaration, ProjectDeclaration, RelationDeclaration,
    RepositoryDeclaration, RuleDeclaration,
};
