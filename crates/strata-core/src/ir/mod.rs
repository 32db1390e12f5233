//! Intermediate representation.
//!
//! The builder produces IR; the emitters turn it into text. Nothing in here
//! knows about declarations beyond the [`EntityId`](crate::domain::EntityId)
//! carried by entity type references.

pub mod file;
pub mod nodes;
pub mod package;
pub mod store;
pub mod types;

pub use file::{EmittableFile, FileSet};
pub use nodes::{
    Body, Const, Enum, EnumVariant, Field, Function, Interface, MethodSignature, Param, Receiver,
    Rendered, Snippet, Struct, Tag, TypeAlias, TypeParam, Var,
};
pub use package::{Dialect, Package, RenderContext, std_packages};
pub use store::{
    AliasId, ConstId, EnumId, FunctionId, InterfaceId, IrStore, NodeKind, NodeRef, StructId, VarId,
};
pub use types::{EntityType, FuncType, Primitive, Type, TypeName};
