//! Node storage.

use std::fmt;

use serde::Serialize;

use crate::arena::{Arena, Id};
use crate::ir::nodes::{Const, Enum, Function, Interface, Struct, TypeAlias, Var};

pub type StructId = Id<Struct>;
pub type InterfaceId = Id<Interface>;
pub type FunctionId = Id<Function>;
pub type AliasId = Id<TypeAlias>;
pub type EnumId = Id<Enum>;
pub type ConstId = Id<Const>;
pub type VarId = Id<Var>;

/// Reference to any top-level node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Const(ConstId),
    Var(VarId),
    Struct(StructId),
    Interface(InterfaceId),
    Alias(AliasId),
    Enum(EnumId),
    Function(FunctionId),
}

impl NodeRef {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Const(_) => NodeKind::Const,
            Self::Var(_) => NodeKind::Var,
            Self::Struct(_) => NodeKind::Struct,
            Self::Interface(_) => NodeKind::Interface,
            Self::Alias(_) => NodeKind::Alias,
            Self::Enum(_) => NodeKind::Enum,
            Self::Function(_) => NodeKind::Function,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Const,
    Var,
    Struct,
    Interface,
    Alias,
    Enum,
    Function,
    /// A function attached to a struct.
    Method,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Const => "const",
            Self::Var => "var",
            Self::Struct => "struct",
            Self::Interface => "interface",
            Self::Alias => "type alias",
            Self::Enum => "enum",
            Self::Function => "function",
            Self::Method => "method",
        };
        f.write_str(s)
    }
}

/// Arenas for every node kind built during one run.
#[derive(Debug, Default)]
pub struct IrStore {
    pub structs: Arena<Struct>,
    pub interfaces: Arena<Interface>,
    pub functions: Arena<Function>,
    pub aliases: Arena<TypeAlias>,
    pub enums: Arena<Enum>,
    pub consts: Arena<Const>,
    pub vars: Arena<Var>,
}

impl IrStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_struct(&mut self, node: Struct) -> StructId {
        self.structs.alloc(node)
    }

    pub fn add_interface(&mut self, node: Interface) -> InterfaceId {
        self.interfaces.alloc(node)
    }

    pub fn add_function(&mut self, node: Function) -> FunctionId {
        self.functions.alloc(node)
    }

    pub fn add_alias(&mut self, node: TypeAlias) -> AliasId {
        self.aliases.alloc(node)
    }

    pub fn add_enum(&mut self, node: Enum) -> EnumId {
        self.enums.alloc(node)
    }

    pub fn add_const(&mut self, node: Const) -> ConstId {
        self.consts.alloc(node)
    }

    pub fn add_var(&mut self, node: Var) -> VarId {
        self.vars.alloc(node)
    }

    /// Add a method and attach it to its struct.
    pub fn add_method(&mut self, owner: StructId, method: Function) -> FunctionId {
        let id = self.functions.alloc(method);
        self.structs[owner].methods.push(id);
        id
    }

    /// Copy a stored function under a new name, adjust the copy, and store it.
    pub fn specialize(
        &mut self,
        template: FunctionId,
        name: impl Into<String>,
        adjust: impl FnOnce(&mut Function),
    ) -> FunctionId {
        let copy = self.functions[template].specialize(name, adjust);
        self.functions.alloc(copy)
    }

    pub fn name_of(&self, node: NodeRef) -> &str {
        match node {
            NodeRef::Const(id) => &self.consts[id].name,
            NodeRef::Var(id) => &self.vars[id].name,
            NodeRef::Struct(id) => &self.structs[id].name,
            NodeRef::Interface(id) => &self.interfaces[id].name,
            NodeRef::Alias(id) => &self.aliases[id].name,
            NodeRef::Enum(id) => &self.enums[id].name,
            NodeRef::Function(id) => &self.functions[id].name,
        }
    }

    pub fn node_count(&self) -> usize {
        self.structs.len()
            + self.interfaces.len()
            + self.functions.len()
            + self.aliases.len()
            + self.enums.len()
            + self.consts.len()
            + self.vars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::nodes::Body;

    #[test]
    fn methods_attach_to_their_struct() {
        let mut store = IrStore::new();
        let owner = store.add_struct(Struct::new("InvoiceRepository"));
        let method = store.add_method(owner, Function::new("GetInvoice"));

        assert_eq!(store.structs[owner].methods, vec![method]);
        assert_eq!(store.name_of(NodeRef::Function(method)), "GetInvoice");
    }

    #[test]
    fn specialized_copies_are_new_nodes() {
        let mut store = IrStore::new();
        let template = store.add_function(Function::new("Tx").body(Body::fixed("")));
        let copy = store.specialize(template, "GetInvoiceTx", |_| {});

        assert_ne!(template, copy);
        assert_eq!(store.functions[template].name, "Tx");
        assert_eq!(store.functions[copy].name, "GetInvoiceTx");
        assert_eq!(store.node_count(), 2);
    }
}
