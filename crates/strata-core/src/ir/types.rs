//! IR type system.
//!
//! A closed sum of type shapes. Every variant can render itself for a
//! [`RenderContext`], list its direct children, and report the packages a
//! reference to it needs imported. `Clone` is a deep copy: no variant shares
//! interior state, so a copied template can be specialized freely.

use crate::domain::{EntityId, ScalarType};
use crate::ir::package::{Dialect, Package, RenderContext, std_packages};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Int,
    Int64,
    Float64,
    Bool,
    Byte,
    Any,
    Error,
    /// `time.Time` in Go, an ISO string in TypeScript.
    Time,
}

impl Primitive {
    fn render(self, ctx: &RenderContext) -> String {
        match ctx.dialect {
            Dialect::Go => match self {
                Self::String => "string".into(),
                Self::Int => "int".into(),
                Self::Int64 => "int64".into(),
                Self::Float64 => "float64".into(),
                Self::Bool => "bool".into(),
                Self::Byte => "byte".into(),
                Self::Any => "any".into(),
                Self::Error => "error".into(),
                Self::Time => ctx.qualify(&std_packages::time(), "Time"),
            },
            Dialect::TypeScript => match self {
                Self::String | Self::Time => "string".into(),
                Self::Int | Self::Int64 | Self::Float64 | Self::Byte => "number".into(),
                Self::Bool => "boolean".into(),
                Self::Any => "unknown".into(),
                Self::Error => "Error".into(),
            },
        }
    }
}

impl From<ScalarType> for Primitive {
    fn from(scalar: ScalarType) -> Self {
        match scalar {
            ScalarType::String => Self::String,
            ScalarType::Int => Self::Int,
            ScalarType::Int64 => Self::Int64,
            ScalarType::Float => Self::Float64,
            ScalarType::Bool => Self::Bool,
            ScalarType::Time => Self::Time,
        }
    }
}

/// A named symbol in a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName {
    pub package: Package,
    pub name: String,
}

impl TypeName {
    pub fn new(package: Package, name: impl Into<String>) -> Self {
        Self {
            package,
            name: name.into(),
        }
    }
}

/// A named function signature, e.g. `type GetInvoiceOption func(*GetInvoiceContext)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncType {
    pub name: String,
    pub params: Vec<Type>,
    pub results: Vec<Type>,
}

impl FuncType {
    /// The literal signature, `func(*GetInvoiceContext)`.
    pub fn render_literal(&self, ctx: &RenderContext) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.render(ctx)).collect();
        let results: Vec<String> = self.results.iter().map(|r| r.render(ctx)).collect();
        match ctx.dialect {
            Dialect::Go => {
                let mut out = format!("func({})", params.join(", "));
                match results.len() {
                    0 => {}
                    1 => {
                        out.push(' ');
                        out.push_str(&results[0]);
                    }
                    _ => out.push_str(&format!(" ({})", results.join(", "))),
                }
                out
            }
            Dialect::TypeScript => {
                let args: Vec<String> = params
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("arg{i}: {p}"))
                    .collect();
                let result = results.first().map_or("void", String::as_str);
                format!("({}) => {}", args.join(", "), result)
            }
        }
    }
}

/// Reference to a generated entity record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityType {
    pub entity: EntityId,
    pub name: TypeName,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(Primitive),
    Array(Box<Type>),
    Map(Box<Type>, Box<Type>),
    /// Pointer in Go, `T | null` in TypeScript.
    Pointer(Box<Type>),
    /// Trailing `...T` parameter.
    Variadic(Box<Type>),
    /// Named alias; always rendered by its bare name.
    Alias(TypeName),
    Enum(TypeName),
    /// Named signature; always rendered by its bare name.
    Func(FuncType),
    /// Any named symbol defined in another file.
    Symbol(TypeName),
    Entity(EntityType),
}

impl Type {
    // ── Constructors ─────────────────────────────────────────────────────

    pub fn string() -> Self {
        Self::Primitive(Primitive::String)
    }

    pub fn int() -> Self {
        Self::Primitive(Primitive::Int)
    }

    pub fn bool() -> Self {
        Self::Primitive(Primitive::Bool)
    }

    pub fn any() -> Self {
        Self::Primitive(Primitive::Any)
    }

    pub fn error() -> Self {
        Self::Primitive(Primitive::Error)
    }

    pub fn time() -> Self {
        Self::Primitive(Primitive::Time)
    }

    pub fn pointer(inner: Type) -> Self {
        Self::Pointer(Box::new(inner))
    }

    pub fn array(inner: Type) -> Self {
        Self::Array(Box::new(inner))
    }

    pub fn map(key: Type, value: Type) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    pub fn variadic(inner: Type) -> Self {
        Self::Variadic(Box::new(inner))
    }

    pub fn symbol(package: &Package, name: impl Into<String>) -> Self {
        Self::Symbol(TypeName::new(package.clone(), name))
    }

    pub fn enumeration(package: &Package, name: impl Into<String>) -> Self {
        Self::Enum(TypeName::new(package.clone(), name))
    }

    pub fn entity(entity: EntityId, package: &Package, name: impl Into<String>) -> Self {
        Self::Entity(EntityType {
            entity,
            name: TypeName::new(package.clone(), name),
        })
    }

    // ── Contract ─────────────────────────────────────────────────────────

    pub fn render(&self, ctx: &RenderContext) -> String {
        match (self, ctx.dialect) {
            (Self::Primitive(p), _) => p.render(ctx),
            (Self::Array(inner), Dialect::Go) => format!("[]{}", inner.render(ctx)),
            (Self::Array(inner), Dialect::TypeScript) => match inner.as_ref() {
                Self::Pointer(_) => format!("({})[]", inner.render(ctx)),
                _ => format!("{}[]", inner.render(ctx)),
            },
            (Self::Map(k, v), Dialect::Go) => format!("map[{}]{}", k.render(ctx), v.render(ctx)),
            (Self::Map(k, v), Dialect::TypeScript) => {
                format!("Record<{}, {}>", k.render(ctx), v.render(ctx))
            }
            (Self::Pointer(inner), Dialect::Go) => format!("*{}", inner.render(ctx)),
            (Self::Pointer(inner), Dialect::TypeScript) => format!("{} | null", inner.render(ctx)),
            (Self::Variadic(inner), Dialect::Go) => format!("...{}", inner.render(ctx)),
            (Self::Variadic(inner), Dialect::TypeScript) => format!("{}[]", inner.render(ctx)),
            (Self::Alias(name), _) => name.name.clone(),
            (Self::Func(func), _) => func.name.clone(),
            (Self::Enum(name) | Self::Symbol(name), _) => ctx.qualify(&name.package, &name.name),
            (Self::Entity(e), _) => ctx.qualify(&e.name.package, &e.name.name),
        }
    }

    /// Direct children.
    pub fn sub_types(&self) -> Vec<&Type> {
        match self {
            Self::Array(inner) | Self::Pointer(inner) | Self::Variadic(inner) => vec![inner],
            Self::Map(k, v) => vec![k, v],
            Self::Func(func) => func.params.iter().chain(&func.results).collect(),
            _ => Vec::new(),
        }
    }

    /// Visit this type and every type below it, depth first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Type)) {
        visit(self);
        for child in self.sub_types() {
            child.walk(visit);
        }
    }

    /// Deep copy.
    pub fn copy(&self) -> Type {
        self.clone()
    }

    /// Packages a reference to this type needs imported.
    ///
    /// Named signatures and aliases render bare, so their contents are not
    /// imported through a reference.
    pub fn packages(&self, dialect: Dialect) -> Vec<Package> {
        let mut out = Vec::new();
        self.collect_packages(dialect, &mut out);
        out
    }

    fn collect_packages(&self, dialect: Dialect, out: &mut Vec<Package>) {
        match self {
            Self::Primitive(Primitive::Time) if dialect == Dialect::Go => {
                out.push(std_packages::time());
            }
            Self::Enum(name) | Self::Symbol(name) => out.push(name.package.clone()),
            Self::Entity(e) => out.push(e.name.package.clone()),
            Self::Func(_) | Self::Alias(_) => {}
            other => {
                for child in other.sub_types() {
                    child.collect_packages(dialect, out);
                }
            }
        }
    }

    /// Rebuild the type with every named reference passed through `f`.
    pub fn map_names(&self, f: &impl Fn(&TypeName) -> TypeName) -> Type {
        match self {
            Self::Primitive(p) => Self::Primitive(*p),
            Self::Array(inner) => Self::array(inner.map_names(f)),
            Self::Map(k, v) => Self::map(k.map_names(f), v.map_names(f)),
            Self::Pointer(inner) => Self::pointer(inner.map_names(f)),
            Self::Variadic(inner) => Self::variadic(inner.map_names(f)),
            Self::Alias(name) => Self::Alias(f(name)),
            Self::Enum(name) => Self::Enum(f(name)),
            Self::Symbol(name) => Self::Symbol(f(name)),
            Self::Func(func) => Self::Func(FuncType {
                name: func.name.clone(),
                params: func.params.iter().map(|p| p.map_names(f)).collect(),
                results: func.results.iter().map(|r| r.map_names(f)).collect(),
            }),
            Self::Entity(e) => Self::Entity(EntityType {
                entity: e.entity,
                name: f(&e.name),
            }),
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::Pointer(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Map(..))
    }

    /// Strip one level of pointer.
    pub fn pointee(&self) -> &Type {
        match self {
            Self::Pointer(inner) => inner,
            other => other,
        }
    }
}
