//! Metadata recorded next to the IR.
//!
//! Later phases never re-derive names from declarations: they read what the
//! earlier phase recorded here.

use indexmap::IndexMap;
use serde::Serialize;

use crate::domain::{
    CrudId, EntityId, LinkDirection, LinkType, Multiplicity, RelationId, RepositoryId, UsecaseId,
    ValidationRule,
};
use crate::ir::{
    AliasId, EnumId, FunctionId, InterfaceId, MethodSignature, Package, StructId, Type,
};

// ── Entities ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldOrigin {
    /// id, createdAt, updatedAt, deletedAt.
    Default,
    Declared,
    /// The `active` flag of an activable entity.
    Activable,
    /// Foreign key or association added by a relation.
    Relation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelField {
    /// Go field name.
    pub name: String,
    pub json: String,
    /// Storage column; `None` for associations.
    pub column: Option<String>,
    pub ty: Type,
    pub origin: FieldOrigin,
    pub rules: Vec<ValidationRule>,
    /// Usable in where and order-by clauses.
    pub queryable: bool,
    /// Foreign key scoping a `uniqueIn` rule, as an index into
    /// [`EntityModel::foreign_keys`].
    pub unique_scope: Option<usize>,
}

impl ModelField {
    pub fn is_unique(&self) -> bool {
        self.rules.iter().any(ValidationRule::is_uniqueness)
    }

    pub fn scope_name(&self) -> Option<&str> {
        self.rules.iter().find_map(|r| match r {
            ValidationRule::UniqueIn(scope) => Some(scope.as_str()),
            _ => None,
        })
    }
}

/// A key column held by this entity for one relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub relation: RelationId,
    pub target: EntityId,
    pub field: String,
    pub json: String,
    pub column: String,
    pub optional: bool,
    /// The relation is `belongsTo`/`subresourcesOf`.
    pub dependency: bool,
}

/// An association field: pointer for a single link, slice for a multiple one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub relation: RelationId,
    pub target: EntityId,
    pub field: String,
    /// Name of one element, used in method names (`AddInvoiceTag`).
    pub singular: String,
    pub json: String,
    pub link_type: LinkType,
    pub multiplicity: Multiplicity,
    pub direction: LinkDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityModel {
    pub entity: EntityId,
    pub struct_id: StructId,
    /// Go type name, `InvoiceLine`.
    pub name: String,
    /// `InvoiceLines`.
    pub plural: String,
    /// `invoiceLine`.
    pub local: String,
    /// `invoiceLines`.
    pub local_plural: String,
    pub table: String,
    /// URL segment, `invoice-lines`.
    pub route: String,
    pub go_stem: String,
    pub sdk_stem: String,
    pub activable: bool,
    pub archivable: bool,
    /// Whether reads offer the retrieve-inactive override.
    pub retrieve_inactive: bool,
    pub fields: Vec<ModelField>,
    pub foreign_keys: Vec<ForeignKey>,
    pub associations: Vec<Association>,
}

impl EntityModel {
    pub fn declared_fields(&self) -> impl Iterator<Item = &ModelField> {
        self.fields
            .iter()
            .filter(|f| f.origin == FieldOrigin::Declared)
    }

    pub fn field(&self, name: &str) -> Option<&ModelField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Columns that can be filtered and ordered on: scalar fields, then
    /// held foreign keys.
    pub fn queryable_columns(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .fields
            .iter()
            .filter(|f| f.queryable)
            .filter_map(|f| f.column.clone().map(|c| (f.name.clone(), c)))
            .collect();
        out.extend(
            self.foreign_keys
                .iter()
                .map(|fk| (fk.field.clone(), fk.column.clone())),
        );
        out
    }

    pub fn entity_type(&self, entities: &Package) -> Type {
        Type::entity(self.entity, entities, self.name.clone())
    }

    pub fn foreign_key(&self, relation: RelationId) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.relation == relation)
    }

    /// Whether a Go field name is already taken.
    pub fn has_name(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
            || self.foreign_keys.iter().any(|fk| fk.field == name)
            || self.associations.iter().any(|a| a.field == name)
    }

    /// `base`, or `base2`, `base3`... whichever is free.
    pub fn unique_name(&self, base: &str) -> String {
        if !self.has_name(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base}{n}"))
            .find(|candidate| !self.has_name(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

// ── Repositories ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RepoMethodKind {
    Get,
    List,
    Create,
    Update,
    Delete,
    Add,
    Remove,
    ListAssociated,
}

/// One field of a method context, with its option constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OptionKind {
    By,
    Not,
    Tx,
    Pagination,
    Ordering,
    RetrieveInactive,
}

impl OptionKind {
    pub const ALL: [OptionKind; 6] = [
        Self::By,
        Self::Not,
        Self::Tx,
        Self::Pagination,
        Self::Ordering,
        Self::RetrieveInactive,
    ];

    /// Context field and constructor suffix.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::By => "By",
            Self::Not => "Not",
            Self::Tx => "Tx",
            Self::Pagination => "Pagination",
            Self::Ordering => "Ordering",
            Self::RetrieveInactive => "RetrieveInactive",
        }
    }
}

/// A where/order-by column and its enum variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub field: String,
    pub column: String,
    pub where_variant: String,
    pub order_variant: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepoMethod {
    pub kind: RepoMethodKind,
    pub name: String,
    pub context: StructId,
    pub context_name: String,
    pub option: AliasId,
    pub option_name: String,
    pub constructors: IndexMap<OptionKind, (FunctionId, String)>,
    pub new_context: FunctionId,
    pub new_context_name: String,
    pub signature: MethodSignature,
    /// Index into the entity's associations for association methods.
    pub association: Option<usize>,
}

impl RepoMethod {
    pub fn constructor(&self, kind: OptionKind) -> Option<&str> {
        self.constructors.get(&kind).map(|(_, name)| name.as_str())
    }

    pub fn has_option(&self, kind: OptionKind) -> bool {
        self.constructors.contains_key(&kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryModel {
    pub entity: EntityId,
    pub repository: RepositoryId,
    pub interface: InterfaceId,
    pub name: String,
    pub where_enum: EnumId,
    pub where_name: String,
    pub order_enum: EnumId,
    pub order_name: String,
    pub columns: Vec<ColumnRef>,
    pub methods: Vec<RepoMethod>,
    pub associations_enabled: bool,
}

impl RepositoryModel {
    pub fn method(&self, kind: RepoMethodKind) -> Option<&RepoMethod> {
        self.methods
            .iter()
            .find(|m| m.kind == kind && m.association.is_none())
    }

    pub fn association_method(&self, kind: RepoMethodKind, association: usize) -> Option<&RepoMethod> {
        self.methods
            .iter()
            .find(|m| m.kind == kind && m.association == Some(association))
    }

    pub fn column(&self, field: &str) -> Option<&ColumnRef> {
        self.columns.iter().find(|c| c.field == field)
    }
}

// ── Use cases ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CrudAction {
    Get,
    GetActive,
    List,
    ListActive,
    Create,
    Update,
    Delete,
    Add,
    Remove,
    ListRelated,
}

impl CrudAction {
    /// Policy key, as written in declarations.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::GetActive => "getActive",
            Self::List => "list",
            Self::ListActive => "listActive",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::ListRelated => "listRelated",
        }
    }

    pub const fn is_active_variant(&self) -> bool {
        matches!(self, Self::GetActive | Self::ListActive)
    }

    pub const fn is_relation(&self) -> bool {
        matches!(self, Self::Add | Self::Remove | Self::ListRelated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsecaseMethod {
    pub action: CrudAction,
    pub name: String,
    pub function: FunctionId,
    pub request: StructId,
    pub request_name: String,
    pub response: StructId,
    pub response_name: String,
    pub association: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsecaseModel {
    pub entity: EntityId,
    pub crud: CrudId,
    pub struct_id: StructId,
    pub name: String,
    pub constructor_name: String,
    /// Entities whose repositories the use case holds, own entity first.
    pub dependencies: Vec<EntityId>,
    pub methods: Vec<UsecaseMethod>,
}

impl UsecaseModel {
    pub fn method(&self, action: CrudAction) -> Option<&UsecaseMethod> {
        self.methods.iter().find(|m| m.action == action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomMethod {
    pub usecase: UsecaseId,
    pub name: String,
    /// URL segment, `close-month`.
    pub route: String,
    pub request: StructId,
    pub request_name: String,
    pub response: StructId,
    pub response_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomModel {
    pub interface: InterfaceId,
    pub name: String,
    pub methods: Vec<CustomMethod>,
}
