//! Declaration types: the builder's input.
//!
//! These mirror the declaration file format one-to-one and are deserialized
//! directly by the loader. Keys are camelCase; snake_case aliases are
//! accepted for multi-word keys.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{RelationKind, RuleValue};

/// A complete domain: everything one generator run consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainDeclaration {
    #[serde(default)]
    pub project: ProjectDeclaration,
    #[serde(default)]
    pub entities: Vec<EntityDeclaration>,
    #[serde(default)]
    pub relations: Vec<RelationDeclaration>,
    #[serde(default)]
    pub repositories: Vec<RepositoryDeclaration>,
    #[serde(default)]
    pub cruds: Vec<CrudDeclaration>,
    #[serde(default)]
    pub usecases: Vec<CustomUsecaseDeclaration>,
}

impl DomainDeclaration {
    /// Append another declaration's contents.
    ///
    /// The project module of `other` wins when set.
    pub fn merge(&mut self, other: DomainDeclaration) {
        if other.project.module.is_some() {
            self.project.module = other.project.module;
        }
        self.entities.extend(other.entities);
        self.relations.extend(other.relations);
        self.repositories.extend(other.repositories);
        self.cruds.extend(other.cruds);
        self.usecases.extend(other.usecases);
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.usecases.is_empty()
    }
}

/// `[project]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDeclaration {
    /// Go module path, e.g. `github.com/acme/shop`.
    #[serde(default)]
    pub module: Option<String>,
}

/// One `[[entities]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDeclaration {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
    /// Rows carry an `active` flag and reads filter inactive rows by default.
    #[serde(default)]
    pub activable: bool,
    /// Rows are soft-deleted through `deletedAt`.
    #[serde(default)]
    pub archivable: bool,
}

impl EntityDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            fields: Vec::new(),
            activable: false,
            archivable: false,
        }
    }

    pub fn field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }

    pub fn activable(mut self) -> Self {
        self.activable = true;
        self
    }

    pub fn archivable(mut self) -> Self {
        self.archivable = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    /// `string`, `int`, `[]string`, or an entity name.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub rules: Vec<RuleDeclaration>,
    #[serde(default)]
    pub doc: Option<String>,
}

impl FieldDeclaration {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            rules: Vec::new(),
            doc: None,
        }
    }

    pub fn rule(mut self, name: &str) -> Self {
        self.rules.push(RuleDeclaration::Bare(name.to_string()));
        self
    }

    pub fn rule_with(mut self, name: &str, value: &str) -> Self {
        self.rules.push(RuleDeclaration::Valued {
            rule: name.to_string(),
            value: Some(RuleValue::Text(value.to_string())),
        });
        self
    }
}

/// A rule as written: `"email"` or `{ rule = "gt", value = "0" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleDeclaration {
    Bare(String),
    Valued {
        rule: String,
        #[serde(default)]
        value: Option<RuleValue>,
    },
}

impl RuleDeclaration {
    pub fn name(&self) -> &str {
        match self {
            Self::Bare(name) => name,
            Self::Valued { rule, .. } => rule,
        }
    }

    pub fn value(&self) -> Option<&RuleValue> {
        match self {
            Self::Bare(_) => None,
            Self::Valued { value, .. } => value.as_ref(),
        }
    }
}

/// One `[[relations]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationDeclaration {
    pub source: String,
    pub target: String,
    pub kind: RelationKind,
    /// Only the source gets a link.
    #[serde(default, alias = "ignore_reverse")]
    pub ignore_reverse: bool,
}

impl RelationDeclaration {
    pub fn new(source: impl Into<String>, kind: RelationKind, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            ignore_reverse: false,
        }
    }

    pub fn ignore_reverse(mut self) -> Self {
        self.ignore_reverse = true;
        self
    }
}

fn enabled() -> bool {
    true
}

/// One `[[repositories]]` entry. Every method is enabled unless turned off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDeclaration {
    pub entity: String,
    #[serde(default = "enabled")]
    pub get: bool,
    #[serde(default = "enabled")]
    pub list: bool,
    #[serde(default = "enabled")]
    pub create: bool,
    #[serde(default = "enabled")]
    pub update: bool,
    #[serde(default = "enabled")]
    pub delete: bool,
    /// Add/Remove/List methods for to-many relations.
    #[serde(default = "enabled")]
    pub associations: bool,
}

impl RepositoryDeclaration {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            get: true,
            list: true,
            create: true,
            update: true,
            delete: true,
            associations: true,
        }
    }
}

/// One `[[cruds]]` entry. Every action is off unless turned on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrudDeclaration {
    pub entity: String,
    #[serde(default)]
    pub get: bool,
    #[serde(default, alias = "get_active")]
    pub get_active: bool,
    #[serde(default)]
    pub list: bool,
    #[serde(default, alias = "list_active")]
    pub list_active: bool,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub update: bool,
    #[serde(default)]
    pub delete: bool,
    #[serde(default)]
    pub relations: Vec<CrudRelationDeclaration>,
}

impl CrudDeclaration {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Self::default()
        }
    }

    /// Every base action enabled, no active variants.
    pub fn all(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            get: true,
            list: true,
            create: true,
            update: true,
            delete: true,
            ..Self::default()
        }
    }
}

/// Relation sub-actions inside a CRUD policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrudRelationDeclaration {
    /// The related entity.
    pub target: String,
    #[serde(default)]
    pub add: bool,
    #[serde(default)]
    pub remove: bool,
    #[serde(default)]
    pub list: bool,
}

/// One `[[usecases]]` entry: a hand-implemented operation with a generated
/// contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomUsecaseDeclaration {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub request: Vec<FieldDeclaration>,
    #[serde(default)]
    pub response: Vec<FieldDeclaration>,
}
