//! Domain value objects: relation kinds, multiplicities, field types and
//! validation rules.
//!
//! These are pure value types with equality-by-value and no identity. Each
//! has a canonical string form and a parser.

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── RelationKind ─────────────────────────────────────────────────────────────

/// Declared kind of a relation between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
    BelongsTo,
    SubresourcesOf,
}

impl RelationKind {
    pub const ALL: [RelationKind; 6] = [
        Self::OneToOne,
        Self::OneToMany,
        Self::ManyToOne,
        Self::ManyToMany,
        Self::BelongsTo,
        Self::SubresourcesOf,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OneToOne => "oneToOne",
            Self::OneToMany => "oneToMany",
            Self::ManyToOne => "manyToOne",
            Self::ManyToMany => "manyToMany",
            Self::BelongsTo => "belongsTo",
            Self::SubresourcesOf => "subresourcesOf",
        }
    }

    /// The source cannot exist without a resolvable target.
    pub const fn is_dependency(&self) -> bool {
        matches!(self, Self::BelongsTo | Self::SubresourcesOf)
    }

    /// Multiplicity seen from the source, then from the target.
    pub const fn multiplicities(&self) -> (Multiplicity, Multiplicity) {
        match self {
            Self::BelongsTo | Self::SubresourcesOf => {
                (Multiplicity::SingleMandatory, Multiplicity::Multiple)
            }
            Self::ManyToOne | Self::OneToOne => {
                (Multiplicity::SingleOptional, Multiplicity::SingleOptional)
            }
            Self::OneToMany => (Multiplicity::Multiple, Multiplicity::SingleOptional),
            Self::ManyToMany => (Multiplicity::Multiple, Multiplicity::Multiple),
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.replace(['_', '-'], "").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| {
                DomainError::InvalidDeclaration(format!("unknown relation kind '{s}'"))
            })
    }
}

// ── Multiplicity ─────────────────────────────────────────────────────────────

/// How many related rows one side of a relation sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Multiplicity {
    SingleMandatory,
    SingleOptional,
    Multiple,
}

impl Multiplicity {
    pub const fn is_single(&self) -> bool {
        !matches!(self, Self::Multiple)
    }

    pub const fn is_optional(&self) -> bool {
        matches!(self, Self::SingleOptional)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SingleMandatory => "single-mandatory",
            Self::SingleOptional => "single-optional",
            Self::Multiple => "multiple",
        }
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── LinkType ─────────────────────────────────────────────────────────────────

/// Edge type in the relation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkType {
    /// Structural dependency: the linked entity must exist.
    Depend,
    One,
    Many,
}

impl LinkType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Depend => "DEPEND",
            Self::One => "ONE",
            Self::Many => "MANY",
        }
    }

    pub const fn from_multiplicity(multiplicity: Multiplicity, dependency: bool) -> Self {
        match multiplicity {
            Multiplicity::Multiple => Self::Many,
            Multiplicity::SingleMandatory if dependency => Self::Depend,
            _ => Self::One,
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a link follows the declared relation or mirrors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkDirection {
    Forward,
    Reverse,
}

// ── ScalarType ───────────────────────────────────────────────────────────────

/// Primitive field types accepted in declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    String,
    Int,
    Int64,
    Float,
    Bool,
    Time,
}

impl ScalarType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Int64 => "int64",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Time => "time",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "text" => Some(Self::String),
            "int" | "integer" => Some(Self::Int),
            "int64" | "long" => Some(Self::Int64),
            "float" | "float64" | "number" => Some(Self::Float),
            "bool" | "boolean" => Some(Self::Bool),
            "time" | "datetime" | "timestamp" => Some(Self::Time),
            _ => None,
        }
    }

    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Int64 | Self::Float)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── FieldType ────────────────────────────────────────────────────────────────

/// Parsed shape of a declared field type.
///
/// `[]T` is a list; a bare word that is not a primitive is an entity
/// reference, resolved once every entity is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Scalar(ScalarType),
    Array(Box<FieldType>),
    Reference(String),
}

impl FieldType {
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if let Some(inner) = trimmed.strip_prefix("[]") {
            return Self::Array(Box::new(Self::parse(inner)));
        }
        match ScalarType::parse(trimmed) {
            Some(scalar) => Self::Scalar(scalar),
            None => Self::Reference(trimmed.to_string()),
        }
    }

    /// The innermost non-array type.
    pub fn element(&self) -> &FieldType {
        match self {
            Self::Array(inner) => inner.element(),
            other => other,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Array(inner) => write!(f, "[]{inner}"),
            Self::Reference(name) => f.write_str(name),
        }
    }
}

// ── ValidationRule ───────────────────────────────────────────────────────────

/// Raw value attached to a rule in a declaration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl RuleValue {
    fn describe(&self) -> &'static str {
        match self {
            Self::Text(_) => "a string",
            Self::Number(_) => "a number",
            Self::Bool(_) => "a boolean",
        }
    }
}

/// A validated rule from the fixed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValidationRule {
    Required,
    Email,
    Gt(String),
    Gte(String),
    Lt(String),
    Lte(String),
    Uuid,
    HexColor,
    Unique,
    /// Unique among rows sharing the same related entity.
    UniqueIn(String),
}

impl ValidationRule {
    /// Parse a rule name and optional value.
    ///
    /// `owner` and `field` only label the error.
    pub fn parse(
        owner: &str,
        field: &str,
        name: &str,
        value: Option<&RuleValue>,
    ) -> Result<Self, DomainError> {
        let invalid = |reason: String| DomainError::InvalidRuleValue {
            owner: owner.to_string(),
            field: field.to_string(),
            rule: name.to_string(),
            reason,
        };

        let text = |value: Option<&RuleValue>| -> Result<String, DomainError> {
            match value {
                Some(RuleValue::Text(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
                Some(RuleValue::Text(_)) => Err(invalid("requires a non-empty value".into())),
                Some(other) => Err(invalid(format!(
                    "requires a string value, got {}",
                    other.describe()
                ))),
                None => Err(invalid("requires a string value".into())),
            }
        };

        let bare = |rule: ValidationRule| -> Result<ValidationRule, DomainError> {
            match value {
                None => Ok(rule),
                Some(v) => Err(invalid(format!("takes no value, got {}", v.describe()))),
            }
        };

        match name {
            "required" => bare(Self::Required),
            "email" => bare(Self::Email),
            "uuid" => bare(Self::Uuid),
            "hexcolor" => bare(Self::HexColor),
            "unique" => bare(Self::Unique),
            "gt" => Ok(Self::Gt(text(value)?)),
            "gte" => Ok(Self::Gte(text(value)?)),
            "lt" => Ok(Self::Lt(text(value)?)),
            "lte" => Ok(Self::Lte(text(value)?)),
            "uniqueIn" | "unique_in" | "uniquein" => Ok(Self::UniqueIn(text(value)?)),
            other => Err(DomainError::UnknownRule {
                owner: owner.to_string(),
                field: field.to_string(),
                rule: other.to_string(),
            }),
        }
    }

    /// Tag fragment for the request validator, if the rule is checked there.
    ///
    /// Uniqueness needs the repository and is synthesized as a precondition.
    pub fn validator_tag(&self) -> Option<String> {
        match self {
            Self::Required => Some("required".into()),
            Self::Email => Some("email".into()),
            Self::Gt(v) => Some(format!("gt={v}")),
            Self::Gte(v) => Some(format!("gte={v}")),
            Self::Lt(v) => Some(format!("lt={v}")),
            Self::Lte(v) => Some(format!("lte={v}")),
            Self::Uuid => Some("uuid".into()),
            Self::HexColor => Some("hexcolor".into()),
            Self::Unique | Self::UniqueIn(_) => None,
        }
    }

    pub fn is_uniqueness(&self) -> bool {
        matches!(self, Self::Unique | Self::UniqueIn(_))
    }
}
