// ============================================================================
// domain/error.rs - DECLARATION SCHEMA AND INVARIANT ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (they are stored as the builder's sticky error)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Schema Errors
    // ========================================================================
    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),

    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Entity '{name}' is declared more than once")]
    DuplicateEntity { name: String },

    #[error("Field '{field}' is declared more than once on entity '{entity}'")]
    DuplicateField { entity: String, field: String },

    #[error("Field '{field}' on entity '{entity}' redefines a reserved default field")]
    ReservedField { entity: String, field: String },

    #[error("Unknown primitive type '{type_name}' for field '{field}' on '{owner}'")]
    UnknownPrimitiveType {
        owner: String,
        field: String,
        type_name: String,
    },

    #[error("Unknown validation rule '{rule}' on field '{owner}.{field}'")]
    UnknownRule {
        owner: String,
        field: String,
        rule: String,
    },

    #[error("Rule '{rule}' on field '{owner}.{field}' {reason}")]
    InvalidRuleValue {
        owner: String,
        field: String,
        rule: String,
        reason: String,
    },

    #[error("'{scope}' is not a relation owned by '{entity}' (uniqueIn on field '{field}')")]
    UnknownUniqueScope {
        entity: String,
        field: String,
        scope: String,
    },

    #[error("Custom use case '{name}' is declared more than once")]
    DuplicateUsecase { name: String },

    #[error("Repository for '{entity}' is declared more than once")]
    DuplicateRepository { entity: String },

    #[error("CRUD policy for '{entity}' is declared more than once")]
    DuplicateCrud { entity: String },

    // ========================================================================
    // Reference Errors
    // ========================================================================
    #[error("Unknown entity '{name}' referenced by {context}")]
    UnknownEntity { name: String, context: String },

    #[error("'{target}' is not related to '{entity}' through a to-many relation")]
    UnrelatedEntity { entity: String, target: String },

    #[error("No repository is declared for entity '{entity}'")]
    MissingRepository { entity: String },

    #[error("Repository for '{entity}' does not enable '{method}'")]
    RepositoryMethodDisabled { entity: String, method: String },

    // ========================================================================
    // Derived Invariant Errors
    // ========================================================================
    #[error("'{action}' requires '{entity}' to be activable")]
    ActiveVariantOnInactivable { entity: String, action: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ReservedField { field, .. } => vec![
                format!("'{field}' is generated for every entity"),
                "Reserved fields: id, createdAt, updatedAt, deletedAt (and active on activable entities)".into(),
                "Rename the field or drop it from the declaration".into(),
            ],
            Self::UnknownPrimitiveType { type_name, .. } => vec![
                format!("'{type_name}' is neither a primitive nor a declared entity"),
                "Primitives: string, int, int64, float, bool, time".into(),
                "Prefix with [] for a list, e.g. []string".into(),
            ],
            Self::UnknownRule { .. } => vec![
                "Known rules: required, email, gt, gte, lt, lte, uuid, hexcolor, unique, uniqueIn"
                    .into(),
            ],
            Self::InvalidRuleValue { rule, .. } => match rule.as_str() {
                "gt" | "gte" | "lt" | "lte" => vec![
                    format!("'{rule}' needs a quoted comparison value"),
                    format!("Example: {{ rule = \"{rule}\", value = \"0\" }}"),
                ],
                "uniqueIn" => vec![
                    "'uniqueIn' needs the name of a related entity".into(),
                    "Example: { rule = \"uniqueIn\", value = \"company\" }".into(),
                ],
                _ => vec![format!("'{rule}' does not take a value")],
            },
            Self::UnknownEntity { name, .. } => vec![
                format!("Declare entity '{name}' or fix the reference"),
                "Entity names are matched case-insensitively across casings".into(),
            ],
            Self::UnrelatedEntity { entity, target } => vec![
                format!("Declare a to-many relation between '{entity}' and '{target}'"),
                "Relation actions need oneToMany, manyToMany, or the reverse side of belongsTo"
                    .into(),
            ],
            Self::MissingRepository { entity } => vec![
                format!("Add a [[repositories]] entry with entity = \"{entity}\""),
                "CRUD policies and dependency checks call the repository".into(),
            ],
            Self::RepositoryMethodDisabled { method, .. } => {
                vec![format!("Enable '{method}' on the repository declaration")]
            }
            Self::ActiveVariantOnInactivable { entity, .. } => vec![
                format!("Mark '{entity}' with activable = true"),
                "Or disable getActive/listActive in its CRUD policy".into(),
            ],
            Self::DuplicateEntity { name } => {
                vec![format!("Remove or rename one of the '{name}' declarations")]
            }
            _ => vec!["Check the declaration file for typos".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownEntity { .. } | Self::MissingRepository { .. } => ErrorCategory::NotFound,
            Self::UnrelatedEntity { .. }
            | Self::RepositoryMethodDisabled { .. }
            | Self::ActiveVariantOnInactivable { .. } => ErrorCategory::Compatibility,
            _ => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Compatibility,
    NotFound,
    Internal,
}
