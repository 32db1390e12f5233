use crate::domain::{
    entities::{EntityDeclaration, FieldDeclaration},
    error::DomainError,
    naming,
    value_objects::ValidationRule,
};

/// Snake-case names of the fields every entity receives.
pub const DEFAULT_FIELDS: [&str; 4] = ["id", "created_at", "updated_at", "deleted_at"];

/// Centralized declaration validation.
///
/// All registration-time checks live here, not scattered across the
/// registry and builder.
pub struct DeclarationValidator;

impl DeclarationValidator {
    /// Names must start with a letter and contain only letters, digits, `_`
    /// or `-`.
    pub fn validate_name(name: &str) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let mut chars = name.chars();
        match chars.next() {
            None => return Err(invalid("name cannot be empty")),
            Some(c) if !c.is_ascii_alphabetic() => {
                return Err(invalid("name must start with a letter"));
            }
            _ => {}
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(invalid("only letters, digits, '_' and '-' are allowed"));
        }
        Ok(())
    }

    pub fn validate_entity(entity: &EntityDeclaration) -> Result<(), DomainError> {
        Self::validate_name(&entity.name)?;

        let mut seen: Vec<String> = Vec::with_capacity(entity.fields.len());
        for field in &entity.fields {
            Self::validate_name(&field.name)?;
            let key = naming::to_snake_case(&field.name);

            if Self::is_reserved(&key, entity.activable) {
                return Err(DomainError::ReservedField {
                    entity: entity.name.clone(),
                    field: field.name.clone(),
                });
            }
            if seen.contains(&key) {
                return Err(DomainError::DuplicateField {
                    entity: entity.name.clone(),
                    field: field.name.clone(),
                });
            }
            seen.push(key);

            Self::parse_rules(&entity.name, field)?;
        }
        Ok(())
    }

    /// Parse every rule on a field, failing on the first bad one.
    pub fn parse_rules(
        owner: &str,
        field: &FieldDeclaration,
    ) -> Result<Vec<ValidationRule>, DomainError> {
        field
            .rules
            .iter()
            .map(|r| ValidationRule::parse(owner, &field.name, r.name(), r.value()))
            .collect()
    }

    /// Default fields are always reserved; `active` only on activable
    /// entities, where it is generated.
    pub fn is_reserved(snake_name: &str, activable: bool) -> bool {
        DEFAULT_FIELDS.contains(&snake_name) || (activable && snake_name == "active")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_must_start_with_a_letter() {
        assert!(DeclarationValidator::validate_name("invoice").is_ok());
        assert!(DeclarationValidator::validate_name("invoice_line-2").is_ok());
        assert!(DeclarationValidator::validate_name("").is_err());
        assert!(DeclarationValidator::validate_name("9lives").is_err());
        assert!(DeclarationValidator::validate_name("a.b").is_err());
    }

    #[test]
    fn reserved_fields_are_rejected_in_any_casing() {
        for name in ["id", "createdAt", "updated_at", "DeletedAt"] {
            let entity =
                EntityDeclaration::new("invoice").field(FieldDeclaration::new(name, "string"));
            assert!(
                matches!(
                    DeclarationValidator::validate_entity(&entity),
                    Err(DomainError::ReservedField { .. })
                ),
                "{name} should be reserved"
            );
        }
    }

    #[test]
    fn active_is_reserved_only_on_activable_entities() {
        let plain = EntityDeclaration::new("tag").field(FieldDeclaration::new("active", "bool"));
        assert!(DeclarationValidator::validate_entity(&plain).is_ok());

        let activable = plain.clone().activable();
        assert!(DeclarationValidator::validate_entity(&activable).is_err());
    }

    #[test]
    fn duplicate_fields_are_detected_across_casings() {
        let entity = EntityDeclaration::new("invoice")
            .field(FieldDeclaration::new("dueDate", "time"))
            .field(FieldDeclaration::new("due_date", "time"));
        assert!(matches!(
            DeclarationValidator::validate_entity(&entity),
            Err(DomainError::DuplicateField { .. })
        ));
    }

    #[test]
    fn bad_rules_fail_entity_validation() {
        let entity = EntityDeclaration::new("invoice")
            .field(FieldDeclaration::new("total", "float").rule("gt"));
        assert!(matches!(
            DeclarationValidator::validate_entity(&entity),
            Err(DomainError::InvalidRuleValue { .. })
        ));
    }
}
