//! Precondition checks synthesized into write use cases.
//!
//! Before a row is built, every key it holds must point at an existing row
//! and every unique field must be free. Both checks go through the `Get`
//! method of a repository, so a policy that needs one fails to build when
//! the method is missing.

use indexmap::IndexMap;

use crate::builder::crud::body::{Filter, Lookup, ReferenceCheck, UniqueCheck};
use crate::builder::model::{EntityModel, OptionKind, RepoMethod, RepoMethodKind, RepositoryModel};
use crate::domain::{DeclarationRegistry, DomainError, EntityId, naming};

/// Read-only view of what the earlier phases recorded.
pub(crate) struct Models<'a> {
    pub registry: &'a DeclarationRegistry,
    pub entities: &'a IndexMap<EntityId, EntityModel>,
    pub repositories: &'a IndexMap<EntityId, RepositoryModel>,
}

impl Models<'_> {
    fn entity_name(&self, entity: EntityId) -> String {
        self.registry.entity(entity).name.clone()
    }

    pub fn repository(&self, entity: EntityId) -> Result<&RepositoryModel, DomainError> {
        self.repositories
            .get(&entity)
            .ok_or_else(|| DomainError::MissingRepository {
                entity: self.entity_name(entity),
            })
    }

    pub fn repository_method(
        &self,
        entity: EntityId,
        kind: RepoMethodKind,
        method: &str,
    ) -> Result<&RepoMethod, DomainError> {
        self.repository(entity)?
            .method(kind)
            .ok_or_else(|| DomainError::RepositoryMethodDisabled {
                entity: self.entity_name(entity),
                method: method.to_string(),
            })
    }

    fn constructor<'m>(
        &self,
        entity: EntityId,
        method: &'m RepoMethod,
        kind: OptionKind,
    ) -> Result<&'m str, DomainError> {
        method
            .constructor(kind)
            .ok_or_else(|| DomainError::RepositoryMethodDisabled {
                entity: self.entity_name(entity),
                method: format!("{} option of {}", kind.field(), method.name),
            })
    }

    fn where_variant(&self, entity: EntityId, field: &str) -> Result<String, DomainError> {
        self.repository(entity)?
            .column(field)
            .map(|c| c.where_variant.clone())
            .ok_or_else(|| DomainError::InvalidRuleValue {
                owner: self.entity_name(entity),
                field: field.to_string(),
                rule: "unique".to_string(),
                reason: "applies only to scalar fields".to_string(),
            })
    }

    /// One existence check per held key.
    pub fn reference_checks(&self, model: &EntityModel) -> Result<Vec<ReferenceCheck>, DomainError> {
        let mut checks = Vec::with_capacity(model.foreign_keys.len());
        for fk in &model.foreign_keys {
            let Some(target) = self.entities.get(&fk.target) else {
                continue;
            };
            let get = self.repository_method(fk.target, RepoMethodKind::Get, "get")?;
            let by = self.constructor(fk.target, get, OptionKind::By)?;
            let id_variant = self.where_variant(fk.target, "ID")?;
            let (value, guard) = if fk.optional {
                (format!("*req.{}", fk.field), Some(format!("req.{}", fk.field)))
            } else {
                (format!("req.{}", fk.field), None)
            };
            checks.push(ReferenceCheck {
                lookup: Lookup {
                    repository: naming::to_go_var(&target.local_plural),
                    method: get.name.clone(),
                    filters: vec![Filter {
                        constructor: by.to_string(),
                        variant: id_variant,
                        value,
                    }],
                    retrieve_inactive: None,
                },
                guard,
                json: fk.json.clone(),
                label: naming::to_snake_case(&self.entity_name(fk.target)).replace('_', " "),
            });
        }
        Ok(checks)
    }

    /// One uniqueness check per unique field. Updates exclude the row being
    /// updated.
    pub fn unique_checks(&self, model: &EntityModel, update: bool) -> Result<Vec<UniqueCheck>, DomainError> {
        let unique: Vec<_> = model.declared_fields().filter(|f| f.is_unique()).collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }
        let entity = model.entity;
        let get = self.repository_method(entity, RepoMethodKind::Get, "get")?;
        let by = self.constructor(entity, get, OptionKind::By)?;
        let retrieve_inactive = get
            .constructor(OptionKind::RetrieveInactive)
            .map(str::to_string);

        let mut checks = Vec::with_capacity(unique.len());
        for field in unique {
            let mut filters = vec![Filter {
                constructor: by.to_string(),
                variant: self.where_variant(entity, &field.name)?,
                value: format!("req.{}", field.name),
            }];
            let mut guard = None;
            if let Some(fk) = field.unique_scope.and_then(|i| model.foreign_keys.get(i)) {
                let value = if fk.optional {
                    guard = Some(format!("req.{}", fk.field));
                    format!("*req.{}", fk.field)
                } else {
                    format!("req.{}", fk.field)
                };
                filters.push(Filter {
                    constructor: by.to_string(),
                    variant: self.where_variant(entity, &fk.field)?,
                    value,
                });
            }
            if update {
                filters.push(Filter {
                    constructor: self.constructor(entity, get, OptionKind::Not)?.to_string(),
                    variant: self.where_variant(entity, "ID")?,
                    value: "req.ID".to_string(),
                });
            }
            checks.push(UniqueCheck {
                lookup: Lookup {
                    repository: naming::to_go_var(&model.local_plural),
                    method: get.name.clone(),
                    filters,
                    retrieve_inactive: retrieve_inactive.clone(),
                },
                guard,
                json: field.json.clone(),
            });
        }
        Ok(checks)
    }
}
