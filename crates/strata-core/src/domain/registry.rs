//! Declaration registry.
//!
//! Registration assigns every declaration an arena id and indexes it by
//! name. Relations are resolved against already-registered entities and
//! their graph edges are built immediately.

use indexmap::IndexMap;

use crate::arena::{Arena, Id};
use crate::domain::{
    entities::{
        CrudDeclaration, CustomUsecaseDeclaration, EntityDeclaration, RelationDeclaration,
        RepositoryDeclaration,
    },
    error::DomainError,
    graph::{NodeSeed, RelationGraph},
    naming,
    validation::DeclarationValidator,
};

pub type EntityId = Id<EntityDeclaration>;
pub type RelationId = Id<RelationDeclaration>;
pub type RepositoryId = Id<RepositoryDeclaration>;
pub type CrudId = Id<CrudDeclaration>;
pub type UsecaseId = Id<CustomUsecaseDeclaration>;

/// Resolved endpoints of a registered relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationEnds {
    pub source: EntityId,
    pub target: EntityId,
}

#[derive(Debug, Clone, Default)]
pub struct DeclarationRegistry {
    entities: Arena<EntityDeclaration>,
    entity_index: IndexMap<String, EntityId>,
    relations: Arena<RelationDeclaration>,
    relation_ends: IndexMap<RelationId, RelationEnds>,
    repositories: Arena<RepositoryDeclaration>,
    repository_index: IndexMap<EntityId, RepositoryId>,
    cruds: Arena<CrudDeclaration>,
    crud_index: IndexMap<EntityId, CrudId>,
    usecases: Arena<CustomUsecaseDeclaration>,
    usecase_index: IndexMap<String, UsecaseId>,
    graph: RelationGraph,
}

/// Names are matched on their snake-case form.
fn key(name: &str) -> String {
    naming::to_snake_case(name)
}

impl DeclarationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ─────────────────────────────────────────────────────

    pub fn register_entity(&mut self, decl: EntityDeclaration) -> Result<EntityId, DomainError> {
        DeclarationValidator::validate_entity(&decl)?;
        let name_key = key(&decl.name);
        if self.entity_index.contains_key(&name_key) {
            return Err(DomainError::DuplicateEntity { name: decl.name });
        }

        let seed = (decl.activable, decl.archivable);
        let id = self.entities.alloc(decl);
        self.entity_index.insert(name_key, id);
        self.graph.ensure_node(NodeSeed {
            entity: id,
            activable: seed.0,
            archivable: seed.1,
        });
        Ok(id)
    }

    pub fn register_relation(
        &mut self,
        decl: RelationDeclaration,
    ) -> Result<RelationId, DomainError> {
        let context = format!("{} relation {} → {}", decl.kind, decl.source, decl.target);
        let source = self.resolve_entity(&decl.source, &context)?;
        let target = self.resolve_entity(&decl.target, &context)?;

        let (kind, ignore_reverse) = (decl.kind, decl.ignore_reverse);
        let id = self.relations.alloc(decl);
        self.relation_ends.insert(id, RelationEnds { source, target });

        let source_seed = self.seed(source);
        let target_seed = self.seed(target);
        self.graph
            .add_relation(id, kind, ignore_reverse, source_seed, target_seed);
        Ok(id)
    }

    pub fn register_repository(
        &mut self,
        decl: RepositoryDeclaration,
    ) -> Result<RepositoryId, DomainError> {
        let entity = self.resolve_entity(&decl.entity, "repository declaration")?;
        if self.repository_index.contains_key(&entity) {
            return Err(DomainError::DuplicateRepository {
                entity: decl.entity,
            });
        }
        let id = self.repositories.alloc(decl);
        self.repository_index.insert(entity, id);
        Ok(id)
    }

    pub fn register_crud(&mut self, decl: CrudDeclaration) -> Result<CrudId, DomainError> {
        let entity = self.resolve_entity(&decl.entity, "CRUD policy")?;
        if self.crud_index.contains_key(&entity) {
            return Err(DomainError::DuplicateCrud {
                entity: decl.entity,
            });
        }
        for relation in &decl.relations {
            self.resolve_entity(&relation.target, &format!("CRUD policy for {}", decl.entity))?;
        }
        let id = self.cruds.alloc(decl);
        self.crud_index.insert(entity, id);
        Ok(id)
    }

    pub fn register_usecase(
        &mut self,
        decl: CustomUsecaseDeclaration,
    ) -> Result<UsecaseId, DomainError> {
        DeclarationValidator::validate_name(&decl.name)?;
        for field in decl.request.iter().chain(&decl.response) {
            DeclarationValidator::validate_name(&field.name)?;
            DeclarationValidator::parse_rules(&decl.name, field)?;
        }
        let name_key = key(&decl.name);
        if self.usecase_index.contains_key(&name_key) {
            return Err(DomainError::DuplicateUsecase { name: decl.name });
        }
        let id = self.usecases.alloc(decl);
        self.usecase_index.insert(name_key, id);
        Ok(id)
    }

    // ── Lookup ───────────────────────────────────────────────────────────

    pub fn entity_id(&self, name: &str) -> Option<EntityId> {
        self.entity_index.get(&key(name)).copied()
    }

    /// Look up an entity by name, failing with a reference error.
    pub fn resolve_entity(&self, name: &str, context: &str) -> Result<EntityId, DomainError> {
        self.entity_id(name).ok_or_else(|| DomainError::UnknownEntity {
            name: name.to_string(),
            context: context.to_string(),
        })
    }

    pub fn entity(&self, id: EntityId) -> &EntityDeclaration {
        &self.entities[id]
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &EntityDeclaration)> {
        self.entities.iter()
    }

    pub fn relation(&self, id: RelationId) -> &RelationDeclaration {
        &self.relations[id]
    }

    pub fn relations(&self) -> impl Iterator<Item = (RelationId, &RelationDeclaration)> {
        self.relations.iter()
    }

    pub fn relation_ends(&self, id: RelationId) -> Option<RelationEnds> {
        self.relation_ends.get(&id).copied()
    }

    pub fn repository(&self, id: RepositoryId) -> &RepositoryDeclaration {
        &self.repositories[id]
    }

    pub fn repository_for(&self, entity: EntityId) -> Option<RepositoryId> {
        self.repository_index.get(&entity).copied()
    }

    pub fn repositories(&self) -> impl Iterator<Item = (EntityId, RepositoryId)> + '_ {
        self.repository_index.iter().map(|(e, r)| (*e, *r))
    }

    pub fn crud(&self, id: CrudId) -> &CrudDeclaration {
        &self.cruds[id]
    }

    pub fn cruds(&self) -> impl Iterator<Item = (EntityId, CrudId)> + '_ {
        self.crud_index.iter().map(|(e, c)| (*e, *c))
    }

    pub fn usecases(&self) -> impl Iterator<Item = (UsecaseId, &CustomUsecaseDeclaration)> {
        self.usecases.iter()
    }

    pub fn graph(&self) -> &RelationGraph {
        &self.graph
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    fn seed(&self, entity: EntityId) -> NodeSeed {
        let decl = &self.entities[entity];
        NodeSeed {
            entity,
            activable: decl.activable,
            archivable: decl.archivable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::RelationKind;

    fn registry_with(names: &[&str]) -> DeclarationRegistry {
        let mut registry = DeclarationRegistry::new();
        for name in names {
            registry
                .register_entity(EntityDeclaration::new(*name))
                .unwrap();
        }
        registry
    }

    #[test]
    fn entity_lookup_ignores_casing() {
        let registry = registry_with(&["invoiceLine"]);
        assert!(registry.entity_id("invoice_line").is_some());
        assert!(registry.entity_id("InvoiceLine").is_some());
        assert!(registry.entity_id("invoice").is_none());
    }

    #[test]
    fn duplicate_entities_are_rejected() {
        let mut registry = registry_with(&["invoice"]);
        let err = registry
            .register_entity(EntityDeclaration::new("Invoice"))
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateEntity { .. }));
    }

    #[test]
    fn relation_to_unregistered_entity_is_rejected() {
        let mut registry = registry_with(&["invoice"]);
        let err = registry
            .register_relation(RelationDeclaration::new(
                "invoice",
                RelationKind::BelongsTo,
                "customer",
            ))
            .unwrap_err();
        assert!(matches!(err, DomainError::UnknownEntity { ref name, .. } if name == "customer"));
    }

    #[test]
    fn relations_build_graph_edges_on_registration() {
        let mut registry = registry_with(&["invoice", "customer"]);
        let rel = registry
            .register_relation(RelationDeclaration::new(
                "invoice",
                RelationKind::BelongsTo,
                "customer",
            ))
            .unwrap();

        let invoice = registry.entity_id("invoice").unwrap();
        let customer = registry.entity_id("customer").unwrap();
        assert_eq!(
            registry.relation_ends(rel),
            Some(RelationEnds {
                source: invoice,
                target: customer
            })
        );
        assert_eq!(registry.graph().links(invoice).len(), 1);
        assert_eq!(registry.graph().links(customer).len(), 1);
    }

    #[test]
    fn one_repository_per_entity() {
        let mut registry = registry_with(&["invoice"]);
        registry
            .register_repository(RepositoryDeclaration::new("invoice"))
            .unwrap();
        assert!(matches!(
            registry.register_repository(RepositoryDeclaration::new("invoice")),
            Err(DomainError::DuplicateRepository { .. })
        ));
    }

    #[test]
    fn crud_relation_targets_must_exist() {
        let mut registry = registry_with(&["invoice"]);
        let mut crud = CrudDeclaration::new("invoice");
        crud.relations
            .push(crate::domain::entities::CrudRelationDeclaration {
                target: "ghost".into(),
                add: true,
                remove: false,
                list: false,
            });
        assert!(matches!(
            registry.register_crud(crud),
            Err(DomainError::UnknownEntity { .. })
        ));
    }
}
