//! Domain builder pipeline.
//!
//! A [`DomainBuilder`] runs one generation: declarations are registered,
//! then a fixed sequence of phases turns them into IR:
//!
//! 1. registration (relation graph edges are built as relations arrive)
//! 2. shared symbols, seeded once
//! 3. entities
//! 4. relations, which extend the entity records built in 3
//! 5. repositories
//! 6. use cases
//! 7. backends: gorm adapter, HTTP controllers, TypeScript SDK
//!
//! Every step first checks the sticky error and does nothing once one is
//! recorded, so a chain of calls needs a single check at [`finish`].
//!
//! [`finish`]: DomainBuilder::finish

mod adapter;
mod crud;
mod entity;
mod http;
pub mod layout;
pub mod model;
mod relation;
mod repository;
mod routes;
mod sdk;
mod shared;
pub mod xref;

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::domain::{
    CrudDeclaration, CrudId, CustomUsecaseDeclaration, DeclarationRegistry, DomainDeclaration,
    DomainError, EntityDeclaration, EntityId, RelationDeclaration, RepositoryDeclaration,
    RepositoryId,
};
use crate::emit::{self, EmitError, RenderedFile};
use crate::ir::{FileSet, InterfaceId, IrStore, StructId};

pub use layout::{BuildConfig, GoPackage, Layout};
pub use model::{
    Association, ColumnRef, CrudAction, CustomMethod, CustomModel, EntityModel, FieldOrigin,
    ForeignKey, ModelField, OptionKind, RepoMethod, RepoMethodKind, RepositoryModel,
    UsecaseMethod, UsecaseModel,
};
pub use routes::Route;
pub use shared::SharedSymbols;
pub use xref::XrefTable;

// ── Phases ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildPhase {
    Registration,
    SharedSymbols,
    Entities,
    Relations,
    Repositories,
    Usecases,
    Backends,
}

impl BuildPhase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::SharedSymbols => "shared symbols",
            Self::Entities => "entities",
            Self::Relations => "relations",
            Self::Repositories => "repositories",
            Self::Usecases => "use cases",
            Self::Backends => "backends",
        }
    }

    /// The phase that must be complete before this one runs.
    pub const fn previous(&self) -> Option<BuildPhase> {
        match self {
            Self::Registration => None,
            Self::SharedSymbols => Some(Self::Registration),
            Self::Entities => Some(Self::SharedSymbols),
            Self::Relations => Some(Self::Entities),
            Self::Repositories => Some(Self::Relations),
            Self::Usecases => Some(Self::Repositories),
            Self::Backends => Some(Self::Usecases),
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("{phase} phase failed while {context}: {source}")]
    Phase {
        phase: BuildPhase,
        context: String,
        #[source]
        source: DomainError,
    },

    #[error("Cannot run the {requested} phase: the last completed phase is {current}")]
    OutOfOrder {
        current: BuildPhase,
        requested: BuildPhase,
    },

    #[error("Declarations cannot be registered after the {current} phase has run")]
    RegistrationClosed { current: BuildPhase },
}

impl BuildError {
    /// The declaration error underneath, if any.
    pub fn domain_error(&self) -> Option<&DomainError> {
        match self {
            Self::Phase { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Phase { source, .. } => source.suggestions(),
            Self::OutOfOrder { .. } | Self::RegistrationClosed { .. } => vec![
                "Register every declaration, then run the phases in order".to_string(),
                "DomainBuilder::build runs the whole pipeline".to_string(),
            ],
        }
    }
}

/// Attach phase and call-site context to a declaration error.
pub(crate) trait PhaseContext<T> {
    fn during(self, phase: BuildPhase, context: impl FnOnce() -> String) -> Result<T, BuildError>;
}

impl<T> PhaseContext<T> for Result<T, DomainError> {
    fn during(self, phase: BuildPhase, context: impl FnOnce() -> String) -> Result<T, BuildError> {
        self.map_err(|source| BuildError::Phase {
            phase,
            context: context(),
            source,
        })
    }
}

// ── Builder ─────────────────────────────────────────────────────────────────

/// Single-run pipeline state. Not reusable: [`finish`](Self::finish)
/// consumes it.
#[derive(Debug)]
pub struct DomainBuilder {
    layout: Layout,
    registry: DeclarationRegistry,
    store: IrStore,
    files: FileSet,
    /// Last completed phase.
    phase: BuildPhase,
    error: Option<BuildError>,
    shared: Option<SharedSymbols>,
    entities: XrefTable<EntityId, StructId>,
    entity_models: IndexMap<EntityId, EntityModel>,
    repositories: XrefTable<RepositoryId, InterfaceId>,
    repository_models: IndexMap<EntityId, RepositoryModel>,
    usecases: XrefTable<CrudId, StructId>,
    usecase_models: IndexMap<EntityId, UsecaseModel>,
    custom: Option<CustomModel>,
}

impl DomainBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            layout: Layout::new(config),
            registry: DeclarationRegistry::new(),
            store: IrStore::new(),
            files: FileSet::new(),
            phase: BuildPhase::Registration,
            error: None,
            shared: None,
            entities: XrefTable::new(),
            entity_models: IndexMap::new(),
            repositories: XrefTable::new(),
            repository_models: IndexMap::new(),
            usecases: XrefTable::new(),
            usecase_models: IndexMap::new(),
            custom: None,
        }
    }

    /// Run the whole pipeline over one declaration.
    #[instrument(skip_all, fields(entities = declaration.entities.len()))]
    pub fn build(config: BuildConfig, declaration: DomainDeclaration) -> Result<BuiltDomain, BuildError> {
        let mut builder = Self::new(config);
        builder
            .register_declaration(declaration)
            .seed_shared()
            .build_entities()
            .apply_relations()
            .build_repositories()
            .build_usecases()
            .build_backends();
        builder.finish()
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    pub fn error(&self) -> Option<&BuildError> {
        self.error.as_ref()
    }

    pub fn registry(&self) -> &DeclarationRegistry {
        &self.registry
    }

    // ── Registration ─────────────────────────────────────────────────────

    fn register(
        &mut self,
        context: impl FnOnce() -> String,
        run: impl FnOnce(&mut DeclarationRegistry) -> Result<(), DomainError>,
    ) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        if self.phase != BuildPhase::Registration {
            self.error = Some(BuildError::RegistrationClosed {
                current: self.phase,
            });
            return self;
        }
        if let Err(e) = run(&mut self.registry).during(BuildPhase::Registration, context) {
            self.error = Some(e);
        }
        self
    }

    pub fn register_entity(&mut self, decl: EntityDeclaration) -> &mut Self {
        let name = decl.name.clone();
        self.register(
            || format!("registering entity '{name}'"),
            |r| r.register_entity(decl).map(|_| ()),
        )
    }

    pub fn register_relation(&mut self, decl: RelationDeclaration) -> &mut Self {
        let label = format!("{} {} {}", decl.source, decl.kind, decl.target);
        self.register(
            || format!("registering relation '{label}'"),
            |r| r.register_relation(decl).map(|_| ()),
        )
    }

    pub fn register_repository(&mut self, decl: RepositoryDeclaration) -> &mut Self {
        let name = decl.entity.clone();
        self.register(
            || format!("registering the repository for '{name}'"),
            |r| r.register_repository(decl).map(|_| ()),
        )
    }

    pub fn register_crud(&mut self, decl: CrudDeclaration) -> &mut Self {
        let name = decl.entity.clone();
        self.register(
            || format!("registering the CRUD policy for '{name}'"),
            |r| r.register_crud(decl).map(|_| ()),
        )
    }

    pub fn register_usecase(&mut self, decl: CustomUsecaseDeclaration) -> &mut Self {
        let name = decl.name.clone();
        self.register(
            || format!("registering use case '{name}'"),
            |r| r.register_usecase(decl).map(|_| ()),
        )
    }

    /// Register everything in a declaration: entities first, so relations
    /// and policies can resolve them.
    pub fn register_declaration(&mut self, decl: DomainDeclaration) -> &mut Self {
        for entity in decl.entities {
            self.register_entity(entity);
        }
        for relation in decl.relations {
            self.register_relation(relation);
        }
        for repository in decl.repositories {
            self.register_repository(repository);
        }
        for crud in decl.cruds {
            self.register_crud(crud);
        }
        for usecase in decl.usecases {
            self.register_usecase(usecase);
        }
        self
    }

    // ── Phases ───────────────────────────────────────────────────────────

    fn step(
        &mut self,
        requested: BuildPhase,
        run: impl FnOnce(&mut Self) -> Result<(), BuildError>,
    ) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        if requested.previous() != Some(self.phase) {
            self.error = Some(BuildError::OutOfOrder {
                current: self.phase,
                requested,
            });
            return self;
        }
        debug!(phase = %requested, "Running build phase");
        match run(self) {
            Ok(()) => self.phase = requested,
            Err(e) => {
                debug!(phase = %requested, error = %e, "Build phase failed");
                self.error = Some(e);
            }
        }
        self
    }

    /// Seed the shared symbols. Running it again is a no-op.
    pub fn seed_shared(&mut self) -> &mut Self {
        if self.shared.is_some() {
            return self;
        }
        self.step(BuildPhase::SharedSymbols, |b| {
            if b.registry.entity_count() == 0 && b.registry.usecases().next().is_none() {
                return Err(DomainError::InvalidDeclaration(
                    "the declaration has no entities and no use cases".to_string(),
                ))
                .during(BuildPhase::SharedSymbols, || "checking the declaration".to_string());
            }
            for entity in b.registry.graph().depend_cycles() {
                warn!(
                    entity = %b.registry.entity(entity).name,
                    "Dependency cycle through belongsTo/subresourcesOf relations"
                );
            }
            b.seed_shared_symbols();
            Ok(())
        })
    }

    pub fn build_entities(&mut self) -> &mut Self {
        self.step(BuildPhase::Entities, Self::entities_phase)
    }

    pub fn apply_relations(&mut self) -> &mut Self {
        self.step(BuildPhase::Relations, Self::relations_phase)
    }

    pub fn build_repositories(&mut self) -> &mut Self {
        self.step(BuildPhase::Repositories, Self::repositories_phase)
    }

    pub fn build_usecases(&mut self) -> &mut Self {
        self.step(BuildPhase::Usecases, Self::usecases_phase)
    }

    pub fn build_backends(&mut self) -> &mut Self {
        self.step(BuildPhase::Backends, |b| {
            b.adapter_phase()?;
            b.http_phase()?;
            if b.layout.emit_sdk() {
                b.sdk_phase()?;
            }
            Ok(())
        })
    }

    /// End the run: the first recorded error, or the finished IR.
    pub fn finish(self) -> Result<BuiltDomain, BuildError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.phase != BuildPhase::Backends {
            return Err(BuildError::OutOfOrder {
                current: self.phase,
                requested: BuildPhase::Backends,
            });
        }
        let shared = self.shared.ok_or(BuildError::OutOfOrder {
            current: BuildPhase::Registration,
            requested: BuildPhase::SharedSymbols,
        })?;

        info!(
            entities = self.entity_models.len(),
            repositories = self.repository_models.len(),
            usecases = self.usecase_models.len(),
            files = self.files.len(),
            "Domain built"
        );
        Ok(BuiltDomain {
            layout: self.layout,
            registry: self.registry,
            store: self.store,
            files: self.files,
            shared,
            entities: self.entities,
            entity_models: self.entity_models,
            repositories: self.repositories,
            repository_models: self.repository_models,
            usecases: self.usecases,
            usecase_models: self.usecase_models,
            custom: self.custom,
        })
    }

    // ── Helpers shared by the phases ─────────────────────────────────────

    /// Shared symbols, for a phase that needs them.
    fn shared(&self, requested: BuildPhase) -> Result<SharedSymbols, BuildError> {
        self.shared.clone().ok_or(BuildError::OutOfOrder {
            current: self.phase,
            requested,
        })
    }
}

// ── Output ──────────────────────────────────────────────────────────────────

/// Everything a successful run produced.
#[derive(Debug)]
pub struct BuiltDomain {
    layout: Layout,
    registry: DeclarationRegistry,
    store: IrStore,
    files: FileSet,
    shared: SharedSymbols,
    entities: XrefTable<EntityId, StructId>,
    entity_models: IndexMap<EntityId, EntityModel>,
    repositories: XrefTable<RepositoryId, InterfaceId>,
    repository_models: IndexMap<EntityId, RepositoryModel>,
    usecases: XrefTable<CrudId, StructId>,
    usecase_models: IndexMap<EntityId, UsecaseModel>,
    custom: Option<CustomModel>,
}

impl BuiltDomain {
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn registry(&self) -> &DeclarationRegistry {
        &self.registry
    }

    pub fn store(&self) -> &IrStore {
        &self.store
    }

    pub fn files(&self) -> &FileSet {
        &self.files
    }

    pub fn shared(&self) -> &SharedSymbols {
        &self.shared
    }

    pub fn entity_struct(&self, entity: EntityId) -> Option<StructId> {
        self.entities.ir(entity)
    }

    pub fn repository_interface(&self, repository: RepositoryId) -> Option<InterfaceId> {
        self.repositories.ir(repository)
    }

    pub fn usecase_struct(&self, crud: CrudId) -> Option<StructId> {
        self.usecases.ir(crud)
    }

    pub fn entity_model(&self, name: &str) -> Option<&EntityModel> {
        let id = self.registry.entity_id(name)?;
        self.entity_models.get(&id)
    }

    pub fn entity_models(&self) -> impl Iterator<Item = &EntityModel> {
        self.entity_models.values()
    }

    pub fn repository_model(&self, name: &str) -> Option<&RepositoryModel> {
        let id = self.registry.entity_id(name)?;
        self.repository_models.get(&id)
    }

    pub fn repository_models(&self) -> impl Iterator<Item = &RepositoryModel> {
        self.repository_models.values()
    }

    pub fn usecase_model(&self, name: &str) -> Option<&UsecaseModel> {
        let id = self.registry.entity_id(name)?;
        self.usecase_models.get(&id)
    }

    pub fn usecase_models(&self) -> impl Iterator<Item = &UsecaseModel> {
        self.usecase_models.values()
    }

    pub fn custom(&self) -> Option<&CustomModel> {
        self.custom.as_ref()
    }

    /// HTTP routes of the generated backend, CRUD first, custom use cases last.
    pub fn routes(&self) -> Vec<Route> {
        let mut routes: Vec<Route> = self
            .usecase_models
            .iter()
            .filter_map(|(id, usecase)| {
                let entity = self.entity_models.get(id)?;
                Some(routes::usecase_routes(entity, usecase))
            })
            .flatten()
            .collect();
        if let Some(custom) = &self.custom {
            routes.extend(routes::custom_routes(custom));
        }
        routes
    }

    /// Render every file. Nothing is returned unless every file renders.
    pub fn render(&self) -> Result<Vec<RenderedFile>, EmitError> {
        emit::render_all(&self.store, self.files.iter())
    }
}
