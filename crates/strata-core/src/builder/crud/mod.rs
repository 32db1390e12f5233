//! Use cases phase: CRUD synthesis and custom use case contracts.
//!
//! Each CRUD policy becomes one use case record holding the repositories it
//! calls. Every enabled action gets a request record, a response record and
//! a method whose body validates the request, checks preconditions and calls
//! the repository. The active-only variants are copies of the base method
//! with the retrieve-inactive override removed.

mod body;
mod custom;
mod preconditions;
mod shapes;

use tracing::debug;

use crate::builder::model::{
    CrudAction, EntityModel, OptionKind, RepoMethodKind, UsecaseMethod, UsecaseModel,
};
use crate::builder::shared::NEW_VALIDATOR;
use crate::builder::{BuildError, BuildPhase, DomainBuilder, GoPackage, PhaseContext, SharedSymbols};
use crate::domain::{CrudDeclaration, CrudId, DomainError, EntityId, LinkType, naming};
use crate::ir::{
    Body, Dialect, Field, Function, FunctionId, NodeRef, Param, Struct, StructId, Type,
    std_packages,
};

use body::{BodyPackages, BodyPlan, Call, render_body};
use preconditions::Models;

pub use custom::CUSTOM_USECASES;
pub(crate) use shapes::link_ids;

/// A built method before it is stored: the pieces the active-only variant
/// is copied from.
struct Draft {
    action: CrudAction,
    name: String,
    function: Function,
    request: Struct,
    response: Struct,
    association: Option<usize>,
}

/// Everything the drafts of one policy share.
struct Scope<'a> {
    model: &'a EntityModel,
    shared: &'a SharedSymbols,
    packages: BodyPackages,
    receiver: Type,
    var: String,
    vars: String,
}

impl Scope<'_> {
    fn signature(&self, name: &str, request: &str, response: &str) -> Function {
        let usecase = &self.packages.usecase;
        Function::new(name)
            .receiver("u", self.receiver.clone())
            .param("ctx", Type::symbol(&std_packages::context(), "Context"))
            .param("req", Type::pointer(Type::symbol(usecase, request)))
            .result(Type::pointer(Type::symbol(usecase, response)))
            .result(Type::error())
    }

    fn call(&self, method: &str, response: &str) -> Call {
        Call {
            repository: self.vars.clone(),
            method: method.to_string(),
            response: response.to_string(),
        }
    }
}

impl DomainBuilder {
    pub(super) fn usecases_phase(&mut self) -> Result<(), BuildError> {
        let shared = self.shared(BuildPhase::Usecases)?;
        let cruds: Vec<(EntityId, CrudId)> = self.registry.cruds().collect();

        for (entity, crud) in cruds {
            let decl = self.registry.crud(crud).clone();
            let model = self
                .build_usecase(entity, crud, &decl, &shared)
                .during(BuildPhase::Usecases, || {
                    format!("synthesizing the CRUD use cases of '{}'", decl.entity)
                })?;
            if !self.usecases.insert(crud, model.struct_id) {
                return Err(DomainError::DuplicateCrud {
                    entity: decl.entity.clone(),
                })
                .during(BuildPhase::Usecases, || "recording use cases".to_string());
            }
            debug!(usecase = %model.name, methods = model.methods.len(), "Built CRUD use case");
            self.usecase_models.insert(entity, model);
        }

        self.custom_usecases()
    }

    fn build_usecase(
        &mut self,
        entity: EntityId,
        crud: CrudId,
        decl: &CrudDeclaration,
        shared: &SharedSymbols,
    ) -> Result<UsecaseModel, DomainError> {
        let model = self
            .entity_models
            .get(&entity)
            .cloned()
            .ok_or_else(|| DomainError::UnknownEntity {
                name: decl.entity.clone(),
                context: "CRUD policy".to_string(),
            })?;

        let usecase_pkg = shared.usecase_package().clone();
        let packages = BodyPackages {
            repository: shared.repository_package().clone(),
            entities: self.layout.package(GoPackage::Entities),
            usecase: usecase_pkg.clone(),
        };
        let name = format!("{}Usecase", model.name);
        let scope = Scope {
            model: &model,
            shared,
            receiver: Type::pointer(Type::symbol(&usecase_pkg, &name)),
            var: naming::to_go_var(&model.local),
            vars: naming::to_go_var(&model.local_plural),
            packages,
        };

        let drafts = self.crud_drafts(&scope, decl)?;

        // Own repository first, then every repository a reference check calls.
        let mut dependencies = vec![entity];
        if decl.create || decl.update {
            for fk in &model.foreign_keys {
                if !dependencies.contains(&fk.target) {
                    dependencies.push(fk.target);
                }
            }
        }

        let struct_id = self.usecase_struct(&scope, &name, &dependencies);
        let constructor_name = format!("New{name}");
        let constructor = self.usecase_constructor(&scope, &name, &constructor_name, &dependencies);

        let path = self.layout.go_file(GoPackage::Usecase, &model.go_stem);
        let mut nodes = vec![NodeRef::Struct(struct_id), NodeRef::Function(constructor)];
        let mut methods = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let request_name = draft.request.name.clone();
            let response_name = draft.response.name.clone();
            let request = self.store.add_struct(draft.request);
            let response = self.store.add_struct(draft.response);
            let function = self.store.add_function(draft.function);
            nodes.extend([
                NodeRef::Struct(request),
                NodeRef::Struct(response),
                NodeRef::Function(function),
            ]);
            methods.push(UsecaseMethod {
                action: draft.action,
                name: draft.name,
                function,
                request,
                request_name,
                response,
                response_name,
                association: draft.association,
            });
        }
        for node in nodes {
            self.files.push(&path, &usecase_pkg, Dialect::Go, node);
        }

        Ok(UsecaseModel {
            entity,
            crud,
            struct_id,
            name,
            constructor_name,
            dependencies,
            methods,
        })
    }

    fn usecase_struct(&mut self, scope: &Scope<'_>, name: &str, dependencies: &[EntityId]) -> StructId {
        let repository = scope.shared.repository_package();
        let mut record = Struct::new(name).doc(format!(
            "{name} implements the CRUD operations on {} rows.",
            scope.model.name
        ));
        for dependency in dependencies {
            if let Some(dep) = self.entity_models.get(dependency) {
                record = record.field(Field::new(
                    naming::to_go_var(&dep.local_plural),
                    Type::symbol(repository, format!("{}Repository", dep.name)),
                ));
            }
        }
        record = record.field(Field::new(
            "validate",
            Type::pointer(Type::symbol(&std_packages::validator(), "Validate")),
        ));
        self.store.add_struct(record)
    }

    fn usecase_constructor(
        &mut self,
        scope: &Scope<'_>,
        name: &str,
        constructor_name: &str,
        dependencies: &[EntityId],
    ) -> FunctionId {
        let repository = scope.shared.repository_package();
        let mut function = Function::new(constructor_name)
            .doc(format!("{constructor_name} wires a {name} to its repositories."))
            .result(Type::pointer(Type::symbol(&scope.packages.usecase, name)));
        let mut fields = Vec::new();
        for dependency in dependencies {
            if let Some(dep) = self.entity_models.get(dependency) {
                let param = naming::to_go_var(&dep.local_plural);
                function = function.param(&param, Type::symbol(repository, format!("{}Repository", dep.name)));
                fields.push(param);
            }
        }
        let record = name.to_string();
        let function = function.body(Body::snippet(move |s| {
            let mut inits: Vec<String> = fields.iter().map(|f| format!("{f}: {f}")).collect();
            inits.push(format!("validate: {NEW_VALIDATOR}()"));
            s.line(format!("return &{record}{{{}}}", inits.join(", ")));
        }));
        self.store.add_function(function)
    }

    /// Drafts of every enabled action, in policy order.
    fn crud_drafts(&self, scope: &Scope<'_>, decl: &CrudDeclaration) -> Result<Vec<Draft>, DomainError> {
        let model = scope.model;
        let entity = model.entity;
        let e = &model.name;
        let models = Models {
            registry: &self.registry,
            entities: &self.entity_models,
            repositories: &self.repository_models,
        };
        let repository = models.repository(entity)?;
        let entities_pkg = scope.packages.entities.clone();
        let mut drafts = Vec::new();

        for (enabled, action) in [(decl.get_active, CrudAction::GetActive), (decl.list_active, CrudAction::ListActive)] {
            if enabled && !model.activable {
                return Err(DomainError::ActiveVariantOnInactivable {
                    entity: decl.entity.clone(),
                    action: action.as_str().to_string(),
                });
            }
        }

        // ── Reads ───────────────────────────────────────────────────────
        if decl.get || decl.get_active {
            let get = models.repository_method(entity, RepoMethodKind::Get, "get")?;
            let by = get.constructor(OptionKind::By).unwrap_or_default().to_string();
            let id_variant = repository
                .column("ID")
                .map(|c| c.where_variant.clone())
                .unwrap_or_default();
            let name = format!("Get{e}");
            let request = shapes::get_request(&format!("{name}Request"), model);
            let response_name = format!("{name}Response");
            let response = shapes::response(
                &response_name,
                e,
                &model.local,
                shapes::entity_pointer(model, &entities_pkg),
            );
            let plan = |response: &str, retrieve_inactive: Option<String>| BodyPlan::Get {
                call: scope.call(&get.name, response),
                option: get.option_name.clone(),
                by: by.clone(),
                id_variant: id_variant.clone(),
                retrieve_inactive,
                var: scope.var.clone(),
                field: e.clone(),
            };
            let base = scope
                .signature(&name, &request.name, &response_name)
                .doc(format!("{name} returns one {e} by ID."))
                .body(render_body(
                    plan(&response_name, get.constructor(OptionKind::RetrieveInactive).map(str::to_string)),
                    scope.packages.clone(),
                ));

            let active = decl.get_active.then(|| {
                self.active_variant(
                    scope,
                    CrudAction::GetActive,
                    &format!("GetActive{e}"),
                    &base,
                    &request,
                    &response,
                    |response| render_body(plan(response, None), scope.packages.clone()),
                )
            });
            if decl.get {
                drafts.push(Draft {
                    action: CrudAction::Get,
                    name,
                    function: base,
                    request,
                    response,
                    association: None,
                });
            }
            drafts.extend(active);
        }

        if decl.list || decl.list_active {
            let list = models.repository_method(entity, RepoMethodKind::List, "list")?;
            let name = format!("List{}", model.plural);
            let request = shapes::list_request(&format!("{name}Request"), model, repository);
            let response_name = format!("{name}Response");
            let response = shapes::response(
                &response_name,
                &model.plural,
                &model.local_plural,
                Type::array(shapes::entity_pointer(model, &entities_pkg)),
            );
            let pagination = list.constructor(OptionKind::Pagination).unwrap_or_default().to_string();
            let ordering = list.constructor(OptionKind::Ordering).unwrap_or_default().to_string();
            let plan = |response: &str, retrieve_inactive: Option<String>| BodyPlan::List {
                call: scope.call(&list.name, response),
                option: list.option_name.clone(),
                pagination: pagination.clone(),
                ordering: ordering.clone(),
                retrieve_inactive,
                var: scope.vars.clone(),
                field: model.plural.clone(),
            };
            let base = scope
                .signature(&name, &request.name, &response_name)
                .doc(format!("{name} returns a page of {} rows.", e))
                .body(render_body(
                    plan(&response_name, list.constructor(OptionKind::RetrieveInactive).map(str::to_string)),
                    scope.packages.clone(),
                ));

            let active = decl.list_active.then(|| {
                self.active_variant(
                    scope,
                    CrudAction::ListActive,
                    &format!("ListActive{}", model.plural),
                    &base,
                    &request,
                    &response,
                    |response| render_body(plan(response, None), scope.packages.clone()),
                )
            });
            if decl.list {
                drafts.push(Draft {
                    action: CrudAction::List,
                    name,
                    function: base,
                    request,
                    response,
                    association: None,
                });
            }
            drafts.extend(active);
        }

        // ── Writes ──────────────────────────────────────────────────────
        for (enabled, action, kind, method) in [
            (decl.create, CrudAction::Create, RepoMethodKind::Create, "create"),
            (decl.update, CrudAction::Update, RepoMethodKind::Update, "update"),
        ] {
            if !enabled {
                continue;
            }
            let update = action == CrudAction::Update;
            let write = models.repository_method(entity, kind, method)?;
            let references = models.reference_checks(model)?;
            let uniques = models.unique_checks(model, update)?;

            let name = format!("{}{e}", if update { "Update" } else { "Create" });
            let request_name = format!("{name}Request");
            let response_name = format!("{name}Response");
            let request = if update {
                shapes::update_request(&request_name, model)
            } else {
                shapes::create_request(&request_name, model)
            };
            let mut assignments = Vec::new();
            if update {
                assignments.push(("ID".to_string(), "req.ID".to_string()));
            }
            assignments.extend(shapes::write_fields(model).into_iter().map(|(_, a)| a));

            let plan = BodyPlan::Write {
                call: scope.call(&write.name, &response_name),
                references,
                uniques,
                entity: e.clone(),
                assignments,
                active: model.activable,
                var: scope.var.clone(),
                field: e.clone(),
            };
            let doc = if update {
                format!("{name} replaces a stored {e} after checking its references and unique fields.")
            } else {
                format!("{name} stores a new {e} after checking its references and unique fields.")
            };
            drafts.push(Draft {
                action,
                function: scope
                    .signature(&name, &request_name, &response_name)
                    .doc(doc)
                    .body(render_body(plan, scope.packages.clone())),
                request,
                response: shapes::response(
                    &response_name,
                    e,
                    &model.local,
                    shapes::entity_pointer(model, &entities_pkg),
                ),
                name,
                association: None,
            });
        }

        if decl.delete {
            let delete = models.repository_method(entity, RepoMethodKind::Delete, "delete")?;
            let name = format!("Delete{e}");
            let request_name = format!("{name}Request");
            let response_name = format!("{name}Response");
            let plan = BodyPlan::Delete {
                call: scope.call(&delete.name, &response_name),
                by: delete.constructor(OptionKind::By).unwrap_or_default().to_string(),
                id_variant: repository
                    .column("ID")
                    .map(|c| c.where_variant.clone())
                    .unwrap_or_default(),
            };
            drafts.push(Draft {
                action: CrudAction::Delete,
                function: scope
                    .signature(&name, &request_name, &response_name)
                    .doc(format!("{name} deletes one {e} by ID."))
                    .body(render_body(plan, scope.packages.clone())),
                request: shapes::delete_request(&request_name, model),
                response: shapes::empty_response(&response_name),
                name,
                association: None,
            });
        }

        // ── Relation sub-actions ────────────────────────────────────────
        for relation in &decl.relations {
            let target = self.registry.resolve_entity(&relation.target, "CRUD relation")?;
            let index = model
                .associations
                .iter()
                .position(|a| a.target == target && a.link_type == LinkType::Many)
                .ok_or_else(|| DomainError::UnrelatedEntity {
                    entity: decl.entity.clone(),
                    target: relation.target.clone(),
                })?;
            if !repository.associations_enabled {
                return Err(DomainError::RepositoryMethodDisabled {
                    entity: decl.entity.clone(),
                    method: "associations".to_string(),
                });
            }
            let association = &model.associations[index];
            let target_model = self.entity_models.get(&target).ok_or_else(|| DomainError::UnknownEntity {
                name: relation.target.clone(),
                context: "CRUD relation".to_string(),
            })?;
            let (own_id, other_id) = shapes::link_ids(model, association);

            for (enabled, action, kind) in [
                (relation.add, CrudAction::Add, RepoMethodKind::Add),
                (relation.remove, CrudAction::Remove, RepoMethodKind::Remove),
            ] {
                if !enabled {
                    continue;
                }
                let Some(method) = repository.association_method(kind, index) else {
                    return Err(DomainError::RepositoryMethodDisabled {
                        entity: decl.entity.clone(),
                        method: "associations".to_string(),
                    });
                };
                let name = method.name.clone();
                let request_name = format!("{name}Request");
                let response_name = format!("{name}Response");
                let plan = BodyPlan::Link {
                    call: scope.call(&method.name, &response_name),
                    own_id: own_id.clone(),
                    other_id: other_id.clone(),
                };
                let verb = if action == CrudAction::Add { "links" } else { "unlinks" };
                drafts.push(Draft {
                    action,
                    function: scope
                        .signature(&name, &request_name, &response_name)
                        .doc(format!("{name} {verb} a {} and a {e}.", target_model.name))
                        .body(render_body(plan, scope.packages.clone())),
                    request: shapes::link_request(&request_name, model, association),
                    response: shapes::empty_response(&response_name),
                    name,
                    association: Some(index),
                });
            }

            if relation.list {
                let Some(method) = repository.association_method(RepoMethodKind::ListAssociated, index) else {
                    return Err(DomainError::RepositoryMethodDisabled {
                        entity: decl.entity.clone(),
                        method: "associations".to_string(),
                    });
                };
                let name = method.name.clone();
                let request_name = format!("{name}Request");
                let response_name = format!("{name}Response");
                let plan = BodyPlan::ListRelated {
                    call: scope.call(&method.name, &response_name),
                    own_id: own_id.clone(),
                    var: naming::to_go_var(&association.json),
                    field: association.field.clone(),
                };
                drafts.push(Draft {
                    action: CrudAction::ListRelated,
                    function: scope
                        .signature(&name, &request_name, &response_name)
                        .doc(format!("{name} returns the {} linked to a {e}.", association.field))
                        .body(render_body(plan, scope.packages.clone())),
                    request: shapes::list_related_request(&request_name, model),
                    response: shapes::response(
                        &response_name,
                        &association.field,
                        &association.json,
                        Type::array(shapes::entity_pointer(target_model, &entities_pkg)),
                    ),
                    name,
                    association: Some(index),
                });
            }
        }

        Ok(drafts)
    }

    /// Copy a read method into its active-only variant.
    #[allow(clippy::too_many_arguments)]
    fn active_variant(
        &self,
        scope: &Scope<'_>,
        action: CrudAction,
        name: &str,
        base: &Function,
        request: &Struct,
        response: &Struct,
        body: impl FnOnce(&str) -> Body,
    ) -> Draft {
        let request = shapes::active_only(request, &format!("{name}Request"));
        let response_name = format!("{name}Response");
        let mut response = response.clone();
        response.name = response_name.clone();

        let usecase = scope.packages.usecase.clone();
        let request_ty = Type::pointer(Type::symbol(&usecase, &request.name));
        let response_ty = Type::pointer(Type::symbol(&usecase, &response_name));
        let body = body(&response_name);
        let function = base.specialize(name, |f| {
            f.doc = Some(format!("{name} is {} restricted to active rows.", base.name));
            f.params = vec![
                Param::new("ctx", Type::symbol(&std_packages::context(), "Context")),
                Param::new("req", request_ty),
            ];
            f.results = vec![response_ty, Type::error()];
            f.body = Some(body);
        });

        Draft {
            action,
            name: name.to_string(),
            function,
            request,
            response,
            association: None,
        }
    }
}
