//! Repositories phase: one storage contract per declared repository.
//!
//! Every method gets its own context record, option signature, option
//! constructors (copied from the shared templates) and context constructor.
//! Filters are keyed by a per-entity where-field enumeration, so a caller
//! cannot name a column that does not exist.

use indexmap::IndexMap;
use tracing::debug;

use crate::builder::model::{ColumnRef, EntityModel, OptionKind, RepoMethod, RepoMethodKind, RepositoryModel};
use crate::builder::shared::{OptionTarget, context_field_type, new_context_body, option_body, option_params};
use crate::builder::{BuildError, BuildPhase, DomainBuilder, GoPackage, PhaseContext, SharedSymbols};
use crate::domain::{DomainError, EntityId, LinkType, RepositoryId, naming};
use crate::ir::{
    Dialect, Enum, Field, FuncType, Interface, MethodSignature, NodeRef, Package, Param, Struct, Type,
    TypeAlias, std_packages,
};

/// Context fields, in declaration order, for one method kind.
pub(crate) fn options_for(kind: RepoMethodKind, retrieve_inactive: bool) -> Vec<OptionKind> {
    let mut options = match kind {
        RepoMethodKind::Get | RepoMethodKind::Delete => {
            vec![OptionKind::By, OptionKind::Not, OptionKind::Tx]
        }
        RepoMethodKind::List => vec![
            OptionKind::By,
            OptionKind::Not,
            OptionKind::Pagination,
            OptionKind::Ordering,
            OptionKind::Tx,
        ],
        RepoMethodKind::Create
        | RepoMethodKind::Update
        | RepoMethodKind::Add
        | RepoMethodKind::Remove
        | RepoMethodKind::ListAssociated => vec![OptionKind::Tx],
    };
    if retrieve_inactive && matches!(kind, RepoMethodKind::Get | RepoMethodKind::List) {
        options.push(OptionKind::RetrieveInactive);
    }
    options
}

fn constructor_doc(kind: OptionKind, constructor: &str) -> String {
    match kind {
        OptionKind::By => format!("{constructor} keeps rows whose field equals value."),
        OptionKind::Not => format!("{constructor} drops rows whose field equals value."),
        OptionKind::Tx => format!("{constructor} runs the call inside tx."),
        OptionKind::Pagination => format!("{constructor} bounds the rows returned."),
        OptionKind::Ordering => format!("{constructor} sorts the rows returned."),
        OptionKind::RetrieveInactive => format!(
            "{constructor} also returns inactive rows and rows under an inactive parent."
        ),
    }
}

/// What a repository method takes and returns besides `ctx` and `opts`.
struct MethodShape {
    kind: RepoMethodKind,
    name: String,
    params: Vec<(String, Type)>,
    results: Vec<Type>,
    association: Option<usize>,
    doc: String,
}

/// Names shared by every method of one repository.
struct RepoScope<'a> {
    shared: &'a SharedSymbols,
    package: Package,
    where_name: String,
    retrieve_inactive: bool,
}

impl DomainBuilder {
    pub(super) fn repositories_phase(&mut self) -> Result<(), BuildError> {
        let shared = self.shared(BuildPhase::Repositories)?;
        let repositories: Vec<(EntityId, RepositoryId)> = self.registry.repositories().collect();

        for (entity, repository) in repositories {
            let model = self.build_repository(entity, repository, &shared)?;
            if !self.repositories.insert(repository, model.interface) {
                return Err(DomainError::DuplicateRepository {
                    entity: self.registry.entity(entity).name.clone(),
                })
                .during(BuildPhase::Repositories, || "recording repositories".to_string());
            }
            debug!(repository = %model.name, methods = model.methods.len(), "Built repository contract");
            self.repository_models.insert(entity, model);
        }
        Ok(())
    }

    fn build_repository(
        &mut self,
        entity: EntityId,
        repository: RepositoryId,
        shared: &SharedSymbols,
    ) -> Result<RepositoryModel, BuildError> {
        let decl = self.registry.repository(repository).clone();
        let model: EntityModel = self
            .entity_models
            .get(&entity)
            .cloned()
            .ok_or_else(|| DomainError::UnknownEntity {
                name: decl.entity.clone(),
                context: "repository declaration".to_string(),
            })
            .during(BuildPhase::Repositories, || {
                format!("building the repository for '{}'", decl.entity)
            })?;

        let package = shared.repository_package().clone();
        let entities_pkg = self.layout.package(GoPackage::Entities);
        let path = self.layout.go_file(GoPackage::Repository, &model.go_stem);
        let e = model.name.clone();
        let entity_ty = model.entity_type(&entities_pkg);
        let mut nodes = Vec::new();

        // ── Field enumerations ──────────────────────────────────────────
        let where_name = format!("{e}WhereField");
        let order_name = format!("{e}OrderField");
        let columns: Vec<ColumnRef> = model
            .queryable_columns()
            .into_iter()
            .map(|(field, column)| ColumnRef {
                where_variant: format!("{where_name}{field}"),
                order_variant: format!("{order_name}{field}"),
                field,
                column,
            })
            .collect();
        let mut where_enum = Enum::new(&where_name);
        where_enum.doc = Some(format!("{where_name} names a column {e} rows can be filtered on."));
        let mut order_enum = Enum::new(&order_name);
        order_enum.doc = Some(format!("{order_name} names a column {e} rows can be sorted by."));
        for column in &columns {
            where_enum.variant(&column.where_variant, &column.column);
            order_enum.variant(&column.order_variant, &column.column);
        }
        let where_id = self.store.add_enum(where_enum);
        let order_id = self.store.add_enum(order_enum);
        nodes.push(NodeRef::Enum(where_id));
        nodes.push(NodeRef::Enum(order_id));

        // ── Methods ─────────────────────────────────────────────────────
        let mut shapes = Vec::new();
        let single = || vec![Type::pointer(entity_ty.clone()), Type::error()];
        if decl.get {
            shapes.push(MethodShape {
                kind: RepoMethodKind::Get,
                name: format!("Get{e}"),
                params: Vec::new(),
                results: single(),
                association: None,
                doc: format!("Get{e} returns the first {e} matching the options, or ErrNotFound."),
            });
        }
        if decl.list {
            shapes.push(MethodShape {
                kind: RepoMethodKind::List,
                name: format!("List{}", model.plural),
                params: Vec::new(),
                results: vec![Type::array(Type::pointer(entity_ty.clone())), Type::error()],
                association: None,
                doc: format!("List{} returns every {e} matching the options.", model.plural),
            });
        }
        if decl.create {
            shapes.push(MethodShape {
                kind: RepoMethodKind::Create,
                name: format!("Create{e}"),
                params: vec![(naming::to_go_var(&model.local), Type::pointer(entity_ty.clone()))],
                results: vec![Type::error()],
                association: None,
                doc: format!("Create{e} stores a new {e}, assigning an ID when it has none."),
            });
        }
        if decl.update {
            shapes.push(MethodShape {
                kind: RepoMethodKind::Update,
                name: format!("Update{e}"),
                params: vec![(naming::to_go_var(&model.local), Type::pointer(entity_ty.clone()))],
                results: vec![Type::error()],
                association: None,
                doc: format!("Update{e} overwrites a stored {e}, or returns ErrNotFound."),
            });
        }
        if decl.delete {
            shapes.push(MethodShape {
                kind: RepoMethodKind::Delete,
                name: format!("Delete{e}"),
                params: Vec::new(),
                results: vec![Type::error()],
                association: None,
                doc: format!("Delete{e} removes every {e} matching the options."),
            });
        }
        if decl.associations {
            for (index, association) in model.associations.iter().enumerate() {
                if association.link_type != LinkType::Many {
                    continue;
                }
                let Some(target) = self.entity_models.get(&association.target) else {
                    continue;
                };
                let target_ty = target.entity_type(&entities_pkg);
                let own_id = format!("{}ID", model.local);
                let mut other_id = format!("{}ID", naming::to_go_local(&association.singular));
                if other_id == own_id {
                    other_id = format!("other{}ID", association.singular);
                }
                let singular = &association.singular;
                let field = &association.field;
                shapes.push(MethodShape {
                    kind: RepoMethodKind::Add,
                    name: format!("Add{e}{singular}"),
                    params: vec![(own_id.clone(), Type::string()), (other_id.clone(), Type::string())],
                    results: vec![Type::error()],
                    association: Some(index),
                    doc: format!("Add{e}{singular} links a {} to the {e}'s {field}.", target.name),
                });
                shapes.push(MethodShape {
                    kind: RepoMethodKind::Remove,
                    name: format!("Remove{e}{singular}"),
                    params: vec![(own_id.clone(), Type::string()), (other_id, Type::string())],
                    results: vec![Type::error()],
                    association: Some(index),
                    doc: format!("Remove{e}{singular} unlinks a {} from the {e}'s {field}.", target.name),
                });
                shapes.push(MethodShape {
                    kind: RepoMethodKind::ListAssociated,
                    name: format!("List{e}{field}"),
                    params: vec![(own_id, Type::string())],
                    results: vec![Type::array(Type::pointer(target_ty)), Type::error()],
                    association: Some(index),
                    doc: format!("List{e}{field} returns the {field} linked to the {e}."),
                });
            }
        }

        let scope = RepoScope {
            shared,
            package: package.clone(),
            where_name: where_name.clone(),
            retrieve_inactive: model.retrieve_inactive,
        };
        let mut methods = Vec::with_capacity(shapes.len());
        let mut method_nodes = Vec::new();
        for shape in shapes {
            let (method, built) = self.build_repo_method(&scope, shape);
            methods.push(method);
            method_nodes.extend(built);
        }

        // ── Contract ────────────────────────────────────────────────────
        let name = format!("{e}Repository");
        let mut contract = Interface::new(&name);
        contract.doc = Some(format!("{name} stores {} rows.", e));
        contract.methods = methods.iter().map(|m| m.signature.clone()).collect();
        let interface = self.store.add_interface(contract);
        nodes.push(NodeRef::Interface(interface));
        nodes.extend(method_nodes);

        for node in nodes {
            self.files.push(&path, &package, Dialect::Go, node);
        }

        Ok(RepositoryModel {
            entity,
            repository,
            interface,
            name,
            where_enum: where_id,
            where_name,
            order_enum: order_id,
            order_name,
            columns,
            methods,
            associations_enabled: decl.associations,
        })
    }

    fn build_repo_method(&mut self, scope: &RepoScope<'_>, shape: MethodShape) -> (RepoMethod, Vec<NodeRef>) {
        let package = &scope.package;
        let name = shape.name;
        let context_name = format!("{name}Context");
        let option_name = format!("{name}Option");
        let options = options_for(shape.kind, scope.retrieve_inactive);
        let mut nodes = Vec::new();

        let mut context = Struct::new(&context_name).doc(format!("{context_name} collects the options of {name}."));
        for kind in &options {
            context = context.field(Field::new(
                kind.field(),
                context_field_type(*kind, package, &scope.where_name),
            ));
        }
        let context_id = self.store.add_struct(context);
        nodes.push(NodeRef::Struct(context_id));

        let option = self.store.add_alias(TypeAlias {
            name: option_name.clone(),
            doc: Some(format!("{option_name} sets one field of a {context_name}.")),
            target: Type::Func(FuncType {
                name: option_name.clone(),
                params: vec![Type::pointer(Type::symbol(package, &context_name))],
                results: Vec::new(),
            }),
        });
        nodes.push(NodeRef::Alias(option));

        let mut constructors = IndexMap::new();
        for kind in options {
            let Some(&template) = scope.shared.option_templates.get(&kind) else {
                continue;
            };
            let constructor = format!("{name}{}", kind.field());
            let target = OptionTarget {
                context: context_name.clone(),
                field_enum: scope.where_name.clone(),
            };
            let params: Vec<Param> = option_params(kind, package, &scope.where_name)
                .into_iter()
                .map(|(n, ty)| Param::new(n, ty))
                .collect();
            let result = Type::symbol(package, &option_name);
            let doc = constructor_doc(kind, &constructor);
            let id = self.store.specialize(template, constructor.clone(), |f| {
                f.doc = Some(doc);
                f.params = params;
                f.results = vec![result];
                f.body = Some(option_body(kind, target));
            });
            nodes.push(NodeRef::Function(id));
            constructors.insert(kind, (id, constructor));
        }

        let new_context_name = format!("New{context_name}");
        let context_ptr = Type::pointer(Type::symbol(package, &context_name));
        let variadic = Type::variadic(Type::symbol(package, &option_name));
        let body_context = context_name.clone();
        let new_context = self.store.specialize(
            scope.shared.new_context_template,
            new_context_name.clone(),
            |f| {
                f.doc = Some(format!("{new_context_name} applies opts to an empty {body_context}."));
                f.params = vec![Param::new("opts", variadic.clone())];
                f.results = vec![context_ptr];
                f.body = Some(new_context_body(body_context));
            },
        );
        nodes.push(NodeRef::Function(new_context));

        let mut signature = MethodSignature::new(&name).param("ctx", Type::symbol(&std_packages::context(), "Context"));
        signature.doc = Some(shape.doc);
        for (param, ty) in shape.params {
            signature = signature.param(param, ty);
        }
        signature = signature.param("opts", variadic);
        for result in shape.results {
            signature = signature.result(result);
        }

        (
            RepoMethod {
                kind: shape.kind,
                name,
                context: context_id,
                context_name,
                option,
                option_name,
                constructors,
                new_context,
                new_context_name,
                signature,
                association: shape.association,
            },
            nodes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildConfig;
    use crate::domain::{
        EntityDeclaration, FieldDeclaration, RelationDeclaration, RelationKind,
        RepositoryDeclaration,
    };
    use crate::emit::render_file;

    fn invoicing() -> DomainBuilder {
        let mut builder = DomainBuilder::new(BuildConfig::default());
        builder
            .register_entity(EntityDeclaration::new("customer").activable())
            .register_entity(
                EntityDeclaration::new("invoice").field(FieldDeclaration::new("number", "string")),
            )
            .register_entity(EntityDeclaration::new("tag"))
            .register_relation(RelationDeclaration::new(
                "invoice",
                RelationKind::BelongsTo,
                "customer",
            ))
            .register_relation(RelationDeclaration::new("invoice", RelationKind::ManyToMany, "tag"))
            .register_repository(RepositoryDeclaration::new("invoice"))
            .register_repository(RepositoryDeclaration {
                delete: false,
                associations: false,
                ..RepositoryDeclaration::new("customer")
            })
            .seed_shared()
            .build_entities()
            .apply_relations()
            .build_repositories();
        assert!(builder.error().is_none(), "{:?}", builder.error());
        builder
    }

    fn repo<'a>(builder: &'a DomainBuilder, name: &str) -> &'a RepositoryModel {
        let id = builder.registry.entity_id(name).unwrap();
        &builder.repository_models[&id]
    }

    #[test]
    fn option_sets_depend_on_the_method() {
        assert_eq!(
            options_for(RepoMethodKind::Get, true),
            [OptionKind::By, OptionKind::Not, OptionKind::Tx, OptionKind::RetrieveInactive]
        );
        assert_eq!(options_for(RepoMethodKind::Create, true), [OptionKind::Tx]);
        assert_eq!(options_for(RepoMethodKind::List, false).len(), 5);
    }

    #[test]
    fn inherited_activation_adds_retrieve_inactive() {
        let builder = invoicing();
        let get = repo(&builder, "invoice").method(RepoMethodKind::Get).unwrap();
        assert_eq!(get.name, "GetInvoice");
        assert_eq!(get.constructor(OptionKind::RetrieveInactive), Some("GetInvoiceRetrieveInactive"));
        assert_eq!(get.constructor(OptionKind::By), Some("GetInvoiceBy"));
    }

    #[test]
    fn columns_cover_scalars_and_keys() {
        let builder = invoicing();
        let invoice = repo(&builder, "invoice");
        let columns: Vec<&str> = invoice.columns.iter().map(|c| c.column.as_str()).collect();
        assert_eq!(columns, ["id", "number", "created_at", "updated_at", "customer_id"]);
        assert_eq!(invoice.column("CustomerID").unwrap().where_variant, "InvoiceWhereFieldCustomerID");
    }

    #[test]
    fn disabled_methods_are_left_out() {
        let builder = invoicing();
        let customer = repo(&builder, "customer");
        assert!(customer.method(RepoMethodKind::Delete).is_none());
        assert!(customer.methods.iter().all(|m| m.association.is_none()));
        assert!(!customer.associations_enabled);
    }

    #[test]
    fn association_methods_only_for_to_many_links() {
        let builder = invoicing();
        let names: Vec<&str> = repo(&builder, "invoice")
            .methods
            .iter()
            .filter(|m| m.association.is_some())
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, ["AddInvoiceTag", "RemoveInvoiceTag", "ListInvoiceTags"]);
    }

    #[test]
    fn templates_are_left_untouched() {
        let builder = invoicing();
        let shared = builder.shared.as_ref().unwrap();
        let template = &builder.store.functions[shared.option_templates[&OptionKind::By]];
        assert_eq!(template.name, "By");
        let get = repo(&builder, "invoice").method(RepoMethodKind::Get).unwrap();
        let (copy, _) = get.constructors[&OptionKind::By];
        assert_ne!(template.body, builder.store.functions[copy].body);
    }

    #[test]
    fn contract_renders_with_typed_options() {
        let builder = invoicing();
        let file = builder.files.get("internal/repository/invoice.go").unwrap();
        let text = render_file(&builder.store, file).unwrap().contents;
        assert!(text.contains("type InvoiceRepository interface {"));
        assert!(text.contains(
            "GetInvoice(ctx context.Context, opts ...GetInvoiceOption) (*entities.Invoice, error)"
        ));
        assert!(text.contains("type GetInvoiceOption func(*GetInvoiceContext)"));
        assert!(text.contains("func GetInvoiceBy(field InvoiceWhereField, value any) GetInvoiceOption {"));
        assert!(text.contains("func NewGetInvoiceContext(opts ...GetInvoiceOption) *GetInvoiceContext {"));
        assert!(text.contains("\"example.com/app/internal/entities\""));
    }
}
