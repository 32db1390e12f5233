//! Relational adapter: gorm implementations of the repository contracts.
//!
//! Reads filter out rows hidden by the entity or by the ancestors it
//! depends on. Inactive rows are hidden unless the retrieve-inactive option
//! is set; archived rows are always hidden.

use tracing::debug;

use crate::builder::model::{EntityModel, OptionKind, RepoMethod, RepoMethodKind, RepositoryModel};
use crate::builder::shared::NOT_FOUND;
use crate::builder::{BuildError, BuildPhase, DomainBuilder, GoPackage};
use crate::domain::RelationId;
use crate::ir::{
    Body, Dialect, Field, Function, NodeRef, Package, Snippet, Struct, Type, Var, std_packages,
};

const TRANSACTION: &str = "Transaction";
const BEGIN: &str = "Begin";
const SESSION: &str = "session";
const APPLY_FILTERS: &str = "applyFilters";
const TRANSLATE: &str = "translate";
const MIGRATE: &str = "Migrate";

fn clause() -> Package {
    Package::new("gorm.io/gorm/clause")
}

fn gorm_db() -> Type {
    Type::pointer(Type::symbol(&std_packages::gorm(), "DB"))
}

/// An inner join towards a dependency, and the filters its row imposes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Join {
    table: String,
    alias: String,
    /// `alias.fk_column = parent.id` operands.
    on: String,
    active: bool,
    archived: bool,
}

/// Everything a read body needs to hide rows.
#[derive(Debug, Clone, Default)]
struct Visibility {
    table: String,
    active: bool,
    archived: bool,
    joins: Vec<Join>,
}

impl Visibility {
    fn render(&self, s: &mut Snippet<'_>, retrieve_inactive: bool) {
        for join in &self.joins {
            let target = if join.alias == join.table {
                join.table.clone()
            } else {
                format!("{} AS {}", join.table, join.alias)
            };
            s.line(format!("db = db.Joins(\"JOIN {target} ON {}\")", join.on));
        }
        if self.archived {
            s.line(format!("db = db.Where(\"{}.deleted_at IS NULL\")", self.table));
        }
        for join in self.joins.iter().filter(|j| j.archived) {
            s.line(format!("db = db.Where(\"{}.deleted_at IS NULL\")", join.alias));
        }
        let active: Vec<String> = std::iter::once(&self.table)
            .filter(|_| self.active)
            .chain(self.joins.iter().filter(|j| j.active).map(|j| &j.alias))
            .map(|alias| format!("db = db.Where(\"{alias}.active = ?\", true)"))
            .collect();
        if active.is_empty() {
            return;
        }
        if retrieve_inactive {
            s.open("if !c.RetrieveInactive {");
            for line in &active {
                s.line(line);
            }
            s.close("}");
        } else {
            for line in &active {
                s.line(line);
            }
        }
    }
}

/// Packages the adapter bodies spell symbols from.
#[derive(Debug, Clone)]
struct AdapterPackages {
    repository: Package,
    entities: Package,
}

impl DomainBuilder {
    pub(super) fn adapter_phase(&mut self) -> Result<(), BuildError> {
        let shared = self.shared(BuildPhase::Backends)?;
        let gormrepo = self.layout.package(GoPackage::GormRepo);
        let packages = AdapterPackages {
            repository: shared.repository_package().clone(),
            entities: self.layout.package(GoPackage::Entities),
        };

        self.adapter_helpers(&gormrepo, &packages);

        let repositories: Vec<RepositoryModel> = self.repository_models.values().cloned().collect();
        for repository in repositories {
            let Some(model) = self.entity_models.get(&repository.entity).cloned() else {
                continue;
            };
            let visibility = self.visibility(&model);
            self.gorm_repository(&gormrepo, &packages, &model, &repository, &visibility);
            debug!(repository = %repository.name, "Built gorm repository");
        }
        Ok(())
    }

    fn visibility(&self, model: &EntityModel) -> Visibility {
        let mut joins: Vec<(Vec<RelationId>, Join)> = Vec::new();
        for path in self.registry.graph().activable_join_paths(model.entity) {
            let mut parent_alias = model.table.clone();
            let mut prefix = Vec::new();
            for step in &path.steps {
                prefix.push(step.relation);
                if let Some((_, existing)) = joins.iter().find(|(p, _)| *p == prefix) {
                    parent_alias = existing.alias.clone();
                    continue;
                }
                let (Some(from), Some(to)) = (self.entity_models.get(&step.from), self.entity_models.get(&step.to)) else {
                    break;
                };
                let Some(fk) = from.foreign_key(step.relation) else {
                    break;
                };
                let taken = joins.iter().filter(|(_, j)| j.table == to.table).count()
                    + usize::from(to.table == model.table);
                let alias = if taken == 0 {
                    to.table.clone()
                } else {
                    format!("{}_{}", to.table, taken + 1)
                };
                let join = Join {
                    table: to.table.clone(),
                    on: format!("{alias}.id = {parent_alias}.{}", fk.column),
                    alias: alias.clone(),
                    active: to.activable,
                    archived: to.archivable,
                };
                joins.push((prefix.clone(), join));
                parent_alias = alias;
            }
        }
        Visibility {
            table: model.table.clone(),
            active: model.activable,
            archived: model.archivable,
            joins: joins.into_iter().map(|(_, j)| j).collect(),
        }
    }

    /// `gormrepo.go`: transaction wrapper, query helpers and migrations.
    fn adapter_helpers(&mut self, gormrepo: &Package, packages: &AdapterPackages) {
        let path = self.layout.go_file(GoPackage::GormRepo, "gormrepo");
        let tx_type = Type::pointer(Type::symbol(gormrepo, TRANSACTION));
        let repository = packages.repository.clone();

        let transaction = self.store.add_struct(
            Struct::new(TRANSACTION)
                .doc("Transaction carries an open gorm transaction through the Tx option of a repository method.")
                .field(Field::new("db", gorm_db())),
        );
        self.store.add_method(
            transaction,
            Function::new("Commit")
                .receiver("t", tx_type.clone())
                .result(Type::error())
                .body(Body::fixed("return t.db.Commit().Error")),
        );
        self.store.add_method(
            transaction,
            Function::new("Rollback")
                .receiver("t", tx_type.clone())
                .result(Type::error())
                .body(Body::fixed("return t.db.Rollback().Error")),
        );

        let begin = self.store.add_function(
            Function::new(BEGIN)
                .doc("Begin opens a transaction to pass to repository methods.")
                .param("ctx", Type::symbol(&std_packages::context(), "Context"))
                .param("db", gorm_db())
                .result(tx_type)
                .result(Type::error())
                .body(Body::snippet(|s| {
                    s.line("tx := db.WithContext(ctx).Begin()");
                    s.open("if tx.Error != nil {");
                    s.line("return nil, tx.Error");
                    s.close("}");
                    s.line(format!("return &{TRANSACTION}{{db: tx}}, nil"));
                })),
        );

        let session = self.store.add_function(
            Function::new(SESSION)
                .doc("session runs on the caller's transaction when one is given.")
                .param("ctx", Type::symbol(&std_packages::context(), "Context"))
                .param("db", gorm_db())
                .param("tx", Type::symbol(&repository, crate::builder::shared::TRANSACTION))
                .result(gorm_db())
                .body(Body::snippet(|s| {
                    s.open(format!("if t, ok := tx.(*{TRANSACTION}); ok && t != nil {{"));
                    s.line("return t.db.WithContext(ctx)");
                    s.close("}");
                    s.line("return db.WithContext(ctx)");
                })),
        );

        let field_ty = Type::symbol(gormrepo, "F");
        let filters = self.store.add_function(
            Function::new(APPLY_FILTERS)
                .doc("applyFilters adds the By and Not options of a method context.")
                .type_param("F", Some("~string"))
                .param("db", gorm_db())
                .param("table", Type::string())
                .param("by", Type::map(field_ty.clone(), Type::any()))
                .param("not", Type::map(field_ty, Type::any()))
                .result(gorm_db())
                .body(Body::snippet(|s| {
                    s.open("for field, value := range by {");
                    s.line("db = db.Where(table+\".\"+string(field)+\" = ?\", value)");
                    s.close("}");
                    s.open("for field, value := range not {");
                    s.line("db = db.Where(table+\".\"+string(field)+\" <> ?\", value)");
                    s.close("}");
                    s.line("return db");
                })),
        );

        let translate_repo = repository.clone();
        let translate = self.store.add_function(
            Function::new(TRANSLATE)
                .doc("translate maps gorm errors onto the repository contract.")
                .param("err", Type::error())
                .result(Type::error())
                .body(Body::snippet(move |s| {
                    let is = s.sym(&std_packages::errors(), "Is");
                    let missing = s.sym(&std_packages::gorm(), "ErrRecordNotFound");
                    let not_found = s.sym(&translate_repo, NOT_FOUND);
                    s.open(format!("if {is}(err, {missing}) {{"));
                    s.line(format!("return {not_found}"));
                    s.close("}");
                    s.line("return err");
                })),
        );

        let entities: Vec<String> = self.entity_models.values().map(|m| m.name.clone()).collect();
        let entities_pkg = packages.entities.clone();
        let migrate = self.store.add_function(
            Function::new(MIGRATE)
                .doc("Migrate creates or updates the table of every entity.")
                .param("db", gorm_db())
                .result(Type::error())
                .body(Body::snippet(move |s| {
                    let rows: Vec<String> = entities
                        .iter()
                        .map(|name| format!("&{}{{}}", s.sym(&entities_pkg, name)))
                        .collect();
                    if rows.is_empty() {
                        s.line("return nil");
                        return;
                    }
                    s.open("return db.AutoMigrate(");
                    for row in rows {
                        s.line(format!("{row},"));
                    }
                    s.close(")");
                })),
        );

        for node in [
            NodeRef::Struct(transaction),
            NodeRef::Function(begin),
            NodeRef::Function(session),
            NodeRef::Function(filters),
            NodeRef::Function(translate),
            NodeRef::Function(migrate),
        ] {
            self.files.push(&path, gormrepo, Dialect::Go, node);
        }
    }

    fn gorm_repository(
        &mut self,
        gormrepo: &Package,
        packages: &AdapterPackages,
        model: &EntityModel,
        repository: &RepositoryModel,
        visibility: &Visibility,
    ) {
        let path = self.layout.go_file(GoPackage::GormRepo, &model.go_stem);
        let name = repository.name.clone();
        let self_ty = Type::pointer(Type::symbol(gormrepo, &name));

        let record = self.store.add_struct(
            Struct::new(&name)
                .doc(format!("{name} implements repository.{name} with gorm."))
                .field(Field::new("db", gorm_db())),
        );
        let constructor = self.store.add_function(
            Function::new(format!("New{name}"))
                .param("db", gorm_db())
                .result(self_ty.clone())
                .body(Body::fixed(format!("return &{name}{{db: db}}"))),
        );
        let check_name = name.clone();
        let check = self.store.add_var(Var {
            name: "_".to_string(),
            doc: None,
            ty: Some(Type::symbol(&packages.repository, &name)),
            value: Body::snippet(move |s| {
                s.line(format!("(*{check_name})(nil)"));
            }),
        });

        for method in &repository.methods {
            let association = method.association.and_then(|i| model.associations.get(i));
            let target = association
                .and_then(|a| self.entity_models.get(&a.target))
                .map(|t| t.name.clone());
            let plan = MethodPlan {
                method: method.clone(),
                entity: model.name.clone(),
                owner_param: method
                    .signature
                    .params
                    .get(1)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                other_param: method
                    .signature
                    .params
                    .get(2)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                association: association.map(|a| a.field.clone()),
                target,
                visibility: visibility.clone(),
            };
            let mut function = Function::new(&method.name).receiver("r", self_ty.clone());
            function.doc = method.signature.doc.clone();
            function.params = method.signature.params.clone();
            function.results = method.signature.results.clone();
            let function = function.body(method_body(plan, packages.clone()));
            self.store.add_method(record, function);
        }

        for node in [NodeRef::Struct(record), NodeRef::Function(constructor), NodeRef::Var(check)] {
            self.files.push(&path, gormrepo, Dialect::Go, node);
        }
    }
}

/// Names one adapter method body refers to.
#[derive(Debug, Clone)]
struct MethodPlan {
    method: RepoMethod,
    entity: String,
    /// Second parameter: the row for writes, the owner id for associations.
    owner_param: String,
    /// Third parameter: the related id for `Add`/`Remove`.
    other_param: String,
    /// Association field, `Tags`.
    association: Option<String>,
    target: Option<String>,
    visibility: Visibility,
}

fn method_body(plan: MethodPlan, packages: AdapterPackages) -> Body {
    Body::snippet(move |s| {
        let method = &plan.method;
        let new_context = s.sym(&packages.repository, &method.new_context_name);
        let table = &plan.visibility.table;
        let entity = s.sym(&packages.entities, &plan.entity);
        let retrieve_inactive = method.has_option(OptionKind::RetrieveInactive);
        s.line(format!("c := {new_context}(opts...)"));

        match method.kind {
            RepoMethodKind::Get => {
                s.line(format!("db := {APPLY_FILTERS}({SESSION}(ctx, r.db, c.Tx), {table:?}, c.By, c.Not)"));
                plan.visibility.render(s, retrieve_inactive);
                s.line(format!("var row {entity}"));
                s.open("if err := db.First(&row).Error; err != nil {");
                s.line(format!("return nil, {TRANSLATE}(err)"));
                s.close("}");
                s.line("return &row, nil");
            }
            RepoMethodKind::List => {
                let order = s.sym(&clause(), "OrderByColumn");
                let column = s.sym(&clause(), "Column");
                s.line(format!("db := {APPLY_FILTERS}({SESSION}(ctx, r.db, c.Tx), {table:?}, c.By, c.Not)"));
                plan.visibility.render(s, retrieve_inactive);
                s.open("if c.Pagination != nil {");
                s.line("db = db.Offset(c.Pagination.Offset)");
                s.open("if c.Pagination.Limit > 0 {");
                s.line("db = db.Limit(c.Pagination.Limit)");
                s.close("}");
                s.close("}");
                s.open("if c.Ordering != nil {");
                s.line(format!(
                    "db = db.Order({order}{{Column: {column}{{Table: {table:?}, Name: c.Ordering.Field}}, Desc: c.Ordering.Descending}})"
                ));
                s.close("}");
                s.line(format!("var rows []*{entity}"));
                s.open("if err := db.Find(&rows).Error; err != nil {");
                s.line(format!("return nil, {TRANSLATE}(err)"));
                s.close("}");
                s.line("return rows, nil");
            }
            RepoMethodKind::Create => {
                let row = &plan.owner_param;
                let new_id = s.sym(&std_packages::uuid(), "NewString");
                s.open(format!("if {row}.ID == \"\" {{"));
                s.line(format!("{row}.ID = {new_id}()"));
                s.close("}");
                s.line(format!("return {TRANSLATE}({SESSION}(ctx, r.db, c.Tx).Create({row}).Error)"));
            }
            RepoMethodKind::Update => {
                let row = &plan.owner_param;
                if plan.visibility.archived {
                    // Archived rows stay archived: no match, no write.
                    s.line(format!(
                        "result := {SESSION}(ctx, r.db, c.Tx).Model({row}).Where(\"{table}.deleted_at IS NULL\").Select(\"*\").Omit(\"created_at\", \"deleted_at\").Updates({row})"
                    ));
                } else {
                    s.line(format!(
                        "result := {SESSION}(ctx, r.db, c.Tx).Model({row}).Select(\"*\").Omit(\"created_at\").Updates({row})"
                    ));
                }
                rows_affected(s, &packages);
            }
            RepoMethodKind::Delete => {
                s.line(format!("db := {APPLY_FILTERS}({SESSION}(ctx, r.db, c.Tx), {table:?}, c.By, c.Not)"));
                if plan.visibility.archived {
                    let now = s.sym(&std_packages::time(), "Now");
                    s.line(format!(
                        "result := db.Model(&{entity}{{}}).Where(\"{table}.deleted_at IS NULL\").Update(\"deleted_at\", {now}())"
                    ));
                } else {
                    s.line(format!("result := db.Delete(&{entity}{{}})"));
                }
                rows_affected(s, &packages);
            }
            RepoMethodKind::Add | RepoMethodKind::Remove => {
                let field = plan.association.as_deref().unwrap_or_default();
                let target = s.sym(&packages.entities, plan.target.as_deref().unwrap_or_default());
                let verb = if method.kind == RepoMethodKind::Add { "Append" } else { "Delete" };
                s.line(format!("owner := &{entity}{{ID: {}}}", plan.owner_param));
                s.line(format!(
                    "err := {SESSION}(ctx, r.db, c.Tx).Model(owner).Association({field:?}).{verb}(&{target}{{ID: {}}})",
                    plan.other_param
                ));
                s.line(format!("return {TRANSLATE}(err)"));
            }
            RepoMethodKind::ListAssociated => {
                let field = plan.association.as_deref().unwrap_or_default();
                let target = s.sym(&packages.entities, plan.target.as_deref().unwrap_or_default());
                s.line(format!("var rows []*{target}"));
                s.line(format!("owner := &{entity}{{ID: {}}}", plan.owner_param));
                s.open(format!(
                    "if err := {SESSION}(ctx, r.db, c.Tx).Model(owner).Association({field:?}).Find(&rows); err != nil {{"
                ));
                s.line(format!("return nil, {TRANSLATE}(err)"));
                s.close("}");
                s.line("return rows, nil");
            }
        }
    })
}

fn rows_affected(s: &mut Snippet<'_>, packages: &AdapterPackages) {
    let not_found = s.sym(&packages.repository, NOT_FOUND);
    s.open("if result.Error != nil {");
    s.line(format!("return {TRANSLATE}(result.Error)"));
    s.close("}");
    s.open("if result.RowsAffected == 0 {");
    s.line(format!("return {not_found}"));
    s.close("}");
    s.line("return nil");
}

#[cfg(test)]
mod tests {
    use crate::builder::{BuildConfig, BuiltDomain, DomainBuilder};
    use crate::domain::{
        CrudDeclaration, CrudRelationDeclaration, DomainDeclaration, EntityDeclaration,
        FieldDeclaration, RelationDeclaration, RelationKind, RepositoryDeclaration,
    };
    use crate::emit::render_file;

    fn shop() -> DomainDeclaration {
        DomainDeclaration {
            entities: vec![
                EntityDeclaration::new("customer").activable(),
                EntityDeclaration::new("invoice")
                    .archivable()
                    .field(FieldDeclaration::new("number", "string")),
                EntityDeclaration::new("invoiceLine"),
                EntityDeclaration::new("tag"),
            ],
            relations: vec![
                RelationDeclaration::new("invoice", RelationKind::BelongsTo, "customer"),
                RelationDeclaration::new("invoiceLine", RelationKind::BelongsTo, "invoice"),
                RelationDeclaration::new("invoice", RelationKind::ManyToMany, "tag"),
            ],
            repositories: vec![
                RepositoryDeclaration::new("customer"),
                RepositoryDeclaration::new("invoice"),
                RepositoryDeclaration::new("invoiceLine"),
                RepositoryDeclaration::new("tag"),
            ],
            cruds: vec![CrudDeclaration {
                relations: vec![CrudRelationDeclaration {
                    target: "tag".into(),
                    add: true,
                    remove: true,
                    list: true,
                }],
                ..CrudDeclaration::all("invoice")
            }],
            ..DomainDeclaration::default()
        }
    }

    fn text(built: &BuiltDomain, path: &str) -> String {
        render_file(built.store(), built.files().get(path).unwrap())
            .unwrap()
            .contents
    }

    #[test]
    fn reads_hide_inactive_ancestors_unless_asked() {
        let built = DomainBuilder::build(BuildConfig::default(), shop()).unwrap();
        let line = text(&built, "internal/adapter/gormrepo/invoice_line.go");
        assert!(line.contains("db = db.Joins(\"JOIN invoices ON invoices.id = invoice_lines.invoice_id\")"));
        assert!(line.contains("db = db.Joins(\"JOIN customers ON customers.id = invoices.customer_id\")"));
        assert!(line.contains("db = db.Where(\"invoices.deleted_at IS NULL\")"));
        assert!(line.contains("if !c.RetrieveInactive {\n\t\tdb = db.Where(\"customers.active = ?\", true)\n\t}"));
    }

    #[test]
    fn archivable_rows_are_soft_deleted() {
        let built = DomainBuilder::build(BuildConfig::default(), shop()).unwrap();
        let invoice = text(&built, "internal/adapter/gormrepo/invoice.go");
        assert!(invoice.contains("Update(\"deleted_at\", time.Now())"));
        let tag = text(&built, "internal/adapter/gormrepo/tag.go");
        assert!(tag.contains("result := db.Delete(&entities.Tag{})"));
    }

    #[test]
    fn updates_skip_archived_rows() {
        let built = DomainBuilder::build(BuildConfig::default(), shop()).unwrap();
        let invoice = text(&built, "internal/adapter/gormrepo/invoice.go");
        assert!(invoice.contains(
            ".Model(invoice).Where(\"invoices.deleted_at IS NULL\").Select(\"*\").Omit(\"created_at\", \"deleted_at\").Updates(invoice)"
        ));
        let tag = text(&built, "internal/adapter/gormrepo/tag.go");
        assert!(tag.contains(".Model(tag).Select(\"*\").Omit(\"created_at\").Updates(tag)"));
    }

    #[test]
    fn repositories_satisfy_their_contract() {
        let built = DomainBuilder::build(BuildConfig::default(), shop()).unwrap();
        let invoice = text(&built, "internal/adapter/gormrepo/invoice.go");
        assert!(invoice.contains("var _ repository.InvoiceRepository = (*InvoiceRepository)(nil)"));
        assert!(invoice.contains(
            "func (r *InvoiceRepository) GetInvoice(ctx context.Context, opts ...repository.GetInvoiceOption) (*entities.Invoice, error) {"
        ));
        assert!(invoice.contains("Association(\"Tags\").Append(&entities.Tag{ID: tagID})"));
    }

    #[test]
    fn helpers_migrate_every_entity() {
        let built = DomainBuilder::build(BuildConfig::default(), shop()).unwrap();
        let helpers = text(&built, "internal/adapter/gormrepo/gormrepo.go");
        assert!(helpers.contains("package gormrepo"));
        assert!(helpers.contains("func applyFilters[F ~string](db *gorm.DB, table string, by map[F]any, not map[F]any) *gorm.DB {"));
        assert!(helpers.contains("\t&entities.InvoiceLine{},\n"));
        assert!(helpers.contains("return repository.ErrNotFound"));
    }
}
