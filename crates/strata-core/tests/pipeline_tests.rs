//! End-to-end properties of the builder pipeline, observed through the
//! public API only.

use strata_core::builder::{BuiltDomain, CrudAction, RepoMethodKind};
use strata_core::domain::{LinkType, Multiplicity, naming};
use strata_core::emit::GENERATED_HEADER;
use strata_core::prelude::*;

fn invoicing() -> DomainDeclaration {
    DomainDeclaration {
        entities: vec![
            EntityDeclaration::new("customer")
                .activable()
                .field(FieldDeclaration::new("name", "string").rule("required")),
            EntityDeclaration::new("invoice")
                .field(FieldDeclaration::new("number", "string").rule("required").rule("unique")),
        ],
        relations: vec![RelationDeclaration::new(
            "invoice",
            RelationKind::BelongsTo,
            "customer",
        )],
        repositories: vec![
            RepositoryDeclaration::new("customer"),
            RepositoryDeclaration::new("invoice"),
        ],
        cruds: vec![CrudDeclaration::all("customer"), CrudDeclaration::all("invoice")],
        ..DomainDeclaration::default()
    }
}

fn build(decl: DomainDeclaration) -> BuiltDomain {
    DomainBuilder::build(BuildConfig::default(), decl).expect("declaration builds")
}

fn file(built: &BuiltDomain, path: &str) -> String {
    built
        .render()
        .expect("every file renders")
        .into_iter()
        .find(|f| f.path == path)
        .unwrap_or_else(|| panic!("{path} was not generated"))
        .contents
}

fn section<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let from = text.find(start).unwrap_or_else(|| panic!("missing {start}"));
    let to = text[from..].find(end).map_or(text.len(), |i| from + i);
    &text[from..to]
}

#[test]
fn belongs_to_adds_a_required_parent_id_to_writes() {
    let built = build(invoicing());
    let usecase = built.usecase_model("invoice").unwrap();
    for action in [CrudAction::Create, CrudAction::Update] {
        let method = usecase.method(action).unwrap();
        let request = &built.store().structs[method.request];
        let field = request.find_field("CustomerID").unwrap();
        assert_eq!(field.tag_value("validate"), Some("required"));
        assert!(!field.omits_empty());
    }
}

#[test]
fn create_checks_the_parent_before_building_the_row() {
    let built = build(invoicing());
    let text = file(&built, "internal/usecase/invoice.go");
    let create = section(
        &text,
        "func (u *InvoiceUsecase) CreateInvoice(",
        "func (u *InvoiceUsecase) UpdateInvoice(",
    );
    let lookup = create.find("u.customers.GetCustomer(").unwrap();
    let construct = create.find("&entities.Invoice{").unwrap();
    assert!(lookup < construct);
}

#[test]
fn get_on_a_child_of_an_activable_parent_offers_retrieve_inactive() {
    let built = build(invoicing());
    let repository = built.repository_model("invoice").unwrap();
    let get = repository
        .methods
        .iter()
        .find(|m| m.kind == RepoMethodKind::Get)
        .unwrap();
    assert_eq!(
        get.constructor(strata_core::builder::OptionKind::RetrieveInactive),
        Some("GetInvoiceRetrieveInactive")
    );
    assert!(file(&built, "internal/repository/invoice.go").contains("func GetInvoiceRetrieveInactive("));
}

#[test]
fn create_request_fields_follow_declaration_order() {
    let decl = DomainDeclaration {
        entities: vec![
            EntityDeclaration::new("product")
                .activable()
                .field(FieldDeclaration::new("sku", "string"))
                .field(FieldDeclaration::new("price", "float"))
                .field(FieldDeclaration::new("stock", "int")),
        ],
        repositories: vec![RepositoryDeclaration::new("product")],
        cruds: vec![CrudDeclaration::all("product")],
        ..DomainDeclaration::default()
    };
    let built = build(decl);
    let create = built
        .usecase_model("product")
        .unwrap()
        .method(CrudAction::Create)
        .unwrap();
    let names: Vec<&str> = built.store().structs[create.request]
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, ["Sku", "Price", "Stock", "Active"]);
}

#[test]
fn only_update_uniqueness_excludes_the_current_row() {
    let built = build(invoicing());
    let text = file(&built, "internal/usecase/invoice.go");
    let create = section(
        &text,
        "func (u *InvoiceUsecase) CreateInvoice(",
        "func (u *InvoiceUsecase) UpdateInvoice(",
    );
    let update = section(
        &text,
        "func (u *InvoiceUsecase) UpdateInvoice(",
        "func (u *InvoiceUsecase) DeleteInvoice(",
    );
    assert!(create.contains("repository.GetInvoiceBy(repository.InvoiceWhereFieldNumber, req.Number)"));
    assert!(!create.contains("repository.GetInvoiceNot("));
    assert!(update.contains("repository.GetInvoiceNot(repository.InvoiceWhereFieldID, req.ID)"));
}

#[test]
fn many_to_many_links_both_sides_unless_reverse_is_ignored() {
    let mut decl = DomainDeclaration {
        entities: vec![
            EntityDeclaration::new("post"),
            EntityDeclaration::new("label"),
            EntityDeclaration::new("author"),
        ],
        relations: vec![
            RelationDeclaration::new("post", RelationKind::ManyToMany, "label"),
            RelationDeclaration::new("post", RelationKind::ManyToMany, "author").ignore_reverse(),
        ],
        ..DomainDeclaration::default()
    };
    decl.repositories.push(RepositoryDeclaration::new("post"));
    let report = InspectService::new().graph(decl).unwrap();
    let node = |name: &str| report.nodes.iter().find(|n| n.entity == name).unwrap();

    assert!(node("post").links.iter().all(|l| l.link_type == LinkType::Many
        && l.multiplicity == Multiplicity::Multiple));
    assert_eq!(node("post").links.len(), 2);
    assert_eq!(node("label").links.len(), 1);
    assert!(node("author").links.is_empty());
}

#[test]
fn retrieve_inactive_propagates_down_dependency_chains_and_survives_cycles() {
    let decl = DomainDeclaration {
        entities: vec![
            EntityDeclaration::new("company").activable(),
            EntityDeclaration::new("department"),
            EntityDeclaration::new("employee"),
            EntityDeclaration::new("ring"),
            EntityDeclaration::new("link"),
        ],
        relations: vec![
            RelationDeclaration::new("department", RelationKind::BelongsTo, "company"),
            RelationDeclaration::new("employee", RelationKind::BelongsTo, "department"),
            RelationDeclaration::new("ring", RelationKind::BelongsTo, "link"),
            RelationDeclaration::new("link", RelationKind::BelongsTo, "ring"),
        ],
        ..DomainDeclaration::default()
    };
    let report = InspectService::new().graph(decl).unwrap();
    let flag = |name: &str| {
        report
            .nodes
            .iter()
            .find(|n| n.entity == name)
            .unwrap()
            .retrieve_inactive
    };
    assert!(flag("department"));
    assert!(flag("employee"));
    assert!(!flag("ring"));
    assert!(report.cycles.contains(&"ring".to_string()));
}

#[test]
fn plurals() {
    assert_eq!(naming::pluralize("category"), "categories");
    assert_eq!(naming::pluralize("order"), "orders");
    assert_eq!(naming::pluralize("company"), "companies");
}

#[test]
fn every_file_carries_the_generated_header() {
    let built = build(invoicing());
    let files = built.render().unwrap();
    assert!(files.iter().any(|f| f.dialect == Dialect::TypeScript));
    for f in &files {
        assert!(
            f.contents.starts_with(&format!("// {GENERATED_HEADER}")),
            "{} has no header",
            f.path
        );
    }
}

#[test]
fn routes_and_controllers_agree() {
    let built = build(invoicing());
    let controller = file(&built, "internal/httpapi/invoice.go");
    let sdk = file(&built, "sdk/invoice.ts");
    for route in built.routes().iter().filter(|r| r.pattern.starts_with("/invoices")) {
        assert!(controller.contains(&format!("mux.HandleFunc({:?}, c.{})", route.mux_pattern(), route.handler)));
        assert!(sdk.contains(&format!("export async function {}(", route.sdk_name())));
    }
}

#[test]
fn active_variant_on_an_inactivable_entity_fails_the_build() {
    let mut decl = invoicing();
    decl.cruds[1].get_active = true;
    let err = DomainBuilder::build(BuildConfig::default(), decl).unwrap_err();
    assert!(matches!(
        err.domain_error(),
        Some(DomainError::ActiveVariantOnInactivable { .. })
    ));
}
