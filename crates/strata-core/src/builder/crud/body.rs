//! Use case method bodies.
//!
//! A body is described by a [`BodyPlan`] holding only names, then rendered
//! late so every symbol is qualified for the file it lands in.

use crate::builder::shared::{INVALID_REQUEST, NOT_FOUND, PAGINATION, ORDERING, VALIDATION_ERROR};
use crate::ir::{Body, Package, Snippet, std_packages};

/// One `By`/`Not` option passed to a repository call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Filter {
    pub constructor: String,
    pub variant: String,
    pub value: String,
}

/// A repository `Get` used as a precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Lookup {
    /// Use case field holding the repository, `customers`.
    pub repository: String,
    pub method: String,
    pub filters: Vec<Filter>,
    /// Constructor of the retrieve-inactive option, when the lookup uses it.
    pub retrieve_inactive: Option<String>,
}

/// The referenced row must exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReferenceCheck {
    pub lookup: Lookup,
    /// Request expression guarding an optional key, `req.ParentID`.
    pub guard: Option<String>,
    pub json: String,
    pub label: String,
}

/// No other row may carry the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniqueCheck {
    pub lookup: Lookup,
    /// Optional scope key the lookup dereferences, `req.ParentID`. Unset
    /// scopes skip the check.
    pub guard: Option<String>,
    pub json: String,
}

/// Names shared by every plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    /// Use case field holding the repository, `invoices`.
    pub repository: String,
    pub method: String,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BodyPlan {
    Get {
        call: Call,
        option: String,
        by: String,
        id_variant: String,
        /// Set when the request carries the retrieve-inactive flag.
        retrieve_inactive: Option<String>,
        var: String,
        field: String,
    },
    List {
        call: Call,
        option: String,
        pagination: String,
        ordering: String,
        retrieve_inactive: Option<String>,
        var: String,
        field: String,
    },
    Write {
        call: Call,
        references: Vec<ReferenceCheck>,
        uniques: Vec<UniqueCheck>,
        entity: String,
        /// `(entity field, request expression)` pairs.
        assignments: Vec<(String, String)>,
        /// The entity has an `Active` flag, defaulted to true.
        active: bool,
        var: String,
        field: String,
    },
    Delete {
        call: Call,
        by: String,
        id_variant: String,
    },
    Link {
        call: Call,
        own_id: String,
        other_id: String,
    },
    ListRelated {
        call: Call,
        own_id: String,
        var: String,
        field: String,
    },
}

/// Packages a body refers to.
#[derive(Debug, Clone)]
pub(crate) struct BodyPackages {
    pub repository: Package,
    pub entities: Package,
    pub usecase: Package,
}

pub(crate) fn render_body(plan: BodyPlan, packages: BodyPackages) -> Body {
    Body::snippet(move |s| {
        validate(s, &packages);
        match &plan {
            BodyPlan::Get {
                call,
                option,
                by,
                id_variant,
                retrieve_inactive,
                var,
                field,
            } => {
                let option = s.sym(&packages.repository, option);
                let by = s.sym(&packages.repository, by);
                let id = s.sym(&packages.repository, id_variant);
                s.line(format!("opts := []{option}{{{by}({id}, req.ID)}}"));
                if let Some(ctor) = retrieve_inactive {
                    let ctor = s.sym(&packages.repository, ctor);
                    s.open("if req.RetrieveInactive {");
                    s.line(format!("opts = append(opts, {ctor}())"));
                    s.close("}");
                }
                s.line(format!("{var}, err := u.{}.{}(ctx, opts...)", call.repository, call.method));
                fail(s);
                s.line(format!("return &{}{{{field}: {var}}}, nil", call.response));
            }
            BodyPlan::List {
                call,
                option,
                pagination,
                ordering,
                retrieve_inactive,
                var,
                field,
            } => {
                let option = s.sym(&packages.repository, option);
                let pagination = s.sym(&packages.repository, pagination);
                let ordering = s.sym(&packages.repository, ordering);
                let pagination_type = s.sym(&packages.repository, PAGINATION);
                let ordering_type = s.sym(&packages.repository, ORDERING);
                s.open(format!("opts := []{option}{{"));
                s.line(format!(
                    "{pagination}({pagination_type}{{Offset: req.Offset, Limit: req.Limit}}),"
                ));
                s.close("}");
                s.open("if req.OrderBy != \"\" {");
                s.line(format!(
                    "opts = append(opts, {ordering}({ordering_type}{{Field: req.OrderBy, Descending: req.Descending}}))"
                ));
                s.close("}");
                if let Some(ctor) = retrieve_inactive {
                    let ctor = s.sym(&packages.repository, ctor);
                    s.open("if req.RetrieveInactive {");
                    s.line(format!("opts = append(opts, {ctor}())"));
                    s.close("}");
                }
                s.line(format!("{var}, err := u.{}.{}(ctx, opts...)", call.repository, call.method));
                fail(s);
                s.line(format!("return &{}{{{field}: {var}}}, nil", call.response));
            }
            BodyPlan::Write {
                call,
                references,
                uniques,
                entity,
                assignments,
                active,
                var,
                field,
            } => {
                for check in references {
                    reference_check(s, &packages, check);
                }
                for check in uniques {
                    unique_check(s, &packages, check);
                }
                if *active {
                    s.line("active := true");
                    s.open("if req.Active != nil {");
                    s.line("active = *req.Active");
                    s.close("}");
                }
                let entity = s.sym(&packages.entities, entity);
                if assignments.is_empty() {
                    s.line(format!("{var} := &{entity}{{}}"));
                } else {
                    s.open(format!("{var} := &{entity}{{"));
                    let width = assignments.iter().map(|(f, _)| f.len() + 1).max().unwrap_or(0);
                    for (target, value) in assignments {
                        let key = format!("{target}:");
                        s.line(format!("{key:<width$} {value},"));
                    }
                    s.close("}");
                }
                s.open(format!(
                    "if err := u.{}.{}(ctx, {var}); err != nil {{",
                    call.repository, call.method
                ));
                s.line("return nil, err");
                s.close("}");
                s.line(format!("return &{}{{{field}: {var}}}, nil", call.response));
            }
            BodyPlan::Delete {
                call,
                by,
                id_variant,
            } => {
                let by = s.sym(&packages.repository, by);
                let id = s.sym(&packages.repository, id_variant);
                s.open(format!(
                    "if err := u.{}.{}(ctx, {by}({id}, req.ID)); err != nil {{",
                    call.repository, call.method
                ));
                s.line("return nil, err");
                s.close("}");
                s.line(format!("return &{}{{}}, nil", call.response));
            }
            BodyPlan::Link {
                call,
                own_id,
                other_id,
            } => {
                s.open(format!(
                    "if err := u.{}.{}(ctx, req.{own_id}, req.{other_id}); err != nil {{",
                    call.repository, call.method
                ));
                s.line("return nil, err");
                s.close("}");
                s.line(format!("return &{}{{}}, nil", call.response));
            }
            BodyPlan::ListRelated {
                call,
                own_id,
                var,
                field,
            } => {
                s.line(format!(
                    "{var}, err := u.{}.{}(ctx, req.{own_id})",
                    call.repository, call.method
                ));
                fail(s);
                s.line(format!("return &{}{{{field}: {var}}}, nil", call.response));
            }
        }
    })
}

fn validate(s: &mut Snippet<'_>, packages: &BodyPackages) {
    let invalid = s.sym(&packages.usecase, INVALID_REQUEST);
    s.open("if err := u.validate.Struct(req); err != nil {");
    s.line(format!("return nil, {invalid}(err)"));
    s.close("}");
}

fn fail(s: &mut Snippet<'_>) {
    s.open("if err != nil {");
    s.line("return nil, err");
    s.close("}");
}

fn lookup_call(s: &mut Snippet<'_>, packages: &BodyPackages, lookup: &Lookup) -> String {
    let mut args = vec!["ctx".to_string()];
    for filter in &lookup.filters {
        let ctor = s.sym(&packages.repository, &filter.constructor);
        let variant = s.sym(&packages.repository, &filter.variant);
        args.push(format!("{ctor}({variant}, {})", filter.value));
    }
    if let Some(ctor) = &lookup.retrieve_inactive {
        let ctor = s.sym(&packages.repository, ctor);
        args.push(format!("{ctor}()"));
    }
    format!("u.{}.{}({})", lookup.repository, lookup.method, args.join(", "))
}

fn reference_check(s: &mut Snippet<'_>, packages: &BodyPackages, check: &ReferenceCheck) {
    let call = lookup_call(s, packages, &check.lookup);
    let is = s.sym(&std_packages::errors(), "Is");
    let not_found = s.sym(&packages.repository, NOT_FOUND);
    let validation = s.sym(&packages.usecase, VALIDATION_ERROR);
    if let Some(guard) = &check.guard {
        s.open(format!("if {guard} != nil {{"));
    }
    s.open(format!("if _, err := {call}; err != nil {{"));
    s.open(format!("if {is}(err, {not_found}) {{"));
    s.line(format!(
        "return nil, &{validation}{{Field: {:?}, Message: \"{} not found\"}}",
        check.json, check.label
    ));
    s.close("}");
    s.line("return nil, err");
    s.close("}");
    if check.guard.is_some() {
        s.close("}");
    }
}

fn unique_check(s: &mut Snippet<'_>, packages: &BodyPackages, check: &UniqueCheck) {
    let call = lookup_call(s, packages, &check.lookup);
    let is = s.sym(&std_packages::errors(), "Is");
    let not_found = s.sym(&packages.repository, NOT_FOUND);
    let validation = s.sym(&packages.usecase, VALIDATION_ERROR);
    if let Some(guard) = &check.guard {
        s.open(format!("if {guard} != nil {{"));
    }
    s.open(format!("if _, err := {call}; err == nil {{"));
    s.line(format!(
        "return nil, &{validation}{{Field: {:?}, Message: \"already taken\"}}",
        check.json
    ));
    s.reopen(format!("}} else if !{is}(err, {not_found}) {{"));
    s.line("return nil, err");
    s.close("}");
    if check.guard.is_some() {
        s.close("}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::RenderContext;

    fn packages() -> BodyPackages {
        BodyPackages {
            repository: Package::new("example.com/app/internal/repository"),
            entities: Package::new("example.com/app/internal/entities"),
            usecase: Package::new("example.com/app/internal/usecase"),
        }
    }

    fn render(plan: BodyPlan) -> (String, Vec<String>) {
        let rendered = render_body(plan, packages())
            .render(&RenderContext::go(packages().usecase));
        let imports = rendered.imports.iter().map(|p| p.path().to_string()).collect();
        (rendered.text, imports)
    }

    fn call(method: &str, response: &str) -> Call {
        Call {
            repository: "invoices".into(),
            method: method.into(),
            response: response.into(),
        }
    }

    #[test]
    fn get_validates_then_reads() {
        let (text, imports) = render(BodyPlan::Get {
            call: call("GetInvoice", "GetInvoiceResponse"),
            option: "GetInvoiceOption".into(),
            by: "GetInvoiceBy".into(),
            id_variant: "InvoiceWhereFieldID".into(),
            retrieve_inactive: Some("GetInvoiceRetrieveInactive".into()),
            var: "invoice".into(),
            field: "Invoice".into(),
        });
        assert!(text.starts_with("if err := u.validate.Struct(req); err != nil {\n\treturn nil, invalidRequest(err)\n}"));
        assert!(text.contains(
            "opts := []repository.GetInvoiceOption{repository.GetInvoiceBy(repository.InvoiceWhereFieldID, req.ID)}"
        ));
        assert!(text.contains("opts = append(opts, repository.GetInvoiceRetrieveInactive())"));
        assert!(text.ends_with("return &GetInvoiceResponse{Invoice: invoice}, nil"));
        assert!(imports.contains(&"example.com/app/internal/repository".to_string()));
    }

    #[test]
    fn writes_check_references_before_uniqueness() {
        let (text, _) = render(BodyPlan::Write {
            call: call("CreateInvoice", "CreateInvoiceResponse"),
            references: vec![ReferenceCheck {
                lookup: Lookup {
                    repository: "customers".into(),
                    method: "GetCustomer".into(),
                    filters: vec![Filter {
                        constructor: "GetCustomerBy".into(),
                        variant: "CustomerWhereFieldID".into(),
                        value: "req.CustomerID".into(),
                    }],
                    retrieve_inactive: None,
                },
                guard: None,
                json: "customerId".into(),
                label: "customer".into(),
            }],
            uniques: vec![UniqueCheck {
                lookup: Lookup {
                    repository: "invoices".into(),
                    method: "GetInvoice".into(),
                    filters: vec![Filter {
                        constructor: "GetInvoiceBy".into(),
                        variant: "InvoiceWhereFieldNumber".into(),
                        value: "req.Number".into(),
                    }],
                    retrieve_inactive: None,
                },
                guard: None,
                json: "number".into(),
            }],
            entity: "Invoice".into(),
            assignments: vec![
                ("Number".into(), "req.Number".into()),
                ("CustomerID".into(), "req.CustomerID".into()),
            ],
            active: false,
            var: "invoice".into(),
            field: "Invoice".into(),
        });
        let reference = text.find("u.customers.GetCustomer").unwrap();
        let unique = text.find("u.invoices.GetInvoice").unwrap();
        let build = text.find("&entities.Invoice{").unwrap();
        assert!(reference < unique && unique < build);
        assert!(text.contains("return nil, &ValidationError{Field: \"customerId\", Message: \"customer not found\"}"));
        assert!(text.contains("} else if !errors.Is(err, repository.ErrNotFound) {\n\treturn nil, err\n}"));
        assert!(text.contains("\tNumber:     req.Number,\n\tCustomerID: req.CustomerID,\n"));
    }

    #[test]
    fn optional_references_are_guarded() {
        let (text, _) = render(BodyPlan::Write {
            call: call("CreateInvoice", "CreateInvoiceResponse"),
            references: vec![ReferenceCheck {
                lookup: Lookup {
                    repository: "invoices".into(),
                    method: "GetInvoice".into(),
                    filters: vec![Filter {
                        constructor: "GetInvoiceBy".into(),
                        variant: "InvoiceWhereFieldID".into(),
                        value: "*req.ParentID".into(),
                    }],
                    retrieve_inactive: None,
                },
                guard: Some("req.ParentID".into()),
                json: "parentId".into(),
                label: "invoice".into(),
            }],
            uniques: Vec::new(),
            entity: "Invoice".into(),
            assignments: Vec::new(),
            active: true,
            var: "invoice".into(),
            field: "Invoice".into(),
        });
        assert!(text.contains("if req.ParentID != nil {\n\tif _, err := u.invoices.GetInvoice(ctx, repository.GetInvoiceBy(repository.InvoiceWhereFieldID, *req.ParentID)); err != nil {"));
        assert!(text.contains("active := true"));
        assert!(text.contains("invoice := &entities.Invoice{}"));
    }
}
