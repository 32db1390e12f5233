//! HTTP routes of the generated backend.
//!
//! One route per use case method. The HTTP controllers register them and the
//! SDK calls them, so both read the same table.

use serde::Serialize;

use crate::builder::crud::link_ids;
use crate::builder::model::{CrudAction, CustomModel, EntityModel, UsecaseModel};
use crate::domain::naming;

/// Where a handler reads the request from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestSource {
    /// Path parameters only, plus optional query flags.
    Path,
    /// Query string, for list endpoints.
    Query,
    /// JSON body, path parameters applied on top.
    Body,
}

/// A path parameter and the request field it fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathParam {
    pub name: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub method: &'static str,
    /// `net/http` pattern, `/invoices/{id}`.
    pub pattern: String,
    /// Use case method, also the Go handler name.
    pub handler: String,
    pub request: String,
    pub response: String,
    /// `None` for custom use cases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<CrudAction>,
    pub source: RequestSource,
    pub params: Vec<PathParam>,
    /// Success status code.
    pub status: u16,
}

impl Route {
    /// `GET /invoices/{id}`, as registered on a `ServeMux`.
    pub fn mux_pattern(&self) -> String {
        format!("{} {}", self.method, self.pattern)
    }

    /// SDK function name, `getInvoice`.
    pub fn sdk_name(&self) -> String {
        naming::to_camel_case(&self.handler)
    }
}

fn param(name: &str, field: &str) -> PathParam {
    PathParam {
        name: name.to_string(),
        field: field.to_string(),
    }
}

/// Routes of one CRUD use case, in method order.
pub fn usecase_routes(entity: &EntityModel, usecase: &UsecaseModel) -> Vec<Route> {
    let base = format!("/{}", entity.route);
    let own_id = format!("{}ID", entity.name);

    usecase
        .methods
        .iter()
        .map(|method| {
            let id = || vec![param("id", "ID")];
            let nested = |suffix: String| {
                let target = method
                    .association
                    .and_then(|i| entity.associations.get(i))
                    .map(|a| naming::to_kebab_case(&a.field))
                    .unwrap_or_default();
                format!("{base}/{{id}}/{target}{suffix}")
            };
            let (verb, pattern, source, params, status) = match method.action {
                CrudAction::Get => ("GET", format!("{base}/{{id}}"), RequestSource::Path, id(), 200),
                CrudAction::GetActive => (
                    "GET",
                    format!("{base}/active/{{id}}"),
                    RequestSource::Path,
                    id(),
                    200,
                ),
                CrudAction::List => ("GET", base.clone(), RequestSource::Query, Vec::new(), 200),
                CrudAction::ListActive => (
                    "GET",
                    format!("{base}/active"),
                    RequestSource::Query,
                    Vec::new(),
                    200,
                ),
                CrudAction::Create => ("POST", base.clone(), RequestSource::Body, Vec::new(), 201),
                CrudAction::Update => ("PUT", format!("{base}/{{id}}"), RequestSource::Body, id(), 200),
                CrudAction::Delete => ("DELETE", format!("{base}/{{id}}"), RequestSource::Path, id(), 200),
                CrudAction::Add | CrudAction::Remove => {
                    let other = method
                        .association
                        .and_then(|i| entity.associations.get(i))
                        .map(|a| link_ids(entity, a).1)
                        .unwrap_or_default();
                    (
                        if method.action == CrudAction::Add { "POST" } else { "DELETE" },
                        nested("/{targetId}".to_string()),
                        RequestSource::Path,
                        vec![param("id", &own_id), param("targetId", &other)],
                        200,
                    )
                }
                CrudAction::ListRelated => (
                    "GET",
                    nested(String::new()),
                    RequestSource::Path,
                    vec![param("id", &own_id)],
                    200,
                ),
            };
            Route {
                method: verb,
                pattern,
                handler: method.name.clone(),
                request: method.request_name.clone(),
                response: method.response_name.clone(),
                action: Some(method.action),
                source,
                params,
                status,
            }
        })
        .collect()
}

/// `POST /usecases/<name>` for every custom use case.
pub fn custom_routes(custom: &CustomModel) -> Vec<Route> {
    custom
        .methods
        .iter()
        .map(|method| Route {
            method: "POST",
            pattern: format!("/usecases/{}", method.route),
            handler: method.name.clone(),
            request: method.request_name.clone(),
            response: method.response_name.clone(),
            action: None,
            source: RequestSource::Body,
            params: Vec::new(),
            status: 200,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::builder::{BuildConfig, DomainBuilder};
    use crate::domain::{
        CrudDeclaration, CrudRelationDeclaration, CustomUsecaseDeclaration, DomainDeclaration,
        EntityDeclaration, RelationDeclaration, RelationKind, RepositoryDeclaration,
    };

    fn shop() -> DomainDeclaration {
        DomainDeclaration {
            entities: vec![
                EntityDeclaration::new("invoiceLine").activable(),
                EntityDeclaration::new("tag"),
            ],
            relations: vec![RelationDeclaration::new(
                "invoiceLine",
                RelationKind::ManyToMany,
                "tag",
            )],
            repositories: vec![
                RepositoryDeclaration::new("invoiceLine"),
                RepositoryDeclaration::new("tag"),
            ],
            cruds: vec![CrudDeclaration {
                get_active: true,
                list_active: true,
                relations: vec![CrudRelationDeclaration {
                    target: "tag".into(),
                    add: true,
                    remove: true,
                    list: true,
                }],
                ..CrudDeclaration::all("invoiceLine")
            }],
            usecases: vec![CustomUsecaseDeclaration {
                name: "closeMonth".into(),
                doc: None,
                request: Vec::new(),
                response: Vec::new(),
            }],
            ..DomainDeclaration::default()
        }
    }

    #[test]
    fn routes_follow_the_resource_layout() {
        let built = DomainBuilder::build(BuildConfig::default(), shop()).unwrap();
        let patterns: Vec<String> = built.routes().iter().map(|r| r.mux_pattern()).collect();
        assert_eq!(
            patterns,
            [
                "GET /invoice-lines/{id}",
                "GET /invoice-lines/active/{id}",
                "GET /invoice-lines",
                "GET /invoice-lines/active",
                "POST /invoice-lines",
                "PUT /invoice-lines/{id}",
                "DELETE /invoice-lines/{id}",
                "POST /invoice-lines/{id}/tags/{targetId}",
                "DELETE /invoice-lines/{id}/tags/{targetId}",
                "GET /invoice-lines/{id}/tags",
                "POST /usecases/close-month",
            ]
        );
    }

    #[test]
    fn relation_routes_fill_both_ids() {
        let built = DomainBuilder::build(BuildConfig::default(), shop()).unwrap();
        let routes = built.routes();
        let add = routes.iter().find(|r| r.handler == "AddInvoiceLineTag").unwrap();
        let fields: Vec<&str> = add.params.iter().map(|p| p.field.as_str()).collect();
        assert_eq!(fields, ["InvoiceLineID", "TagID"]);
        assert_eq!(add.sdk_name(), "addInvoiceLineTag");
        let create = routes.iter().find(|r| r.handler == "CreateInvoiceLine").unwrap();
        assert_eq!(create.status, 201);
    }
}
