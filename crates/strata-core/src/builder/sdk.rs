//! TypeScript SDK: one `fetch` wrapper per HTTP route.
//!
//! Records are copies of the Go entity and request/response records with
//! their methods dropped and their references moved into the SDK modules.
//! The functions are built from the same route table the controllers
//! register, so paths and verbs cannot drift apart.

use tracing::debug;

use crate::builder::routes::{RequestSource, Route, custom_routes, usecase_routes};
use crate::builder::{BuildError, BuildPhase, DomainBuilder, GoPackage};
use crate::ir::{
    Body, Dialect, Field, Function, NodeRef, Package, Struct, StructId, Type, TypeName,
};

const CLIENT: &str = "client";
const ENTITIES: &str = "entities";
const CLIENT_CONFIG: &str = "ClientConfig";
const API_ERROR: &str = "ApiError";
const REQUEST: &str = "request";

/// Moves Go references into SDK modules.
#[derive(Debug, Clone)]
struct Remap {
    go_entities: Package,
    go_usecase: Package,
    entities: Package,
    /// Module the copied record lands in.
    own: Package,
}

impl Remap {
    fn name(&self, name: &TypeName) -> TypeName {
        if name.package == self.go_entities {
            TypeName::new(self.entities.clone(), name.name.clone())
        } else if name.package == self.go_usecase {
            TypeName::new(self.own.clone(), name.name.clone())
        } else {
            name.clone()
        }
    }

    fn record(&self, source: &Struct) -> Struct {
        let mut record = source.clone();
        record.methods.clear();
        for field in &mut record.fields {
            field.ty = field.ty.map_names(&|n| self.name(n));
        }
        record
    }
}

impl DomainBuilder {
    pub(super) fn sdk_phase(&mut self) -> Result<(), BuildError> {
        self.shared(BuildPhase::Backends)?;
        let client = self.layout.sdk_package(CLIENT);
        let entities = self.layout.sdk_package(ENTITIES);
        self.sdk_client(&client);

        let base = Remap {
            go_entities: self.layout.package(GoPackage::Entities),
            go_usecase: self.layout.package(GoPackage::Usecase),
            entities: entities.clone(),
            own: entities.clone(),
        };

        let entities_path = self.layout.sdk_file(ENTITIES);
        let models: Vec<_> = self.entity_models.values().cloned().collect();
        for model in &models {
            let record = base.record(&self.store.structs[model.struct_id]);
            let id = self.store.add_struct(record);
            self.files
                .push(&entities_path, &entities, Dialect::TypeScript, NodeRef::Struct(id));
        }
        let orderings: Vec<_> = self
            .repository_models
            .values()
            .map(|r| r.order_enum)
            .collect();
        for order in orderings {
            let node = self.store.enums[order].clone();
            let id = self.store.add_enum(node);
            self.files
                .push(&entities_path, &entities, Dialect::TypeScript, NodeRef::Enum(id));
        }

        let usecases: Vec<_> = self.usecase_models.values().cloned().collect();
        for usecase in usecases {
            let Some(model) = self.entity_models.get(&usecase.entity).cloned() else {
                continue;
            };
            let own = self.layout.sdk_package(&model.sdk_stem);
            let records: Vec<(StructId, StructId)> = usecase
                .methods
                .iter()
                .map(|m| (m.request, m.response))
                .collect();
            let routes = usecase_routes(&model, &usecase);
            let path = self.layout.sdk_file(&model.sdk_stem);
            let remap = Remap { own, ..base.clone() };
            self.sdk_module(&path, &remap, &client, &records, &routes);
            debug!(module = %path, functions = routes.len(), "Built SDK module");
        }

        if let Some(custom) = self.custom.clone() {
            let remap = Remap {
                own: self.layout.sdk_package("custom"),
                ..base
            };
            let records: Vec<(StructId, StructId)> = custom
                .methods
                .iter()
                .map(|m| (m.request, m.response))
                .collect();
            let path = self.layout.sdk_file("custom");
            self.sdk_module(&path, &remap, &client, &records, &custom_routes(&custom));
        }
        Ok(())
    }

    /// `client.ts`: configuration, error shape and the `fetch` wrapper.
    fn sdk_client(&mut self, client: &Package) {
        let path = self.layout.sdk_file(CLIENT);

        let config = self.store.add_struct(
            Struct::new(CLIENT_CONFIG)
                .doc("Where the API lives and what every call sends along.")
                .field(Field::new("BaseUrl", Type::string()).json("baseUrl", false))
                .field(
                    Field::new("Headers", Type::map(Type::string(), Type::string()))
                        .json("headers", true),
                ),
        );
        let error = self.store.add_struct(
            Struct::new(API_ERROR)
                .doc("Thrown for every non-2xx response.")
                .field(Field::new("Status", Type::int()).json("status", false))
                .field(Field::new("Field", Type::string()).json("field", true))
                .field(Field::new("Message", Type::string()).json("message", false)),
        );
        let request = self.store.add_function(
            Function::new(REQUEST)
                .doc("Send one request and decode the JSON response.")
                .type_param("T", None)
                .param("config", Type::symbol(client, CLIENT_CONFIG))
                .param("method", Type::string())
                .param("path", Type::string())
                .param("query", Type::pointer(Type::map(Type::string(), Type::any())))
                .param("body", Type::any())
                .result(Type::symbol(client, "T"))
                .body(Body::snippet(|s| {
                    s.line("const url = new URL(config.baseUrl.replace(/\\/$/, '') + path);");
                    s.open("if (query) {");
                    s.open("for (const [key, value] of Object.entries(query)) {");
                    s.open("if (value !== undefined && value !== null) {");
                    s.line("url.searchParams.set(key, String(value));");
                    s.close("}");
                    s.close("}");
                    s.close("}");
                    s.open("const response = await fetch(url, {");
                    s.line("method,");
                    s.line("headers: { 'Content-Type': 'application/json', ...config.headers },");
                    s.line("body: body === undefined ? undefined : JSON.stringify(body),");
                    s.close("});");
                    s.line("const payload = await response.json().catch(() => ({}));");
                    s.open("if (!response.ok) {");
                    s.open(format!("const error: {API_ERROR} = {{"));
                    s.line("status: response.status,");
                    s.line("field: payload.field,");
                    s.line("message: payload.message ?? response.statusText,");
                    s.close("};");
                    s.line("throw error;");
                    s.close("}");
                    s.line("return payload as T;");
                })),
        );

        for node in [
            NodeRef::Struct(config),
            NodeRef::Struct(error),
            NodeRef::Function(request),
        ] {
            self.files.push(&path, client, Dialect::TypeScript, node);
        }
    }

    fn sdk_module(
        &mut self,
        path: &str,
        remap: &Remap,
        client: &Package,
        records: &[(StructId, StructId)],
        routes: &[Route],
    ) {
        let own = remap.own.clone();
        for &(request, response) in records {
            for source in [request, response] {
                let copy = remap.record(&self.store.structs[source]);
                let id = self.store.add_struct(copy);
                self.files.push(path, &own, Dialect::TypeScript, NodeRef::Struct(id));
            }
        }

        for (route, &(request, _)) in routes.iter().zip(records) {
            let fields: Vec<(String, String)> = self.store.structs[request]
                .fields
                .iter()
                .filter_map(|f| f.wire_name().map(|json| (f.name.clone(), json.to_string())))
                .collect();
            let call = sdk_call(route, &fields, client.clone());
            let function = self.store.add_function(
                Function::new(route.sdk_name())
                    .doc(format!("{} {}", route.method, route.pattern))
                    .param("config", Type::symbol(client, CLIENT_CONFIG))
                    .param("req", Type::symbol(&own, &route.request))
                    .result(Type::symbol(&own, &route.response))
                    .body(call),
            );
            self.files
                .push(path, &own, Dialect::TypeScript, NodeRef::Function(function));
        }
    }
}

/// `/invoices/{id}` → `` `/invoices/${encodeURIComponent(req.id)}` ``.
fn sdk_path(route: &Route, fields: &[(String, String)]) -> String {
    let mut path = route.pattern.clone();
    for param in &route.params {
        let json = fields
            .iter()
            .find(|(field, _)| *field == param.field)
            .map_or(param.name.as_str(), |(_, json)| json.as_str());
        path = path.replace(
            &format!("{{{}}}", param.name),
            &format!("${{encodeURIComponent(req.{json})}}"),
        );
    }
    format!("`{path}`")
}

fn sdk_call(route: &Route, fields: &[(String, String)], client: Package) -> Body {
    let path = sdk_path(route, fields);
    let query: Vec<String> = match route.source {
        RequestSource::Query => fields.iter().map(|(_, json)| format!("{json}: req.{json}")).collect(),
        RequestSource::Path => fields
            .iter()
            .filter(|(field, _)| field == "RetrieveInactive")
            .map(|(_, json)| format!("{json}: req.{json}"))
            .collect(),
        RequestSource::Body => Vec::new(),
    };
    let query = if query.is_empty() {
        "null".to_string()
    } else {
        format!("{{ {} }}", query.join(", "))
    };
    let body = match route.source {
        RequestSource::Body => "req",
        _ => "undefined",
    };
    let method = route.method;
    let response = route.response.clone();
    Body::snippet(move |s| {
        let request = s.sym(&client, REQUEST);
        s.line(format!(
            "return {request}<{response}>(config, '{method}', {path}, {query}, {body});"
        ));
    })
}

#[cfg(test)]
mod tests {
    use crate::builder::{BuildConfig, BuiltDomain, DomainBuilder};
    use crate::domain::{
        CrudDeclaration, CustomUsecaseDeclaration, DomainDeclaration, EntityDeclaration,
        FieldDeclaration, RelationDeclaration, RelationKind, RepositoryDeclaration,
    };
    use crate::emit::render_file;

    fn declaration() -> DomainDeclaration {
        DomainDeclaration {
            entities: vec![
                EntityDeclaration::new("customer").activable(),
                EntityDeclaration::new("invoice")
                    .field(FieldDeclaration::new("number", "string").rule("required")),
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
            cruds: vec![CrudDeclaration::all("invoice")],
            usecases: vec![CustomUsecaseDeclaration {
                name: "closeMonth".into(),
                doc: None,
                request: vec![FieldDeclaration::new("month", "string")],
                response: Vec::new(),
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
    fn entities_module_mirrors_the_records() {
        let built = DomainBuilder::build(BuildConfig::default(), declaration()).unwrap();
        let entities = text(&built, "sdk/entities.ts");
        assert!(entities.contains("export interface Invoice {"));
        assert!(entities.contains("  number: string;"));
        assert!(entities.contains("export type InvoiceOrderField = "));
        assert!(!entities.contains("TableName"));
    }

    #[test]
    fn functions_follow_the_routes() {
        let built = DomainBuilder::build(BuildConfig::default(), declaration()).unwrap();
        let invoice = text(&built, "sdk/invoice.ts");
        assert!(invoice.contains("import * as client from './client';"));
        assert!(invoice.contains(
            "export async function getInvoice(config: client.ClientConfig, req: GetInvoiceRequest): Promise<GetInvoiceResponse> {"
        ));
        assert!(invoice.contains(
            "return client.request<GetInvoiceResponse>(config, 'GET', `/invoices/${encodeURIComponent(req.id)}`, { retrieveInactive: req.retrieveInactive }, undefined);"
        ));
        assert!(invoice.contains("'POST', `/invoices`, null, req);"));
        assert!(invoice.contains("{ offset: req.offset, limit: req.limit"));
    }

    #[test]
    fn client_wraps_fetch() {
        let built = DomainBuilder::build(BuildConfig::default(), declaration()).unwrap();
        let client = text(&built, "sdk/client.ts");
        assert!(client.contains("export async function request<T>(config: ClientConfig"));
        assert!(client.contains("throw error;"));
        assert!(client.contains("headers?: Record<string, string>;"));
    }

    #[test]
    fn sdk_can_be_switched_off() {
        let config = BuildConfig {
            emit_sdk: false,
            ..BuildConfig::default()
        };
        let built = DomainBuilder::build(config, declaration()).unwrap();
        assert!(built.files().paths().all(|p| !p.starts_with("sdk/")));
    }

    #[test]
    fn custom_module_posts_the_request() {
        let built = DomainBuilder::build(BuildConfig::default(), declaration()).unwrap();
        let custom = text(&built, "sdk/custom.ts");
        assert!(custom.contains("'POST', `/usecases/close-month`, null, req);"));
    }
}
