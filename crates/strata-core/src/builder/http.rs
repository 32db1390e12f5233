//! HTTP layer: `net/http` controllers over the use cases.

use tracing::debug;

use crate::builder::crud::CUSTOM_USECASES;
use crate::builder::routes::{RequestSource, Route, custom_routes, usecase_routes};
use crate::builder::shared::{NOT_FOUND, VALIDATION_ERROR};
use crate::builder::{BuildError, BuildPhase, DomainBuilder, GoPackage};
use crate::ir::{
    Body, Dialect, Field, Function, Interface, MethodSignature, NodeRef, Package, Snippet, Struct,
    StructId, Type, std_packages,
};

const WRITE_JSON: &str = "writeJSON";
const WRITE_ERROR: &str = "writeError";
const DECODE: &str = "decode";
const QUERY_INT: &str = "queryInt";
const QUERY_BOOL: &str = "queryBool";
const ERROR_BODY: &str = "errorBody";
const CONTROLLER: &str = "Controller";

fn response_writer() -> Type {
    Type::symbol(&std_packages::net_http(), "ResponseWriter")
}

fn request() -> Type {
    Type::pointer(Type::symbol(&std_packages::net_http(), "Request"))
}

fn serve_mux() -> Type {
    Type::pointer(Type::symbol(&std_packages::net_http(), "ServeMux"))
}

#[derive(Debug, Clone)]
struct HttpPackages {
    httpapi: Package,
    usecase: Package,
    repository: Package,
}

impl DomainBuilder {
    pub(super) fn http_phase(&mut self) -> Result<(), BuildError> {
        let shared = self.shared(BuildPhase::Backends)?;
        let packages = HttpPackages {
            httpapi: self.layout.package(GoPackage::HttpApi),
            usecase: shared.usecase_package().clone(),
            repository: shared.repository_package().clone(),
        };
        self.respond_helpers(&packages);

        let usecases: Vec<_> = self.usecase_models.values().cloned().collect();
        for usecase in usecases {
            let Some(model) = self.entity_models.get(&usecase.entity).cloned() else {
                continue;
            };
            let routes = usecase_routes(&model, &usecase);
            let controller = format!("{}Controller", model.name);
            let path = self.layout.go_file(GoPackage::HttpApi, &model.go_stem);
            let service = Type::pointer(Type::symbol(&packages.usecase, &usecase.name));
            let doc = format!("{controller} serves the {} use cases.", model.name);
            self.controller(&packages, &path, &controller, doc, service, &routes);
            debug!(controller = %controller, routes = routes.len(), "Built HTTP controller");
        }

        if let Some(custom) = self.custom.clone() {
            let routes = custom_routes(&custom);
            let path = self.layout.go_file(GoPackage::HttpApi, "custom");
            let service = Type::symbol(&packages.usecase, CUSTOM_USECASES);
            self.controller(
                &packages,
                &path,
                "CustomController",
                "CustomController routes requests to the hand-written use cases.".to_string(),
                service,
                &routes,
            );
        }
        Ok(())
    }

    /// `respond.go`: JSON helpers, error mapping and the mux constructor.
    fn respond_helpers(&mut self, packages: &HttpPackages) {
        let path = self.layout.go_file(GoPackage::HttpApi, "respond");
        let httpapi = &packages.httpapi;

        let controller = self.store.add_interface(Interface {
            name: CONTROLLER.to_string(),
            doc: Some("Controller registers its routes on a mux.".to_string()),
            methods: vec![MethodSignature::new("Register").param("mux", serve_mux())],
        });
        let new_mux = self.store.add_function(
            Function::new("NewMux")
                .doc("NewMux registers every controller on a fresh mux.")
                .param(
                    "controllers",
                    Type::variadic(Type::symbol(httpapi, CONTROLLER)),
                )
                .result(serve_mux())
                .body(Body::snippet(|s| {
                    let new = s.sym(&std_packages::net_http(), "NewServeMux");
                    s.line(format!("mux := {new}()"));
                    s.open("for _, c := range controllers {");
                    s.line("c.Register(mux)");
                    s.close("}");
                    s.line("return mux");
                })),
        );

        let error_body = self.store.add_struct(
            Struct::new(ERROR_BODY).field(Field::new("Message", Type::string()).json("message", false)),
        );
        let write_json = self.store.add_function(
            Function::new(WRITE_JSON)
                .param("w", response_writer())
                .param("status", Type::int())
                .param("body", Type::any())
                .body(Body::snippet(|s| {
                    let encoder = s.sym(&std_packages::encoding_json(), "NewEncoder");
                    s.line("w.Header().Set(\"Content-Type\", \"application/json\")");
                    s.line("w.WriteHeader(status)");
                    s.line(format!("_ = {encoder}(w).Encode(body)"));
                })),
        );
        let error_packages = packages.clone();
        let write_error = self.store.add_function(
            Function::new(WRITE_ERROR)
                .doc("writeError maps use case errors onto status codes.")
                .param("w", response_writer())
                .param("err", Type::error())
                .body(Body::snippet(move |s| {
                    let validation = s.sym(&error_packages.usecase, VALIDATION_ERROR);
                    let as_fn = s.sym(&std_packages::errors(), "As");
                    let is = s.sym(&std_packages::errors(), "Is");
                    let not_found = s.sym(&error_packages.repository, NOT_FOUND);
                    let bad = s.sym(&std_packages::net_http(), "StatusBadRequest");
                    let missing = s.sym(&std_packages::net_http(), "StatusNotFound");
                    let internal = s.sym(&std_packages::net_http(), "StatusInternalServerError");
                    s.line(format!("var invalid *{validation}"));
                    s.line("switch {");
                    s.open(format!("case {as_fn}(err, &invalid):"));
                    s.line(format!("{WRITE_JSON}(w, {bad}, invalid)"));
                    s.reopen(format!("case {is}(err, {not_found}):"));
                    s.line(format!("{WRITE_JSON}(w, {missing}, {ERROR_BODY}{{Message: \"not found\"}})"));
                    s.reopen("default:");
                    s.line(format!("{WRITE_JSON}(w, {internal}, {ERROR_BODY}{{Message: err.Error()}})"));
                    s.close("}");
                })),
        );
        let decode_packages = packages.clone();
        let decode = self.store.add_function(
            Function::new(DECODE)
                .param("r", request())
                .param("dst", Type::any())
                .result(Type::error())
                .body(Body::snippet(move |s| {
                    let decoder = s.sym(&std_packages::encoding_json(), "NewDecoder");
                    let validation = s.sym(&decode_packages.usecase, VALIDATION_ERROR);
                    s.open(format!("if err := {decoder}(r.Body).Decode(dst); err != nil {{"));
                    s.line(format!(
                        "return &{validation}{{Message: \"malformed JSON body: \" + err.Error()}}"
                    ));
                    s.close("}");
                    s.line("return nil");
                })),
        );
        let int_packages = packages.clone();
        let query_int = self.store.add_function(
            Function::new(QUERY_INT)
                .param("r", request())
                .param("key", Type::string())
                .result(Type::int())
                .result(Type::error())
                .body(Body::snippet(move |s| {
                    let atoi = s.sym(&std_packages::strconv(), "Atoi");
                    let validation = s.sym(&int_packages.usecase, VALIDATION_ERROR);
                    s.line("raw := r.URL.Query().Get(key)");
                    s.open("if raw == \"\" {");
                    s.line("return 0, nil");
                    s.close("}");
                    s.line(format!("n, err := {atoi}(raw)"));
                    s.open("if err != nil {");
                    s.line(format!(
                        "return 0, &{validation}{{Field: key, Message: \"must be an integer\"}}"
                    ));
                    s.close("}");
                    s.line("return n, nil");
                })),
        );
        let query_bool = self.store.add_function(
            Function::new(QUERY_BOOL)
                .param("r", request())
                .param("key", Type::string())
                .result(Type::bool())
                .body(Body::snippet(|s| {
                    let parse = s.sym(&std_packages::strconv(), "ParseBool");
                    s.line(format!("v, _ := {parse}(r.URL.Query().Get(key))"));
                    s.line("return v");
                })),
        );

        for node in [
            NodeRef::Interface(controller),
            NodeRef::Function(new_mux),
            NodeRef::Struct(error_body),
            NodeRef::Function(write_json),
            NodeRef::Function(write_error),
            NodeRef::Function(decode),
            NodeRef::Function(query_int),
            NodeRef::Function(query_bool),
        ] {
            self.files.push(&path, httpapi, Dialect::Go, node);
        }
    }

    fn controller(
        &mut self,
        packages: &HttpPackages,
        path: &str,
        name: &str,
        doc: String,
        service: Type,
        routes: &[Route],
    ) -> StructId {
        let self_ty = Type::pointer(Type::symbol(&packages.httpapi, name));
        let record = self
            .store
            .add_struct(Struct::new(name).doc(doc).field(Field::new("service", service.clone())));

        let constructor = self.store.add_function(
            Function::new(format!("New{name}"))
                .param("service", service)
                .result(self_ty.clone())
                .body(Body::fixed(format!("return &{name}{{service: service}}"))),
        );

        let patterns: Vec<(String, String)> = routes
            .iter()
            .map(|r| (r.mux_pattern(), r.handler.clone()))
            .collect();
        self.store.add_method(
            record,
            Function::new("Register")
                .doc(format!("Register adds the {name} routes to mux."))
                .receiver("c", self_ty.clone())
                .param("mux", serve_mux())
                .body(Body::snippet(move |s| {
                    for (pattern, handler) in &patterns {
                        s.line(format!("mux.HandleFunc({pattern:?}, c.{handler})"));
                    }
                })),
        );

        for route in routes {
            let fields: Vec<(String, String)> = self
                .route_request(route)
                .map(|id| {
                    self.store.structs[id]
                        .fields
                        .iter()
                        .filter_map(|f| f.wire_name().map(|json| (f.name.clone(), json.to_string())))
                        .collect()
                })
                .unwrap_or_default();
            let plan = HandlerPlan {
                route: route.clone(),
                fields,
                usecase: packages.usecase.clone(),
            };
            self.store.add_method(
                record,
                Function::new(&route.handler)
                    .doc(format!("{} handles {}.", route.handler, route.mux_pattern()))
                    .receiver("c", self_ty.clone())
                    .param("w", response_writer())
                    .param("r", request())
                    .body(handler_body(plan)),
            );
        }

        for node in [NodeRef::Struct(record), NodeRef::Function(constructor)] {
            self.files.push(path, &packages.httpapi, Dialect::Go, node);
        }
        record
    }

    /// Request record a route decodes into.
    fn route_request(&self, route: &Route) -> Option<StructId> {
        if route.action.is_none() {
            return self
                .custom
                .as_ref()?
                .methods
                .iter()
                .find(|m| m.name == route.handler)
                .map(|m| m.request);
        }
        self.usecase_models
            .values()
            .flat_map(|u| &u.methods)
            .find(|m| m.name == route.handler && m.request_name == route.request)
            .map(|m| m.request)
    }
}

#[derive(Debug, Clone)]
struct HandlerPlan {
    route: Route,
    /// `(Go field, JSON name)` of the request record.
    fields: Vec<(String, String)>,
    usecase: Package,
}

fn handler_body(plan: HandlerPlan) -> Body {
    Body::snippet(move |s| {
        let route = &plan.route;
        let request = s.sym(&plan.usecase, &route.request);
        let path_fields: Vec<String> = route
            .params
            .iter()
            .map(|p| format!("{}: r.PathValue({:?})", p.field, p.name))
            .collect();

        match route.source {
            RequestSource::Body => {
                s.line(format!("req := &{request}{{}}"));
                s.open(format!("if err := {DECODE}(r, req); err != nil {{"));
                bail(s);
                for param in &route.params {
                    s.line(format!("req.{} = r.PathValue({:?})", param.field, param.name));
                }
            }
            RequestSource::Path => {
                s.line(format!("req := &{request}{{{}}}", path_fields.join(", ")));
                if plan.fields.iter().any(|(f, _)| f == "RetrieveInactive") {
                    s.line(format!("req.RetrieveInactive = {QUERY_BOOL}(r, \"retrieveInactive\")"));
                }
            }
            RequestSource::Query => {
                s.line(format!("req := &{request}{{}}"));
                s.line("var err error");
                for (field, json) in &plan.fields {
                    match field.as_str() {
                        "Offset" | "Limit" => {
                            s.open(format!("if req.{field}, err = {QUERY_INT}(r, {json:?}); err != nil {{"));
                            bail(s);
                        }
                        "OrderBy" => {
                            s.line(format!("req.OrderBy = r.URL.Query().Get({json:?})"));
                        }
                        _ => {
                            s.line(format!("req.{field} = {QUERY_BOOL}(r, {json:?})"));
                        }
                    }
                }
            }
        }

        let status = match route.status {
            201 => "StatusCreated",
            _ => "StatusOK",
        };
        let status = s.sym(&std_packages::net_http(), status);
        s.line(format!("resp, err := c.service.{}(r.Context(), req)", route.handler));
        s.open("if err != nil {");
        bail(s);
        s.line(format!("{WRITE_JSON}(w, {status}, resp)"));
    })
}

/// Body of an `if err != nil {` block opened by the caller.
fn bail(s: &mut Snippet<'_>) {
    s.line(format!("{WRITE_ERROR}(w, err)"));
    s.line("return");
    s.close("}");
}
