//! Shared symbols, seeded once per run.
//!
//! The repository package gets the not-found sentinel, pagination and
//! ordering records and the transaction interface. The use case package gets
//! the validation error record and its helpers. Option constructors are
//! seeded here as templates and copied per repository method.

use indexmap::IndexMap;

use crate::builder::{DomainBuilder, GoPackage, OptionKind};
use crate::ir::{
    Body, Dialect, Field, FuncType, Function, FunctionId, Interface, InterfaceId, MethodSignature, NodeRef,
    Package, Struct, StructId, Type, TypeName, Var, VarId, std_packages,
};

pub const NOT_FOUND: &str = "ErrNotFound";
pub const PAGINATION: &str = "Pagination";
pub const ORDERING: &str = "Ordering";
pub const TRANSACTION: &str = "Transaction";
pub const VALIDATION_ERROR: &str = "ValidationError";
pub const INVALID_REQUEST: &str = "invalidRequest";
pub const NEW_VALIDATOR: &str = "newValidator";

#[derive(Debug, Clone)]
pub struct SharedSymbols {
    pub not_found: VarId,
    pub pagination: StructId,
    pub ordering: StructId,
    pub transaction: InterfaceId,
    pub validation_error: StructId,
    pub invalid_request: FunctionId,
    pub new_validator: FunctionId,
    /// Option constructor templates, copied for every method context.
    pub option_templates: IndexMap<OptionKind, FunctionId>,
    pub new_context_template: FunctionId,
    repository: Package,
    usecase: Package,
}

impl SharedSymbols {
    pub fn repository_package(&self) -> &Package {
        &self.repository
    }

    pub fn usecase_package(&self) -> &Package {
        &self.usecase
    }

    pub fn pagination_type(&self) -> Type {
        Type::symbol(&self.repository, PAGINATION)
    }

    pub fn ordering_type(&self) -> Type {
        Type::symbol(&self.repository, ORDERING)
    }

    pub fn transaction_type(&self) -> Type {
        Type::symbol(&self.repository, TRANSACTION)
    }

    pub fn validation_error_type(&self) -> Type {
        Type::symbol(&self.usecase, VALIDATION_ERROR)
    }
}

/// Concrete names an option constructor body refers to. All live in the
/// repository package.
#[derive(Debug, Clone)]
pub(crate) struct OptionTarget {
    pub context: String,
    pub field_enum: String,
}

/// Parameters of the constructor for one context field.
pub(crate) fn option_params(kind: OptionKind, repository: &Package, field_enum: &str) -> Vec<(String, Type)> {
    match kind {
        OptionKind::By | OptionKind::Not => vec![
            ("field".to_string(), Type::enumeration(repository, field_enum)),
            ("value".to_string(), Type::any()),
        ],
        OptionKind::Tx => vec![("tx".to_string(), Type::symbol(repository, TRANSACTION))],
        OptionKind::Pagination => vec![(
            "pagination".to_string(),
            Type::symbol(repository, PAGINATION),
        )],
        OptionKind::Ordering => vec![("ordering".to_string(), Type::symbol(repository, ORDERING))],
        OptionKind::RetrieveInactive => Vec::new(),
    }
}

/// Type of one context field.
pub(crate) fn context_field_type(kind: OptionKind, repository: &Package, field_enum: &str) -> Type {
    match kind {
        OptionKind::By | OptionKind::Not => {
            Type::map(Type::enumeration(repository, field_enum), Type::any())
        }
        OptionKind::Tx => Type::symbol(repository, TRANSACTION),
        OptionKind::Pagination => Type::pointer(Type::symbol(repository, PAGINATION)),
        OptionKind::Ordering => Type::pointer(Type::symbol(repository, ORDERING)),
        OptionKind::RetrieveInactive => Type::bool(),
    }
}

pub(crate) fn option_body(kind: OptionKind, target: OptionTarget) -> Body {
    Body::snippet(move |s| {
        let field = kind.field();
        s.open(format!("return func(c *{}) {{", target.context));
        match kind {
            OptionKind::By | OptionKind::Not => {
                s.open(format!("if c.{field} == nil {{"));
                s.line(format!("c.{field} = make(map[{}]any)", target.field_enum));
                s.close("}");
                s.line(format!("c.{field}[field] = value"));
            }
            OptionKind::Tx => {
                s.line("c.Tx = tx");
            }
            OptionKind::Pagination => {
                s.line("c.Pagination = &pagination");
            }
            OptionKind::Ordering => {
                s.line("c.Ordering = &ordering");
            }
            OptionKind::RetrieveInactive => {
                s.line("c.RetrieveInactive = true");
            }
        }
        s.close("}");
    })
}

pub(crate) fn new_context_body(context: String) -> Body {
    Body::snippet(move |s| {
        s.line(format!("c := &{context}{{}}"));
        s.open("for _, opt := range opts {");
        s.line("opt(c)");
        s.close("}");
        s.line("return c");
    })
}

/// Placeholder signature used by the templates.
fn placeholder_option(repository: &Package) -> Type {
    Type::Func(FuncType {
        name: "Option".to_string(),
        params: vec![Type::pointer(Type::symbol(repository, "Context"))],
        results: Vec::new(),
    })
}

impl DomainBuilder {
    pub(super) fn seed_shared_symbols(&mut self) {
        let repository = self.layout.package(GoPackage::Repository);
        let usecase = self.layout.package(GoPackage::Usecase);
        let repository_file = self.layout.go_file(GoPackage::Repository, "repository");
        let errors_file = self.layout.go_file(GoPackage::Usecase, "errors");

        // ── repository package ───────────────────────────────────────────
        let not_found = self.store.add_var(Var {
            name: NOT_FOUND.to_string(),
            doc: Some(format!("{NOT_FOUND} is returned when no row matches a query.")),
            ty: None,
            value: Body::snippet(|s| {
                let new = s.sym(&std_packages::errors(), "New");
                s.line(format!("{new}(\"not found\")"));
            }),
        });
        let pagination = self.store.add_struct(
            Struct::new(PAGINATION)
                .doc("Pagination bounds a list query.")
                .field(Field::new("Offset", Type::int()).json("offset", false))
                .field(Field::new("Limit", Type::int()).json("limit", false)),
        );
        let ordering = self.store.add_struct(
            Struct::new(ORDERING)
                .doc("Ordering sorts a list query by one column.")
                .field(Field::new("Field", Type::string()).json("field", false))
                .field(Field::new("Descending", Type::bool()).json("descending", false)),
        );
        let mut tx = Interface::new(TRANSACTION);
        tx.doc = Some("Transaction is an open storage transaction, passed to methods through their Tx option.".to_string());
        tx.methods.push(MethodSignature::new("Commit").result(Type::error()));
        tx.methods.push(MethodSignature::new("Rollback").result(Type::error()));
        let transaction = self.store.add_interface(tx);

        for node in [
            NodeRef::Var(not_found),
            NodeRef::Struct(pagination),
            NodeRef::Struct(ordering),
            NodeRef::Interface(transaction),
        ] {
            self.files
                .push(&repository_file, &repository, Dialect::Go, node);
        }

        // ── use case package ─────────────────────────────────────────────
        let validation_error = self.store.add_struct(
            Struct::new(VALIDATION_ERROR)
                .doc("ValidationError reports a request that failed validation or a precondition.")
                .field(Field::new("Field", Type::string()).json("field", true))
                .field(Field::new("Message", Type::string()).json("message", false)),
        );
        self.store.add_method(
            validation_error,
            Function::new("Error")
                .receiver("e", Type::pointer(Type::symbol(&usecase, VALIDATION_ERROR)))
                .result(Type::string())
                .body(Body::snippet(|s| {
                    s.open("if e.Field == \"\" {");
                    s.line("return e.Message");
                    s.close("}");
                    s.line("return e.Field + \": \" + e.Message");
                })),
        );
        let invalid_request = self.store.add_function(
            Function::new(INVALID_REQUEST)
                .doc("invalidRequest turns a validator failure into a ValidationError.")
                .param("err", Type::error())
                .result(Type::error())
                .body(Body::snippet(|s| {
                    let errs = s.sym(&std_packages::validator(), "ValidationErrors");
                    let as_fn = s.sym(&std_packages::errors(), "As");
                    s.line(format!("var fieldErrors {errs}"));
                    s.open(format!("if {as_fn}(err, &fieldErrors) && len(fieldErrors) > 0 {{"));
                    s.line("first := fieldErrors[0]");
                    s.line(format!(
                        "return &{VALIDATION_ERROR}{{Field: first.Field(), Message: \"failed on the '\" + first.Tag() + \"' rule\"}}"
                    ));
                    s.close("}");
                    s.line(format!("return &{VALIDATION_ERROR}{{Message: err.Error()}}"));
                })),
        );
        let new_validator = self.store.add_function(
            Function::new(NEW_VALIDATOR)
                .doc("newValidator reports fields by their JSON names.")
                .result(Type::pointer(Type::symbol(&std_packages::validator(), "Validate")))
                .body(Body::snippet(|s| {
                    let new = s.sym(&std_packages::validator(), "New");
                    let field = s.sym(&Package::new("reflect"), "StructField");
                    let split = s.sym(&Package::new("strings"), "SplitN");
                    s.line(format!("v := {new}()"));
                    s.open(format!("v.RegisterTagNameFunc(func(f {field}) string {{"));
                    s.line(format!("name := {split}(f.Tag.Get(\"json\"), \",\", 2)[0]"));
                    s.open("if name == \"-\" {");
                    s.line("return \"\"");
                    s.close("}");
                    s.line("return name");
                    s.close("})");
                    s.line("return v");
                })),
        );
        for node in [
            NodeRef::Struct(validation_error),
            NodeRef::Function(invalid_request),
            NodeRef::Function(new_validator),
        ] {
            self.files
                .push(&errors_file, &usecase, Dialect::Go, node);
        }

        // ── option constructor templates ─────────────────────────────────
        let placeholder = OptionTarget {
            context: "Context".to_string(),
            field_enum: "Field".to_string(),
        };
        let mut option_templates = IndexMap::new();
        for kind in OptionKind::ALL {
            let mut template = Function::new(kind.field()).result(placeholder_option(&repository));
            for (name, ty) in option_params(kind, &repository, &placeholder.field_enum) {
                template = template.param(name, ty);
            }
            let template = template.body(option_body(kind, placeholder.clone()));
            option_templates.insert(kind, self.store.add_function(template));
        }
        let new_context_template = self.store.add_function(
            Function::new("NewContext")
                .param(
                    "opts",
                    Type::variadic(Type::Alias(TypeName::new(repository.clone(), "Option"))),
                )
                .result(Type::pointer(Type::symbol(&repository, "Context")))
                .body(new_context_body(placeholder.context.clone())),
        );

        self.shared = Some(SharedSymbols {
            not_found,
            pagination,
            ordering,
            transaction,
            validation_error,
            invalid_request,
            new_validator,
            option_templates,
            new_context_template,
            repository,
            usecase,
        });
    }
}
