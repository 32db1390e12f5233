//! Custom use cases: generated contracts, hand-written implementations.

use crate::builder::crud::shapes::validate_tag;
use crate::builder::entity::resolve_field_type;
use crate::builder::model::{CustomMethod, CustomModel};
use crate::builder::{BuildError, BuildPhase, DomainBuilder, GoPackage, PhaseContext};
use crate::domain::{
    CustomUsecaseDeclaration, DeclarationValidator, FieldDeclaration, UsecaseId, ValidationRule,
    naming,
};
use crate::ir::{
    Dialect, Field, Interface, MethodSignature, NodeRef, Package, Struct, Type, std_packages,
};

pub const CUSTOM_USECASES: &str = "CustomUsecases";

impl DomainBuilder {
    pub(super) fn custom_usecases(&mut self) -> Result<(), BuildError> {
        let decls: Vec<(UsecaseId, CustomUsecaseDeclaration)> = self
            .registry
            .usecases()
            .map(|(id, decl)| (id, decl.clone()))
            .collect();
        if decls.is_empty() {
            return Ok(());
        }

        let usecase_pkg = self.layout.package(GoPackage::Usecase);
        let entities_pkg = self.layout.package(GoPackage::Entities);
        let path = self.layout.go_file(GoPackage::Usecase, "custom");

        let mut contract = Interface::new(CUSTOM_USECASES);
        contract.doc = Some(format!(
            "{CUSTOM_USECASES} is implemented by hand; the HTTP layer only routes to it."
        ));
        let mut methods = Vec::with_capacity(decls.len());
        let mut nodes = Vec::new();

        for (id, decl) in decls {
            let name = naming::to_go_ident(&decl.name);
            let request_name = format!("{name}Request");
            let response_name = format!("{name}Response");

            let request = self.custom_record(&request_name, &decl, &decl.request, &entities_pkg, true)?;
            let response = self.custom_record(&response_name, &decl, &decl.response, &entities_pkg, false)?;
            let request = self.store.add_struct(request);
            let response = self.store.add_struct(response);
            nodes.push(NodeRef::Struct(request));
            nodes.push(NodeRef::Struct(response));

            let mut signature = MethodSignature::new(&name)
                .param("ctx", Type::symbol(&std_packages::context(), "Context"))
                .param("req", Type::pointer(Type::symbol(&usecase_pkg, &request_name)))
                .result(Type::pointer(Type::symbol(&usecase_pkg, &response_name)))
                .result(Type::error());
            signature.doc = decl.doc.clone();
            contract.methods.push(signature);

            methods.push(CustomMethod {
                usecase: id,
                route: naming::to_kebab_case(&decl.name),
                name,
                request,
                request_name,
                response,
                response_name,
            });
        }

        let interface = self.store.add_interface(contract);
        self.files
            .push(&path, &usecase_pkg, Dialect::Go, NodeRef::Interface(interface));
        for node in nodes {
            self.files.push(&path, &usecase_pkg, Dialect::Go, node);
        }
        self.custom = Some(CustomModel {
            interface,
            name: CUSTOM_USECASES.to_string(),
            methods,
        });
        Ok(())
    }

    fn custom_record(
        &self,
        name: &str,
        decl: &CustomUsecaseDeclaration,
        fields: &[FieldDeclaration],
        entities_pkg: &Package,
        validated: bool,
    ) -> Result<Struct, BuildError> {
        let context = || format!("building custom use case '{}'", decl.name);
        let mut record = Struct::new(name);
        for field in fields {
            let rules = DeclarationValidator::parse_rules(&decl.name, field)
                .during(BuildPhase::Usecases, context)?;
            let ty = resolve_field_type(&self.registry, entities_pkg, &decl.name, field)
                .during(BuildPhase::Usecases, context)?;
            let required = rules.contains(&ValidationRule::Required);
            let mut ir = Field::new(naming::to_go_ident(&field.name), ty)
                .json(&naming::to_camel_case(&field.name), !required);
            if validated {
                if let Some(tag) = validate_tag(&rules) {
                    ir = ir.tag("validate", tag);
                }
            }
            if let Some(doc) = &field.doc {
                ir = ir.doc(doc);
            }
            record = record.field(ir);
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{BuildConfig, DomainBuilder};
    use crate::domain::{CustomUsecaseDeclaration, DomainDeclaration, FieldDeclaration};
    use crate::emit::render_file;

    fn close_month() -> CustomUsecaseDeclaration {
        CustomUsecaseDeclaration {
            name: "closeMonth".into(),
            doc: Some("CloseMonth locks every invoice of a month.".into()),
            request: vec![FieldDeclaration::new("month", "string").rule("required")],
            response: vec![FieldDeclaration::new("closed", "int")],
        }
    }

    #[test]
    fn custom_contract_is_generated() {
        let decl = DomainDeclaration {
            usecases: vec![close_month()],
            ..DomainDeclaration::default()
        };
        let built = DomainBuilder::build(BuildConfig::default(), decl).unwrap();
        let custom = built.custom().unwrap();
        assert_eq!(custom.methods[0].name, "CloseMonth");
        assert_eq!(custom.methods[0].route, "close-month");

        let file = built.files().get("internal/usecase/custom.go").unwrap();
        let text = render_file(built.store(), file).unwrap().contents;
        assert!(text.contains("type CustomUsecases interface {"));
        assert!(text.contains("CloseMonth(ctx context.Context, req *CloseMonthRequest) (*CloseMonthResponse, error)"));
        assert!(text.contains("Month string `json:\"month\" validate:\"required\"`"));
        assert!(text.contains("Closed int `json:\"closed,omitempty\"`"));
    }
}
