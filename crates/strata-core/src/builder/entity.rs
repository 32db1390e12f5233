//! Entities phase: one record per declared entity.
//!
//! Field order is fixed: `ID`, declared fields, `Active` (activable only),
//! `CreatedAt`, `UpdatedAt`, `DeletedAt` (archivable only). The relations
//! phase appends foreign keys and associations after these.

use tracing::debug;

use crate::builder::model::{EntityModel, FieldOrigin, ModelField};
use crate::builder::{BuildError, BuildPhase, DomainBuilder, GoPackage, Layout, PhaseContext};
use crate::domain::{
    DeclarationRegistry, DeclarationValidator, DomainError, EntityId, FieldDeclaration, FieldType,
    naming,
};
use crate::ir::{Body, Dialect, Field, Function, NodeRef, Package, Primitive, Struct, Type};

/// Resolve a declared field type.
///
/// Entity references become pointers to the referenced record; anything
/// that is neither a primitive nor a registered entity is rejected.
pub(crate) fn resolve_field_type(
    registry: &DeclarationRegistry,
    entities: &Package,
    owner: &str,
    field: &FieldDeclaration,
) -> Result<Type, DomainError> {
    fn convert(
        registry: &DeclarationRegistry,
        entities: &Package,
        parsed: &FieldType,
    ) -> Option<Type> {
        match parsed {
            FieldType::Scalar(scalar) => Some(Type::Primitive(Primitive::from(*scalar))),
            FieldType::Array(inner) => convert(registry, entities, inner).map(Type::array),
            FieldType::Reference(name) => {
                let id = registry.entity_id(name)?;
                let go_name = naming::to_go_ident(&registry.entity(id).name);
                Some(Type::pointer(Type::entity(id, entities, go_name)))
            }
        }
    }

    convert(registry, entities, &FieldType::parse(&field.type_name)).ok_or_else(|| {
        DomainError::UnknownPrimitiveType {
            owner: owner.to_string(),
            field: field.name.clone(),
            type_name: field.type_name.clone(),
        }
    })
}

fn default_field(name: &str, json: &str, column: &str, ty: Type, queryable: bool) -> ModelField {
    ModelField {
        name: name.to_string(),
        json: json.to_string(),
        column: Some(column.to_string()),
        ty,
        origin: FieldOrigin::Default,
        rules: Vec::new(),
        queryable,
        unique_scope: None,
    }
}

fn struct_field(field: &ModelField, gorm: String, omit_empty: bool) -> Field {
    Field::new(&field.name, field.ty.clone())
        .json(&field.json, omit_empty)
        .tag("gorm", gorm)
}

impl DomainBuilder {
    pub(super) fn entities_phase(&mut self) -> Result<(), BuildError> {
        let entities_pkg = self.layout.package(GoPackage::Entities);
        let ids: Vec<EntityId> = self.registry.entities().map(|(id, _)| id).collect();

        for id in ids {
            let model = self.build_entity(id, &entities_pkg)?;
            if !self.entities.insert(id, model.struct_id) {
                return Err(DomainError::DuplicateEntity {
                    name: self.registry.entity(id).name.clone(),
                })
                .during(BuildPhase::Entities, || "recording entity records".to_string());
            }
            let path = self.layout.go_file(GoPackage::Entities, &model.go_stem);
            self.files
                .push(&path, &entities_pkg, Dialect::Go, NodeRef::Struct(model.struct_id));
            debug!(entity = %model.name, fields = model.fields.len(), "Built entity record");
            self.entity_models.insert(id, model);
        }
        Ok(())
    }

    fn build_entity(&mut self, id: EntityId, entities_pkg: &Package) -> Result<EntityModel, BuildError> {
        let decl = self.registry.entity(id).clone();
        let context = || format!("building entity '{}'", decl.name);

        let snake = naming::to_snake_case(&decl.name);
        let plural_snake = naming::pluralize(&snake);
        let name = naming::to_go_ident(&decl.name);

        let mut fields = vec![default_field("ID", "id", "id", Type::string(), true)];
        let mut gorm_tags = vec!["primaryKey".to_string()];

        for declared in &decl.fields {
            let rules = DeclarationValidator::parse_rules(&decl.name, declared)
                .during(BuildPhase::Entities, context)?;
            let ty = resolve_field_type(&self.registry, entities_pkg, &decl.name, declared)
                .during(BuildPhase::Entities, context)?;
            let parsed = FieldType::parse(&declared.type_name);
            let column = naming::to_snake_case(&declared.name);

            let mut gorm = format!("column:{column}");
            if !matches!(parsed, FieldType::Scalar(_)) {
                gorm.push_str(";serializer:json");
            }
            if rules.iter().any(|r| matches!(r, crate::domain::ValidationRule::Unique)) {
                gorm.push_str(";uniqueIndex");
            } else if rules.iter().any(|r| r.is_uniqueness()) {
                gorm.push_str(";index");
            }
            gorm_tags.push(gorm);

            fields.push(ModelField {
                name: naming::to_go_ident(&declared.name),
                json: naming::to_camel_case(&declared.name),
                column: Some(column),
                ty,
                origin: FieldOrigin::Declared,
                rules,
                queryable: matches!(parsed, FieldType::Scalar(_)),
                unique_scope: None,
            });
        }

        if decl.activable {
            let mut active = default_field("Active", "active", "active", Type::bool(), true);
            active.origin = FieldOrigin::Activable;
            fields.push(active);
            // No column default: gorm would skip an explicit false on insert.
            gorm_tags.push("column:active;not null".to_string());
        }
        fields.push(default_field("CreatedAt", "createdAt", "created_at", Type::time(), true));
        gorm_tags.push("column:created_at;autoCreateTime".to_string());
        fields.push(default_field("UpdatedAt", "updatedAt", "updated_at", Type::time(), true));
        gorm_tags.push("column:updated_at;autoUpdateTime".to_string());
        if decl.archivable {
            fields.push(default_field(
                "DeletedAt",
                "deletedAt",
                "deleted_at",
                Type::pointer(Type::time()),
                false,
            ));
            gorm_tags.push("column:deleted_at;index".to_string());
        }

        let doc = decl
            .doc
            .clone()
            .unwrap_or_else(|| format!("{name} is the stored {} record.", snake.replace('_', " ")));
        let mut record = Struct::new(&name).doc(doc);
        for (field, gorm) in fields.iter().zip(gorm_tags) {
            let omit_empty = field.ty.is_pointer();
            let mut ir = struct_field(field, gorm, omit_empty);
            if let Some(doc) = decl
                .fields
                .iter()
                .find(|d| naming::to_go_ident(&d.name) == field.name)
                .and_then(|d| d.doc.clone())
            {
                ir = ir.doc(doc);
            }
            record = record.field(ir);
        }
        let struct_id = self.store.add_struct(record);

        let table = naming::table_name(&decl.name);
        let table_literal = table.clone();
        self.store.add_method(
            struct_id,
            Function::new("TableName")
                .receiver("", Type::entity(id, entities_pkg, name.clone()))
                .result(Type::string())
                .body(Body::fixed(format!("return {table_literal:?}"))),
        );

        Ok(EntityModel {
            entity: id,
            struct_id,
            plural: naming::to_go_ident(&plural_snake),
            local: naming::to_go_local(&decl.name),
            local_plural: naming::to_go_local(&plural_snake),
            table,
            route: naming::to_kebab_case(&plural_snake),
            go_stem: Layout::go_stem(&decl.name),
            sdk_stem: Layout::sdk_stem(&decl.name),
            activable: decl.activable,
            archivable: decl.archivable,
            retrieve_inactive: self.registry.graph().require_retrieve_inactive(id),
            fields,
            foreign_keys: Vec::new(),
            associations: Vec::new(),
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{BuildConfig, DomainBuilder};
    use crate::domain::{
        DomainError, EntityDeclaration, FieldDeclaration, RelationDeclaration, RelationKind,
    };
    use crate::ir::NodeRef;

    fn built(entities: Vec<EntityDeclaration>) -> DomainBuilder {
        let mut builder = DomainBuilder::new(BuildConfig::default());
        for entity in entities {
            builder.register_entity(entity);
        }
        builder.seed_shared().build_entities();
        builder
    }

    #[test]
    fn record_fields_follow_the_fixed_order() {
        let builder = built(vec![
            EntityDeclaration::new("customer")
                .activable()
                .archivable()
                .field(FieldDeclaration::new("email", "string").rule("email")),
        ]);
        let model = builder.entity_models.values().next().unwrap();
        let names: Vec<&str> = model.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["ID", "Email", "Active", "CreatedAt", "UpdatedAt", "DeletedAt"]
        );
        assert_eq!(model.table, "customers");
        assert_eq!(model.route, "customers");
        assert!(model.retrieve_inactive);
    }

    #[test]
    fn deleted_at_only_on_archivable_entities() {
        let builder = built(vec![EntityDeclaration::new("note")]);
        let model = builder.entity_models.values().next().unwrap();
        assert!(model.field("DeletedAt").is_none());
        assert!(model.field("Active").is_none());
        assert!(!model.retrieve_inactive);
    }

    #[test]
    fn entity_records_render_with_gorm_tags() {
        let builder = built(vec![
            EntityDeclaration::new("invoice")
                .field(FieldDeclaration::new("number", "string").rule("unique"))
                .field(FieldDeclaration::new("labels", "[]string")),
        ]);
        let file = builder.files.get("internal/entities/invoice.go").unwrap();
        let NodeRef::Struct(id) = file.nodes[0] else {
            panic!("expected a struct");
        };
        let record = &builder.store.structs[id];
        assert_eq!(
            record.find_field("Number").unwrap().tag_value("gorm"),
            Some("column:number;uniqueIndex")
        );
        assert_eq!(
            record.find_field("Labels").unwrap().tag_value("gorm"),
            Some("column:labels;serializer:json")
        );
        assert_eq!(record.methods.len(), 1);
    }

    #[test]
    fn active_flag_has_no_column_default() {
        let builder = built(vec![EntityDeclaration::new("customer").activable()]);
        let file = builder.files.get("internal/entities/customer.go").unwrap();
        let NodeRef::Struct(id) = file.nodes[0] else {
            panic!("expected a struct");
        };
        let tag = builder.store.structs[id]
            .find_field("Active")
            .unwrap()
            .tag_value("gorm")
            .unwrap();
        assert_eq!(tag, "column:active;not null");
        assert!(!tag.contains("default"));
    }

    #[test]
    fn references_resolve_to_entity_pointers() {
        let builder = built(vec![
            EntityDeclaration::new("address"),
            EntityDeclaration::new("customer").field(FieldDeclaration::new("billing", "address")),
        ]);
        let customer = builder.entity_models.values().nth(1).unwrap();
        assert!(customer.field("Billing").unwrap().ty.is_pointer());
        assert!(!customer.field("Billing").unwrap().queryable);
    }

    #[test]
    fn unknown_types_are_rejected() {
        let builder = built(vec![
            EntityDeclaration::new("customer").field(FieldDeclaration::new("billing", "ghost")),
        ]);
        assert!(matches!(
            builder.error().and_then(|e| e.domain_error()),
            Some(DomainError::UnknownPrimitiveType { type_name, .. }) if type_name == "ghost"
        ));
    }

    #[test]
    fn inherited_activation_requires_retrieve_inactive() {
        let mut builder = DomainBuilder::new(BuildConfig::default());
        builder
            .register_entity(EntityDeclaration::new("customer").activable())
            .register_entity(EntityDeclaration::new("invoice"))
            .register_relation(RelationDeclaration::new(
                "invoice",
                RelationKind::BelongsTo,
                "customer",
            ))
            .seed_shared()
            .build_entities();
        let invoice = builder.entity_models.values().nth(1).unwrap();
        assert!(invoice.retrieve_inactive);
        assert!(!invoice.activable);
    }
}
