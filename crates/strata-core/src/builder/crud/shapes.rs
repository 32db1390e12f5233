//! Request and response records of the CRUD use cases.

use crate::builder::model::{Association, EntityModel, RepositoryModel};
use crate::domain::{ValidationRule, naming};
use crate::ir::{Field, Package, Struct, Type};

/// The `validate` tag for a rule list: `required,email`, or
/// `omitempty,email` when the field may be left out.
pub(crate) fn validate_tag(rules: &[ValidationRule]) -> Option<String> {
    let tags: Vec<String> = rules.iter().filter_map(ValidationRule::validator_tag).collect();
    if tags.is_empty() {
        return None;
    }
    if rules.contains(&ValidationRule::Required) {
        Some(tags.join(","))
    } else {
        Some(format!("omitempty,{}", tags.join(",")))
    }
}

fn required_id(name: &str, json: &str) -> Field {
    Field::new(name, Type::string())
        .json(json, false)
        .tag("validate", "required")
}

fn retrieve_inactive() -> Field {
    Field::new("RetrieveInactive", Type::bool()).json("retrieveInactive", true)
}

pub(crate) fn get_request(name: &str, model: &EntityModel) -> Struct {
    let mut request = Struct::new(name)
        .doc(format!("{name} selects one {} by ID.", model.name))
        .field(required_id("ID", "id"));
    if model.retrieve_inactive {
        request = request.field(retrieve_inactive());
    }
    request
}

pub(crate) fn list_request(name: &str, model: &EntityModel, repository: &RepositoryModel) -> Struct {
    let columns: Vec<&str> = repository.columns.iter().map(|c| c.column.as_str()).collect();
    let mut request = Struct::new(name)
        .doc(format!("{name} pages through {} rows.", model.name))
        .field(Field::new("Offset", Type::int()).json("offset", true).tag("validate", "gte=0"))
        .field(Field::new("Limit", Type::int()).json("limit", true).tag("validate", "gte=0"))
        .field(
            Field::new("OrderBy", Type::string())
                .json("orderBy", true)
                .tag("validate", format!("omitempty,oneof={}", columns.join(" "))),
        )
        .field(Field::new("Descending", Type::bool()).json("descending", true));
    if model.retrieve_inactive {
        request = request.field(retrieve_inactive());
    }
    request
}

/// Fields a write request carries, paired with the expression that copies
/// each into the entity.
pub(crate) fn write_fields(model: &EntityModel) -> Vec<(Field, (String, String))> {
    let mut out = Vec::new();
    for field in model.declared_fields() {
        let required = field.rules.contains(&ValidationRule::Required);
        let mut ir = Field::new(&field.name, field.ty.clone()).json(&field.json, !required);
        if let Some(tag) = validate_tag(&field.rules) {
            ir = ir.tag("validate", tag);
        }
        out.push((ir, (field.name.clone(), format!("req.{}", field.name))));
    }
    if model.activable {
        out.push((
            Field::new("Active", Type::pointer(Type::bool())).json("active", true),
            ("Active".to_string(), "active".to_string()),
        ));
    }
    for fk in &model.foreign_keys {
        let ir = if fk.optional {
            Field::new(&fk.field, Type::pointer(Type::string())).json(&fk.json, true)
        } else {
            Field::new(&fk.field, Type::string())
                .json(&fk.json, false)
                .tag("validate", "required")
        };
        out.push((ir, (fk.field.clone(), format!("req.{}", fk.field))));
    }
    out
}

pub(crate) fn create_request(name: &str, model: &EntityModel) -> Struct {
    let mut request = Struct::new(name).doc(format!("{name} holds the fields of a new {}.", model.name));
    for (field, _) in write_fields(model) {
        request = request.field(field);
    }
    request
}

pub(crate) fn update_request(name: &str, model: &EntityModel) -> Struct {
    let mut request = Struct::new(name)
        .doc(format!("{name} replaces the fields of a stored {}.", model.name))
        .field(required_id("ID", "id"));
    for (field, _) in write_fields(model) {
        request = request.field(field);
    }
    request
}

pub(crate) fn delete_request(name: &str, model: &EntityModel) -> Struct {
    Struct::new(name)
        .doc(format!("{name} selects the {} to delete.", model.name))
        .field(required_id("ID", "id"))
}

/// Request field names of a relation sub-action: the owner's key, then the
/// related row's key.
pub(crate) fn link_ids(model: &EntityModel, association: &Association) -> (String, String) {
    let own = format!("{}ID", model.name);
    let mut other = format!("{}ID", naming::to_go_ident(&association.singular));
    if other == own {
        other = format!("Other{other}");
    }
    (own, other)
}

pub(crate) fn link_request(name: &str, model: &EntityModel, association: &Association) -> Struct {
    let (own, other) = link_ids(model, association);
    Struct::new(name)
        .field(required_id(&own, &naming::to_camel_case(&own)))
        .field(required_id(&other, &naming::to_camel_case(&other)))
}

pub(crate) fn list_related_request(name: &str, model: &EntityModel) -> Struct {
    let own = format!("{}ID", model.name);
    Struct::new(name).field(required_id(&own, &naming::to_camel_case(&own)))
}

/// Response carrying one value.
pub(crate) fn response(name: &str, field: &str, json: &str, ty: Type) -> Struct {
    Struct::new(name).field(Field::new(field, ty).json(json, false))
}

pub(crate) fn empty_response(name: &str) -> Struct {
    Struct::new(name)
}

/// Copy of a request without the retrieve-inactive flag, for the
/// active-only variants.
pub(crate) fn active_only(request: &Struct, name: &str) -> Struct {
    let mut copy = request.clone();
    copy.name = name.to_string();
    copy.doc = request.doc.as_ref().map(|d| d.replacen(&request.name, name, 1));
    copy.fields.retain(|f| f.name != "RetrieveInactive");
    copy.methods.clear();
    copy
}

/// Entity types as seen from the use case package.
pub(crate) fn entity_pointer(model: &EntityModel, entities: &Package) -> Type {
    Type::pointer(model.entity_type(entities))
}
