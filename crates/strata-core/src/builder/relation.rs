//! Relations phase: foreign keys and association fields.
//!
//! Which side holds the key depends only on the multiplicities of the
//! relation kind:
//!
//! | source   | target   | key holder                  |
//! |----------|----------|-----------------------------|
//! | single   | multiple | source                      |
//! | multiple | single   | target                      |
//! | single   | single   | source                      |
//! | multiple | multiple | none, a join table is used  |
//!
//! Suppressing the reverse link removes the association field on the
//! target, never the key column it may hold.

use tracing::debug;

use crate::builder::model::{Association, ForeignKey};
use crate::builder::{BuildError, BuildPhase, DomainBuilder, GoPackage, PhaseContext};
use crate::domain::{
    DomainError, EntityId, LinkDirection, Multiplicity, RelationId, RelationKind, naming,
};
use crate::ir::{Field, Package, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Holder {
    Source,
    Target,
}

fn key_holder(kind: RelationKind) -> Option<Holder> {
    let (source, target) = kind.multiplicities();
    match (source.is_single(), target.is_single()) {
        (true, _) => Some(Holder::Source),
        (false, true) => Some(Holder::Target),
        (false, false) => None,
    }
}

/// Association field name and singular element name for one side.
fn association_names(
    multiplicity: Multiplicity,
    other_name: &str,
    other_plural: &str,
    self_relation: bool,
    direction: LinkDirection,
    forward_multiplicity: Multiplicity,
) -> (String, String) {
    if !self_relation {
        return if multiplicity.is_single() {
            (other_name.to_string(), other_name.to_string())
        } else {
            (other_plural.to_string(), other_name.to_string())
        };
    }
    let (field, singular) = match (direction, multiplicity.is_single()) {
        (LinkDirection::Forward, true) => ("Parent", "Parent"),
        (LinkDirection::Forward, false) => ("Children", "Child"),
        (LinkDirection::Reverse, true) if !forward_multiplicity.is_single() => ("Parent", "Parent"),
        (LinkDirection::Reverse, true) => ("Child", "Child"),
        (LinkDirection::Reverse, false) if forward_multiplicity.is_single() => ("Children", "Child"),
        (LinkDirection::Reverse, false) => ("Parents", "Parent"),
    };
    (field.to_string(), singular.to_string())
}

struct Side {
    entity: EntityId,
    other: EntityId,
    multiplicity: Multiplicity,
    direction: LinkDirection,
}

impl DomainBuilder {
    pub(super) fn relations_phase(&mut self) -> Result<(), BuildError> {
        let entities_pkg = self.layout.package(GoPackage::Entities);
        let relations: Vec<(RelationId, RelationKind, bool)> = self
            .registry
            .relations()
            .map(|(id, decl)| (id, decl.kind, decl.ignore_reverse))
            .collect();

        for (relation, kind, ignore_reverse) in relations {
            self.apply_relation(relation, kind, ignore_reverse, &entities_pkg)?;
        }
        self.resolve_unique_scopes()
    }

    fn apply_relation(
        &mut self,
        relation: RelationId,
        kind: RelationKind,
        ignore_reverse: bool,
        entities_pkg: &Package,
    ) -> Result<(), BuildError> {
        let decl = self.registry.relation(relation).clone();
        let context = || format!("applying relation {} {} {}", decl.source, decl.kind, decl.target);
        let ends = self
            .registry
            .relation_ends(relation)
            .ok_or_else(|| DomainError::UnknownEntity {
                name: decl.target.clone(),
                context: "relation".to_string(),
            })
            .during(BuildPhase::Relations, context)?;

        let (source_multiplicity, target_multiplicity) = kind.multiplicities();
        let self_relation = ends.source == ends.target;
        let holder = key_holder(kind);

        let join_table = match holder {
            None => Some(format!(
                "{}_{}",
                naming::to_snake_case(&self.registry.entity(ends.source).name),
                naming::table_name(&self.registry.entity(ends.target).name)
            )),
            Some(_) => None,
        };

        let key_field = match holder {
            Some(Holder::Source) => Some(self.add_foreign_key(
                relation,
                kind,
                ends.source,
                ends.target,
                source_multiplicity,
                self_relation,
            )),
            Some(Holder::Target) => Some(self.add_foreign_key(
                relation,
                kind,
                ends.target,
                ends.source,
                target_multiplicity,
                self_relation,
            )),
            None => None,
        };

        let gorm = match (&join_table, &key_field) {
            (Some(table), _) => format!("many2many:{table}"),
            (None, Some(field)) => format!("foreignKey:{field}"),
            (None, None) => String::new(),
        };

        let mut sides = vec![Side {
            entity: ends.source,
            other: ends.target,
            multiplicity: source_multiplicity,
            direction: LinkDirection::Forward,
        }];
        if !ignore_reverse {
            sides.push(Side {
                entity: ends.target,
                other: ends.source,
                multiplicity: target_multiplicity,
                direction: LinkDirection::Reverse,
            });
        }

        for side in sides {
            let link = self
                .registry
                .graph()
                .links(side.entity)
                .iter()
                .find(|l| l.relation == relation && l.direction == side.direction)
                .copied();
            let Some(link) = link else {
                continue;
            };
            let (other_name, other_plural) = match self.entity_models.get(&side.other) {
                Some(other) => (other.name.clone(), other.plural.clone()),
                None => continue,
            };
            let (base, singular) = association_names(
                side.multiplicity,
                &other_name,
                &other_plural,
                self_relation,
                side.direction,
                source_multiplicity,
            );
            let Some(model) = self.entity_models.get_mut(&side.entity) else {
                continue;
            };
            let field = model.unique_name(&base);
            let json = naming::to_camel_case(&field);
            let element = Type::pointer(Type::entity(side.other, entities_pkg, other_name));
            let ty = if side.multiplicity.is_single() {
                element
            } else {
                Type::array(element)
            };

            self.store.structs[model.struct_id].fields.push(
                Field::new(&field, ty)
                    .json(&json, true)
                    .tag("gorm", gorm.clone()),
            );
            model.associations.push(Association {
                relation,
                target: side.other,
                field,
                singular,
                json,
                link_type: link.link_type,
                multiplicity: side.multiplicity,
                direction: side.direction,
            });
        }

        debug!(relation = %decl.kind, source = %decl.source, target = %decl.target, "Applied relation");
        Ok(())
    }

    /// Append the key column to the holder's record and return its field name.
    fn add_foreign_key(
        &mut self,
        relation: RelationId,
        kind: RelationKind,
        holder: EntityId,
        referenced: EntityId,
        multiplicity: Multiplicity,
        self_relation: bool,
    ) -> String {
        let base = if self_relation {
            "ParentID".to_string()
        } else {
            format!("{}ID", naming::to_go_ident(&self.registry.entity(referenced).name))
        };
        let Some(model) = self.entity_models.get_mut(&holder) else {
            return base;
        };
        let field = model.unique_name(&base);
        let json = naming::to_camel_case(&field);
        let column = naming::to_snake_case(&field);
        let optional = multiplicity.is_optional();
        let ty = if optional {
            Type::pointer(Type::string())
        } else {
            Type::string()
        };

        self.store.structs[model.struct_id].fields.push(
            Field::new(&field, ty)
                .json(&json, optional)
                .tag("gorm", format!("column:{column};index")),
        );
        model.foreign_keys.push(ForeignKey {
            relation,
            target: referenced,
            field: field.clone(),
            json,
            column,
            optional,
            dependency: kind.is_dependency(),
        });
        field
    }

    /// Point every `uniqueIn` rule at the key column it is scoped by.
    ///
    /// The scope names the related entity (`customer`) or the key field
    /// itself (`customerId`).
    fn resolve_unique_scopes(&mut self) -> Result<(), BuildError> {
        let names: Vec<(EntityId, String)> = self
            .registry
            .entities()
            .map(|(id, decl)| (id, naming::to_snake_case(&decl.name)))
            .collect();

        for model in self.entity_models.values_mut() {
            let entity_name = self.registry.entity(model.entity).name.clone();
            for index in 0..model.fields.len() {
                let Some(scope) = model.fields[index].scope_name().map(str::to_string) else {
                    continue;
                };
                let wanted = naming::to_snake_case(&scope);
                let found = model.foreign_keys.iter().position(|fk| {
                    fk.column == wanted
                        || names
                            .iter()
                            .any(|(id, snake)| *id == fk.target && *snake == wanted)
                });
                match found {
                    Some(fk) => model.fields[index].unique_scope = Some(fk),
                    None => {
                        let field = model.fields[index].json.clone();
                        return Err(DomainError::UnknownUniqueScope {
                            entity: entity_name,
                            field,
                            scope,
                        })
                        .during(BuildPhase::Relations, || {
                            "resolving uniqueIn scopes".to_string()
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
