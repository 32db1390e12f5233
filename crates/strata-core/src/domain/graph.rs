//! Relation graph.
//!
//! A directed graph over entities. Every registered relation adds one link
//! on its source node and, unless the reverse is suppressed, a mirrored link
//! on its target node. Links are typed `DEPEND`, `ONE` or `MANY`.
//!
//! Two derived properties are computed from `DEPEND` edges:
//!
//! - [`RelationGraph::require_retrieve_inactive`]: reads of an entity must
//!   offer a retrieve-inactive override because it, or something it depends
//!   on, is activable.
//! - [`RelationGraph::activable_join_paths`]: the chains of dependencies a
//!   query has to join to filter inactive or archived ancestors.
//!
//! The first walk visits each edge at most once per call and the second
//! at most once per path, so cyclic `belongsTo` declarations terminate.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::domain::{
    registry::{EntityId, RelationId},
    value_objects::{LinkDirection, LinkType, Multiplicity, RelationKind},
};

/// One outgoing edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationNodeLink {
    pub relation: RelationId,
    pub target: EntityId,
    pub link_type: LinkType,
    pub multiplicity: Multiplicity,
    pub direction: LinkDirection,
}

/// Graph node wrapping one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationNode {
    pub entity: EntityId,
    pub activable: bool,
    pub archivable: bool,
    pub links: Vec<RelationNodeLink>,
}

impl RelationNode {
    fn new(entity: EntityId, activable: bool, archivable: bool) -> Self {
        Self {
            entity,
            activable,
            archivable,
            links: Vec::new(),
        }
    }

    pub fn depend_links(&self) -> impl Iterator<Item = &RelationNodeLink> {
        self.links
            .iter()
            .filter(|l| l.link_type == LinkType::Depend)
    }

    pub fn many_links(&self) -> impl Iterator<Item = &RelationNodeLink> {
        self.links.iter().filter(|l| l.link_type == LinkType::Many)
    }
}

/// One hop of a join path: `from` holds the key referencing `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JoinStep {
    pub relation: RelationId,
    pub from: EntityId,
    pub to: EntityId,
}

/// A chain of dependencies ending at an activable or archivable ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPath {
    pub steps: Vec<JoinStep>,
}

impl JoinPath {
    pub fn terminal(&self) -> Option<EntityId> {
        self.steps.last().map(|s| s.to)
    }
}

/// Endpoint flags needed when a node has to be created.
#[derive(Debug, Clone, Copy)]
pub struct NodeSeed {
    pub entity: EntityId,
    pub activable: bool,
    pub archivable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    nodes: IndexMap<EntityId, RelationNode>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locate or create the node for an entity.
    pub fn ensure_node(&mut self, seed: NodeSeed) -> &mut RelationNode {
        self.nodes
            .entry(seed.entity)
            .or_insert_with(|| RelationNode::new(seed.entity, seed.activable, seed.archivable))
    }

    /// Add the links for one relation. Returns how many links were created.
    pub fn add_relation(
        &mut self,
        relation: RelationId,
        kind: RelationKind,
        ignore_reverse: bool,
        source: NodeSeed,
        target: NodeSeed,
    ) -> usize {
        let (forward, reverse) = kind.multiplicities();
        let dependency = kind.is_dependency();

        self.ensure_node(target);
        self.ensure_node(source).links.push(RelationNodeLink {
            relation,
            target: target.entity,
            link_type: LinkType::from_multiplicity(forward, dependency),
            multiplicity: forward,
            direction: LinkDirection::Forward,
        });

        if ignore_reverse {
            return 1;
        }

        // The depended-upon side always sees many dependents.
        let reverse_type = if dependency {
            LinkType::Many
        } else {
            LinkType::from_multiplicity(reverse, false)
        };
        self.ensure_node(target).links.push(RelationNodeLink {
            relation,
            target: source.entity,
            link_type: reverse_type,
            multiplicity: reverse,
            direction: LinkDirection::Reverse,
        });
        2
    }

    pub fn node(&self, entity: EntityId) -> Option<&RelationNode> {
        self.nodes.get(&entity)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &RelationNode> {
        self.nodes.values()
    }

    pub fn links(&self, entity: EntityId) -> &[RelationNodeLink] {
        self.nodes
            .get(&entity)
            .map(|n| n.links.as_slice())
            .unwrap_or(&[])
    }

    /// The link `entity` holds for `relation`, if any.
    pub fn link_for(&self, entity: EntityId, relation: RelationId) -> Option<&RelationNodeLink> {
        self.links(entity).iter().find(|l| l.relation == relation)
    }

    /// True iff the entity is activable or depends, through `DEPEND` edges,
    /// on an entity that is.
    pub fn require_retrieve_inactive(&self, entity: EntityId) -> bool {
        let mut visited = HashSet::new();
        self.requires_inactive_filter(entity, &mut visited)
    }

    fn requires_inactive_filter(&self, entity: EntityId, visited: &mut HashSet<RelationId>) -> bool {
        let Some(node) = self.nodes.get(&entity) else {
            return false;
        };
        if node.activable {
            return true;
        }
        for link in node.depend_links() {
            if !visited.insert(link.relation) {
                continue;
            }
            if self.requires_inactive_filter(link.target, visited) {
                return true;
            }
        }
        false
    }

    /// Every dependency chain from `entity` whose last hop reaches an
    /// activable or archivable ancestor. Paths are reported in depth-first
    /// order; a prefix is reported before its extensions. An edge appears at
    /// most once per path, so cycles end the path but sibling routes through
    /// a shared ancestor are each reported.
    pub fn activable_join_paths(&self, entity: EntityId) -> Vec<JoinPath> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        self.collect_join_paths(entity, &mut prefix, &mut out);
        out
    }

    fn collect_join_paths(&self, entity: EntityId, prefix: &mut Vec<JoinStep>, out: &mut Vec<JoinPath>) {
        let Some(node) = self.nodes.get(&entity) else {
            return;
        };
        for link in node.depend_links() {
            if prefix.iter().any(|step| step.relation == link.relation) {
                continue;
            }
            prefix.push(JoinStep {
                relation: link.relation,
                from: entity,
                to: link.target,
            });
            if let Some(target) = self.nodes.get(&link.target) {
                if target.activable || target.archivable {
                    out.push(JoinPath {
                        steps: prefix.clone(),
                    });
                }
            }
            self.collect_join_paths(link.target, prefix, out);
            prefix.pop();
        }
    }

    /// Entities that can reach themselves through `DEPEND` edges.
    pub fn depend_cycles(&self) -> Vec<EntityId> {
        self.nodes
            .keys()
            .copied()
            .filter(|&start| self.depends_on(start, start))
            .collect()
    }

    fn depends_on(&self, from: EntityId, wanted: EntityId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            for link in node.depend_links() {
                if link.target == wanted {
                    return true;
                }
                if seen.insert(link.target) {
                    stack.push(link.target);
                }
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::domain::entities::{EntityDeclaration, RelationDeclaration};

    struct Fixture {
        entities: Arena<EntityDeclaration>,
        relations: Arena<RelationDeclaration>,
        graph: RelationGraph,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                entities: Arena::new(),
                relations: Arena::new(),
                graph: RelationGraph::new(),
            }
        }

        fn entity(&mut self, name: &str, activable: bool) -> EntityId {
            let mut decl = EntityDeclaration::new(name);
            decl.activable = activable;
            let id = self.entities.alloc(decl);
            let seed = self.seed(id);
            self.graph.ensure_node(seed);
            id
        }

        fn seed(&self, id: EntityId) -> NodeSeed {
            NodeSeed {
                entity: id,
                activable: self.entities[id].activable,
                archivable: self.entities[id].archivable,
            }
        }

        fn relate(
            &mut self,
            source: EntityId,
            kind: RelationKind,
            target: EntityId,
            ignore_reverse: bool,
        ) -> (RelationId, usize) {
            let decl = RelationDeclaration::new(
                self.entities[source].name.clone(),
                kind,
                self.entities[target].name.clone(),
            );
            let rel = self.relations.alloc(decl);
            let (s, t) = (self.seed(source), self.seed(target));
            let created = self.graph.add_relation(rel, kind, ignore_reverse, s, t);
            (rel, created)
        }
    }

    #[test]
    fn belongs_to_creates_depend_and_many() {
        let mut fx = Fixture::new();
        let invoice = fx.entity("invoice", false);
        let customer = fx.entity("customer", true);
        let (rel, created) = fx.relate(invoice, RelationKind::BelongsTo, customer, false);

        assert_eq!(created, 2);
        let forward = fx.graph.link_for(invoice, rel).unwrap();
        assert_eq!(forward.link_type, LinkType::Depend);
        assert_eq!(forward.multiplicity, Multiplicity::SingleMandatory);
        assert_eq!(forward.target, customer);

        let reverse = fx.graph.link_for(customer, rel).unwrap();
        assert_eq!(reverse.link_type, LinkType::Many);
        assert_eq!(reverse.direction, LinkDirection::Reverse);
    }

    #[test]
    fn many_to_many_links_both_sides_as_many() {
        let mut fx = Fixture::new();
        let invoice = fx.entity("invoice", false);
        let tag = fx.entity("tag", false);
        let (rel, _) = fx.relate(invoice, RelationKind::ManyToMany, tag, false);

        assert_eq!(fx.graph.link_for(invoice, rel).unwrap().link_type, LinkType::Many);
        assert_eq!(fx.graph.link_for(tag, rel).unwrap().link_type, LinkType::Many);
        assert_eq!(fx.graph.link_for(tag, rel).unwrap().target, invoice);
    }

    #[test]
    fn ignore_reverse_only_links_the_source() {
        let mut fx = Fixture::new();
        let invoice = fx.entity("invoice", false);
        let tag = fx.entity("tag", false);
        let (rel, created) = fx.relate(invoice, RelationKind::ManyToMany, tag, true);

        assert_eq!(created, 1);
        assert!(fx.graph.link_for(invoice, rel).is_some());
        assert!(fx.graph.links(tag).is_empty());
    }

    #[test]
    fn optional_kinds_produce_one_links() {
        let mut fx = Fixture::new();
        let user = fx.entity("user", false);
        let profile = fx.entity("profile", false);
        let (rel, _) = fx.relate(user, RelationKind::OneToOne, profile, false);

        for entity in [user, profile] {
            let link = fx.graph.link_for(entity, rel).unwrap();
            assert_eq!(link.link_type, LinkType::One);
            assert_eq!(link.multiplicity, Multiplicity::SingleOptional);
        }
    }

    #[test]
    fn one_to_many_mirrors_as_single_optional() {
        let mut fx = Fixture::new();
        let customer = fx.entity("customer", false);
        let invoice = fx.entity("invoice", false);
        let (rel, _) = fx.relate(customer, RelationKind::OneToMany, invoice, false);

        assert_eq!(fx.graph.link_for(customer, rel).unwrap().link_type, LinkType::Many);
        let reverse = fx.graph.link_for(invoice, rel).unwrap();
        assert_eq!(reverse.link_type, LinkType::One);
        assert_eq!(reverse.multiplicity, Multiplicity::SingleOptional);
    }

    #[test]
    fn retrieve_inactive_propagates_along_depend_chains() {
        let mut fx = Fixture::new();
        let line = fx.entity("line", false);
        let invoice = fx.entity("invoice", false);
        let customer = fx.entity("customer", true);
        fx.relate(line, RelationKind::BelongsTo, invoice, false);
        fx.relate(invoice, RelationKind::BelongsTo, customer, false);

        assert!(fx.graph.require_retrieve_inactive(customer));
        assert!(fx.graph.require_retrieve_inactive(invoice));
        assert!(fx.graph.require_retrieve_inactive(line));
    }

    #[test]
    fn retrieve_inactive_ignores_non_depend_edges() {
        let mut fx = Fixture::new();
        let invoice = fx.entity("invoice", false);
        let tag = fx.entity("tag", true);
        fx.relate(invoice, RelationKind::ManyToMany, tag, false);
        fx.relate(invoice, RelationKind::ManyToOne, tag, false);

        assert!(!fx.graph.require_retrieve_inactive(invoice));
        // The depended-upon side never inherits from its dependents.
        let mut fx = Fixture::new();
        let invoice = fx.entity("invoice", true);
        let customer = fx.entity("customer", false);
        fx.relate(invoice, RelationKind::BelongsTo, customer, false);
        assert!(!fx.graph.require_retrieve_inactive(customer));
    }

    #[test]
    fn retrieve_inactive_terminates_on_cycles() {
        let mut fx = Fixture::new();
        let a = fx.entity("a", false);
        let b = fx.entity("b", false);
        fx.relate(a, RelationKind::BelongsTo, b, false);
        fx.relate(b, RelationKind::BelongsTo, a, false);
        assert!(!fx.graph.require_retrieve_inactive(a));

        let c = fx.entity("c", true);
        fx.relate(b, RelationKind::BelongsTo, c, false);
        assert!(fx.graph.require_retrieve_inactive(a));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut fx = Fixture::new();
        let category = fx.entity("category", true);
        let other = fx.entity("tag", false);
        fx.relate(category, RelationKind::BelongsTo, category, false);

        assert_eq!(fx.graph.depend_cycles(), vec![category]);
        assert!(!fx.graph.depend_cycles().contains(&other));
        assert!(fx.graph.require_retrieve_inactive(category));
        // One self edge yields one path, then the walk stops.
        assert_eq!(fx.graph.activable_join_paths(category).len(), 1);
    }

    #[test]
    fn join_paths_reach_every_activable_ancestor() {
        let mut fx = Fixture::new();
        let line = fx.entity("line", false);
        let invoice = fx.entity("invoice", true);
        let customer = fx.entity("customer", true);
        let (first, _) = fx.relate(line, RelationKind::BelongsTo, invoice, false);
        let (second, _) = fx.relate(invoice, RelationKind::BelongsTo, customer, false);

        let paths = fx.graph.activable_join_paths(line);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].steps.len(), 1);
        assert_eq!(paths[0].steps[0].relation, first);
        assert_eq!(paths[1].steps.len(), 2);
        assert_eq!(paths[1].steps[1].relation, second);
        assert_eq!(paths[1].terminal(), Some(customer));
    }

    #[test]
    fn join_paths_follow_every_route_through_a_shared_ancestor() {
        let mut fx = Fixture::new();
        let shipment = fx.entity("shipment", false);
        let order = fx.entity("order", false);
        let invoice = fx.entity("invoice", false);
        let account = fx.entity("account", false);
        let company = fx.entity("company", true);
        fx.relate(shipment, RelationKind::BelongsTo, order, false);
        fx.relate(shipment, RelationKind::BelongsTo, invoice, false);
        fx.relate(order, RelationKind::BelongsTo, account, false);
        fx.relate(invoice, RelationKind::BelongsTo, account, false);
        fx.relate(account, RelationKind::BelongsTo, company, false);

        let paths = fx.graph.activable_join_paths(shipment);
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.steps.len() == 3));
        assert!(paths.iter().all(|p| p.terminal() == Some(company)));
        assert_eq!(paths[0].steps[0].to, order);
        assert_eq!(paths[1].steps[0].to, invoice);
    }

    #[test]
    fn join_paths_stop_at_cycles() {
        let mut fx = Fixture::new();
        let a = fx.entity("a", true);
        let b = fx.entity("b", true);
        fx.relate(a, RelationKind::BelongsTo, b, false);
        fx.relate(b, RelationKind::BelongsTo, a, false);

        let paths = fx.graph.activable_join_paths(a);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[1].steps.len(), 2);
        assert_eq!(paths[1].terminal(), Some(a));
    }
}
