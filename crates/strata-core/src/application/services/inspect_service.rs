//! Inspect Service - read-only views over a declaration.

use serde::Serialize;
use tracing::instrument;

use crate::builder::{BuildConfig, DomainBuilder};
use crate::domain::{DomainDeclaration, LinkDirection, LinkType, Multiplicity};
use crate::error::StrataResult;

/// One edge of the relation graph, by entity name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLink {
    pub target: String,
    /// Declared relation kind, `belongsTo`.
    pub relation: String,
    pub link_type: LinkType,
    pub multiplicity: Multiplicity,
    pub direction: LinkDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub entity: String,
    pub activable: bool,
    pub archivable: bool,
    /// Reads offer the retrieve-inactive override.
    pub retrieve_inactive: bool,
    pub links: Vec<GraphLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphReport {
    pub nodes: Vec<GraphNode>,
    /// Entities on a dependency cycle.
    pub cycles: Vec<String>,
}

impl GraphReport {
    /// Graphviz rendering. Reverse links are left out; each relation shows
    /// once, from the side that declared it.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph domain {\n  node [shape=box];\n");
        for node in &self.nodes {
            let style = if node.activable { ", style=bold" } else { "" };
            out.push_str(&format!("  \"{}\" [label=\"{}\"{style}];\n", node.entity, node.entity));
        }
        for node in &self.nodes {
            for link in node.links.iter().filter(|l| l.direction == LinkDirection::Forward) {
                let dashed = if link.link_type == LinkType::Depend { "" } else { ", style=dashed" };
                out.push_str(&format!(
                    "  \"{}\" -> \"{}\" [label=\"{}\"{dashed}];\n",
                    node.entity, link.target, link.relation
                ));
            }
        }
        out.push_str("}\n");
        out
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InspectService;

impl InspectService {
    pub fn new() -> Self {
        Self
    }

    /// Register the declaration and report its relation graph. No IR is built.
    #[instrument(skip_all, fields(entities = declaration.entities.len()))]
    pub fn graph(&self, declaration: DomainDeclaration) -> StrataResult<GraphReport> {
        let mut builder = DomainBuilder::new(BuildConfig::default());
        builder.register_declaration(declaration);
        if let Some(error) = builder.error() {
            return Err(error.clone().into());
        }

        let registry = builder.registry();
        let graph = registry.graph();
        let name = |id| registry.entity(id).name.clone();
        let nodes = graph
            .nodes()
            .map(|node| GraphNode {
                entity: name(node.entity),
                activable: node.activable,
                archivable: node.archivable,
                retrieve_inactive: graph.require_retrieve_inactive(node.entity),
                links: node
                    .links
                    .iter()
                    .map(|link| GraphLink {
                        target: name(link.target),
                        relation: registry.relation(link.relation).kind.to_string(),
                        link_type: link.link_type,
                        multiplicity: link.multiplicity,
                        direction: link.direction,
                    })
                    .collect(),
            })
            .collect();
        let cycles = graph.depend_cycles().into_iter().map(name).collect();
        Ok(GraphReport { nodes, cycles })
    }
}
