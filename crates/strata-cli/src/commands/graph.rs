//! `strata graph`: print the relation graph of a declaration.

use strata_core::application::{GraphReport, InspectService};
use strata_core::domain::LinkDirection;

use super::load_declaration;
use crate::{
    cli::{GraphArgs, GraphFormat},
    error::CliResult,
    output::OutputManager,
};

pub fn execute(args: GraphArgs, output: OutputManager) -> CliResult<()> {
    let declaration = load_declaration(&args.declaration)?;
    let report = InspectService::new().graph(declaration)?;

    match args.format {
        GraphFormat::Json => output.json(&report)?,
        GraphFormat::Dot => output.raw(&report.to_dot())?,
        GraphFormat::Text => output.raw(&render_text(&report))?,
    }
    if !report.cycles.is_empty() {
        output.warning(&format!(
            "Dependency cycle through: {}",
            report.cycles.join(", ")
        ))?;
    }
    Ok(())
}

/// One block per entity:
///
/// ```text
/// invoice [archivable, retrieve-inactive]
///   -> customer  DEPEND  single-mandatory  belongsTo
///   <- invoiceLine  MANY  multiple  subresourcesOf
/// ```
fn render_text(report: &GraphReport) -> String {
    let mut out = String::new();
    for node in &report.nodes {
        let flags: Vec<&str> = [
            (node.activable, "activable"),
            (node.archivable, "archivable"),
            (node.retrieve_inactive, "retrieve-inactive"),
        ]
        .into_iter()
        .filter_map(|(on, flag)| on.then_some(flag))
        .collect();
        out.push_str(&node.entity);
        if !flags.is_empty() {
            out.push_str(&format!(" [{}]", flags.join(", ")));
        }
        out.push('\n');

        for link in &node.links {
            let arrow = match link.direction {
                LinkDirection::Forward => "->",
                LinkDirection::Reverse => "<-",
            };
            out.push_str(&format!(
                "  {arrow} {}  {}  {}  {}\n",
                link.target, link.link_type, link.multiplicity, link.relation
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::domain::{DomainDeclaration, EntityDeclaration, RelationDeclaration, RelationKind};

    #[test]
    fn text_lists_flags_and_both_directions() {
        let declaration = DomainDeclaration {
            entities: vec![
                EntityDeclaration::new("customer").activable(),
                EntityDeclaration::new("invoice"),
            ],
            relations: vec![RelationDeclaration::new(
                "invoice",
                RelationKind::BelongsTo,
                "customer",
            )],
            ..DomainDeclaration::default()
        };
        let text = render_text(&InspectService::new().graph(declaration).unwrap());
        assert!(text.contains("customer [activable, retrieve-inactive]\n"));
        assert!(text.contains("invoice [retrieve-inactive]\n"));
        assert!(text.contains("  -> customer  DEPEND  single-mandatory  belongsTo\n"));
        assert!(text.contains("  <- invoice  MANY  multiple  belongsTo\n"));
    }
}
