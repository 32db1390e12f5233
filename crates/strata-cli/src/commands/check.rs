//! `strata check`: build a declaration without writing anything.

use strata_adapters::{LocalFilesystem, NoopFormatter};
use strata_core::application::GenerateService;
use tracing::instrument;

use super::{build_config, load_declaration};
use crate::{
    cli::{CheckArgs, OutputFormat},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all, fields(declaration = %args.declaration.display()))]
pub fn execute(args: CheckArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let declaration = load_declaration(&args.declaration)?;
    let build = build_config(&config, &declaration, None, false);
    let service = GenerateService::new(Box::new(LocalFilesystem::new()), Box::new(NoopFormatter));
    let plan = service.plan(declaration, build)?;

    if output.format() == OutputFormat::Json {
        output.json(&plan.report)?;
        return Ok(());
    }
    let report = &plan.report;
    output.success(&format!("{} is valid", args.declaration.display()))?;
    output.field("Entities", report.entities)?;
    output.field("Relations", report.relations)?;
    output.field("Use cases", report.usecases + report.custom_usecases)?;
    output.field("Routes", report.routes)?;
    output.field("Files", report.files())?;
    Ok(())
}
