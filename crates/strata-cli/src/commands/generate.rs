//! `strata generate`: build a declaration and write the generated tree.

use std::path::Path;

use chrono::Utc;
use serde_json::json;
use strata_adapters::{CommandFormatter, LocalFilesystem};
use strata_core::application::{GenerateOptions, GenerateService, GenerationPlan};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{build_config, load_declaration};
use crate::{
    cli::{GenerateArgs, OutputFormat, global::GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[instrument(
    skip_all,
    fields(run = %Uuid::new_v4(), declaration = %args.declaration.display())
)]
pub fn execute(
    args: GenerateArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let declaration = load_declaration(&args.declaration)?;
    let build = build_config(&config, &declaration, args.module.as_deref(), args.no_sdk);
    info!(module = %build.module_path, sdk = build.emit_sdk, "Build configured");

    let formatter = CommandFormatter::new(config.format.go_command(), config.format.typescript_command());
    let service = GenerateService::new(Box::new(LocalFilesystem::new()), Box::new(formatter));

    if args.dry_run {
        let plan = service.plan(declaration, build)?;
        return report(&output, &plan, &args.output, true);
    }

    if args.force && args.output.exists() && !args.yes && !global.quiet {
        confirm_overwrite(&args.output)?;
    }

    let options = GenerateOptions {
        force: args.force,
        format: config.format.enabled && !args.no_format,
    };
    let spinner = output.spinner(&format!("Generating into {}", args.output.display()));
    let result = service.generate(declaration, build, &args.output, options);
    spinner.finish_and_clear();
    let plan = result?;

    info!(files = plan.tree.len(), "Generation completed");
    report(&output, &plan, &args.output, false)
}

fn report(output: &OutputManager, plan: &GenerationPlan, root: &Path, dry_run: bool) -> CliResult<()> {
    if output.format() == OutputFormat::Json {
        output.json(&json!({
            "output": root,
            "dryRun": dry_run,
            "generatedAt": Utc::now().to_rfc3339(),
            "report": plan.report,
            "files": plan.tree.paths().collect::<Vec<_>>(),
        }))?;
        return Ok(());
    }

    let report = &plan.report;
    if dry_run {
        output.info(&format!(
            "Dry run: would write {} files under {}",
            report.files(),
            root.display()
        ))?;
        output.header("Files")?;
        for path in plan.tree.paths() {
            output.print(&format!("  + {path}"))?;
        }
        output.header("Summary")?;
    } else {
        output.success(&format!("Generated {} files in {}", report.files(), root.display()))?;
    }
    output.field("Entities", report.entities)?;
    output.field("Relations", report.relations)?;
    output.field("Repositories", report.repositories)?;
    output.field("Use cases", report.usecases)?;
    output.field("Custom use cases", report.custom_usecases)?;
    output.field("Routes", report.routes)?;
    output.field("Go files", report.go_files)?;
    output.field("TypeScript files", report.typescript_files)?;
    Ok(())
}

#[cfg(feature = "interactive")]
fn confirm_overwrite(root: &Path) -> CliResult<()> {
    use std::io::IsTerminal as _;

    if !std::io::stdin().is_terminal() {
        return Ok(());
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(format!("Overwrite generated files in {}?", root.display()))
        .default(false)
        .interact()
        .map_err(|e| CliError::InvalidInput {
            message: "could not read the confirmation".into(),
            source: Some(Box::new(e)),
        })?;
    if confirmed { Ok(()) } else { Err(CliError::Cancelled) }
}

#[cfg(not(feature = "interactive"))]
fn confirm_overwrite(_root: &Path) -> CliResult<()> {
    Ok(())
}
