//! `strata sample`: write the bundled shop declaration.

use std::fs;

use strata_adapters::samples::SHOP_DOMAIN;

use crate::{
    cli::SampleArgs,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

pub fn execute(args: SampleArgs, output: OutputManager) -> CliResult<()> {
    let Some(path) = args.output else {
        output.raw(SHOP_DOMAIN)?;
        return Ok(());
    };

    if path.exists() && !args.force {
        return Err(CliError::FileExists { path });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_cli_context(|| format!("Failed to create directory '{}'", parent.display()))?;
    }
    fs::write(&path, SHOP_DOMAIN)
        .with_cli_context(|| format!("Failed to write sample to '{}'", path.display()))?;

    output.success(&format!("Sample declaration written to {}", path.display()))?;
    output.print(&format!("  strata generate {} -o shop", path.display()))?;
    Ok(())
}
