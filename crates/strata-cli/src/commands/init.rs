//! `strata init`: create a default configuration file.

use chrono::Utc;

use crate::{
    cli::{GlobalArgs, InitArgs},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

pub fn execute(args: InitArgs, global: GlobalArgs, output: OutputManager) -> CliResult<()> {
    let config_path = AppConfig::target_path(global.config.as_deref());

    if config_path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {}  (use --force to overwrite)",
            config_path.display(),
        ))?;
        return Ok(());
    }

    let body = toml::to_string_pretty(&AppConfig::default()).map_err(|e| CliError::ConfigError {
        message: format!("Failed to serialise default config: {e}"),
        source: Some(Box::new(e)),
    })?;
    let contents = format!(
        "# Strata configuration, created {}.\n\
         # Environment variables override keys: STRATA__GENERATOR__MODULE, ...\n\n{body}",
        Utc::now().format("%Y-%m-%d"),
    );

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_cli_context(|| format!("Failed to create config directory '{}'", parent.display()))?;
    }
    std::fs::write(&config_path, contents)
        .with_cli_context(|| format!("Failed to write config to '{}'", config_path.display()))?;

    output.success(&format!("Configuration created at {}", config_path.display()))?;
    Ok(())
}
