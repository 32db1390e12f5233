//! `strata config`: read configuration values.

use serde_json::Value;

use crate::{
    cli::{ConfigCommands, GlobalArgs, OutputFormat},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

pub fn execute(
    cmd: ConfigCommands,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    match cmd {
        ConfigCommands::Get { key } => {
            let value = config.get(&key).ok_or_else(|| CliError::ConfigError {
                message: format!("Unknown config key: '{key}'"),
                source: None,
            })?;
            if output.format() == OutputFormat::Json {
                output.json(&value)?;
            } else {
                output.raw(&format!("{}\n", display_value(&value)))?;
            }
        }

        ConfigCommands::List => {
            if output.format() == OutputFormat::Json {
                output.json(&config)?;
                return Ok(());
            }
            let serialised = toml::to_string_pretty(&config).map_err(|e| CliError::ConfigError {
                message: format!("Failed to serialise config: {e}"),
                source: Some(Box::new(e)),
            })?;
            output.raw(&serialised)?;
        }

        ConfigCommands::Path => {
            let path = AppConfig::target_path(global.config.as_deref());
            output.raw(&format!("{}\n", path.display()))?;
        }
    }

    Ok(())
}

/// Strings print bare, unset values as an empty line.
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_print_without_quotes() {
        assert_eq!(display_value(&json!("sdk")), "sdk");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&Value::Null), "");
    }
}
