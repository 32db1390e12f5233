//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only sees the [`BuildConfig`] derived
//! from it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. `STRATA__SECTION__KEY` environment variables, `.env` included
//! 3. Config file: `--config`, else the platform config dir
//! 4. Built-in defaults
//!
//! [`BuildConfig`]: strata_core::builder::BuildConfig

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use strata_adapters::FormatCommand;
use tracing::debug;

/// Module path used when neither the CLI, the declaration nor the config sets one.
pub const DEFAULT_MODULE: &str = "example.com/app";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub generator: GeneratorConfig,
    pub format: FormatConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Go module path, used when the declaration has no `[project]` module.
    pub module: Option<String>,
    pub backend_dir: String,
    pub sdk_dir: String,
    pub emit_sdk: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            module: None,
            backend_dir: "internal".into(),
            sdk_dir: "sdk".into(),
            emit_sdk: true,
        }
    }
}

/// External formatters run over the written files. An empty command skips
/// that dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub enabled: bool,
    pub go: String,
    pub typescript: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            go: "gofmt -w".into(),
            typescript: String::new(),
        }
    }
}

impl FormatConfig {
    pub fn go_command(&self) -> Option<FormatCommand> {
        FormatCommand::parse(&self.go)
    }

    pub fn typescript_command(&self) -> Option<FormatCommand> {
        FormatCommand::parse(&self.typescript)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write log events to this file.
    pub file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration over the built-in defaults.
    ///
    /// `config_file` is the `--config` path. When `required` is set, a named
    /// file that does not exist is an error; the default location never is.
    pub fn load(config_file: Option<&PathBuf>, required: bool) -> anyhow::Result<Self> {
        let path = config_file.cloned().unwrap_or_else(Self::config_path);
        let required = required && config_file.is_some();
        debug!(path = %path.display(), required, "Loading configuration");

        let defaults = Config::try_from(&Self::default()).context("Failed to encode defaults")?;
        let settings = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.as_path()).required(required))
            .add_source(
                Environment::with_prefix("STRATA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.strata.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "strata", "strata")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".strata.toml"))
    }

    /// The file `init` writes and `config path` reports.
    pub fn target_path(config_file: Option<&Path>) -> PathBuf {
        config_file.map_or_else(Self::config_path, Path::to_path_buf)
    }

    /// Resolve the Go module path: CLI flag, then declaration, then config.
    pub fn module_path(&self, cli: Option<&str>, declaration: Option<&str>) -> String {
        cli.or(declaration)
            .or(self.generator.module.as_deref())
            .unwrap_or(DEFAULT_MODULE)
            .to_string()
    }

    /// Look up a dotted key such as `generator.module`.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut value = serde_json::to_value(self).ok()?;
        for part in key.split('.') {
            value = value.get_mut(part)?.take();
        }
        Some(value)
    }
}
