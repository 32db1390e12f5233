//! Command handlers.
//!
//! Each handler turns parsed arguments into a service call and reports the
//! result through the [`OutputManager`](crate::output::OutputManager). No
//! generation logic lives here.

use std::path::Path;

use strata_adapters::DeclarationLoader;
use strata_core::builder::BuildConfig;
use strata_core::domain::DomainDeclaration;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::{CliError, CliResult, IntoCli};

pub mod check;
pub mod completions;
pub mod config;
pub mod generate;
pub mod graph;
pub mod init;
pub mod sample;

/// Load a declaration file or directory.
pub(crate) fn load_declaration(path: &Path) -> CliResult<DomainDeclaration> {
    if !path.exists() {
        return Err(CliError::DeclarationNotFound {
            path: path.to_path_buf(),
        });
    }
    let declaration = DeclarationLoader::new(path)
        .load()
        .with_cli_context(|| format!("loading {}", path.display()))?;
    debug!(
        entities = declaration.entities.len(),
        relations = declaration.relations.len(),
        "Declaration loaded"
    );
    Ok(declaration)
}

/// Builder settings from the config file, the declaration and CLI flags.
pub(crate) fn build_config(
    config: &AppConfig,
    declaration: &DomainDeclaration,
    module: Option<&str>,
    no_sdk: bool,
) -> BuildConfig {
    BuildConfig {
        module_path: config.module_path(module, declaration.project.module.as_deref()),
        backend_dir: config.generator.backend_dir.clone(),
        sdk_dir: config.generator.sdk_dir.clone(),
        emit_sdk: config.generator.emit_sdk && !no_sdk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_declarations_are_not_found() {
        let err = load_declaration(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, CliError::DeclarationNotFound { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn no_sdk_flag_wins_over_config() {
        let mut declaration = DomainDeclaration::default();
        declaration.project.module = Some("github.com/acme/shop".into());
        let config = AppConfig::default();

        let build = build_config(&config, &declaration, None, true);
        assert!(!build.emit_sdk);
        assert_eq!(build.module_path, "github.com/acme/shop");

        let build = build_config(&config, &declaration, Some("example.org/x"), false);
        assert!(build.emit_sdk);
        assert_eq!(build.module_path, "example.org/x");
    }
}
