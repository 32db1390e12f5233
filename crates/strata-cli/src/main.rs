//! # Strata CLI
//!
//! Generates a Go backend and a TypeScript SDK from a domain declaration.
//!
//! ## Startup sequence
//!
//! 1. Parse CLI arguments (clap handles `--help` / `--version` early-exit).
//! 2. Load configuration (defaults, file, env).
//! 3. Initialise the tracing subscriber, with the configured log file.
//! 4. Build the [`OutputManager`].
//! 5. Dispatch to the appropriate command handler.
//! 6. Translate any [`CliError`] into a user-facing message and exit code.
//!
//! ## Exit codes
//!
//! | Code | Meaning                 |
//! |------|-------------------------|
//! |  0   | Success                 |
//! |  1   | Internal / system error |
//! |  2   | User / input error      |
//! |  3   | Resource not found      |
//! |  4   | Configuration error     |

use std::io::IsTerminal as _;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, instrument};

use crate::{
    cli::{Cli, Commands, OutputFormat},
    config::AppConfig,
    error::{CliError, CliResult},
    logging::init_logging,
    output::OutputManager,
};

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;

fn main() -> ExitCode {
    // Missing .env is fine.
    let _ = dotenvy::dotenv();

    // ── 1. Parse arguments ────────────────────────────────────────────────
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 2 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    // ── 2. Load configuration ─────────────────────────────────────────────
    // `init` creates the file, so a missing --config path is fine there.
    let required = !matches!(cli.command, Commands::Init(_));
    let config = match AppConfig::load(cli.global.config.as_ref(), required) {
        Ok(cfg) => cfg,
        Err(e) => {
            let err = CliError::ConfigError {
                message: format!("{e:#}"),
                source: None,
            };
            eprint!("{}", err.format_plain(false));
            return ExitCode::from(err.exit_code());
        }
    };

    // ── 3. Initialise tracing ─────────────────────────────────────────────
    let _log_guard = match init_logging(&cli.global, &config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialise logging: {e:#}");
            return ExitCode::from(1);
        }
    };

    debug!(
        verbose = cli.global.verbose,
        quiet = cli.global.quiet,
        no_color = cli.global.no_color,
        "CLI started"
    );

    // ── 4. Build output manager ───────────────────────────────────────────
    let output = OutputManager::new(&cli.global, &config);
    let json = output.format() == OutputFormat::Json;
    let verbose = cli.global.verbose > 0;
    let no_color = cli.global.no_color || config.output.no_color;

    // ── 5. Dispatch + 6. Error handling ──────────────────────────────────
    match run(cli, config, output) {
        Ok(()) => {
            info!("Strata completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => handle_error(e, verbose, json, no_color),
    }
}

#[instrument(skip_all)]
fn run(cli: Cli, config: AppConfig, output: OutputManager) -> CliResult<()> {
    match cli.command {
        Commands::Generate(cmd) => commands::generate::execute(cmd, cli.global, config, output),
        Commands::Check(cmd) => commands::check::execute(cmd, config, output),
        Commands::Graph(cmd) => commands::graph::execute(cmd, output),
        Commands::Sample(cmd) => commands::sample::execute(cmd, output),
        Commands::Init(cmd) => commands::init::execute(cmd, cli.global, output),
        Commands::Completions(cmd) => commands::completions::execute(cmd),
        Commands::Config(cmd) => commands::config::execute(cmd, cli.global, config, output),
    }
}

/// The single place where structured errors become output and exit codes.
fn handle_error(err: CliError, verbose: bool, json: bool, no_color: bool) -> ExitCode {
    err.log();

    if json {
        match serde_json::to_string_pretty(&err.to_json()) {
            Ok(text) => println!("{text}"),
            Err(_) => eprint!("{}", err.format_plain(verbose)),
        }
    } else if !no_color && std::io::stderr().is_terminal() {
        eprint!("{}", err.format_colored(verbose));
    } else {
        eprint!("{}", err.format_plain(verbose));
    }

    ExitCode::from(err.exit_code())
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_version_matches_cargo() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_version(), Some(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn every_command_is_registered() {
        let cmd = Cli::command();
        let names: Vec<&str> = cmd.get_subcommands().map(|c| c.get_name()).collect();
        for expected in ["generate", "check", "graph", "sample", "init", "completions", "config"] {
            assert!(names.contains(&expected), "{expected} missing");
        }
    }
}
