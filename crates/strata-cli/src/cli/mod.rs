//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, LogFormat, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "strata",
    bin_name = "strata",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Generate a Go backend and TypeScript SDK from a domain declaration",
    long_about = "Strata reads entities, relations, repositories and CRUD policies \
                  and generates entities, repositories, use cases, a gorm adapter, \
                  net/http controllers and a TypeScript client.",
    after_help = "EXAMPLES:\n\
        \x20 strata sample -o shop.toml\n\
        \x20 strata generate shop.toml -o ./shop --module github.com/acme/shop\n\
        \x20 strata graph shop.toml --format dot | dot -Tsvg > shop.svg\n\
        \x20 strata completions bash > /usr/share/bash-completion/completions/strata",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate the backend and SDK from a declaration.
    #[command(
        visible_alias = "gen",
        about = "Generate code from a declaration",
        after_help = "EXAMPLES:\n\
            \x20 strata generate shop.toml\n\
            \x20 strata generate domain/ -o ./out --force\n\
            \x20 strata generate shop.toml --dry-run"
    )]
    Generate(GenerateArgs),

    /// Build a declaration without writing anything.
    #[command(
        about = "Validate a declaration",
        after_help = "EXAMPLES:\n\
            \x20 strata check shop.toml"
    )]
    Check(CheckArgs),

    /// Print the relation graph of a declaration.
    #[command(
        about = "Show the relation graph",
        after_help = "EXAMPLES:\n\
            \x20 strata graph shop.toml\n\
            \x20 strata graph shop.toml --format json"
    )]
    Graph(GraphArgs),

    /// Write the bundled sample declaration.
    #[command(
        about = "Write a sample declaration",
        after_help = "EXAMPLES:\n\
            \x20 strata sample            # print to stdout\n\
            \x20 strata sample -o shop.toml"
    )]
    Sample(SampleArgs),

    /// Initialise a Strata configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 strata init\n\
            \x20 strata init --force"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 strata completions bash > ~/.local/share/bash-completion/completions/strata\n\
            \x20 strata completions zsh  > ~/.zfunc/_strata\n\
            \x20 strata completions fish > ~/.config/fish/completions/strata.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the Strata configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 strata config get generator.module\n\
            \x20 strata config list\n\
            \x20 strata config path"
    )]
    Config(ConfigCommands),
}

// ── generate ──────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Declaration file (.toml or .json) or a directory of them.
    #[arg(value_name = "DECL", help = "Declaration file or directory")]
    pub declaration: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        default_value = "generated",
        help = "Output directory"
    )]
    pub output: PathBuf,

    /// Go module path; wins over the declaration and the config file.
    #[arg(long = "module", value_name = "PATH", help = "Go module path")]
    pub module: Option<String>,

    /// Write into an existing directory, replacing generated files.
    #[arg(long = "force", help = "Write into an existing directory")]
    pub force: bool,

    /// Skip the confirmation asked before `--force` writes into a directory.
    #[arg(short = 'y', long = "yes", help = "Do not ask before overwriting")]
    pub yes: bool,

    #[arg(long = "dry-run", help = "List the files without writing them")]
    pub dry_run: bool,

    #[arg(long = "no-format", help = "Skip the external formatters")]
    pub no_format: bool,

    #[arg(long = "no-sdk", help = "Do not generate the TypeScript SDK")]
    pub no_sdk: bool,
}

// ── check ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[arg(value_name = "DECL", help = "Declaration file or directory")]
    pub declaration: PathBuf,
}

// ── graph ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GraphArgs {
    #[arg(value_name = "DECL", help = "Declaration file or directory")]
    pub declaration: PathBuf,

    #[arg(
        long = "format",
        value_enum,
        default_value = "text",
        help = "Graph output format"
    )]
    pub format: GraphFormat,
}

/// Output format for the `graph` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    /// One entity per line with its links.
    Text,
    /// The graph report as JSON.
    Json,
    /// Graphviz digraph.
    Dot,
}

// ── sample ────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SampleArgs {
    /// Destination file; stdout when omitted.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[arg(short = 'f', long = "force", help = "Overwrite an existing file")]
    pub force: bool,
}

// ── init ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `generator.module`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_generate_command() {
        let cli = Cli::parse_from([
            "strata",
            "generate",
            "shop.toml",
            "-o",
            "out",
            "--module",
            "github.com/acme/shop",
            "--no-sdk",
        ]);
        let Commands::Generate(args) = cli.command else {
            panic!("expected Generate command");
        };
        assert_eq!(args.declaration, PathBuf::from("shop.toml"));
        assert_eq!(args.output, PathBuf::from("out"));
        assert_eq!(args.module.as_deref(), Some("github.com/acme/shop"));
        assert!(args.no_sdk);
        assert!(!args.force);
    }

    #[test]
    fn generate_alias_and_default_output() {
        let cli = Cli::parse_from(["strata", "gen", "shop.toml"]);
        let Commands::Generate(args) = cli.command else {
            panic!("expected Generate command");
        };
        assert_eq!(args.output, PathBuf::from("generated"));
    }

    #[test]
    fn graph_format_defaults_to_text() {
        let cli = Cli::parse_from(["strata", "graph", "shop.toml"]);
        let Commands::Graph(args) = cli.command else {
            panic!("expected Graph command");
        };
        assert_eq!(args.format, GraphFormat::Text);

        let cli = Cli::parse_from(["strata", "graph", "shop.toml", "--format", "dot"]);
        let Commands::Graph(args) = cli.command else {
            panic!("expected Graph command");
        };
        assert_eq!(args.format, GraphFormat::Dot);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["strata", "--quiet", "--verbose", "check", "x.toml"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_set_is_not_offered() {
        assert!(Cli::try_parse_from(["strata", "config", "set", "a", "b"]).is_err());
    }
}
