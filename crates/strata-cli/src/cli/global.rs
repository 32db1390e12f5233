//! Flags shared by every `strata` subcommand.
//!
//! Flattened into [`super::Cli`] and marked `global`, so `strata generate
//! shop.toml -q` and `strata -q generate shop.toml` parse the same way.

use std::path::PathBuf;

use clap::{ArgAction, Args, ValueEnum, builder::FalseyValueParser};

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Log more of the pipeline: phases at `-v`, per-file writes at `-vv`,
    /// IR construction at `-vvv`. `RUST_LOG` still wins when set.
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Logging",
        help = "Log more (-v phases, -vv files, -vvv everything)"
    )]
    pub verbose: u8,

    /// Only errors reach the terminal. Payload output (`graph`, `sample`,
    /// `completions`, JSON documents) is still written.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help_heading = "Logging",
        help = "Print errors only"
    )]
    pub quiet: bool,

    #[arg(
        long = "log-format",
        global = true,
        value_enum,
        env = "STRATA_LOG_FORMAT",
        default_value = "text",
        help_heading = "Logging",
        help = "Shape of log events on stderr and in the log file"
    )]
    pub log_format: LogFormat,

    /// Any non-empty `NO_COLOR` other than `0`/`false`/`no`/`off` turns
    /// colour off, following <https://no-color.org>.
    #[arg(
        long = "no-color",
        global = true,
        env = "NO_COLOR",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new(),
        help_heading = "Output",
        help = "Disable colored output"
    )]
    pub no_color: bool,

    #[arg(
        long = "output-format",
        global = true,
        value_enum,
        default_value = "auto",
        help_heading = "Output",
        help = "How command results are rendered"
    )]
    pub output_format: OutputFormat,

    /// Strata config file. Defaults to the platform config dir, then
    /// `.strata.toml`.
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "FILE",
        help = "Configuration file path"
    )]
    pub config: Option<PathBuf>,
}

/// Rendering of command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human on a terminal, plain otherwise.
    #[default]
    Auto,
    /// Colored summaries and a progress spinner.
    Human,
    /// The same lines without ANSI codes.
    Plain,
    /// One JSON document per command on stdout.
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::cli::Cli;

    #[test]
    fn no_color_flag_takes_no_value() {
        let cli = Cli::parse_from(["strata", "--no-color", "check", "shop.toml"]);
        assert!(cli.global.no_color);
    }

    #[test]
    fn global_flags_parse_after_the_subcommand() {
        let cli = Cli::parse_from(["strata", "check", "shop.toml", "-q", "--output-format", "json"]);
        assert!(cli.global.quiet);
        assert_eq!(cli.global.output_format, super::OutputFormat::Json);
    }
}
