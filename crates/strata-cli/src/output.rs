//! Output management and formatting.
//!
//! Human and plain formats write lines through [`console::Term`]; the JSON
//! format writes exactly one document per command to stdout and keeps every
//! other line quiet so the output stays parseable.

use std::io::{self, IsTerminal};
use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        let requested = match (args.output_format, config.output.format.as_str()) {
            (OutputFormat::Auto, "human") => OutputFormat::Human,
            (OutputFormat::Auto, "plain") => OutputFormat::Plain,
            (OutputFormat::Auto, "json") => OutputFormat::Json,
            (format, _) => format,
        };
        let resolved_format = if requested == OutputFormat::Auto {
            if io::stdout().is_terminal() {
                OutputFormat::Human
            } else {
                OutputFormat::Plain
            }
        } else {
            requested
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color
                || config.output.no_color
                || resolved_format != OutputFormat::Human,
            term: Term::stdout(),
        }
    }

    /// Line output is muted in quiet mode and when emitting JSON.
    fn muted(&self) -> bool {
        self.quiet || self.resolved_format == OutputFormat::Json
    }

    // ── Public write methods ───────────────────────────────────────────────

    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.muted() {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.muted() {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2713} {msg}")
        } else {
            format!("{} {}", "\u{2713}".green().bold(), msg.green())
        };
        self.term.write_line(&line)
    }

    /// Warning indicator: `⚠ <msg>`, on stderr.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{26a0} {msg}")
        } else {
            format!("{} {}", "\u{26a0}".yellow().bold(), msg.yellow())
        };
        Term::stderr().write_line(&line)
    }

    /// Informational indicator: `ℹ <msg>`.
    pub fn info(&self, msg: &str) -> io::Result<()> {
        if self.muted() {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2139} {msg}")
        } else {
            format!("{} {}", "\u{2139}".blue().bold(), msg.blue())
        };
        self.term.write_line(&line)
    }

    /// Bold cyan header line.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.muted() {
            return Ok(());
        }
        let line = if self.no_color {
            text.to_owned()
        } else {
            text.cyan().bold().to_string()
        };
        self.term.write_line(&line)
    }

    /// Aligned `label: value` row for summaries.
    pub fn field(&self, label: &str, value: impl std::fmt::Display) -> io::Result<()> {
        let label = format!("{label}:");
        if self.no_color {
            self.print(&format!("  {label:<18} {value}"))
        } else {
            self.print(&format!("  {:<18} {value}", label.dimmed()))
        }
    }

    /// Raw text, written even when quiet. Used for command payloads such as
    /// completions, graphs and the sample declaration.
    pub fn raw(&self, text: &str) -> io::Result<()> {
        self.term.write_str(text)?;
        self.term.flush()
    }

    /// Pretty JSON document on stdout. Written in every mode so scripted
    /// callers can ask for it with `--output-format json` plus `--quiet`.
    pub fn json<T: Serialize>(&self, value: &T) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.term.write_line(&text)
    }

    /// Spinner on stderr; hidden unless output is human-facing.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.muted() || self.resolved_format != OutputFormat::Human {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(msg.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// The resolved (non-Auto) output format.
    pub fn format(&self) -> OutputFormat {
        self.resolved_format
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::LogFormat;

    fn make_manager(quiet: bool, no_color: bool, format: OutputFormat) -> OutputManager {
        let args = GlobalArgs {
            verbose: 0,
            quiet,
            no_color,
            config: None,
            output_format: format,
            log_format: LogFormat::Text,
        };
        OutputManager::new(&args, &AppConfig::default())
    }

    #[test]
    fn quiet_print_is_ok() {
        let out = make_manager(true, true, OutputFormat::Plain);
        assert!(out.print("hello").is_ok());
        assert!(out.muted());
    }

    #[test]
    fn only_human_output_is_colored() {
        assert!(!make_manager(false, false, OutputFormat::Human).no_color);
        assert!(make_manager(false, true, OutputFormat::Human).no_color);
        assert!(make_manager(false, false, OutputFormat::Plain).no_color);
    }

    #[test]
    fn config_format_applies_when_flag_is_auto() {
        let args = GlobalArgs {
            verbose: 0,
            quiet: false,
            no_color: true,
            config: None,
            output_format: OutputFormat::Auto,
            log_format: LogFormat::Text,
        };
        let mut config = AppConfig::default();
        config.output.format = "json".into();
        assert_eq!(OutputManager::new(&args, &config).format(), OutputFormat::Json);
    }

    #[test]
    fn spinner_is_hidden_outside_human_output() {
        let out = make_manager(false, true, OutputFormat::Plain);
        assert!(out.spinner("working").is_hidden());
    }
}
