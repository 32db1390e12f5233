//! Formatter adapters.
//!
//! [`CommandFormatter`] runs an external tool once per dialect with every
//! file of that dialect appended to its arguments, from the output root.

use std::path::{Path, PathBuf};
use std::process::Command;

use strata_core::application::{ApplicationError, ports::CodeFormatter};
use strata_core::error::StrataResult;
use strata_core::ir::Dialect;
use tracing::{debug, instrument};

/// A program and its leading arguments, `gofmt -w`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl FormatCommand {
    /// Split a command line on whitespace. `None` when it is blank.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandFormatter {
    go: Option<FormatCommand>,
    typescript: Option<FormatCommand>,
}

impl CommandFormatter {
    pub fn new(go: Option<FormatCommand>, typescript: Option<FormatCommand>) -> Self {
        Self { go, typescript }
    }

    fn command(&self, dialect: Dialect) -> Option<&FormatCommand> {
        match dialect {
            Dialect::Go => self.go.as_ref(),
            Dialect::TypeScript => self.typescript.as_ref(),
        }
    }
}

impl CodeFormatter for CommandFormatter {
    #[instrument(skip(self, files), fields(files = files.len()))]
    fn format(&self, root: &Path, files: &[PathBuf], dialect: Dialect) -> StrataResult<()> {
        let Some(command) = self.command(dialect) else {
            debug!(%dialect, "No formatter configured");
            return Ok(());
        };
        let failed = |reason: String| ApplicationError::FormatterFailed {
            dialect,
            command: command.display(),
            reason,
        };

        let output = Command::new(&command.program)
            .args(&command.args)
            .args(files)
            .current_dir(root)
            .output()
            .map_err(|e| failed(format!("could not start: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => format!("exited with {}", output.status),
                message => message.to_string(),
            };
            return Err(failed(reason).into());
        }
        debug!(%dialect, command = %command.display(), "Formatted");
        Ok(())
    }
}

/// Leaves files as rendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFormatter;

impl CodeFormatter for NoopFormatter {
    fn format(&self, _root: &Path, _files: &[PathBuf], _dialect: Dialect) -> StrataResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::error::StrataError;
    use tempfile::TempDir;

    #[test]
    fn parse_splits_program_and_args() {
        let command = FormatCommand::parse("gofmt -w").unwrap();
        assert_eq!(command.program, "gofmt");
        assert_eq!(command.args, ["-w"]);
        assert!(FormatCommand::parse("   ").is_none());
    }

    #[test]
    fn unconfigured_dialects_are_skipped() {
        let root = TempDir::new().unwrap();
        let formatter = CommandFormatter::new(None, None);
        formatter
            .format(root.path(), &[PathBuf::from("a.go")], Dialect::Go)
            .unwrap();
    }

    #[test]
    fn missing_programs_fail_with_the_command() {
        let root = TempDir::new().unwrap();
        let formatter = CommandFormatter::new(FormatCommand::parse("strata-no-such-formatter -w"), None);
        let err = formatter
            .format(root.path(), &[PathBuf::from("a.go")], Dialect::Go)
            .unwrap_err();
        assert!(matches!(
            err,
            StrataError::Application(ApplicationError::FormatterFailed { .. })
        ));
        assert!(err.to_string().contains("strata-no-such-formatter -w"));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_a_failure() {
        let root = TempDir::new().unwrap();
        let formatter = CommandFormatter::new(None, FormatCommand::parse("false"));
        assert!(formatter
            .format(root.path(), &[PathBuf::from("a.ts")], Dialect::TypeScript)
            .is_err());
    }
}
