//! Rendering for CLI commands.
//!
//! A command writes one JSON document to stdout in `--json` mode and colored
//! text otherwise. `--quiet` keeps only warnings and errors. Warnings and
//! errors go to stderr in JSON mode so stdout stays parseable.

use std::fmt::Display;

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

use super::command::Cli;
use crate::application::cache::EntryStatus;
use crate::domain::partition::PartitionKey;

/// Output settings from the global CLI flags, passed to every handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Output {
    json: bool,
    quiet: bool,
    verbose: u8,
}

impl Output {
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            json,
            quiet,
            verbose,
        }
    }

    #[must_use]
    pub const fn from_cli(cli: &Cli) -> Self {
        Self::new(cli.json, cli.quiet, cli.verbose)
    }

    #[must_use]
    pub const fn is_json(self) -> bool {
        self.json
    }

    /// True with at least one `-v`.
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        self.verbose > 0
    }

    const fn shows_text(self) -> bool {
        !self.json && !self.quiet
    }

    /// Command banner: binary name, version and subcommand.
    pub fn title(self, command: &str) {
        if !self.shows_text() {
            return;
        }
        println!(
            "{} {} {}",
            "wheeldesk".bold(),
            env!("CARGO_PKG_VERSION").dimmed(),
            command.cyan()
        );
    }

    pub fn section(self, title: &str) {
        if !self.shows_text() {
            return;
        }
        println!();
        println!("{}", title.bold().underline());
    }

    pub fn field(self, label: &str, value: impl Display) {
        if !self.shows_text() {
            return;
        }
        println!("{:>12}  {}", label.dimmed(), value);
    }

    /// One cache key and the status its entry is in.
    pub fn entry(self, key: &PartitionKey, status: EntryStatus) {
        if !self.shows_text() {
            return;
        }
        let label = format!("{:>12}", status.as_str());
        println!("{}  {}", paint_status(status, &label), key);
    }

    /// Pre-rendered block such as a table or pretty JSON, indented.
    pub fn block(self, content: &str) {
        if !self.shows_text() {
            return;
        }
        for line in content.lines() {
            println!("  {line}");
        }
    }

    pub fn done(self, message: &str) {
        if !self.shows_text() {
            return;
        }
        println!("{:>12}  {}", "ok".green().bold(), message);
    }

    pub fn warn(self, message: &str) {
        if self.json {
            eprintln!("{}", json!({ "warning": message }));
            return;
        }
        println!("{:>12}  {}", "warning".yellow().bold(), message);
    }

    pub fn error(self, message: &str) {
        if self.json {
            eprintln!("{}", json!({ "error": message }));
            return;
        }
        eprintln!("{:>12}  {}", "error".red().bold(), message);
    }

    /// Write the command's JSON document. No-op outside `--json` mode.
    ///
    /// # Errors
    ///
    /// Returns an error if `document` does not serialize.
    pub fn document(self, document: &impl Serialize) -> serde_json::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(document)?);
        }
        Ok(())
    }
}

/// `label` colored by how usable an entry in `status` is.
fn paint_status(status: EntryStatus, label: &str) -> String {
    match status {
        EntryStatus::Fresh => label.green().to_string(),
        EntryStatus::Stale => label.yellow().to_string(),
        EntryStatus::Error => label.red().to_string(),
        EntryStatus::Loading => label.cyan().to_string(),
        EntryStatus::Idle => label.dimmed().to_string(),
    }
}

/// Dimmed text for placeholder values.
#[must_use]
pub fn muted(value: impl Display) -> String {
    value.to_string().dimmed().to_string()
}

/// Bold text for emphasized values.
#[must_use]
pub fn highlight(value: impl Display) -> String {
    value.to_string().bold().to_string()
}
