//! Output management and formatting.

use std::io;

use console::Term;
use owo_colors::OwoColorize;

use crate::cli::GlobalArgs;
use crate::config::ClayConfig;

/// Writes human-facing status lines to stdout.
///
/// Machine-readable output (`test-path`) bypasses this and prints JSON directly.
pub struct OutputManager {
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags and loaded config.
    pub fn new(args: &GlobalArgs, config: &ClayConfig) -> Self {
        Self {
            quiet: args.quiet,
            no_color: args.no_color || config.no_color || !Term::stdout().features().colors_supported(),
            term: Term::stdout(),
        }
    }

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(&self.decorate("\u{2713}", msg, Tone::Green))
    }

    /// Warning indicator: `⚠ <msg>`.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(&self.decorate("\u{26a0}", msg, Tone::Yellow))
    }

    /// Informational indicator: `ℹ <msg>`.
    pub fn info(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(&self.decorate("\u{2139}", msg, Tone::Blue))
    }

    fn decorate(&self, symbol: &str, msg: &str, tone: Tone) -> String {
        if self.no_color {
            return format!("{symbol} {msg}");
        }
        match tone {
            Tone::Green => format!("{} {}", symbol.green().bold(), msg.green()),
            Tone::Yellow => format!("{} {}", symbol.yellow().bold(), msg.yellow()),
            Tone::Blue => format!("{} {}", symbol.blue().bold(), msg.blue()),
        }
    }

    /// `true` if ANSI colours are enabled.
    pub fn supports_color(&self) -> bool {
        !self.no_color
    }
}

#[derive(Clone, Copy)]
enum Tone {
    Green,
    Yellow,
    Blue,
}
