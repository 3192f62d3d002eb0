//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! and help text.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod global;
pub use global::GlobalArgs;

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "clay",
    bin_name = "clay",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Model-driven code generation",
    long_about = "Clay renders a JSON model through generators of templates, \
                  copies and commands, and remembers what it wrote so it can \
                  skip unchanged files and clean up after itself.",
    after_help = "EXAMPLES:\n\
        \x20 clay init\n\
        \x20 clay generate models/shop.json\n\
        \x20 clay generate models/shop.json out\n\
        \x20 clay test-path models/shop.json '$.model.types[*]'\n\
        \x20 clay clean models/shop.json",
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

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run every generator of a model.
    #[command(
        visible_alias = "g",
        about = "Generate code from a model",
        after_help = "EXAMPLES:\n\
            \x20 clay generate models/shop.json         # into the project root\n\
            \x20 clay generate models/shop.json build   # into ./build"
    )]
    Generate(GenerateArgs),

    /// Remove everything generated for a model.
    #[command(
        about = "Delete the files recorded for a model",
        after_help = "EXAMPLES:\n\
            \x20 clay clean models/shop.json"
    )]
    Clean(CleanArgs),

    /// Evaluate a path expression against the resolved model.
    #[command(
        name = "test-path",
        about = "Print what a path expression selects",
        after_help = "EXAMPLES:\n\
            \x20 clay test-path models/shop.json '$.model.types[*]'\n\
            \x20 clay test-path models/shop.json '$..fields[?(@.required)]'"
    )]
    TestPath(TestPathArgs),

    /// Create an empty generation index.
    #[command(
        about = "Create an empty .clay index in the current directory",
        after_help = "EXAMPLES:\n\
            \x20 clay init"
    )]
    Init,
}

// ── generate ──────────────────────────────────────────────────────────────────

/// Arguments for `clay generate`.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Path to the model file.
    #[arg(value_name = "MODEL", help = "Model file")]
    pub model: PathBuf,

    /// Output directory, relative to the project root.
    #[arg(
        value_name = "OUTPUT",
        help = "Output directory (default: config `default_output`, else '.')"
    )]
    pub output: Option<String>,

    /// Stream the output of `runCommand` steps.
    #[arg(long = "verbose-commands", help = "Show output of runCommand steps")]
    pub verbose_commands: bool,
}

// ── clean ─────────────────────────────────────────────────────────────────────

/// Arguments for `clay clean`.
#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Path to the model file.
    #[arg(value_name = "MODEL", help = "Model file")]
    pub model: PathBuf,
}

// ── test-path ─────────────────────────────────────────────────────────────────

/// Arguments for `clay test-path`.
#[derive(Debug, Args)]
pub struct TestPathArgs {
    /// Path to the model file.
    #[arg(value_name = "MODEL", help = "Model file")]
    pub model: PathBuf,

    /// Path expression, e.g. `$.model.types[*]`.
    #[arg(value_name = "EXPR", help = "Path expression")]
    pub expression: String,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_generate_command() {
        let cli = Cli::try_parse_from(["clay", "generate", "m.json", "out"]).unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.model, PathBuf::from("m.json"));
                assert_eq!(args.output.as_deref(), Some("out"));
                assert!(!args.verbose_commands);
            }
            other => panic!("expected generate, got {other:?}"),
        }
    }

    #[test]
    fn output_is_optional() {
        let cli = Cli::try_parse_from(["clay", "g", "m.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate(GenerateArgs { output: None, .. })));
    }

    #[test]
    fn parse_test_path_command() {
        let cli = Cli::try_parse_from(["clay", "test-path", "m.json", "$.a[*]"]).unwrap();
        match cli.command {
            Commands::TestPath(args) => assert_eq!(args.expression, "$.a[*]"),
            other => panic!("expected test-path, got {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["clay", "clean", "m.json", "-vv"]).unwrap();
        assert_eq!(cli.global.verbose, 2);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["clay", "-q", "-v", "init"]).is_err());
    }
}
