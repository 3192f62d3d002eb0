//! Application configuration.
//!
//! [`ClayConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. `CLAY_VERBOSE`, then `CLAY_*` environment variables (`.env` included)
//! 3. Config file: `--config`, else `./clay.toml`, else the user config dir
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Name of the project-local config file.
pub const LOCAL_FILE: &str = "clay.toml";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClayConfig {
    /// Stream `runCommand` output unless a step sets `verbose` itself.
    pub verbose_commands: bool,
    /// Output directory used when `generate` is given none.
    pub default_output: String,
    pub no_color: bool,
}

impl Default for ClayConfig {
    fn default() -> Self {
        Self {
            verbose_commands: false,
            default_output: ".".into(),
            no_color: false,
        }
    }
}

impl ClayConfig {
    /// Load configuration for the current process.
    ///
    /// `config_file` is the path passed via `--config`; it must exist when given.
    pub fn load(config_file: Option<&Path>) -> anyhow::Result<Self> {
        let file = match config_file {
            Some(path) => Some((path.to_path_buf(), true)),
            None => Self::discover().map(|path| (path, false)),
        };
        Self::build(
            file,
            Environment::with_prefix("CLAY").try_parsing(true),
            std::env::var("CLAY_VERBOSE").ok(),
        )
    }

    /// First existing default location: `./clay.toml`, then the user config file.
    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_FILE);
        if local.is_file() {
            return Some(local);
        }
        Self::user_config_path().filter(|path| path.is_file())
    }

    /// Per-user configuration file, e.g. `~/.config/clay/config.toml`.
    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "clay").map(|d| d.config_dir().join("config.toml"))
    }

    fn build(
        file: Option<(PathBuf, bool)>,
        environment: Environment,
        verbose: Option<String>,
    ) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("verbose_commands", defaults.verbose_commands)?
            .set_default("default_output", defaults.default_output)?
            .set_default("no_color", defaults.no_color)?;

        if let Some((path, required)) = file {
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            );
        }

        let config = builder
            .add_source(environment)
            .set_override_option("verbose_commands", verbose)?
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
