//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `clay-adapters` crate provides implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::domain::{FormatterSpec, Partial};
use crate::error::ClayResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `clay_adapters::filesystem::LocalFilesystem` (production)
/// - `clay_adapters::filesystem::MemoryFilesystem` (testing)
///
/// Callers create parent directories before writing; `write_file` and
/// `copy_file` do not.
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> ClayResult<String>;

    fn read_bytes(&self, path: &Path) -> ClayResult<Vec<u8>>;

    /// Write content to a file, replacing it if present.
    fn write_file(&self, path: &Path, content: &str) -> ClayResult<()>;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> ClayResult<()>;

    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn remove_file(&self, path: &Path) -> ClayResult<()>;

    /// Remove `path` if it is an empty directory. Returns whether it was removed.
    fn remove_dir_if_empty(&self, path: &Path) -> ClayResult<bool>;

    /// Every regular file below `dir`, relative to `dir`, sorted.
    fn list_files(&self, dir: &Path) -> ClayResult<Vec<PathBuf>>;

    fn copy_file(&self, from: &Path, to: &Path) -> ClayResult<()>;
}

/// A template compiled once and rendered against many contexts.
pub type CompiledTemplate = Arc<dyn Fn(&Value) -> ClayResult<String> + Send + Sync>;

/// Port for template rendering.
///
/// Implemented by:
/// - `clay_adapters::renderer::HandlebarsRenderer`
pub trait TemplateRenderer: Send + Sync {
    /// Render `template` against `context` in one go.
    fn render(&self, template: &str, context: &Value) -> ClayResult<String>;

    /// Parse `template` once for repeated rendering.
    fn compile(&self, template: &str) -> ClayResult<CompiledTemplate>;

    /// A renderer that also knows `partials`. `self` is left unchanged.
    fn with_partials(&self, partials: &[Partial]) -> ClayResult<Arc<dyn TemplateRenderer>>;
}

/// Result of one finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    pub code: Option<i32>,
    /// Captured output; empty when the output was streamed.
    pub stdout: String,
    pub stderr: String,
}

/// Port for shell command execution.
///
/// Implemented by:
/// - `clay_adapters::command::ShellCommandRunner`
///
/// A command that runs and exits non-zero is `Ok` with `success == false`;
/// `Err` means it could not be started at all.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &str, cwd: &Path, stream_output: bool) -> ClayResult<CommandOutcome>;
}

/// One stage of the post-render pipeline.
pub trait Formatter: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this formatter handles `path` (usually by extension).
    fn applies_to(&self, path: &Path) -> bool;

    fn format(&self, path: &Path, content: &str) -> ClayResult<String>;
}

/// Port turning manifest `formatters` entries into formatters.
///
/// Implemented by:
/// - `clay_adapters::formatter::BuiltinFormatters`
pub trait FormatterProvider: Send + Sync {
    fn resolve(&self, spec: &FormatterSpec) -> ClayResult<Arc<dyn Formatter>>;
}
