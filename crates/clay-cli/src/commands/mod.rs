//! Command handlers. Each translates parsed arguments into a `ClayService`
//! call and reports the result; no generation logic lives here.

pub mod clean;
pub mod generate;
pub mod init;
pub mod test_path;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clay_adapters::{BuiltinFormatters, HandlebarsRenderer, LocalFilesystem, ShellCommandRunner};
use clay_core::application::ClayService;

use crate::{
    config::ClayConfig,
    error::{CliError, CliResult},
};

/// Service over the real filesystem, rooted at the working directory.
fn service(config: &ClayConfig) -> CliResult<ClayService> {
    let root = std::env::current_dir()?;
    Ok(ClayService::new(
        root,
        Arc::new(LocalFilesystem::new()),
        Arc::new(HandlebarsRenderer::new()),
        Arc::new(ShellCommandRunner::new()),
        Arc::new(BuiltinFormatters::new()),
    )
    .with_verbose_commands(config.verbose_commands))
}

/// Absolute path of a model argument, which must name an existing file.
fn model_path(root: &Path, model: &Path) -> CliResult<PathBuf> {
    let path = root.join(model);
    if !path.is_file() {
        return Err(CliError::ModelNotFound {
            path: model.to_path_buf(),
        });
    }
    Ok(path)
}
