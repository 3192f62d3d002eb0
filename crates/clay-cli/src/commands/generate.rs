//! `clay generate`: run every generator of a model.

use tracing::instrument;

use crate::{
    cli::GenerateArgs,
    config::ClayConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all, fields(model = %args.model.display()))]
pub fn execute(args: GenerateArgs, config: ClayConfig, output: OutputManager) -> CliResult<()> {
    let output_dir = args
        .output
        .unwrap_or_else(|| config.default_output.clone());
    let service = super::service(&config)?
        .with_verbose_commands(args.verbose_commands || config.verbose_commands);
    let model = super::model_path(service.project_root(), &args.model)?;

    let report = service.generate_model(&model, &output_dir)?;

    output.success(&format!(
        "Generated {} into {}: {} written, {} unchanged, {} copied, {} commands",
        args.model.display(),
        output_dir,
        report.written,
        report.skipped,
        report.copied,
        report.commands,
    ))?;
    Ok(())
}
