//! `clay clean`: delete everything recorded for a model.

use tracing::instrument;

use crate::{cli::CleanArgs, config::ClayConfig, error::CliResult, output::OutputManager};

#[instrument(skip_all, fields(model = %args.model.display()))]
pub fn execute(args: CleanArgs, config: ClayConfig, output: OutputManager) -> CliResult<()> {
    let service = super::service(&config)?;
    // the model may be gone already; only its index key matters here
    let model = service.project_root().join(&args.model);

    let report = service.clean_model(&model)?;
    if report.removed == 0 && report.missing == 0 {
        output.warning(&format!("Nothing recorded for {}", args.model.display()))?;
        return Ok(());
    }

    output.success(&format!(
        "Cleaned {}: {} removed, {} already gone, {} directories pruned",
        args.model.display(),
        report.removed,
        report.missing,
        report.pruned_dirs,
    ))?;
    Ok(())
}
