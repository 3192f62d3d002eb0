//! `clay test-path`: show what a path expression selects.

use serde_json::Value;

use crate::{
    cli::TestPathArgs,
    config::ClayConfig,
    error::{CliError, CliResult},
};

/// Prints the selection as a JSON array to stdout, one summary per match.
pub fn execute(args: TestPathArgs, config: ClayConfig) -> CliResult<()> {
    let service = super::service(&config)?;
    let model = super::model_path(service.project_root(), &args.model)?;

    let nodes = service.test_path(&model, &args.expression)?;
    let summaries: Vec<Value> = nodes.iter().map(|node| node.to_summary()).collect();

    let json = serde_json::to_string_pretty(&summaries).map_err(|e| CliError::InvalidInput {
        message: format!("selection is not printable: {e}"),
    })?;
    println!("{json}");
    Ok(())
}
