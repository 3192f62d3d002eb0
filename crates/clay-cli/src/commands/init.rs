//! `clay init`: create an empty `.clay` index in the working directory.

use crate::{config::ClayConfig, error::CliResult, output::OutputManager};

pub fn execute(config: ClayConfig, output: OutputManager) -> CliResult<()> {
    let service = super::service(&config)?;
    if service.init()? {
        output.success("Created .clay")?;
    } else {
        output.info(".clay already exists, left untouched")?;
    }
    Ok(())
}
