//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `clay-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: File operations
//!   - `TemplateRenderer`: Template compilation and rendering
//!   - `CommandRunner`: Shell commands of `runCommand` steps
//!   - `FormatterProvider` / `Formatter`: Post-render formatting pipeline
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{
    CommandOutcome, CommandRunner, CompiledTemplate, Filesystem, Formatter, FormatterProvider,
    TemplateRenderer,
};

#[cfg(test)]
pub use output::{MockCommandRunner, MockFilesystem};
