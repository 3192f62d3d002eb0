//! Application layer for Clay.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (ClayService, GenerationEngine, ...)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! document logic itself. Parsing and validation live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{
    ClayService, CleanReport, GenerationEngine, GenerationIndex, GenerationReport,
    GeneratorLoader, MixinFn, MixinRegistry, ModelResolver, ResolvedModel,
};

// Re-export port traits (for adapter implementation)
pub use ports::{
    CommandOutcome, CommandRunner, CompiledTemplate, Filesystem, Formatter, FormatterProvider,
    TemplateRenderer,
};

pub use error::ApplicationError;
