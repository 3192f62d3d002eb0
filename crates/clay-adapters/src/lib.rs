//! Infrastructure adapters for Clay.
//!
//! This crate implements the ports defined in `clay_core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod command;
pub mod filesystem;
pub mod formatter;
pub mod renderer;

// Re-export commonly used adapters
pub use command::ShellCommandRunner;
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use formatter::BuiltinFormatters;
pub use renderer::HandlebarsRenderer;
