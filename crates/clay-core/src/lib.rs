//! Clay Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for the Clay
//! model-driven code generator, following hexagonal (ports and adapters)
//! architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             clay-cli (CLI)              │
//! │       (Implements Driving Ports)        │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │          Application Services           │
//! │  (ClayService, ModelResolver, Engine)   │
//! │          Orchestrates Use Cases         │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │       Application Ports (Traits)        │
//! │ (Filesystem, Renderer, Runner, Format)  │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      clay-adapters (Infrastructure)     │
//! │  (LocalFilesystem, HandlebarsRenderer)  │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │  (JsonPath, Query, Generator, Index)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::path::Path;
//! use clay_core::prelude::*;
//!
//! // adapters come from clay-adapters
//! let service = ClayService::new(".", filesystem, renderer, runner, formatters);
//! let report = service.generate_model(Path::new("models/shop.json"), ".").unwrap();
//! println!("{} files written", report.written);
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        ClayService, CleanReport, GenerationEngine, GenerationIndex, GenerationReport,
        MixinRegistry, ModelResolver, ResolvedModel,
        ports::{
            CommandOutcome, CommandRunner, CompiledTemplate, Filesystem, Formatter,
            FormatterProvider, TemplateRenderer,
        },
    };
    pub use crate::domain::{
        AnnotatedNode, Generator, IncludeMap, JsonPath, Model, PathSegment, TraceResult, select,
        trace_to_source,
    };
    pub use crate::error::{ClayError, ClayResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
