//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "generate a model" or "clean a model".

pub mod clay_service;
pub mod generation_engine;
pub mod generation_index;
pub mod generator_loader;
pub mod model_resolver;

pub use clay_service::ClayService;
pub use generation_engine::{CleanReport, GenerationEngine, GenerationReport};
pub use generation_index::GenerationIndex;
pub use generator_loader::GeneratorLoader;
pub use model_resolver::{MixinFn, MixinRegistry, ModelResolver, ResolvedModel};
