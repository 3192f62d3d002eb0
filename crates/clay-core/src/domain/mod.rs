// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Clay.
//!
//! Pure document logic: locations inside JSON documents, the path-query
//! language, model and generator manifests, the index file shape and include
//! provenance. Nothing here touches the filesystem or spawns processes; those
//! concerns sit behind the ports in [`crate::application`].

pub mod error;
pub mod generator;
pub mod index;
pub mod model;
pub mod path;
pub mod provenance;
pub mod query;

pub use error::{DomainError, ErrorCategory};
pub use generator::{
    CommandStep, CopyStep, FormatterSpec, GenerateStep, Generator, MANIFEST_FILE, Partial, Step,
};
pub use index::{GeneratedFile, IndexDocument, ModelEntry, content_hash, repair_merge_conflicts};
pub use model::{GeneratorRef, MixinDef, Model};
pub use path::{JsonPath, PathSegment};
pub use provenance::{IncludeMap, TraceResult, trace_to_source};
pub use query::{AnnotatedNode, Query, is_truthy, select};
