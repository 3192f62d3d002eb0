//! Include provenance and tracing edits back to their source file.
//!
//! Resolution splices included files into one document. Tools that edit the
//! model must write through to the file that actually owns a value; the
//! [`IncludeMap`] remembers, per resolved location, which file produced it and
//! [`trace_to_source`] turns a location in the resolved document into a file
//! plus an in-file path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::path::step;
use super::{JsonPath, PathSegment};

/// Provenance table: resolved location → absolute path of the contributing file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeMap {
    entries: BTreeMap<JsonPath, PathBuf>,
}

impl IncludeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `location` was produced by `file`. A later record for the
    /// same location (an include nested at the top of an included file) wins.
    pub fn insert(&mut self, location: JsonPath, file: impl Into<PathBuf>) {
        self.entries.insert(location, file.into());
    }

    pub fn get(&self, location: &JsonPath) -> Option<&Path> {
        self.entries.get(location).map(PathBuf::as_path)
    }

    pub fn contains(&self, location: &JsonPath) -> bool {
        self.entries.contains_key(location)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&JsonPath, &Path)> {
        self.entries.iter().map(|(k, v)| (k, v.as_path()))
    }
}

/// Where an edit to a resolved location has to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceResult {
    /// Owning include file, or `None` for the main model file.
    pub file_path: Option<PathBuf>,
    /// Path inside the owning file.
    pub relative_path: JsonPath,
}

impl TraceResult {
    /// True when the target is the included object itself, so deleting it
    /// means removing the `include` reference rather than editing the file.
    pub fn is_include_root(&self) -> bool {
        self.file_path.is_some() && self.relative_path.is_root()
    }
}

/// Resolve which file owns `target` and where inside it.
///
/// Walks `target` from the root through `model`, remembering the deepest
/// location recorded in `includes`. The walk stops at the first segment that
/// does not exist in `model`.
pub fn trace_to_source(model: &Value, includes: &IncludeMap, target: &JsonPath) -> TraceResult {
    let mut location = JsonPath::root();
    let mut node = Some(model);
    let mut deepest: Option<(usize, &Path)> = includes.get(&location).map(|file| (1, file));

    for (depth, segment) in target.segments().iter().enumerate().skip(1) {
        node = node.and_then(|n| step(n, segment));
        if node.is_none() {
            break;
        }
        location = match segment {
            PathSegment::Key(key) => location.child_key(key.as_str()),
            PathSegment::Index(i) => location.child_index(*i),
            PathSegment::Root => location,
        };
        if let Some(file) = includes.get(&location) {
            deepest = Some((depth + 1, file));
        }
    }

    match deepest {
        None => TraceResult {
            file_path: None,
            relative_path: target.clone(),
        },
        Some((boundary, file)) => TraceResult {
            file_path: Some(file.to_path_buf()),
            relative_path: JsonPath::from_segments(
                target.segments().iter().skip(boundary).cloned(),
            ),
        },
    }
}
