//! Selection with structural context for templates.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use super::{Query, is_truthy};
use crate::domain::error::DomainError;
use crate::domain::{JsonPath, PathSegment};

/// A query match enriched with the context templates navigate by.
///
/// `clay_model` is shared by every node of one [`select`] call and is an
/// independent copy of the document, so nothing done to a rendering context
/// can leak back into the model being iterated.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedNode {
    pub value: Value,
    pub path: JsonPath,
    pub clay_model: Arc<Value>,
    pub clay_parent: Option<Box<AnnotatedNode>>,
    /// Key or index reaching this node from `clay_parent`.
    pub clay_key: Option<PathSegment>,
    /// Final segment of this node's own path.
    pub clay_json_key: Option<PathSegment>,
}

impl AnnotatedNode {
    /// Build the JSON object handed to the template renderer.
    ///
    /// Object values expose their own members at the top level; anything else
    /// is available as `value`. Parents omit `clay_model`.
    pub fn to_context(&self) -> Value {
        self.context(true)
    }

    /// Same as [`Self::to_context`] without `clay_model`, for printing.
    pub fn to_summary(&self) -> Value {
        self.context(false)
    }

    fn context(&self, with_model: bool) -> Value {
        let mut ctx = match &self.value {
            Value::Object(map) => map.clone(),
            other => {
                let mut map = Map::new();
                map.insert("value".into(), other.clone());
                map
            }
        };
        if with_model {
            ctx.insert("clay_model".into(), self.clay_model.as_ref().clone());
        }
        if let Some(parent) = &self.clay_parent {
            ctx.insert("clay_parent".into(), parent.context(false));
        }
        if let Some(key) = &self.clay_key {
            ctx.insert("clay_key".into(), key.to_value());
        }
        if let Some(key) = &self.clay_json_key {
            ctx.insert("clay_json_key".into(), key.to_value());
        }
        ctx.insert("clay_path".into(), Value::String(self.path.to_string()));
        Value::Object(ctx)
    }

    /// Number of ancestors reachable through `clay_parent`.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self;
        while let Some(parent) = &node.clay_parent {
            depth += 1;
            node = parent;
        }
        depth
    }
}

/// Evaluate `expression` against `model` and annotate every match.
///
/// Invalid syntax is an error; a valid expression matching nothing logs a
/// warning and yields an empty list.
pub fn select(model: &Value, expression: &str) -> Result<Vec<AnnotatedNode>, DomainError> {
    let query = Query::parse(expression)?;
    let matches = query.find(model);
    if matches.is_empty() {
        warn!(expression, "path expression matched nothing");
        return Ok(Vec::new());
    }

    let shared = Arc::new(model.clone());
    Ok(matches
        .into_iter()
        .map(|(path, value)| annotate(path, value.clone(), model, &shared))
        .collect())
}

fn annotate(path: JsonPath, value: Value, live: &Value, shared: &Arc<Value>) -> AnnotatedNode {
    let clay_json_key = path.last().cloned();
    let (clay_parent, clay_key) = match find_parent(&path, live) {
        Some((parent_path, key)) => {
            let parent_value = parent_path.lookup(live).cloned().unwrap_or(Value::Null);
            let parent = annotate(parent_path, parent_value, live, shared);
            (Some(Box::new(parent)), Some(key))
        }
        None => (None, None),
    };

    AnnotatedNode {
        value,
        path,
        clay_model: Arc::clone(shared),
        clay_parent,
        clay_key,
        clay_json_key,
    }
}

/// Nearest ancestor that is neither an array nor falsy, with the segment
/// dropped last on the way up. Bounded by the root.
fn find_parent(path: &JsonPath, live: &Value) -> Option<(JsonPath, PathSegment)> {
    let mut current = path.clone();
    loop {
        let dropped = current.pop()?;
        if let Some(candidate) = current.lookup(live) {
            if !candidate.is_array() && is_truthy(candidate) {
                return Some((current, dropped));
            }
        }
        if current.is_root() {
            return None;
        }
    }
}
