//! Locations inside a JSON document.
//!
//! A [`JsonPath`] is a normalized, fully concrete location: `$` followed by
//! object keys and array indices. It is what queries return for every match,
//! what the include map is keyed by, and what the mutation tracer walks.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::DomainError;
use super::query::{Query, Segment, Selector};

/// One step of a [`JsonPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Root,
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// JSON form used in template contexts: keys as strings, indices as numbers.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Root => Value::String("$".into()),
            Self::Key(key) => Value::String(key.clone()),
            Self::Index(i) => Value::from(*i),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("$"),
            Self::Key(key) if is_plain_key(key) => write!(f, ".{key}"),
            Self::Key(key) => write!(f, "['{}']", key.replace('\\', "\\\\").replace('\'', "\\'")),
            Self::Index(i) => write!(f, "[{i}]"),
        }
    }
}

impl Serialize for PathSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Root => serializer.serialize_str("$"),
            Self::Key(key) => serializer.serialize_str(key),
            Self::Index(i) => serializer.serialize_u64(*i as u64),
        }
    }
}

impl<'de> Deserialize<'de> for PathSegment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Index(u64),
            Key(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Index(i) => usize::try_from(i)
                .map(PathSegment::Index)
                .map_err(|_| de::Error::custom("path index out of range")),
            Raw::Key(key) => Ok(PathSegment::Key(key)),
        }
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with(|c: char| c.is_ascii_digit())
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// A concrete location inside a JSON document, always starting at `$`.
///
/// Invariant: the first segment is [`PathSegment::Root`] and no other segment is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonPath(Vec<PathSegment>);

impl JsonPath {
    pub fn root() -> Self {
        Self(vec![PathSegment::Root])
    }

    /// Build a path from segments following the root.
    pub fn from_segments(segments: impl IntoIterator<Item = PathSegment>) -> Self {
        let mut path = Self::root();
        path.0
            .extend(segments.into_iter().filter(|s| *s != PathSegment::Root));
        path
    }

    /// Parse a normalized path such as `$.types[2]['field name']`.
    ///
    /// Wildcards, filters, slices and recursive descent are rejected.
    pub fn parse_normalized(expression: &str) -> Result<Self, DomainError> {
        let query = Query::parse(expression)?;
        let mut path = Self::root();
        for segment in query.segments() {
            let Segment::Child(selectors) = segment else {
                return Err(not_normalized(expression));
            };
            match selectors.as_slice() {
                [Selector::Name(name)] => path.push_key(name),
                [Selector::Index(i)] if *i >= 0 => path.push_index(*i as usize),
                _ => return Err(not_normalized(expression)),
            }
        }
        Ok(path)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true: every path holds at least the root.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.0.len() <= 1
    }

    pub fn last(&self) -> Option<&PathSegment> {
        if self.is_root() { None } else { self.0.last() }
    }

    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.push_key(key);
        path
    }

    pub fn child_index(&self, index: usize) -> Self {
        let mut path = self.clone();
        path.push_index(index);
        path
    }

    pub fn push_key(&mut self, key: impl Into<String>) {
        self.0.push(PathSegment::Key(key.into()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.0.push(PathSegment::Index(index));
    }

    /// Drop the last segment, returning it. The root is never popped.
    pub fn pop(&mut self) -> Option<PathSegment> {
        if self.is_root() { None } else { self.0.pop() }
    }

    /// Segments after `prefix`, or `None` when `prefix` is not a prefix of `self`.
    pub fn strip_prefix(&self, prefix: &JsonPath) -> Option<&[PathSegment]> {
        self.0.strip_prefix(prefix.0.as_slice())
    }

    /// Follow this path in `document`.
    pub fn lookup<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .skip(1)
            .try_fold(document, |node, segment| step(node, segment))
    }

    pub fn lookup_mut<'a>(&self, document: &'a mut Value) -> Option<&'a mut Value> {
        let mut node = document;
        for segment in self.0.iter().skip(1) {
            node = match (segment, node) {
                (PathSegment::Key(key), Value::Object(map)) => map.get_mut(key)?,
                (PathSegment::Index(i), Value::Array(items)) => items.get_mut(*i)?,
                _ => return None,
            };
        }
        Some(node)
    }
}

/// Step from `node` into the child named by `segment`.
pub(crate) fn step<'a>(node: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (segment, node) {
        (PathSegment::Key(key), Value::Object(map)) => map.get(key),
        (PathSegment::Index(i), Value::Array(items)) => items.get(*i),
        _ => None,
    }
}

fn not_normalized(expression: &str) -> DomainError {
    DomainError::NotNormalizedPath {
        expression: expression.to_string(),
    }
}

impl Default for JsonPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl Serialize for JsonPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for segment in &self.0 {
            seq.serialize_element(segment)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for JsonPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut segments = Vec::<PathSegment>::deserialize(deserializer)?;
        // only the leading "$" is the root; later "$" segments are object keys
        if segments.first() == Some(&PathSegment::Key("$".into())) {
            segments.remove(0);
        }
        Ok(Self::from_segments(segments))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn displays_bracket_notation_for_odd_keys() {
        let path = JsonPath::root()
            .child_key("types")
            .child_index(2)
            .child_key("field name");
        assert_eq!(path.to_string(), "$.types[2]['field name']");
    }

    #[test]
    fn parses_normalized_paths() {
        let path = JsonPath::parse_normalized("$.types[2]['fields'][0]").unwrap();
        assert_eq!(
            path,
            JsonPath::from_segments(["types".into(), 2.into(), "fields".into(), 0.into()])
        );
    }

    #[test]
    fn rejects_wildcards_in_normalized_paths() {
        assert!(JsonPath::parse_normalized("$.types[*]").is_err());
        assert!(JsonPath::parse_normalized("$..name").is_err());
    }

    #[test]
    fn serializes_like_a_segment_array() {
        let path = JsonPath::from_segments(["types".into(), 2.into()]);
        assert_eq!(serde_json::to_value(&path).unwrap(), json!(["$", "types", 2]));

        let back: JsonPath = serde_json::from_value(json!(["$", "types", 2])).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn dollar_keys_survive_a_serde_round_trip() {
        let path = JsonPath::root().child_key("$").child_key("a");
        let value = serde_json::to_value(&path).unwrap();
        assert_eq!(value, json!(["$", "$", "a"]));

        let back: JsonPath = serde_json::from_value(value).unwrap();
        assert_eq!(back, path);
        assert_eq!(back.lookup(&json!({ "$": { "a": 1 } })), Some(&json!(1)));
    }

    #[test]
    fn lookup_follows_keys_and_indices() {
        let doc = json!({ "types": [{ "name": "a" }, { "name": "b" }] });
        let path = JsonPath::parse_normalized("$.types[1].name").unwrap();
        assert_eq!(path.lookup(&doc), Some(&json!("b")));
        assert_eq!(JsonPath::root().child_key("missing").lookup(&doc), None);
    }

    #[test]
    fn pop_never_removes_root() {
        let mut path = JsonPath::root().child_key("a");
        assert_eq!(path.pop(), Some(PathSegment::Key("a".into())));
        assert_eq!(path.pop(), None);
        assert!(path.is_root());
    }
}
