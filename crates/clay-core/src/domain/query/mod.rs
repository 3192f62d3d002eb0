//! Path-query expressions over JSON documents.
//!
//! Clay steps pick the model nodes they fan out over with a JSONPath subset:
//!
//! | Form                    | Meaning                                  |
//! |-------------------------|------------------------------------------|
//! | `$`                     | the document root                        |
//! | `.name`, `['name']`     | object member                            |
//! | `[0]`, `[-1]`           | array element (negative counts from end) |
//! | `.*`, `[*]`             | every member / element                   |
//! | `['a','b']`, `[0,2]`    | union                                    |
//! | `[1:3]`, `[::2]`        | array slice                              |
//! | `..name`, `..*`         | recursive descent                        |
//! | `[?(@.kind == 'x')]`    | filter on members / elements             |
//!
//! Filters support `== != < <= > >=`, `&&`, `||`, `!`, parentheses, relative
//! (`@`) and absolute (`$`) singular paths, and string, number, boolean and
//! `null` literals. A bare path in a filter tests truthiness.

mod eval;
mod parser;
mod select;

use serde_json::Value;

pub use select::{AnnotatedNode, select};

use super::error::DomainError;

/// A parsed path-query expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    source: String,
    segments: Vec<Segment>,
}

impl Query {
    /// Parse an expression, failing with the offset of the first bad character.
    pub fn parse(expression: &str) -> Result<Self, DomainError> {
        let segments = parser::parse(expression)?;
        Ok(Self {
            source: expression.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Evaluate against `document`, returning every match with its location.
    pub fn find<'a>(&self, document: &'a Value) -> Vec<(super::JsonPath, &'a Value)> {
        eval::evaluate(&self.segments, document)
    }
}

/// One `.x`, `[...]` or `..x` step of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Child(Vec<Selector>),
    Descendant(Vec<Selector>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Name(String),
    Index(i64),
    Wildcard,
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    },
    Filter(FilterExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Or(Box<FilterExpr>, Box<FilterExpr>),
    And(Box<FilterExpr>, Box<FilterExpr>),
    Not(Box<FilterExpr>),
    Truthy(FilterPath),
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Path(FilterPath),
    Literal(Value),
}

/// A singular path inside a filter, relative to `@` or absolute from `$`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPath {
    pub absolute: bool,
    pub steps: Vec<FilterStep>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterStep {
    Name(String),
    Index(i64),
}

/// JSON-script truthiness: `null`, `false`, `0`, `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
