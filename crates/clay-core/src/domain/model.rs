//! The model document and the references it carries.
//!
//! A model file looks like:
//!
//! ```json
//! {
//!   "name": "shop",
//!   "generators": ["./generators/api", { "generator": "./generators/docs", "output": "docs" }],
//!   "mixins": [{ "name": "timestamps", "function": "{ \"created\": true }" }],
//!   "model": { "types": [] }
//! }
//! ```
//!
//! The whole document is kept as a [`serde_json::Value`]; only the header
//! fields are lifted into typed form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::DomainError;

/// A resolved model: the full document plus its typed header.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    document: Value,
    name: String,
    generators: Vec<GeneratorRef>,
    mixins: Vec<MixinDef>,
}

impl Model {
    /// Lift the header fields out of a (resolved) model document.
    pub fn from_document(document: Value) -> Result<Self, DomainError> {
        let Value::Object(root) = &document else {
            return Err(DomainError::InvalidModel(
                "the model document must be a JSON object".into(),
            ));
        };

        let name = match root.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(_) => return Err(DomainError::InvalidModel("'name' must be a string".into())),
            None => return Err(DomainError::InvalidModel("missing 'name'".into())),
        };

        let generators = match root.get("generators") {
            Some(value) => Vec::<GeneratorRef>::deserialize(value).map_err(|e| {
                DomainError::InvalidModel(format!("'generators' is malformed: {e}"))
            })?,
            None => return Err(DomainError::InvalidModel("missing 'generators'".into())),
        };

        let mixins = parse_mixins(root.get("mixins"))?;

        Ok(Self {
            document,
            name,
            generators,
            mixins,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generators(&self) -> &[GeneratorRef] {
        &self.generators
    }

    pub fn mixins(&self) -> &[MixinDef] {
        &self.mixins
    }

    /// The whole document, header included. Queries run against this.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The `model` payload, `null` when the document has none.
    pub fn payload(&self) -> &Value {
        self.document.get("model").unwrap_or(&Value::Null)
    }
}

/// Entry of a model's `generators` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneratorRef {
    Name(String),
    Explicit {
        generator: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },
}

impl GeneratorRef {
    /// Path of the generator, relative to the model file.
    pub fn generator(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Explicit { generator, .. } => generator,
        }
    }

    /// Sub-directory of the output root this generator writes into.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Name(_) => None,
            Self::Explicit { output, .. } => output.as_deref(),
        }
    }
}

/// A model-defined mixin: `function` is a template that renders to a JSON
/// object patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixinDef {
    pub name: String,
    pub function: String,
}

/// Parse a `mixins` list without validating the rest of the document.
pub(crate) fn parse_mixins(value: Option<&Value>) -> Result<Vec<MixinDef>, DomainError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let Value::Array(items) = value else {
        return Err(DomainError::InvalidModel("'mixins' must be an array".into()));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            MixinDef::deserialize(item).map_err(|e| DomainError::InvalidMixin {
                name: item
                    .get("name")
                    .and_then(Value::as_str)
                    .map_or_else(|| format!("mixins[{i}]"), str::to_string),
                reason: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn header_fields_are_lifted() {
        let model = Model::from_document(json!({
            "name": "shop",
            "generators": ["./api", { "generator": "./docs", "output": "docs" }],
            "mixins": [{ "name": "m", "function": "{}" }],
            "model": { "types": [] }
        }))
        .unwrap();

        assert_eq!(model.name(), "shop");
        assert_eq!(
            model.generators(),
            &[
                GeneratorRef::Name("./api".into()),
                GeneratorRef::Explicit {
                    generator: "./docs".into(),
                    output: Some("docs".into())
                }
            ]
        );
        assert_eq!(model.generators()[1].output(), Some("docs"));
        assert_eq!(model.mixins()[0].name, "m");
        assert_eq!(model.payload(), &json!({ "types": [] }));
    }

    #[test]
    fn missing_payload_reads_as_null() {
        let model = Model::from_document(json!({ "name": "x", "generators": [] })).unwrap();
        assert!(model.payload().is_null());
    }

    #[test]
    fn missing_name_is_rejected() {
        let err = Model::from_document(json!({ "generators": [] })).unwrap_err();
        assert!(matches!(err, DomainError::InvalidModel(_)));
    }

    #[test]
    fn malformed_generator_refs_are_rejected() {
        let err = Model::from_document(json!({ "name": "x", "generators": [42] })).unwrap_err();
        assert!(err.to_string().contains("generators"));
    }

    #[test]
    fn mixin_without_function_names_the_mixin() {
        let err = Model::from_document(json!({
            "name": "x",
            "generators": [],
            "mixins": [{ "name": "broken" }]
        }))
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidMixin { ref name, .. } if name == "broken"));
    }
}
