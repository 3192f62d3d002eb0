// ============================================================================
// domain/generator.rs - GENERATOR MANIFEST
// ============================================================================

//! Typed form of `generator.json`.
//!
//! Manifests are validated field by field so one load reports every problem
//! at once, each prefixed with its location (`steps[2].select: ...`).

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::error::DomainError;

/// File name looked up inside a generator directory.
pub const MANIFEST_FILE: &str = "generator.json";

/// A loaded generator. Relative paths in steps resolve against `root`.
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub root: PathBuf,
    pub steps: Vec<Step>,
    pub partials: Vec<String>,
    pub formatters: Vec<FormatterSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Generate(GenerateStep),
    Copy(CopyStep),
    RunCommand(CommandStep),
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Generate(_) => "generate",
            Self::Copy(_) => "copy",
            Self::RunCommand(_) => "runCommand",
        }
    }

    pub fn select(&self) -> Option<&str> {
        match self {
            Self::Generate(s) => s.select.as_deref(),
            Self::Copy(s) => s.select.as_deref(),
            Self::RunCommand(s) => s.select.as_deref(),
        }
    }
}

/// Render a template file or tree once per selected node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateStep {
    pub generate: String,
    pub select: Option<String>,
    pub target: Option<String>,
    pub touch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyStep {
    pub copy: String,
    pub select: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStep {
    pub run_command: String,
    pub select: Option<String>,
    pub npx_command: bool,
    /// `None` falls back to the engine default.
    pub verbose: Option<bool>,
}

/// Entry of the `formatters` list.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatterSpec {
    Named(String),
    Package { package: String, options: Value },
}

impl FormatterSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Package { package, .. } => package,
        }
    }

    pub fn options(&self) -> Option<&Value> {
        match self {
            Self::Named(_) => None,
            Self::Package { options, .. } => Some(options),
        }
    }
}

/// A partial template registered under `name` for every render of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partial {
    pub name: String,
    pub source: String,
}

impl Partial {
    /// Name a partial after its file stem: `partials/header.hbs` → `header`.
    pub fn name_for(path: &Path) -> String {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl Generator {
    /// Validate a parsed manifest. All field errors are collected before failing.
    pub fn from_manifest(root: impl Into<PathBuf>, manifest: &Value) -> Result<Self, DomainError> {
        let mut errors = Vec::new();

        let Value::Object(fields) = manifest else {
            return Err(DomainError::InvalidGenerator {
                errors: vec!["manifest must be a JSON object".into()],
            });
        };

        for key in fields.keys() {
            if !matches!(key.as_str(), "steps" | "partials" | "formatters") {
                errors.push(format!("{key}: unknown field"));
            }
        }

        let steps = match fields.get("steps") {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| parse_step(&format!("steps[{i}]"), item, &mut errors))
                .collect(),
            Some(_) => {
                errors.push("steps: expected an array".into());
                Vec::new()
            }
            None => {
                errors.push("steps: required".into());
                Vec::new()
            }
        };

        let partials = match fields.get("partials") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| match item {
                    Value::String(path) => Some(path.clone()),
                    _ => {
                        errors.push(format!("partials[{i}]: expected a string"));
                        None
                    }
                })
                .collect(),
            Some(_) => {
                errors.push("partials: expected an array of strings".into());
                Vec::new()
            }
        };

        let formatters = match fields.get("formatters") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| parse_formatter(&format!("formatters[{i}]"), item, &mut errors))
                .collect(),
            Some(_) => {
                errors.push("formatters: expected an array".into());
                Vec::new()
            }
        };

        if !errors.is_empty() {
            return Err(DomainError::InvalidGenerator { errors });
        }

        Ok(Self {
            root: root.into(),
            steps,
            partials,
            formatters,
        })
    }

    /// Resolve a path named in the manifest against the generator directory.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

fn parse_step(at: &str, item: &Value, errors: &mut Vec<String>) -> Option<Step> {
    let Value::Object(fields) = item else {
        errors.push(format!("{at}: expected an object"));
        return None;
    };

    let kinds: Vec<&str> = ["generate", "copy", "runCommand"]
        .into_iter()
        .filter(|k| fields.contains_key(*k))
        .collect();
    if kinds.len() != 1 {
        errors.push(format!(
            "{at}: expected exactly one of 'generate', 'copy', 'runCommand'"
        ));
        return None;
    }

    let before = errors.len();
    let mut fields = Fields { at, fields, errors };

    let step = match kinds[0] {
        "generate" => {
            fields.allow(&["generate", "select", "target", "touch"]);
            Step::Generate(GenerateStep {
                generate: fields.required_string("generate"),
                select: fields.string("select"),
                target: fields.string("target"),
                touch: fields.bool("touch").unwrap_or(false),
            })
        }
        "copy" => {
            fields.allow(&["copy", "select", "target"]);
            Step::Copy(CopyStep {
                copy: fields.required_string("copy"),
                select: fields.string("select"),
                target: fields.string("target"),
            })
        }
        _ => {
            fields.allow(&["runCommand", "select", "npxCommand", "verbose"]);
            Step::RunCommand(CommandStep {
                run_command: fields.required_string("runCommand"),
                select: fields.string("select"),
                npx_command: fields.bool("npxCommand").unwrap_or(false),
                verbose: fields.bool("verbose"),
            })
        }
    };

    (errors.len() == before).then_some(step)
}

fn parse_formatter(at: &str, item: &Value, errors: &mut Vec<String>) -> Option<FormatterSpec> {
    match item {
        Value::String(name) => Some(FormatterSpec::Named(name.clone())),
        Value::Object(fields) => {
            let before = errors.len();
            let mut fields = Fields { at, fields, errors };
            fields.allow(&["package", "options"]);
            let package = fields.required_string("package");
            let options = match fields.fields.get("options") {
                None => Value::Object(Map::new()),
                Some(v @ Value::Object(_)) => v.clone(),
                Some(_) => {
                    fields.errors.push(format!("{at}.options: expected an object"));
                    Value::Null
                }
            };
            (errors.len() == before).then_some(FormatterSpec::Package { package, options })
        }
        _ => {
            errors.push(format!("{at}: expected a name or {{ package, options }}"));
            None
        }
    }
}

/// Typed accessors over one manifest object that record errors as they go.
struct Fields<'a> {
    at: &'a str,
    fields: &'a Map<String, Value>,
    errors: &'a mut Vec<String>,
}

impl Fields<'_> {
    fn allow(&mut self, known: &[&str]) {
        for key in self.fields.keys() {
            if !known.contains(&key.as_str()) {
                self.errors.push(format!("{}.{key}: unknown field", self.at));
            }
        }
    }

    fn required_string(&mut self, key: &str) -> String {
        match self.fields.get(key) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::String(_)) => {
                self.errors.push(format!("{}.{key}: must not be empty", self.at));
                String::new()
            }
            _ => {
                self.errors.push(format!("{}.{key}: expected a string", self.at));
                String::new()
            }
        }
    }

    fn string(&mut self, key: &str) -> Option<String> {
        match self.fields.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.errors.push(format!("{}.{key}: expected a string", self.at));
                None
            }
        }
    }

    fn bool(&mut self, key: &str) -> Option<bool> {
        match self.fields.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => {
                self.errors.push(format!("{}.{key}: expected a boolean", self.at));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn errors_of(manifest: Value) -> Vec<String> {
        match Generator::from_manifest("/g", &manifest) {
            Err(DomainError::InvalidGenerator { errors }) => errors,
            other => panic!("expected InvalidGenerator, got {other:?}"),
        }
    }

    #[test]
    fn parses_every_step_kind() {
        let generator = Generator::from_manifest(
            "/g",
            &json!({
                "steps": [
                    { "generate": "templates", "select": "$.model.types[*]", "target": "src", "touch": true },
                    { "copy": "static" },
                    { "runCommand": "tsc", "npxCommand": true, "verbose": false }
                ],
                "partials": ["partials/header.hbs"],
                "formatters": ["final-newline", { "package": "prettier", "options": { "extensions": [".ts"] } }]
            }),
        )
        .unwrap();

        assert_eq!(generator.steps.len(), 3);
        assert_eq!(
            generator.steps[0],
            Step::Generate(GenerateStep {
                generate: "templates".into(),
                select: Some("$.model.types[*]".into()),
                target: Some("src".into()),
                touch: true,
            })
        );
        assert_eq!(generator.steps[1].kind(), "copy");
        assert!(matches!(
            &generator.steps[2],
            Step::RunCommand(CommandStep { npx_command: true, verbose: Some(false), .. })
        ));
        assert_eq!(generator.partials, vec!["partials/header.hbs"]);
        assert_eq!(generator.formatters[1].name(), "prettier");
        assert_eq!(generator.resolve("static"), PathBuf::from("/g/static"));
    }

    #[test]
    fn ambiguous_step_names_its_index() {
        let errors = errors_of(json!({
            "steps": [{ "generate": "a" }, { "copy": "b" }, { "generate": "c", "copy": "d" }]
        }));
        assert_eq!(
            errors,
            vec!["steps[2]: expected exactly one of 'generate', 'copy', 'runCommand'"]
        );
    }

    #[test]
    fn every_problem_is_reported_at_once() {
        let errors = errors_of(json!({
            "steps": [
                { "generate": "a", "touch": "yes" },
                { "runCommand": 1, "shell": "bash" }
            ],
            "formatters": [3],
            "extra": true
        }));
        assert!(errors.contains(&"extra: unknown field".to_string()));
        assert!(errors.contains(&"steps[0].touch: expected a boolean".to_string()));
        assert!(errors.contains(&"steps[1].shell: unknown field".to_string()));
        assert!(errors.contains(&"steps[1].runCommand: expected a string".to_string()));
        assert!(errors.iter().any(|e| e.starts_with("formatters[0]:")));
    }

    #[test]
    fn steps_are_required() {
        assert_eq!(errors_of(json!({})), vec!["steps: required"]);
    }

    #[test]
    fn partial_names_come_from_file_stems() {
        assert_eq!(Partial::name_for(Path::new("partials/header.hbs")), "header");
    }
}
