//! Model Resolver - turns a model file into one self-contained document.
//!
//! Resolution runs in two passes:
//! 1. Every object carrying `include` is merged with the parsed contents of
//!    the referenced file (relative to the including file), recursively.
//! 2. Inside the `model` payload, every object carrying `mixin` is handed to
//!    the named mixins in order, then `mixin` is dropped.
//!
//! The result is a fresh in-memory document; files on disk are never touched.

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    application::{
        ApplicationError,
        ports::{Filesystem, TemplateRenderer},
    },
    domain::{DomainError, IncludeMap, JsonPath, Model, model::parse_mixins},
    error::ClayResult,
};

/// A mixin transform applied in place to a model node.
pub type MixinFn = Arc<dyn Fn(&mut Value) -> ClayResult<()> + Send + Sync>;

/// Name → mixin table for one load.
#[derive(Clone, Default)]
pub struct MixinRegistry {
    mixins: HashMap<String, MixinFn>,
}

impl MixinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a native mixin, replacing any previous one of the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, mixin: F)
    where
        F: Fn(&mut Value) -> ClayResult<()> + Send + Sync + 'static,
    {
        self.mixins.insert(name.into(), Arc::new(mixin));
    }

    pub fn get(&self, name: &str) -> Option<&MixinFn> {
        self.mixins.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mixins.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.mixins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mixins.is_empty()
    }
}

impl fmt::Debug for MixinRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.mixins.keys().collect();
        names.sort();
        f.debug_struct("MixinRegistry").field("mixins", &names).finish()
    }
}

/// A resolved model with the provenance of every included object.
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub model: Model,
    pub includes: IncludeMap,
}

/// Expands includes and applies mixins.
pub struct ModelResolver {
    filesystem: Arc<dyn Filesystem>,
    renderer: Arc<dyn TemplateRenderer>,
    natives: MixinRegistry,
}

impl ModelResolver {
    pub fn new(filesystem: Arc<dyn Filesystem>, renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            filesystem,
            renderer,
            natives: MixinRegistry::new(),
        }
    }

    /// Use `natives` as the built-in mixin table. Model-defined mixins of the
    /// same name shadow these.
    pub fn with_mixins(mut self, natives: MixinRegistry) -> Self {
        self.natives = natives;
        self
    }

    /// Resolve `model_path`, discarding provenance.
    pub fn resolve(&self, model_path: &Path) -> ClayResult<Model> {
        self.resolve_with_map(model_path).map(|resolved| resolved.model)
    }

    /// Resolve `model_path` and record which file produced each included object.
    #[instrument(skip_all, fields(model = %model_path.display()))]
    pub fn resolve_with_map(&self, model_path: &Path) -> ClayResult<ResolvedModel> {
        let mut document = self.read_json(model_path)?;
        let mut includes = IncludeMap::new();

        let mut expansion = Expansion {
            filesystem: self.filesystem.as_ref(),
            includes: &mut includes,
            chain: vec![normalize(model_path)],
        };
        let base = model_path.parent().unwrap_or(Path::new("")).to_path_buf();
        expansion.expand(&mut document, &base, &mut JsonPath::root())?;
        debug!(includes = includes.len(), "includes expanded");

        let table = self.mixin_table(&document)?;
        if let Some(payload) = document.get_mut("model") {
            let mut location = JsonPath::root().child_key("model");
            apply_mixins(payload, &table, &mut location)?;
        }

        let model = Model::from_document(document)?;
        Ok(ResolvedModel { model, includes })
    }

    /// Natives first, then the model's own mixins compiled as template patches.
    fn mixin_table(&self, document: &Value) -> ClayResult<MixinRegistry> {
        let mut table = self.natives.clone();
        for def in parse_mixins(document.get("mixins"))? {
            let compiled = self.renderer.compile(&def.function).map_err(|e| {
                DomainError::InvalidMixin {
                    name: def.name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let name = def.name.clone();
            table.register(def.name, move |node: &mut Value| {
                let rendered = compiled(&*node)?;
                let patch: Value =
                    serde_json::from_str(&rendered).map_err(|e| DomainError::InvalidMixin {
                        name: name.clone(),
                        reason: format!("rendered patch is not JSON: {e}"),
                    })?;
                let Value::Object(patch) = patch else {
                    return Err(DomainError::InvalidMixin {
                        name: name.clone(),
                        reason: "rendered patch must be a JSON object".into(),
                    }
                    .into());
                };
                if let Value::Object(map) = node {
                    map.extend(patch);
                }
                Ok(())
            });
        }
        Ok(table)
    }

    fn read_json(&self, path: &Path) -> ClayResult<Value> {
        read_json(self.filesystem.as_ref(), path)
    }
}

fn read_json(filesystem: &dyn Filesystem, path: &Path) -> ClayResult<Value> {
    let text = filesystem.read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| {
        ApplicationError::InvalidJson {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Absolute form of `path` with `.` and `..` folded lexically, so one file
/// has one spelling in the include chain and the include map.
fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// State of one include pass.
struct Expansion<'a> {
    filesystem: &'a dyn Filesystem,
    includes: &'a mut IncludeMap,
    /// Files currently being expanded, outermost first.
    chain: Vec<PathBuf>,
}

impl Expansion<'_> {
    fn expand(&mut self, node: &mut Value, dir: &Path, location: &mut JsonPath) -> ClayResult<()> {
        let mut dir = dir.to_path_buf();
        let mut entered = 0;

        // an included file may itself start with `include`
        loop {
            let include = match &mut *node {
                Value::Object(map) => map.shift_remove("include"),
                _ => None,
            };
            let Some(include) = include else { break };

            let Value::String(relative) = include else {
                return Err(DomainError::InvalidInclude {
                    location: location.to_string(),
                    reason: "expected a relative path string".into(),
                }
                .into());
            };

            let file = normalize(&dir.join(&relative));
            if self.chain.contains(&file) {
                return Err(DomainError::InvalidInclude {
                    location: location.to_string(),
                    reason: format!("include cycle through {}", file.display()),
                }
                .into());
            }

            let included = read_json(self.filesystem, &file)?;
            debug!(at = %location, file = %file.display(), "include");
            self.includes.insert(location.clone(), file.clone());

            match (&mut *node, included) {
                (Value::Object(map), Value::Object(incoming)) => map.extend(incoming),
                (slot, other) => *slot = other,
            }

            dir = file.parent().unwrap_or(Path::new("")).to_path_buf();
            self.chain.push(file);
            entered += 1;
        }

        let result = self.expand_children(node, &dir, location);
        self.chain.truncate(self.chain.len() - entered);
        result
    }

    fn expand_children(
        &mut self,
        node: &mut Value,
        dir: &Path,
        location: &mut JsonPath,
    ) -> ClayResult<()> {
        match node {
            Value::Object(map) => {
                for (key, child) in map.iter_mut() {
                    location.push_key(key.as_str());
                    let result = self.expand(child, dir, location);
                    location.pop();
                    result?;
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter_mut().enumerate() {
                    location.push_index(i);
                    let result = self.expand(child, dir, location);
                    location.pop();
                    result?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn apply_mixins(node: &mut Value, table: &MixinRegistry, location: &mut JsonPath) -> ClayResult<()> {
    let names = match node.get("mixin") {
        None => Vec::new(),
        Some(Value::String(name)) => vec![name.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    DomainError::InvalidModel(format!("{location}.mixin must list mixin names"))
                })
            })
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(
                DomainError::InvalidModel(format!("{location}.mixin must list mixin names")).into(),
            );
        }
    };

    if !names.is_empty() {
        for name in &names {
            match table.get(name) {
                Some(mixin) => {
                    debug!(at = %location, mixin = %name, "apply mixin");
                    mixin(&mut *node)?;
                }
                None => debug!(at = %location, mixin = %name, "unknown mixin skipped"),
            }
        }
        if let Value::Object(map) = &mut *node {
            map.shift_remove("mixin");
        }
    }

    match node {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                location.push_key(key.as_str());
                let result = apply_mixins(child, table, location);
                location.pop();
                result?;
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter_mut().enumerate() {
                location.push_index(i);
                let result = apply_mixins(child, table, location);
                location.pop();
                result?;
            }
        }
        _ => {}
    }
    Ok(())
}
