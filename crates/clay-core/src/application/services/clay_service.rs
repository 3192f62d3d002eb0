//! Clay Service - main application orchestrator.
//!
//! This service coordinates whole-model use cases:
//! 1. Resolve the model (includes, mixins)
//! 2. Load each referenced generator and run it through the engine
//! 3. Keep the generation index in step with what was written or removed
//!
//! It implements the driving port (incoming) and uses driven ports (outgoing).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use super::{
    generation_engine::{CleanReport, GenerationEngine, GenerationReport},
    generation_index::GenerationIndex,
    generator_loader::GeneratorLoader,
    model_resolver::{MixinRegistry, ModelResolver},
};
use crate::{
    application::ports::{CommandRunner, Filesystem, FormatterProvider, TemplateRenderer},
    domain::{AnnotatedNode, Model, select},
    error::ClayResult,
};

pub struct ClayService {
    filesystem: Arc<dyn Filesystem>,
    resolver: ModelResolver,
    loader: GeneratorLoader,
    engine: GenerationEngine,
}

impl ClayService {
    /// Create a service rooted at `project_root`, where `.clay` lives.
    pub fn new(
        project_root: impl Into<PathBuf>,
        filesystem: Arc<dyn Filesystem>,
        renderer: Arc<dyn TemplateRenderer>,
        runner: Arc<dyn CommandRunner>,
        formatters: Arc<dyn FormatterProvider>,
    ) -> Self {
        Self {
            resolver: ModelResolver::new(Arc::clone(&filesystem), Arc::clone(&renderer)),
            loader: GeneratorLoader::new(Arc::clone(&filesystem)),
            engine: GenerationEngine::new(
                project_root,
                Arc::clone(&filesystem),
                renderer,
                runner,
                formatters,
            ),
            filesystem,
        }
    }

    pub fn with_verbose_commands(mut self, verbose: bool) -> Self {
        self.engine = self.engine.with_verbose_commands(verbose);
        self
    }

    /// Register native mixins available to every model.
    pub fn with_mixins(mut self, mixins: MixinRegistry) -> Self {
        self.resolver = self.resolver.with_mixins(mixins);
        self
    }

    pub fn project_root(&self) -> &Path {
        self.engine.project_root()
    }

    pub fn resolver(&self) -> &ModelResolver {
        &self.resolver
    }

    /// Run every generator of the model at `model_path` into `output`.
    ///
    /// The index is saved even when a generator fails, so files written by
    /// earlier generators stay tracked.
    #[instrument(skip_all, fields(model = %model_path.display(), output = %output))]
    pub fn generate_model(&self, model_path: &Path, output: &str) -> ClayResult<GenerationReport> {
        let model = self.resolver.resolve(model_path)?;
        info!(name = model.name(), generators = model.generators().len(), "generating");

        let key = self.engine.index_key(model_path);
        let mut index = GenerationIndex::load(Arc::clone(&self.filesystem), self.project_root())?;

        let outcome = self.run_generators(&model, model_path, output, &key, &mut index);
        if outcome.is_ok() {
            index.get_or_create(&key, output).last_generated = Some(Utc::now());
        }
        let saved = index.save();

        let report = outcome?;
        saved?;
        Ok(report)
    }

    fn run_generators(
        &self,
        model: &Model,
        model_path: &Path,
        output: &str,
        key: &str,
        index: &mut GenerationIndex,
    ) -> ClayResult<GenerationReport> {
        let model_dir = model_path.parent().unwrap_or(Path::new(""));
        let output_root = self.project_root().join(output);
        let mut report = GenerationReport::default();

        for reference in model.generators() {
            let dir = GeneratorLoader::locate(model_dir, reference.generator());
            let generator = self.loader.load(&dir)?;
            let target = output_root.join(reference.output().unwrap_or(""));
            let entry = index.get_or_create(key, output);
            report.merge(self.engine.generate(&generator, model.document(), &target, entry)?);
        }
        Ok(report)
    }

    /// Remove every file recorded for `model_path`, across all outputs.
    #[instrument(skip_all, fields(model = %model_path.display()))]
    pub fn clean_model(&self, model_path: &Path) -> ClayResult<CleanReport> {
        let key = self.engine.index_key(model_path);
        let mut index = GenerationIndex::load(Arc::clone(&self.filesystem), self.project_root())?;

        let entries: Vec<_> = index.entries_for_model(&key).into_iter().cloned().collect();
        if entries.is_empty() {
            warn!(model = %key, "nothing recorded for model");
            return Ok(CleanReport::default());
        }

        let mut report = CleanReport::default();
        let mut outcome = Ok(());
        for entry in &entries {
            match self.engine.clean(entry) {
                Ok(cleaned) => {
                    report.merge(cleaned);
                    index.remove(&entry.path, &entry.output);
                }
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        let saved = index.save();

        outcome?;
        saved?;
        Ok(report)
    }

    /// Resolve the model and run `expression` against it.
    pub fn test_path(&self, model_path: &Path, expression: &str) -> ClayResult<Vec<AnnotatedNode>> {
        let model = self.resolver.resolve(model_path)?;
        Ok(select(model.document(), expression)?)
    }

    /// Create an empty index in the project root. Returns `false` if one exists.
    pub fn init(&self) -> ClayResult<bool> {
        let index = GenerationIndex::load(Arc::clone(&self.filesystem), self.project_root())?;
        if self.filesystem.exists(&index.path()) {
            return Ok(false);
        }
        index.save()?;
        Ok(true)
    }
}
