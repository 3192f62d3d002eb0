//! Generation Engine - executes a generator's steps against a model.
//!
//! This service drives one generator run:
//! 1. Select the nodes each step fans out over
//! 2. Render / copy / run per node, concurrently within the step
//! 3. Write only files whose rendered content changed, recording hashes
//!
//! Steps run strictly in order. The first rendering or formatting failure
//! aborts the rest of the run; work already recorded stays recorded.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{
            CommandRunner, CompiledTemplate, Filesystem, Formatter, FormatterProvider,
            TemplateRenderer,
        },
    },
    domain::{
        AnnotatedNode, CommandStep, CopyStep, GenerateStep, Generator, ModelEntry, Partial, Step,
        content_hash, select,
    },
    error::{ClayError, ClayResult},
};

/// What one generator run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Files written because their content changed (or they were missing).
    pub written: usize,
    /// Files left alone: unchanged content, or `touch` targets that exist.
    pub skipped: usize,
    pub copied: usize,
    pub commands: usize,
}

impl GenerationReport {
    pub fn merge(&mut self, other: GenerationReport) {
        self.written += other.written;
        self.skipped += other.skipped;
        self.copied += other.copied;
        self.commands += other.commands;
    }
}

/// What one clean removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: usize,
    /// Recorded files that were already gone.
    pub missing: usize,
    pub pruned_dirs: usize,
}

impl CleanReport {
    pub fn merge(&mut self, other: CleanReport) {
        self.removed += other.removed;
        self.missing += other.missing;
        self.pruned_dirs += other.pruned_dirs;
    }
}

pub struct GenerationEngine {
    project_root: PathBuf,
    filesystem: Arc<dyn Filesystem>,
    renderer: Arc<dyn TemplateRenderer>,
    runner: Arc<dyn CommandRunner>,
    formatters: Arc<dyn FormatterProvider>,
    verbose_commands: bool,
}

impl GenerationEngine {
    /// `project_root` is where the index lives; recorded paths are relative to it.
    pub fn new(
        project_root: impl Into<PathBuf>,
        filesystem: Arc<dyn Filesystem>,
        renderer: Arc<dyn TemplateRenderer>,
        runner: Arc<dyn CommandRunner>,
        formatters: Arc<dyn FormatterProvider>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            filesystem,
            renderer,
            runner,
            formatters,
            verbose_commands: false,
        }
    }

    /// Default for `runCommand` steps that do not set `verbose`.
    pub fn with_verbose_commands(mut self, verbose: bool) -> Self {
        self.verbose_commands = verbose;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Run every step of `generator` against `model` into `output_root`,
    /// recording written files in `entry`.
    #[instrument(
        skip_all,
        fields(generator = %generator.root.display(), output = %output_root.display())
    )]
    pub fn generate(
        &self,
        generator: &Generator,
        model: &Value,
        output_root: &Path,
        entry: &mut ModelEntry,
    ) -> ClayResult<GenerationReport> {
        let run = Run {
            engine: self,
            generator,
            renderer: self.renderer_for(generator)?,
            formatters: generator
                .formatters
                .iter()
                .map(|spec| self.formatters.resolve(spec))
                .collect::<ClayResult<_>>()?,
            output_root,
            recorder: Mutex::new(Recorder {
                entry,
                report: GenerationReport::default(),
            }),
        };

        for (i, step) in generator.steps.iter().enumerate() {
            info!(
                step = i,
                kind = step.kind(),
                select = step.select().unwrap_or("$"),
                "running step"
            );
            match step {
                Step::Generate(s) => run.generate(s, model)?,
                Step::Copy(s) => run.copy(s, model)?,
                Step::RunCommand(s) => run.run_command(s, model)?,
            }
        }

        let report = run.recorder.into_inner().map_err(|_| ApplicationError::LockPoisoned)?.report;
        info!(
            written = report.written,
            skipped = report.skipped,
            copied = report.copied,
            commands = report.commands,
            "generator finished"
        );
        Ok(report)
    }

    /// Delete every file recorded in `entry` and prune their now-empty parents.
    ///
    /// The caller removes the entry from the index.
    #[instrument(skip_all, fields(model = %entry.path, output = %entry.output))]
    pub fn clean(&self, entry: &ModelEntry) -> ClayResult<CleanReport> {
        let mut report = CleanReport::default();
        let mut parents = BTreeSet::new();

        for key in entry.generated_files.keys() {
            let path = self.project_root.join(key);
            if !self.filesystem.exists(&path) {
                debug!(file = %key, "already removed");
                report.missing += 1;
                continue;
            }
            self.filesystem.remove_file(&path)?;
            debug!(file = %key, "removed");
            report.removed += 1;
            if let Some(parent) = path.parent() {
                if parent != self.project_root && !parent.as_os_str().is_empty() {
                    parents.insert(parent.to_path_buf());
                }
            }
        }

        // deepest first so nested empty directories unwind
        for dir in parents.into_iter().rev() {
            if self.filesystem.remove_dir_if_empty(&dir)? {
                debug!(dir = %dir.display(), "pruned empty directory");
                report.pruned_dirs += 1;
            }
        }

        info!(removed = report.removed, missing = report.missing, "clean finished");
        Ok(report)
    }

    /// Index key of an output path: relative to the project root, `/`-separated.
    pub fn index_key(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.project_root).unwrap_or(path);
        relative
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn renderer_for(&self, generator: &Generator) -> ClayResult<Arc<dyn TemplateRenderer>> {
        if generator.partials.is_empty() {
            return Ok(Arc::clone(&self.renderer));
        }
        let partials = generator
            .partials
            .iter()
            .map(|relative| {
                let path = generator.resolve(relative);
                Ok(Partial {
                    name: Partial::name_for(&path),
                    source: self.filesystem.read_to_string(&path)?,
                })
            })
            .collect::<ClayResult<Vec<_>>>()?;
        debug!(count = partials.len(), "partials registered");
        self.renderer.with_partials(&partials)
    }
}

struct Recorder<'a> {
    entry: &'a mut ModelEntry,
    report: GenerationReport,
}

/// A template file of a `generate` step, compiled once for all nodes.
struct TemplateFile {
    source: PathBuf,
    path: CompiledTemplate,
    content: CompiledTemplate,
}

/// State shared by the steps of one generator run.
struct Run<'a> {
    engine: &'a GenerationEngine,
    generator: &'a Generator,
    renderer: Arc<dyn TemplateRenderer>,
    formatters: Vec<Arc<dyn Formatter>>,
    output_root: &'a Path,
    recorder: Mutex<Recorder<'a>>,
}

impl Run<'_> {
    fn fs(&self) -> &dyn Filesystem {
        self.engine.filesystem.as_ref()
    }

    fn with_recorder<T>(&self, f: impl FnOnce(&mut Recorder<'_>) -> T) -> ClayResult<T> {
        let mut recorder = self.recorder.lock().map_err(|_| ApplicationError::LockPoisoned)?;
        Ok(f(&mut recorder))
    }

    // -------------------------------------------------------------------------
    // generate
    // -------------------------------------------------------------------------

    fn generate(&self, step: &GenerateStep, model: &Value) -> ClayResult<()> {
        let nodes = select(model, step.select.as_deref().unwrap_or("$"))?;
        let source = self.generator.resolve(&step.generate);
        let templates = self.compile_templates(&source)?;
        let target = self.compile(step.target.as_deref().unwrap_or(""), &source)?;
        debug!(
            source = %source.display(),
            templates = templates.len(),
            nodes = nodes.len(),
            "generate step"
        );

        nodes.par_iter().try_for_each(|node| {
            let context = node.to_context();
            let base = self.output_root.join(target(&context)?);
            templates
                .par_iter()
                .try_for_each(|template| self.render_file(step, template, &base, &context))
        })
    }

    fn compile_templates(&self, source: &Path) -> ClayResult<Vec<TemplateFile>> {
        self.source_files(source)?
            .into_iter()
            .map(|(file, relative)| {
                let text = self.fs().read_to_string(&file)?;
                Ok(TemplateFile {
                    path: self.compile(&relative, &file)?,
                    content: self.compile(&text, &file)?,
                    source: file,
                })
            })
            .collect()
    }

    fn render_file(
        &self,
        step: &GenerateStep,
        template: &TemplateFile,
        base: &Path,
        context: &Value,
    ) -> ClayResult<()> {
        let output = base.join((template.path)(context)?);
        let key = self.engine.index_key(&output);

        if step.touch && self.fs().exists(&output) {
            debug!(file = %key, "exists, touch skipped");
            return self.with_recorder(|r| r.report.skipped += 1);
        }

        let rendered = (template.content)(context).map_err(|e| rendering_failed(&template.source, e))?;
        let hash = content_hash(rendered.as_bytes());

        if !step.touch {
            let unchanged = self.with_recorder(|r| r.entry.hash_of(&key) == Some(hash.as_str()))?;
            if unchanged && self.fs().exists(&output) {
                debug!(file = %key, "unchanged");
                return self.with_recorder(|r| r.report.skipped += 1);
            }
        }

        let formatted = self.format(&output, rendered)?;
        self.write(&output, &formatted)?;
        debug!(file = %key, "written");

        self.with_recorder(|r| {
            if !step.touch {
                r.entry.record(key, hash);
            }
            r.report.written += 1;
        })
    }

    fn format(&self, path: &Path, content: String) -> ClayResult<String> {
        self.formatters
            .iter()
            .filter(|f| f.applies_to(path))
            .try_fold(content, |content, formatter| formatter.format(path, &content))
    }

    fn write(&self, path: &Path, content: &str) -> ClayResult<()> {
        if let Some(parent) = path.parent() {
            self.fs().create_dir_all(parent)?;
        }
        self.fs().write_file(path, content)
    }

    // -------------------------------------------------------------------------
    // copy
    // -------------------------------------------------------------------------

    fn copy(&self, step: &CopyStep, model: &Value) -> ClayResult<()> {
        let source = self.generator.resolve(&step.copy);
        let files = self.source_files(&source)?;

        let Some(expression) = step.select.as_deref() else {
            let base = self.output_root.join(step.target.as_deref().unwrap_or(""));
            return files
                .par_iter()
                .try_for_each(|(file, relative)| self.copy_file(file, &base.join(relative)));
        };

        let nodes = select(model, expression)?;
        let target = self.compile(step.target.as_deref().unwrap_or(""), &source)?;
        let names = files
            .iter()
            .map(|(file, relative)| self.compile(relative, file))
            .collect::<ClayResult<Vec<_>>>()?;

        nodes.par_iter().try_for_each(|node| {
            let context = node.to_context();
            let base = self.output_root.join(target(&context)?);
            files
                .par_iter()
                .zip(names.par_iter())
                .try_for_each(|((file, _), name)| self.copy_file(file, &base.join(name(&context)?)))
        })
    }

    fn copy_file(&self, from: &Path, to: &Path) -> ClayResult<()> {
        let hash = content_hash(&self.fs().read_bytes(from)?);
        if let Some(parent) = to.parent() {
            self.fs().create_dir_all(parent)?;
        }
        self.fs().copy_file(from, to)?;

        let key = self.engine.index_key(to);
        debug!(file = %key, "copied");
        self.with_recorder(|r| {
            r.entry.record(key, hash);
            r.report.copied += 1;
        })
    }

    // -------------------------------------------------------------------------
    // runCommand
    // -------------------------------------------------------------------------

    fn run_command(&self, step: &CommandStep, model: &Value) -> ClayResult<()> {
        let verbose = step.verbose.unwrap_or(self.engine.verbose_commands);
        self.fs().create_dir_all(self.output_root)?;

        let commands: Vec<String> = match step.select.as_deref() {
            None => vec![step.run_command.clone()],
            Some(expression) => {
                let template = self.compile(&step.run_command, &self.generator.root)?;
                select(model, expression)?
                    .iter()
                    .map(|node: &AnnotatedNode| template(&node.to_context()))
                    .collect::<ClayResult<_>>()?
            }
        };

        commands.par_iter().try_for_each(|command| {
            let command = if step.npx_command {
                format!("npx {command}")
            } else {
                command.clone()
            };
            info!(command = %command, "running command");
            match self.engine.runner.run(&command, self.output_root, verbose) {
                Ok(outcome) if outcome.success => debug!(command = %command, "command succeeded"),
                Ok(outcome) => warn!(
                    command = %command,
                    code = ?outcome.code,
                    stdout = %outcome.stdout,
                    stderr = %outcome.stderr,
                    "command failed"
                ),
                Err(e) => warn!(command = %command, error = %e, "command could not be run"),
            }
            self.with_recorder(|r| r.report.commands += 1)
        })
    }

    // -------------------------------------------------------------------------
    // shared
    // -------------------------------------------------------------------------

    /// Files of a step source as `(absolute, relative path with '/')`.
    ///
    /// A single-file source is relative to its own directory.
    fn source_files(&self, source: &Path) -> ClayResult<Vec<(PathBuf, String)>> {
        if self.fs().is_dir(source) {
            return Ok(self
                .fs()
                .list_files(source)?
                .into_iter()
                .map(|relative| (source.join(&relative), slash_path(&relative)))
                .collect());
        }
        if !self.fs().exists(source) {
            return Err(ApplicationError::NotFound {
                what: "step source",
                path: source.to_path_buf(),
            }
            .into());
        }
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(vec![(source.to_path_buf(), name)])
    }

    fn compile(&self, template: &str, origin: &Path) -> ClayResult<CompiledTemplate> {
        self.renderer
            .compile(template)
            .map_err(|e| rendering_failed(origin, e))
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn rendering_failed(template: &Path, error: ClayError) -> ClayError {
    match error {
        ClayError::Application(ApplicationError::RenderingFailed { reason, .. }) => {
            ApplicationError::RenderingFailed {
                template: template.display().to_string(),
                reason,
            }
            .into()
        }
        other => other,
    }
}
