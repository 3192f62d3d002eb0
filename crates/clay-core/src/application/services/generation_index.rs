//! Generation Index - the `.clay` catalogue of generated files.
//!
//! The index is read-modify-written on every `generate` and `clean`. It is
//! committed alongside the project, so it has to survive merges: unresolved
//! conflict blocks are repaired on load by keeping the incoming side.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    application::{ApplicationError, ports::Filesystem},
    domain::{IndexDocument, ModelEntry, repair_merge_conflicts},
    error::ClayResult,
};

/// File name of the index inside the project root.
pub const FILE_NAME: &str = ".clay";

pub struct GenerationIndex {
    filesystem: Arc<dyn Filesystem>,
    root: PathBuf,
    document: IndexDocument,
}

impl GenerationIndex {
    /// Load `<directory>/.clay`, starting empty when it is absent or blank.
    pub fn load(filesystem: Arc<dyn Filesystem>, directory: &Path) -> ClayResult<Self> {
        let path = directory.join(FILE_NAME);
        let document = if filesystem.exists(&path) {
            let raw = filesystem.read_to_string(&path)?;
            parse(&path, &raw)?
        } else {
            IndexDocument::default()
        };
        debug!(path = %path.display(), models = document.models.len(), "index loaded");

        Ok(Self {
            filesystem,
            root: directory.to_path_buf(),
            document,
        })
    }

    /// Directory holding the index; recorded paths are relative to it.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(FILE_NAME)
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.document.models
    }

    /// Entry for `(path, output)`, created empty if absent.
    pub fn get_or_create(&mut self, path: &str, output: &str) -> &mut ModelEntry {
        let position = match self.document.models.iter().position(|e| e.matches(path, output)) {
            Some(i) => i,
            None => {
                self.document.models.push(ModelEntry::new(path, output));
                self.document.models.len() - 1
            }
        };
        &mut self.document.models[position]
    }

    pub fn find(&self, path: &str, output: &str) -> Option<&ModelEntry> {
        self.document.models.iter().find(|e| e.matches(path, output))
    }

    pub fn remove(&mut self, path: &str, output: &str) -> Option<ModelEntry> {
        let position = self.document.models.iter().position(|e| e.matches(path, output))?;
        Some(self.document.models.remove(position))
    }

    /// Every entry recorded for a model, whatever its output.
    pub fn entries_for_model(&self, path: &str) -> Vec<&ModelEntry> {
        self.document.models.iter().filter(|e| e.path == path).collect()
    }

    /// Overwrite the index file. Last writer wins.
    pub fn save(&self) -> ClayResult<()> {
        let path = self.path();
        let mut text = serde_json::to_string_pretty(&self.document).map_err(|e| {
            ApplicationError::IndexCorrupt {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        text.push('\n');
        self.filesystem.write_file(&path, &text)?;
        debug!(path = %path.display(), models = self.document.models.len(), "index saved");
        Ok(())
    }
}

fn parse(path: &Path, raw: &str) -> ClayResult<IndexDocument> {
    if raw.trim().is_empty() {
        return Ok(IndexDocument::default());
    }

    let (repaired, blocks) = repair_merge_conflicts(raw);
    if blocks > 0 {
        warn!(
            path = %path.display(),
            blocks,
            "repaired unresolved merge conflicts in generation index, keeping incoming side"
        );
    }

    serde_json::from_str(&repaired).map_err(|e| {
        ApplicationError::IndexCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::application::ports::MockFilesystem;
    use crate::error::ClayError;

    fn with_index(raw: Option<&'static str>) -> Arc<MockFilesystem> {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().return_const(raw.is_some());
        if let Some(raw) = raw {
            fs.expect_read_to_string()
                .returning(move |_| Ok(raw.to_string()));
        }
        Arc::new(fs)
    }

    #[test]
    fn absent_index_starts_empty() {
        let index = GenerationIndex::load(with_index(None), Path::new("/p")).unwrap();
        assert!(index.entries().is_empty());
    }

    #[test]
    fn blank_index_starts_empty() {
        let index = GenerationIndex::load(with_index(Some("  \n")), Path::new("/p")).unwrap();
        assert!(index.entries().is_empty());
    }

    #[test]
    fn get_or_create_is_keyed_by_path_and_output() {
        let mut index = GenerationIndex::load(with_index(None), Path::new("/p")).unwrap();
        index.get_or_create("m.json", ".").record("a.txt", "1");
        index.get_or_create("m.json", "out");
        assert_eq!(index.get_or_create("m.json", ".").hash_of("a.txt"), Some("1"));
        assert_eq!(index.entries().len(), 2);
        assert_eq!(index.entries_for_model("m.json").len(), 2);
        assert!(index.find("m.json", "other").is_none());

        let removed = index.remove("m.json", "out").unwrap();
        assert_eq!(removed.output, "out");
        assert_eq!(index.entries().len(), 1);
    }

    #[test]
    fn merge_conflicted_index_loads_incoming_side() {
        let raw = "{\"models\": [\n\
                   <<<<<<< HEAD\n\
                   {\"path\": \"a.json\", \"output\": \".\"}\n\
                   =======\n\
                   {\"path\": \"a.json\", \"output\": \".\"},\n\
                   {\"path\": \"b.json\", \"output\": \".\"}\n\
                   >>>>>>> feature\n\
                   ]}";
        let index = GenerationIndex::load(with_index(Some(raw)), Path::new("/p")).unwrap();
        let paths: Vec<_> = index.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a.json", "b.json"]);
    }

    #[test]
    fn unrepairable_index_is_corrupt() {
        let Err(err) = GenerationIndex::load(with_index(Some("{\"models\": [")), Path::new("/p"))
        else {
            panic!("truncated index loaded");
        };
        assert!(matches!(
            err,
            ClayError::Application(ApplicationError::IndexCorrupt { .. })
        ));
    }

    #[test]
    fn save_writes_pretty_json_with_trailing_newline() {
        let written = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&written);

        let mut fs = MockFilesystem::new();
        fs.expect_exists().return_const(false);
        fs.expect_write_file()
            .withf(|p, _| p == Path::new("/p/.clay"))
            .returning(move |_, text| {
                *sink.lock().unwrap() = text.to_string();
                Ok(())
            });

        let mut index = GenerationIndex::load(Arc::new(fs), Path::new("/p")).unwrap();
        index.get_or_create("m.json", ".");
        index.save().unwrap();

        let text = written.lock().unwrap().clone();
        assert!(text.starts_with("{\n  \"models\": [\n"));
        assert!(text.ends_with("}\n"));
    }
}
