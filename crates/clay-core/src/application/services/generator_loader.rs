//! Generator Loader - finds and validates `generator.json` manifests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::{
    application::{ApplicationError, ports::Filesystem},
    domain::{Generator, MANIFEST_FILE},
    error::ClayResult,
};

pub struct GeneratorLoader {
    filesystem: Arc<dyn Filesystem>,
}

impl GeneratorLoader {
    pub fn new(filesystem: Arc<dyn Filesystem>) -> Self {
        Self { filesystem }
    }

    /// Directory of the generator `reference` names, relative to `model_dir`.
    ///
    /// A reference may name the directory or the manifest file inside it.
    pub fn locate(model_dir: &Path, reference: &str) -> PathBuf {
        let candidate = model_dir.join(reference);
        match candidate.file_name() {
            Some(name) if name == MANIFEST_FILE => candidate
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
            _ => candidate,
        }
    }

    /// Read and validate `dir/generator.json`.
    pub fn load(&self, dir: &Path) -> ClayResult<Generator> {
        let manifest_path = dir.join(MANIFEST_FILE);
        if !self.filesystem.exists(&manifest_path) {
            return Err(ApplicationError::NotFound {
                what: "generator manifest",
                path: manifest_path,
            }
            .into());
        }

        let text = self.filesystem.read_to_string(&manifest_path)?;
        let manifest: Value =
            serde_json::from_str(&text).map_err(|e| ApplicationError::InvalidJson {
                path: manifest_path.clone(),
                reason: e.to_string(),
            })?;

        let generator = Generator::from_manifest(dir, &manifest)?;
        debug!(
            generator = %dir.display(),
            steps = generator.steps.len(),
            "generator loaded"
        );
        Ok(generator)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::application::ports::MockFilesystem;
    use crate::domain::{DomainError, Step};
    use crate::error::ClayError;

    fn loader_with(manifest: Option<Value>) -> GeneratorLoader {
        let mut fs = MockFilesystem::new();
        let present = manifest.is_some();
        fs.expect_exists().return_const(present);
        if let Some(manifest) = manifest {
            let text = manifest.to_string();
            fs.expect_read_to_string()
                .withf(|p| p == Path::new("/g/api/generator.json"))
                .returning(move |_| Ok(text.clone()));
        }
        GeneratorLoader::new(Arc::new(fs))
    }

    #[test]
    fn references_resolve_against_the_model_directory() {
        assert_eq!(
            GeneratorLoader::locate(Path::new("/p/models"), "../generators/api"),
            PathBuf::from("/p/models/../generators/api")
        );
        assert_eq!(
            GeneratorLoader::locate(Path::new("/p"), "gen/generator.json"),
            PathBuf::from("/p/gen")
        );
    }

    #[test]
    fn valid_manifest_loads_rooted_at_its_directory() {
        let loader = loader_with(Some(json!({ "steps": [{ "copy": "static" }] })));
        let generator = loader.load(Path::new("/g/api")).unwrap();
        assert_eq!(generator.root, PathBuf::from("/g/api"));
        assert!(matches!(generator.steps[0], Step::Copy(_)));
    }

    #[test]
    fn missing_manifest_is_not_found() {
        let err = loader_with(None).load(Path::new("/g/api")).unwrap_err();
        assert!(matches!(
            err,
            ClayError::Application(ApplicationError::NotFound { what: "generator manifest", .. })
        ));
    }

    #[test]
    fn schema_errors_surface_as_invalid_generator() {
        let loader = loader_with(Some(json!({ "steps": [{}] })));
        let err = loader.load(Path::new("/g/api")).unwrap_err();
        assert!(matches!(
            err,
            ClayError::Domain(DomainError::InvalidGenerator { .. })
        ));
    }
}
