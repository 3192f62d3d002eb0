//! In-memory filesystem adapter for testing.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use clay_core::{
    application::{ApplicationError, ports::Filesystem},
    error::ClayResult,
};

/// In-memory filesystem for testing.
///
/// Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, Vec<u8>>,
    directories: BTreeSet<PathBuf>,
    writes: usize,
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating its parent directories (testing helper).
    pub fn insert(&self, path: impl AsRef<Path>, content: &str) {
        let path = path.as_ref();
        if let Ok(mut inner) = self.inner.write() {
            if let Some(parent) = path.parent() {
                add_ancestors(&mut inner.directories, parent);
            }
            inner.files.insert(path.to_path_buf(), content.as_bytes().to_vec());
        }
    }

    /// Read a file's content (testing helper).
    pub fn read_file(&self, path: impl AsRef<Path>) -> Option<String> {
        let inner = self.inner.read().ok()?;
        let bytes = inner.files.get(path.as_ref())?;
        String::from_utf8(bytes.clone()).ok()
    }

    /// Every file path, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of `write_file` / `copy_file` calls so far.
    pub fn write_count(&self) -> usize {
        self.inner.read().map(|inner| inner.writes).unwrap_or(0)
    }

    fn read(&self) -> ClayResult<std::sync::RwLockReadGuard<'_, MemoryFilesystemInner>> {
        self.inner.read().map_err(|_| ApplicationError::LockPoisoned.into())
    }

    fn write(&self) -> ClayResult<std::sync::RwLockWriteGuard<'_, MemoryFilesystemInner>> {
        self.inner.write().map_err(|_| ApplicationError::LockPoisoned.into())
    }
}

fn add_ancestors(directories: &mut BTreeSet<PathBuf>, path: &Path) {
    let mut current = PathBuf::new();
    for component in path.components() {
        current.push(component);
        directories.insert(current.clone());
    }
}

fn not_found(path: &Path) -> clay_core::error::ClayError {
    ApplicationError::NotFound {
        what: "file",
        path: path.to_path_buf(),
    }
    .into()
}

impl Filesystem for MemoryFilesystem {
    fn read_to_string(&self, path: &Path) -> ClayResult<String> {
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes).map_err(|e| {
            ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: format!("Failed to read file: {}", e),
            }
            .into()
        })
    }

    fn read_bytes(&self, path: &Path) -> ClayResult<Vec<u8>> {
        self.read()?
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    fn write_file(&self, path: &Path, content: &str) -> ClayResult<()> {
        let mut inner = self.write()?;

        // Ensure parent exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !inner.directories.contains(parent) {
                return Err(ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "Parent directory does not exist".into(),
                }
                .into());
            }
        }

        inner.files.insert(path.to_path_buf(), content.as_bytes().to_vec());
        inner.writes += 1;
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> ClayResult<()> {
        add_ancestors(&mut self.write()?.directories, path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.read()
            .map(|inner| inner.files.contains_key(path) || inner.directories.contains(path))
            .unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.read()
            .map(|inner| inner.directories.contains(path))
            .unwrap_or(false)
    }

    fn remove_file(&self, path: &Path) -> ClayResult<()> {
        self.write()?
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn remove_dir_if_empty(&self, path: &Path) -> ClayResult<bool> {
        let mut inner = self.write()?;
        if !inner.directories.contains(path) {
            return Ok(false);
        }
        let occupied = inner.files.keys().any(|p| p.starts_with(path))
            || inner.directories.iter().any(|d| d != path && d.starts_with(path));
        if occupied {
            return Ok(false);
        }
        inner.directories.remove(path);
        Ok(true)
    }

    fn list_files(&self, dir: &Path) -> ClayResult<Vec<PathBuf>> {
        Ok(self
            .read()?
            .files
            .keys()
            .filter_map(|p| p.strip_prefix(dir).ok())
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .collect())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> ClayResult<()> {
        let bytes = self.read_bytes(from)?;
        let mut inner = self.write()?;
        inner.files.insert(to.to_path_buf(), bytes);
        inner.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_are_pruned_only_when_empty() {
        let fs = MemoryFilesystem::new();
        fs.insert("/p/src/a/x.ts", "x");
        fs.remove_file(Path::new("/p/src/a/x.ts")).unwrap();

        assert!(!fs.remove_dir_if_empty(Path::new("/p/src")).unwrap());
        assert!(fs.remove_dir_if_empty(Path::new("/p/src/a")).unwrap());
        assert!(fs.remove_dir_if_empty(Path::new("/p/src")).unwrap());
        assert!(!fs.remove_dir_if_empty(Path::new("/p/gone")).unwrap());
    }

    #[test]
    fn writes_require_an_existing_parent() {
        let fs = MemoryFilesystem::new();
        assert!(fs.write_file(Path::new("/p/a.txt"), "a").is_err());
        fs.create_dir_all(Path::new("/p")).unwrap();
        fs.write_file(Path::new("/p/a.txt"), "a").unwrap();
        assert_eq!(fs.read_file("/p/a.txt").as_deref(), Some("a"));
        assert_eq!(fs.write_count(), 1);
    }

    #[test]
    fn list_files_is_relative_and_recursive() {
        let fs = MemoryFilesystem::new();
        fs.insert("/g/tpl/a.ts", "");
        fs.insert("/g/tpl/nested/b.ts", "");
        fs.insert("/g/other.ts", "");
        assert_eq!(
            fs.list_files(Path::new("/g/tpl")).unwrap(),
            vec![PathBuf::from("a.ts"), PathBuf::from("nested/b.ts")]
        );
    }
}
