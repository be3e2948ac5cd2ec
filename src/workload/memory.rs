//! In-memory workload storage.
//!
//! Used to exercise reconciliation without a real container. Tracks how many
//! writes happened so idempotence can be asserted.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::workload::storage::{StorageError, WorkloadStorage};

#[derive(Debug, Clone)]
pub struct MemoryStorage {
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    reachable: bool,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let mut dirs = BTreeSet::new();
        dirs.insert(PathBuf::from("/"));
        Self {
            files: HashMap::new(),
            dirs,
            reachable: true,
            writes: 0,
        }
    }

    /// A backend whose every call fails as if the container were gone.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    /// Seed a file without counting it as a write.
    pub fn with_file(mut self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.insert_dirs(parent);
        }
        self.files.insert(path, data.into());
        self
    }

    pub fn file(&self, path: &Path) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn reset_write_count(&mut self) {
        self.writes = 0;
    }

    fn insert_dirs(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }

    fn ensure_reachable(&self) -> Result<(), StorageError> {
        if self.reachable {
            Ok(())
        } else {
            Err(StorageError::Unreachable("in-memory workload is offline".into()))
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkloadStorage for MemoryStorage {
    fn can_connect(&self) -> bool {
        self.reachable
    }

    fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        self.ensure_reachable()?;
        Ok(self.files.contains_key(path) || self.dirs.contains(path))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        self.ensure_reachable()?;
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.display().to_string()))
    }

    fn write(&mut self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        self.ensure_reachable()?;
        if let Some(parent) = path.parent() {
            if !self.dirs.contains(parent) {
                return Err(StorageError::NotFound(parent.display().to_string()));
            }
        }
        self.files.insert(path.to_path_buf(), data.to_vec());
        self.writes += 1;
        Ok(())
    }

    fn make_dir(&mut self, path: &Path, recursive: bool) -> Result<(), StorageError> {
        self.ensure_reachable()?;
        if !recursive {
            if let Some(parent) = path.parent() {
                if !self.dirs.contains(parent) {
                    return Err(StorageError::NotFound(parent.display().to_string()));
                }
            }
            self.dirs.insert(path.to_path_buf());
            return Ok(());
        }
        self.insert_dirs(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_requires_parent_directory() {
        let mut storage = MemoryStorage::new();
        let err = storage
            .write(Path::new("/etc/falcosidekick/a.yaml"), b"x")
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn test_push_creates_parents() {
        let mut storage = MemoryStorage::new();
        storage
            .push(Path::new("/etc/falcosidekick/certs/server/server.crt"), b"cert")
            .unwrap();
        assert!(storage.exists(Path::new("/etc/falcosidekick/certs")).unwrap());
        assert_eq!(
            storage.file(Path::new("/etc/falcosidekick/certs/server/server.crt")),
            Some(&b"cert"[..])
        );
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn test_unreachable_backend_fails_every_call() {
        let storage = MemoryStorage::unreachable();
        assert!(!storage.can_connect());
        let err = storage.exists(Path::new("/etc")).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_seeded_files_do_not_count_as_writes() {
        let storage = MemoryStorage::new().with_file("/etc/a", "x");
        assert_eq!(storage.write_count(), 0);
        assert_eq!(storage.read_optional(Path::new("/etc/a")).unwrap(), Some(b"x".to_vec()));
        assert_eq!(storage.read_optional(Path::new("/etc/b")).unwrap(), None);
    }
}
