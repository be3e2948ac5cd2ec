//! Workload storage backed by a local directory.
//!
//! The directory plays the role of the container's root filesystem: the
//! container path `/etc/falcosidekick/falcosidekick.yaml` lands at
//! `<root>/etc/falcosidekick/falcosidekick.yaml`.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;

use crate::workload::storage::{StorageError, WorkloadStorage};

#[derive(Debug, Clone)]
pub struct RootedFilesystem {
    root: PathBuf,
}

impl RootedFilesystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Translate a container path into a host path under the root.
    fn resolve(&self, path: &Path) -> Result<PathBuf, StorageError> {
        let mut resolved = self.root.clone();
        for component in path.components() {
            match component {
                Component::RootDir | Component::CurDir => {}
                Component::Normal(part) => resolved.push(part),
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(StorageError::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("path escapes workload root: {}", path.display()),
                    )));
                }
            }
        }
        Ok(resolved)
    }

    fn ensure_reachable(&self) -> Result<(), StorageError> {
        if self.can_connect() {
            Ok(())
        } else {
            Err(StorageError::Unreachable(format!(
                "workload root {} is not mounted",
                self.root.display()
            )))
        }
    }
}

impl WorkloadStorage for RootedFilesystem {
    fn can_connect(&self) -> bool {
        self.root.is_dir()
    }

    fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        self.ensure_reachable()?;
        Ok(self.resolve(path)?.exists())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        self.ensure_reachable()?;
        let host_path = self.resolve(path)?;
        fs::read(&host_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(path.display().to_string()),
            _ => StorageError::Io(e),
        })
    }

    fn write(&mut self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        self.ensure_reachable()?;
        let host_path = self.resolve(path)?;
        let parent = host_path
            .parent()
            .ok_or_else(|| StorageError::NotFound(path.display().to_string()))?;
        if !parent.is_dir() {
            return Err(StorageError::NotFound(
                path.parent().unwrap_or(path).display().to_string(),
            ));
        }

        // Stage next to the target so the rename stays on one filesystem.
        let mut staged = NamedTempFile::new_in(parent)?;
        staged.write_all(data)?;
        staged.as_file().sync_all()?;
        staged.persist(&host_path).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }

    fn make_dir(&mut self, path: &Path, recursive: bool) -> Result<(), StorageError> {
        self.ensure_reachable()?;
        let host_path = self.resolve(path)?;
        if recursive {
            fs::create_dir_all(&host_path)?;
        } else {
            fs::create_dir(&host_path)?;
        }
        Ok(())
    }
}
