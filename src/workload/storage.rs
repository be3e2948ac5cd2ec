//! Workload storage backend trait definitions.

use std::path::Path;
use thiserror::Error;

/// Errors that can occur while talking to the workload filesystem.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The workload container cannot be reached right now.
    #[error("Workload unreachable: {0}")]
    Unreachable(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether the failure is expected to clear up on a later trigger.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unreachable(_))
    }
}

/// Narrow view of the workload filesystem.
///
/// Reads take `&self`; anything that mutates the filesystem takes `&mut self`
/// so a single owner performs all writes during a reconciliation pass.
pub trait WorkloadStorage {
    /// Whether the workload filesystem is reachable.
    fn can_connect(&self) -> bool;

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> Result<bool, StorageError>;

    /// Read the full content of a file.
    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Replace the content of a file. Partial writes are never observable.
    fn write(&mut self, path: &Path, data: &[u8]) -> Result<(), StorageError>;

    /// Create a directory, including parents when `recursive` is set.
    fn make_dir(&mut self, path: &Path, recursive: bool) -> Result<(), StorageError>;

    /// Read a file if it exists.
    fn read_optional(&self, path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
        if !self.exists(path)? {
            return Ok(None);
        }
        self.read(path).map(Some)
    }

    /// Write a file, creating its parent directory first when missing.
    fn push(&mut self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            if !self.exists(parent)? {
                self.make_dir(parent, true)?;
            }
        }
        self.write(path, data)?;
        tracing::info!(path = %path.display(), bytes = data.len(), "Pushed file to workload");
        Ok(())
    }
}

impl<S: WorkloadStorage + ?Sized> WorkloadStorage for &mut S {
    fn can_connect(&self) -> bool {
        (**self).can_connect()
    }

    fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        (**self).exists(path)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        (**self).read(path)
    }

    fn write(&mut self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        (**self).write(path, data)
    }

    fn make_dir(&mut self, path: &Path, recursive: bool) -> Result<(), StorageError> {
        (**self).make_dir(path, recursive)
    }
}
