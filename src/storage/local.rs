//! Local filesystem storage backend
//!
//! Provides storage operations on the local filesystem.

use super::StorageError;
use log::warn;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Local filesystem storage backend
///
/// Wraps standard filesystem operations relative to a base directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    /// Base directory for relative paths (the database root)
    base_dir: PathBuf,
}

impl LocalStorage {
    /// Create a local storage backend with a custom base directory
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolve a path relative to the base directory
    fn resolve(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }

    fn ensure_parent(full_path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// List files in a directory
    ///
    /// Returns filenames (not full paths). Subdirectories are skipped and a
    /// missing directory yields an empty list.
    pub fn list(&self, path: &str) -> Result<Vec<String>, StorageError> {
        let full_path = self.resolve(path);

        match std::fs::read_dir(&full_path) {
            Ok(entries) => Ok(entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .filter_map(|e| e.file_name().into_string().ok())
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StorageError::from(e)),
        }
    }

    /// Read a file
    pub fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        Ok(std::fs::read(self.resolve(path))?)
    }

    /// Write a file
    ///
    /// Creates or overwrites the file with the given data.
    pub fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let full_path = self.resolve(path);
        Self::ensure_parent(&full_path)?;
        std::fs::write(&full_path, data)?;
        Ok(())
    }

    /// Create a file that must not exist yet
    ///
    /// Uses `create_new`, so two processes racing on the same path see
    /// exactly one success. A failed write removes the file again so no
    /// empty or truncated entry keeps the path claimed.
    pub fn create(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let full_path = self.resolve(path);
        Self::ensure_parent(&full_path)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(path.to_string()),
                _ => StorageError::from(e),
            })?;
        let written = file.write_all(data);
        drop(file);
        Self::discard_on_error(&full_path, written)
    }

    /// Remove a freshly created file whose write failed
    fn discard_on_error(full_path: &Path, written: std::io::Result<()>) -> Result<(), StorageError> {
        if let Err(e) = written {
            if let Err(cleanup) = std::fs::remove_file(full_path) {
                warn!("failed to remove partial {}: {}", full_path.display(), cleanup);
            }
            return Err(StorageError::from(e));
        }
        Ok(())
    }

    /// Delete a file
    pub fn delete(&self, path: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.resolve(path)) {
            Ok(()) => Ok(()),
            // Not found is OK for delete
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from(e)),
        }
    }

    /// Check if a file exists
    pub fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.resolve(path).is_file())
    }
}
