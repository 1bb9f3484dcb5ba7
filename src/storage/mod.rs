//! Storage Abstraction Layer
//!
//! Record tables talk to a [`Storage`], which dispatches to one of two backends:
//! - [`LocalStorage`] → files under a base directory (the normal case)
//! - [`MemoryStorage`] → a shared in-process map (tests, scratch databases)
//!
//! Both backends provide an atomic `create` that fails with
//! [`StorageError::AlreadyExists`] when the path is taken. Free-ID reservation
//! relies on it as the uniqueness constraint.

pub mod local;
pub mod memory;

pub use local::LocalStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Storage error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    /// File or directory not found
    #[error("not found: {0}")]
    NotFound(String),
    /// Exclusive create hit an existing entry
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Permission denied
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),
    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(e.to_string()),
            std::io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(e.to_string()),
            std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(e.to_string()),
            _ => StorageError::Io(e.to_string()),
        }
    }
}

/// Storage mode indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Files on the local filesystem
    Local,
    /// In-process map, gone when the last handle drops
    Memory,
}

impl StorageMode {
    /// Human-readable label for the storage mode
    pub fn label(&self) -> &'static str {
        match self {
            StorageMode::Local => "Local",
            StorageMode::Memory => "Memory",
        }
    }
}

#[derive(Debug, Clone)]
enum Backend {
    Local(LocalStorage),
    Memory(MemoryStorage),
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage - Unified storage over either backend
// ─────────────────────────────────────────────────────────────────────────────

/// Unified storage handle
///
/// Paths are `/`-separated and relative to the backend root,
/// e.g. `item_template/42.ron`.
#[derive(Debug, Clone)]
pub struct Storage {
    backend: Backend,
}

impl Storage {
    /// Storage backed by files under `base_dir`
    pub fn local(base_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            backend: Backend::Local(LocalStorage::with_base_dir(base_dir)),
        }
    }

    /// Fresh, empty in-memory storage
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryStorage::new()),
        }
    }

    /// Which backend this storage uses
    pub fn mode(&self) -> StorageMode {
        match self.backend {
            Backend::Local(_) => StorageMode::Local,
            Backend::Memory(_) => StorageMode::Memory,
        }
    }

    /// List file names (not full paths) in a directory
    ///
    /// A missing directory lists as empty.
    pub fn list(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        match &self.backend {
            Backend::Local(local) => local.list(dir),
            Backend::Memory(memory) => memory.list(dir),
        }
    }

    /// Read a file
    pub fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        match &self.backend {
            Backend::Local(local) => local.read(path),
            Backend::Memory(memory) => memory.read(path),
        }
    }

    /// Create or overwrite a file
    pub fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        match &self.backend {
            Backend::Local(local) => local.write(path, data),
            Backend::Memory(memory) => memory.write(path, data),
        }
    }

    /// Create a file, failing with `AlreadyExists` if it is already there
    pub fn create(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        match &self.backend {
            Backend::Local(local) => local.create(path, data),
            Backend::Memory(memory) => memory.create(path, data),
        }
    }

    /// Delete a file (deleting a missing file is not an error)
    pub fn delete(&self, path: &str) -> Result<(), StorageError> {
        match &self.backend {
            Backend::Local(local) => local.delete(path),
            Backend::Memory(memory) => memory.delete(path),
        }
    }

    /// Check if a file exists
    pub fn exists(&self, path: &str) -> Result<bool, StorageError> {
        match &self.backend {
            Backend::Local(local) => local.exists(path),
            Backend::Memory(memory) => memory.exists(path),
        }
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::memory()
    }
}
