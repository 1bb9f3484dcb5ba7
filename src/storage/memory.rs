//! In-memory storage backend
//!
//! Keeps files in a shared ordered map. Clones share the same map, so a
//! cloned handle sees every write made through the original.

use super::StorageError;
use parking_lot::Mutex;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(path: &str) -> String {
        path.trim_start_matches("./").trim_matches('/').to_string()
    }

    /// List file names directly inside `dir`
    pub fn list(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        let dir = Self::normalize(dir);
        let prefix = if dir.is_empty() || dir == "." {
            String::new()
        } else {
            format!("{}/", dir)
        };

        let files = self.files.lock();
        Ok(files
            .keys()
            .filter_map(|key| key.strip_prefix(prefix.as_str()))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }

    pub fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let path = Self::normalize(path);
        self.files
            .lock()
            .get(&path)
            .cloned()
            .ok_or(StorageError::NotFound(path))
    }

    pub fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        self.files.lock().insert(Self::normalize(path), data.to_vec());
        Ok(())
    }

    /// Insert only if the path is vacant
    pub fn create(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = Self::normalize(path);
        match self.files.lock().entry(path) {
            Entry::Occupied(entry) => Err(StorageError::AlreadyExists(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(data.to_vec());
                Ok(())
            }
        }
    }

    pub fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.files.lock().remove(&Self::normalize(path));
        Ok(())
    }

    pub fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.files.lock().contains_key(&Self::normalize(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_only_direct_children() {
        let storage = MemoryStorage::new();
        storage.write("quest/1.ron", b"a").unwrap();
        storage.write("quest/2.ron", b"b").unwrap();
        storage.write("quest/archive/3.ron", b"c").unwrap();
        storage.write("shop/1.ron", b"d").unwrap();

        assert_eq!(storage.list("quest").unwrap(), vec!["1.ron", "2.ron"]);
        assert_eq!(storage.list("shop/").unwrap(), vec!["1.ron"]);
        assert!(storage.list("map").unwrap().is_empty());
    }

    #[test]
    fn test_clones_share_files() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        storage.create("map/7.ron", b"x").unwrap();
        assert!(other.exists("map/7.ron").unwrap());
        assert!(matches!(
            other.create("map/7.ron", b"y"),
            Err(StorageError::AlreadyExists(_))
        ));

        other.delete("map/7.ron").unwrap();
        assert!(!storage.exists("map/7.ron").unwrap());
    }

    #[test]
    fn test_read_missing() {
        let storage = MemoryStorage::new();
        assert_eq!(
            storage.read("item/1.ron"),
            Err(StorageError::NotFound("item/1.ron".to_string()))
        );
    }
}
