//! Content database
//!
//! Single entry point the editors use for records: owns the storage and
//! config, hands out [`RecordTable`] query objects and runs free-ID searches
//! with each table's configured range.

use crate::config::{ConfigError, DbConfig};
use crate::free_id::{find_free_id, FreeIdError, SearchOptions};
use crate::record::{RecordError, RecordId, RecordTable, TableKind};
use crate::storage::{Storage, StorageMode};
use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{table}: {source}")]
    FreeId {
        table: TableKind,
        source: FreeIdError<RecordError>,
    },
    #[error("{table} record {id} is not a placeholder")]
    NotPlaceholder { table: TableKind, id: RecordId },
}

#[derive(Debug, Clone)]
pub struct Database {
    storage: Storage,
    config: DbConfig,
}

impl Database {
    /// Open the file-backed database at `config.root`
    pub fn open(config: DbConfig) -> Self {
        info!("opening database at {}", config.root.display());
        Self {
            storage: Storage::local(&config.root),
            config,
        }
    }

    /// Database kept entirely in memory
    pub fn in_memory(config: DbConfig) -> Self {
        Self {
            storage: Storage::memory(),
            config,
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn mode(&self) -> StorageMode {
        self.storage.mode()
    }

    /// Query object for one table
    pub fn table(&self, kind: TableKind) -> RecordTable<'_> {
        RecordTable::new(&self.storage, kind, self.config.compress)
    }

    /// Lowest free ID at or above the table's configured base
    ///
    /// With `reserve` set, a placeholder row is written so no other caller
    /// can take the same ID.
    pub fn free_id(&self, kind: TableKind, reserve: bool) -> Result<RecordId, DbError> {
        self.free_id_from(kind, self.config.base(kind), reserve)
    }

    /// Same as [`free_id`](Self::free_id) with an explicit base
    pub fn free_id_from(
        &self,
        kind: TableKind,
        base: RecordId,
        reserve: bool,
    ) -> Result<RecordId, DbError> {
        let options = SearchOptions {
            base,
            max_id: self.config.max_id(kind),
            reserve,
            max_conflicts: self.config.max_conflicts,
        };

        let id = find_free_id(&self.table(kind), &options)
            .map_err(|source| DbError::FreeId { table: kind, source })?;
        if reserve {
            info!("reserved {} id {}", kind, id);
        }
        Ok(id)
    }

    /// Give back a reserved ID that was never filled in
    ///
    /// Returns false if the row is already gone. Refuses to delete a row that
    /// has been saved with real content.
    pub fn release(&self, kind: TableKind, id: RecordId) -> Result<bool, DbError> {
        let table = self.table(kind);
        match table.find(id)? {
            None => Ok(false),
            Some(record) if !record.placeholder => Err(DbError::NotPlaceholder { table: kind, id }),
            Some(_) => {
                table.delete(id)?;
                info!("released {} id {}", kind, id);
                Ok(true)
            }
        }
    }

    /// Delete every placeholder row in a table, returns how many went
    pub fn purge_placeholders(&self, kind: TableKind) -> Result<usize, DbError> {
        let table = self.table(kind);
        let mut purged = 0;
        for record in table.placeholders()? {
            if table.delete(record.id)? {
                purged += 1;
            }
        }
        if purged > 0 {
            info!("purged {} placeholder(s) from {}", purged, kind);
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;
    use crate::record::Record;
    use std::collections::BTreeSet;

    fn memory_db() -> Database {
        Database::in_memory(DbConfig::default())
    }

    fn seed(db: &Database, kind: TableKind, ids: &[RecordId]) {
        for &id in ids {
            db.table(kind)
                .insert(&Record::new(id, format!("seed {}", id)))
                .unwrap();
        }
    }

    #[test]
    fn test_free_id_examples() {
        let db = memory_db();
        seed(&db, TableKind::Alliance, &[0, 1, 2, 4]);

        assert_eq!(db.free_id(TableKind::Alliance, false).unwrap(), 3);
        assert_eq!(db.free_id_from(TableKind::Quest, 5, false).unwrap(), 5);
    }

    #[test]
    fn test_reserve_then_next_caller_moves_on() {
        let db = memory_db();
        seed(&db, TableKind::ItemTemplate, &[0, 1, 2, 4]);

        assert_eq!(db.free_id(TableKind::ItemTemplate, true).unwrap(), 3);
        assert_eq!(db.free_id(TableKind::ItemTemplate, true).unwrap(), 5);
        assert_eq!(db.free_id(TableKind::ItemTemplate, false).unwrap(), 6);

        let placeholder = db.table(TableKind::ItemTemplate).get(3).unwrap();
        assert!(placeholder.placeholder);
    }

    #[test]
    fn test_find_only_does_not_reserve() {
        let db = memory_db();
        assert_eq!(db.free_id(TableKind::Shop, false).unwrap(), 0);
        assert_eq!(db.free_id(TableKind::Shop, false).unwrap(), 0);
        assert!(db.table(TableKind::Shop).used_ids().unwrap().is_empty());
    }

    #[test]
    fn test_configured_base_and_max() {
        let mut config = DbConfig::default();
        config.tables.insert(
            TableKind::Quest,
            TableConfig {
                base: 100,
                max_id: Some(101),
            },
        );
        let db = Database::in_memory(config);

        assert_eq!(db.free_id(TableKind::Quest, true).unwrap(), 100);
        assert_eq!(db.free_id(TableKind::Quest, true).unwrap(), 101);
        let err = db.free_id(TableKind::Quest, true).unwrap_err();
        assert!(matches!(
            err,
            DbError::FreeId {
                table: TableKind::Quest,
                source: FreeIdError::Exhausted { base: 100, max: 101 },
            }
        ));
    }

    #[test]
    fn test_alliance_space_is_a_byte() {
        let db = memory_db();
        let all: Vec<RecordId> = (0..=255).collect();
        seed(&db, TableKind::Alliance, &all);

        assert!(db.free_id(TableKind::Alliance, false).is_err());
        // Other tables are unaffected
        assert_eq!(db.free_id(TableKind::CharacterTemplate, false).unwrap(), 0);
    }

    #[test]
    fn test_release_only_placeholders() {
        let db = memory_db();
        seed(&db, TableKind::Shop, &[0]);
        let id = db.free_id(TableKind::Shop, true).unwrap();
        assert_eq!(id, 1);

        assert!(matches!(
            db.release(TableKind::Shop, 0),
            Err(DbError::NotPlaceholder { id: 0, .. })
        ));
        assert!(db.release(TableKind::Shop, id).unwrap());
        assert!(!db.release(TableKind::Shop, id).unwrap());

        // Released id is handed out again
        assert_eq!(db.free_id(TableKind::Shop, false).unwrap(), 1);
    }

    #[test]
    fn test_purge_placeholders() {
        let db = memory_db();
        seed(&db, TableKind::Map, &[1]);
        for _ in 0..3 {
            db.free_id(TableKind::Map, true).unwrap();
        }

        // A placeholder that got filled in survives the purge
        let mut filled = db.table(TableKind::Map).get(0).unwrap();
        filled.name = "Harbor".to_string();
        db.table(TableKind::Map).update(&filled).unwrap();

        assert_eq!(db.purge_placeholders(TableKind::Map).unwrap(), 2);
        assert_eq!(
            db.table(TableKind::Map).used_ids().unwrap(),
            BTreeSet::from([0, 1])
        );
        assert_eq!(db.purge_placeholders(TableKind::Map).unwrap(), 0);
    }

    #[test]
    fn test_purge_survives_corrupt_sibling() {
        let db = memory_db();
        let id = db.free_id(TableKind::Shop, true).unwrap();
        assert_eq!(id, 0);
        db.storage.write("shop/2.ron", b"garbage").unwrap();

        assert_eq!(db.purge_placeholders(TableKind::Shop).unwrap(), 1);
        assert_eq!(db.table(TableKind::Shop).find(0).unwrap(), None);
        // The unreadable row still holds its id
        assert_eq!(db.free_id_from(TableKind::Shop, 2, false).unwrap(), 3);
    }

    #[test]
    fn test_concurrent_reservations_are_distinct() {
        let mut config = DbConfig::default();
        config.max_conflicts = None;
        let db = Database::in_memory(config);
        seed(&db, TableKind::CharacterTemplate, &[0, 2, 5]);

        let ids = reserve_from_threads(&db, TableKind::CharacterTemplate, 8, 10);
        assert_eq!(ids.len(), 80);
        let unique: BTreeSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(!unique.contains(&0) && !unique.contains(&2) && !unique.contains(&5));
    }

    #[test]
    fn test_concurrent_reservations_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = DbConfig::default();
        config.root = dir.path().to_path_buf();
        config.max_conflicts = None;
        let db = Database::open(config);
        assert_eq!(db.mode(), StorageMode::Local);

        let ids = reserve_from_threads(&db, TableKind::Item, 4, 16);
        let unique: BTreeSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), 64);
        // Nothing was skipped either: the ids are exactly 0..64
        assert_eq!(unique, (0..64).collect::<BTreeSet<_>>());
        assert_eq!(db.table(TableKind::Item).placeholders().unwrap().len(), 64);
    }

    fn reserve_from_threads(
        db: &Database,
        kind: TableKind,
        threads: usize,
        per_thread: usize,
    ) -> Vec<RecordId> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    scope.spawn(|| {
                        (0..per_thread)
                            .map(|_| db.free_id(kind, true).unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        })
    }
}
