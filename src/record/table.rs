//! Record table - the query object for one content table
//!
//! Wraps a [`Storage`] with the table's directory layout and implements
//! [`IdSpace`] so the free-ID search can run against it directly.

use super::{decode_record, encode_record, Record, RecordError, RecordId, TableKind};
use crate::free_id::{IdSpace, Reservation};
use crate::storage::{Storage, StorageError};
use log::warn;
use std::collections::BTreeSet;

/// File extension of record files
pub const RECORD_EXT: &str = "ron";

#[derive(Debug, Clone, Copy)]
pub struct RecordTable<'a> {
    storage: &'a Storage,
    kind: TableKind,
    compress: bool,
}

impl<'a> RecordTable<'a> {
    pub fn new(storage: &'a Storage, kind: TableKind, compress: bool) -> Self {
        Self {
            storage,
            kind,
            compress,
        }
    }

    fn path(&self, id: RecordId) -> String {
        format!("{}/{}.{}", self.kind.dir_name(), id, RECORD_EXT)
    }

    /// Parse `<id>.ron`, returning `None` for anything else
    ///
    /// Only the exact name `path` would produce is accepted, so `007.ron`
    /// or `+7.ron` never count as row 7.
    fn parse_file_name(name: &str) -> Option<RecordId> {
        let stem = name.strip_suffix(RECORD_EXT)?.strip_suffix('.')?;
        let id: RecordId = stem.parse().ok()?;
        (id.to_string() == stem).then_some(id)
    }

    /// IDs of every row in the table, from the directory listing
    pub fn used_ids(&self) -> Result<BTreeSet<RecordId>, RecordError> {
        let names = self.storage.list(self.kind.dir_name())?;
        let mut ids = BTreeSet::new();
        for name in names {
            match Self::parse_file_name(&name) {
                Some(id) => {
                    ids.insert(id);
                }
                None => warn!("ignoring '{}' in table {}", name, self.kind),
            }
        }
        Ok(ids)
    }

    /// Look up a row, `None` if it does not exist
    pub fn find(&self, id: RecordId) -> Result<Option<Record>, RecordError> {
        let data = match self.storage.read(&self.path(id)) {
            Ok(data) => data,
            Err(StorageError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record = decode_record(&data)?;
        if record.id != id {
            return Err(RecordError::Validation(format!(
                "{} holds record id {}",
                self.path(id),
                record.id
            )));
        }
        Ok(Some(record))
    }

    /// Look up a row that must exist
    pub fn get(&self, id: RecordId) -> Result<Record, RecordError> {
        self.find(id)?
            .ok_or_else(|| StorageError::NotFound(self.path(id)).into())
    }

    /// Insert a new row
    ///
    /// Fails with a duplicate-key error (see [`RecordError::is_duplicate_key`])
    /// if the ID is taken.
    pub fn insert(&self, record: &Record) -> Result<(), RecordError> {
        let data = encode_record(record, self.compress)?;
        self.storage.create(&self.path(record.id), &data)?;
        Ok(())
    }

    /// Overwrite an existing row
    ///
    /// Saving a row clears its placeholder flag.
    pub fn update(&self, record: &Record) -> Result<(), RecordError> {
        let path = self.path(record.id);
        if !self.storage.exists(&path)? {
            return Err(StorageError::NotFound(path).into());
        }

        let mut record = record.clone();
        record.placeholder = false;
        let data = encode_record(&record, self.compress)?;
        self.storage.write(&path, &data)?;
        Ok(())
    }

    /// Delete a row, returns whether it existed
    pub fn delete(&self, id: RecordId) -> Result<bool, RecordError> {
        let path = self.path(id);
        let existed = self.storage.exists(&path)?;
        self.storage.delete(&path)?;
        Ok(existed)
    }

    /// All readable rows in ID order
    ///
    /// Rows that fail to decode are logged and skipped; storage errors still
    /// fail the whole listing.
    pub fn list(&self) -> Result<Vec<Record>, RecordError> {
        let mut records = Vec::new();
        for id in self.used_ids()? {
            match self.find(id) {
                Ok(Some(record)) => records.push(record),
                // Deleted between listing and reading
                Ok(None) => {}
                Err(
                    e @ (RecordError::Serialization(_)
                    | RecordError::Compression(_)
                    | RecordError::Validation(_)),
                ) => {
                    warn!("skipping unreadable {}: {}", self.path(id), e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    /// Rows that are still reservation placeholders
    pub fn placeholders(&self) -> Result<Vec<Record>, RecordError> {
        Ok(self.list()?.into_iter().filter(|r| r.placeholder).collect())
    }
}

impl IdSpace for RecordTable<'_> {
    type Error = RecordError;

    fn used_ids(&self) -> Result<BTreeSet<RecordId>, RecordError> {
        RecordTable::used_ids(self)
    }

    fn is_occupied(&self, id: RecordId) -> Result<bool, RecordError> {
        Ok(self.storage.exists(&self.path(id))?)
    }

    fn reserve(&self, id: RecordId) -> Result<Reservation, RecordError> {
        match self.insert(&Record::placeholder(self.kind, id)) {
            Ok(()) => Ok(Reservation::Reserved),
            Err(e) if e.is_duplicate_key() => Ok(Reservation::DuplicateKey),
            Err(e) => Err(e),
        }
    }
}
