//! Content records
//!
//! Every editor table (alliances, templates, quests, shops, items, maps) stores
//! the same shape of row: a stable numeric ID, a display name and a bag of
//! named fields. Rows live one per file:
//!
//! ```text
//! <db root>/
//! ├── alliance/
//! │   ├── 0.ron
//! │   └── 1.ron
//! ├── item_template/
//! │   └── 42.ron        # brotli-compressed or plain RON
//! └── ...
//! ```

mod codec;
mod table;

pub use codec::{decode_record, encode_record};
pub use table::RecordTable;

use crate::storage::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Numeric record identifier, unique within one table
pub type RecordId = u32;

/// Error type for record operations
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("compression error: {0}")]
    Compression(String),
    #[error("validation error: {0}")]
    Validation(String),
}

impl RecordError {
    /// True when an exclusive insert lost to an existing row
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, RecordError::Storage(StorageError::AlreadyExists(_)))
    }
}

/// The tables of the content database
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TableKind {
    Alliance,
    CharacterTemplate,
    ItemTemplate,
    Quest,
    Shop,
    Item,
    Map,
}

impl TableKind {
    pub const ALL: [TableKind; 7] = [
        TableKind::Alliance,
        TableKind::CharacterTemplate,
        TableKind::ItemTemplate,
        TableKind::Quest,
        TableKind::Shop,
        TableKind::Item,
        TableKind::Map,
    ];

    /// Directory (and CLI) name of the table
    pub fn dir_name(&self) -> &'static str {
        match self {
            TableKind::Alliance => "alliance",
            TableKind::CharacterTemplate => "character_template",
            TableKind::ItemTemplate => "item_template",
            TableKind::Quest => "quest",
            TableKind::Shop => "shop",
            TableKind::Item => "item",
            TableKind::Map => "map",
        }
    }

    /// Largest ID the table's key column can hold
    ///
    /// Alliances use a byte key, items a signed 32-bit key, everything
    /// else an unsigned 16-bit key.
    pub fn default_max_id(&self) -> RecordId {
        match self {
            TableKind::Alliance => u8::MAX as RecordId,
            TableKind::Item => i32::MAX as RecordId,
            _ => u16::MAX as RecordId,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for TableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        TableKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.dir_name() == wanted)
            .ok_or_else(|| format!("unknown table '{}'", s))
    }
}

/// A single field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{:?}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// One row of a content table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,

    /// Human-readable name shown in the editors
    pub name: String,

    /// Set on rows written by an ID reservation and cleared on first real save
    #[serde(default)]
    pub placeholder: bool,

    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            placeholder: false,
            fields: BTreeMap::new(),
        }
    }

    /// The row written to hold a reserved ID, e.g. `new_quest_007`
    pub fn placeholder(kind: TableKind, id: RecordId) -> Self {
        Self {
            id,
            name: format!("new_{}_{:03}", kind.dir_name(), id),
            placeholder: true,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_kind_parse() {
        assert_eq!("item_template".parse::<TableKind>(), Ok(TableKind::ItemTemplate));
        assert_eq!("Character-Template".parse::<TableKind>(), Ok(TableKind::CharacterTemplate));
        assert!("npc_chat".parse::<TableKind>().is_err());

        for kind in TableKind::ALL {
            assert_eq!(kind.to_string().parse::<TableKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_default_max_ids() {
        assert_eq!(TableKind::Alliance.default_max_id(), 255);
        assert_eq!(TableKind::Shop.default_max_id(), 65535);
        assert_eq!(TableKind::Item.default_max_id(), 2_147_483_647);
    }

    #[test]
    fn test_placeholder_naming() {
        let record = Record::placeholder(TableKind::Quest, 7);
        assert_eq!(record.name, "new_quest_007");
        assert!(record.placeholder);
        assert!(record.fields.is_empty());

        let record = Record::placeholder(TableKind::Map, 1234);
        assert_eq!(record.name, "new_map_1234");
    }

    #[test]
    fn test_duplicate_key_detection() {
        let dup = RecordError::from(StorageError::AlreadyExists("shop/1.ron".into()));
        assert!(dup.is_duplicate_key());

        let other = RecordError::from(StorageError::Io("disk full".into()));
        assert!(!other.is_duplicate_key());
        assert!(!RecordError::Validation("bad".into()).is_duplicate_key());
    }
}
