//! BONNIE-DB: content record store for the BONNIE-32 editors
//!
//! Alliances, character templates, item templates, quests, shops, items and
//! maps are stored one record per RON file. New records get their IDs from
//! the free-ID search in [`free_id`], which probes upward for the lowest
//! unused ID and claims it with a placeholder row. Concurrent editors racing
//! for the same ID are settled by the store's exclusive create.
//!
//! ```no_run
//! use bonnie_db::{Database, DbConfig, TableKind};
//!
//! let db = Database::open(DbConfig::default());
//! let id = db.free_id(TableKind::ItemTemplate, true)?;
//! let mut record = db.table(TableKind::ItemTemplate).get(id)?;
//! record.name = "Rusty Sword".to_string();
//! db.table(TableKind::ItemTemplate).update(&record)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod database;
pub mod free_id;
pub mod record;
pub mod storage;

pub use config::{ConfigError, DbConfig, TableConfig};
pub use database::{Database, DbError};
pub use free_id::{find_free_id, next_free_value, FreeIdError, IdSpace, Reservation, SearchOptions};
pub use record::{FieldValue, Record, RecordError, RecordId, RecordTable, TableKind};
pub use storage::{Storage, StorageError, StorageMode};
