//! Database configuration
//!
//! Stored as RON, e.g.:
//!
//! ```ron
//! (
//!   root: "assets/userdata/db",
//!   compress: true,
//!   max_conflicts: Some(64),
//!   tables: {
//!     ItemTemplate: (base: 100, max_id: None),
//!   },
//! )
//! ```

use crate::record::{RecordId, TableKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default database root, under the user data directory
pub const DEFAULT_ROOT: &str = "assets/userdata/db";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "bonnie-db.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("failed to write config: {0}")]
    Write(String),
}

/// Per-table ID range override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableConfig {
    /// First ID handed out by a search
    #[serde(default)]
    pub base: RecordId,
    /// Upper bound, `None` uses the table's column width
    #[serde(default)]
    pub max_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Write record files brotli-compressed
    #[serde(default = "default_compress")]
    pub compress: bool,

    /// Lost reservation races tolerated per search
    #[serde(default = "default_max_conflicts")]
    pub max_conflicts: Option<u32>,

    #[serde(default)]
    pub tables: BTreeMap<TableKind, TableConfig>,
}

fn default_root() -> PathBuf {
    PathBuf::from(DEFAULT_ROOT)
}

fn default_compress() -> bool {
    true
}

fn default_max_conflicts() -> Option<u32> {
    Some(64)
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            compress: default_compress(),
            max_conflicts: default_max_conflicts(),
            tables: BTreeMap::new(),
        }
    }
}

impl DbConfig {
    /// Search base for a table
    pub fn base(&self, kind: TableKind) -> RecordId {
        self.tables.get(&kind).map(|t| t.base).unwrap_or(0)
    }

    /// Largest ID for a table
    pub fn max_id(&self, kind: TableKind) -> RecordId {
        self.tables
            .get(&kind)
            .and_then(|t| t.max_id)
            .unwrap_or_else(|| kind.default_max_id())
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Save as pretty RON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = ron::ser::PrettyConfig::new().indentor("  ".to_string());
        let text = ron::ser::to_string_pretty(self, config)
            .map_err(|e| ConfigError::Write(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write(e.to_string()))?;
        }
        std::fs::write(path, text).map_err(|e| ConfigError::Write(e.to_string()))
    }

    /// Per-user config file location
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bonnie-db").join("config.ron"))
    }

    /// Resolve the config to use
    ///
    /// An explicit path must load. Otherwise `./bonnie-db.ron`, then the
    /// per-user file, then defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidates = std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE))
            .chain(Self::user_config_path());
        for path in candidates {
            if path.is_file() {
                log::info!("using config {}", path.display());
                return Self::load(&path);
            }
        }

        log::debug!("no config file found, using defaults");
        Ok(Self::default())
    }
}
