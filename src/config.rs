//! Database configuration
//!
//! relicdb is embedded; configuration is a plain struct the host builds
//! (or deserializes) and hands to [`crate::Database::open`]. An absent
//! `data_dir` means a purely in-memory database with no checkpointing.

use std::path::PathBuf;

use serde::Deserialize;

/// Configuration for a relicdb database.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Directory holding the checkpoint file. `None` disables persistence.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl DatabaseConfig {
    /// In-memory configuration, no persistence.
    pub fn in_memory() -> Self {
        Self { data_dir: None }
    }

    /// Persistent configuration rooted at `dir`.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
        }
    }

    /// Path of the checkpoint file, when persistence is enabled.
    pub fn checkpoint_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|d| d.join("relicdb.ckpt"))
    }
}
