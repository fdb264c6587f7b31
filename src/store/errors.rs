//! Store error types

use thiserror::Error;

/// Store module result type
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the bucket store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store lock poisoned; a writer panicked mid-commit")]
    Poisoned,

    /// A key addressed as a bucket holds a plain value.
    #[error("slot {key:?} holds a value, not a bucket")]
    SlotIsValue {
        /// Offending key, rendered lossily for diagnostics
        key: String,
    },

    /// A key addressed as a value holds a nested bucket.
    #[error("slot {key:?} holds a bucket, not a value")]
    SlotIsBucket {
        /// Offending key, rendered lossily for diagnostics
        key: String,
    },

    /// Checkpoint I/O failed.
    #[error("checkpoint i/o: {0}")]
    Io(#[from] std::io::Error),

    /// Checkpoint file failed structural or checksum validation.
    #[error("checkpoint corrupt: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub(crate) fn slot_is_value(key: &[u8]) -> Self {
        StoreError::SlotIsValue {
            key: render_key(key),
        }
    }

    pub(crate) fn slot_is_bucket(key: &[u8]) -> Self {
        StoreError::SlotIsBucket {
            key: render_key(key),
        }
    }
}

/// Render a byte key for error messages: UTF-8 when possible, hex otherwise.
pub(crate) fn render_key(key: &[u8]) -> String {
    match std::str::from_utf8(key) {
        Ok(s) => s.to_string(),
        Err(_) => key.iter().map(|b| format!("{:02x}", b)).collect(),
    }
}
