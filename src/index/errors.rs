//! Index error types

use thiserror::Error;

use crate::store::StoreError;

/// Index module result type
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors surfaced by the index layout and writer.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Underlying store failure
    #[error("index store access: {0}")]
    Store(#[from] StoreError),

    /// An index key failed to decode
    #[error("index key decode: {reason} (key {key})")]
    KeyDecode {
        /// Why the key was rejected
        reason: &'static str,
        /// Offending key, hex-rendered
        key: String,
    },

    /// An index entry failed to decode
    #[error("index entry decode: {reason} ({len} bytes)")]
    EntryDecode {
        /// Why the entry was rejected
        reason: &'static str,
        /// Length of the rejected payload
        len: usize,
    },
}

impl IndexError {
    pub(crate) fn key_decode(reason: &'static str, key: &[u8]) -> Self {
        IndexError::KeyDecode {
            reason,
            key: key.iter().map(|b| format!("{:02x}", b)).collect(),
        }
    }
}
