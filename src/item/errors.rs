//! Item error types

use thiserror::Error;

use crate::store::StoreError;

/// Item module result type
pub type ItemResult<T> = Result<T, ItemError>;

/// Errors surfaced by the item model and body storage.
#[derive(Debug, Error)]
pub enum ItemError {
    /// Underlying store failure
    #[error("item store access: {0}")]
    Store(#[from] StoreError),

    /// A stored item body failed to decode
    #[error("item body decode: {0}")]
    Body(#[from] serde_json::Error),

    /// An item id failed to parse
    #[error("bad item id: {0}")]
    BadId(String),
}
