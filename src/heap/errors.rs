//! Heap error types

use thiserror::Error;

use crate::store::StoreError;

/// Heap module result type
pub type HeapResult<T> = Result<T, HeapError>;

/// Errors surfaced by the interning heaps.
#[derive(Debug, Error)]
pub enum HeapError {
    /// Underlying store failure
    #[error("heap store access: {0}")]
    Store(#[from] StoreError),

    /// Heap bucket contents failed validation
    #[error("heap corrupt: {0}")]
    Corrupt(String),

    /// The ID space of a heap is exhausted
    #[error("heap id space exhausted for {heap}")]
    Exhausted {
        /// Which heap ran out
        heap: &'static str,
    },
}
