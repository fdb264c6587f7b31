//! Query error types
//!
//! Only genuinely broken states error. A mod with no index bucket, an
//! empty bucket, or a result smaller than requested are all ordinary
//! outcomes and never raise.

use thiserror::Error;

use crate::index::IndexError;
use crate::store::StoreError;

/// Query module result type
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that abort a running query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// An index bucket exists but could not be opened as a bucket
    #[error("open index bucket for mod position {mod_index}: {source}")]
    BucketOpen {
        /// Position of the mod in the query
        mod_index: usize,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },

    /// An index key or entry under a live cursor failed to decode
    #[error("index decode during query: {0}")]
    Decode(#[from] IndexError),

    /// The store refused a read snapshot
    #[error("open read snapshot: {source}")]
    Snapshot {
        /// Underlying store failure
        #[source]
        source: StoreError,
    },
}
