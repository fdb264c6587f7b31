//! Search error types

use thiserror::Error;

/// Search module result type
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors loading or decoding a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Reading the search file failed
    #[error("read search: {0}")]
    Io(#[from] std::io::Error),

    /// The search JSON was malformed or failed validation
    #[error("decode search: {0}")]
    Decode(#[from] serde_json::Error),
}
