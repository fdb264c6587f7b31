//! User-facing mod search
//!
//! A [`ModSearch`] is the serializable, human-readable form of a query:
//! names instead of heap IDs, unscaled minimum values. The database
//! facade translates it into an [`crate::IndexQuery`] under a snapshot;
//! [`ModSearch::satisfies`] re-checks results client-side without
//! touching the index.

mod errors;
mod mod_search;

pub use errors::{SearchError, SearchResult};
pub use mod_search::ModSearch;
