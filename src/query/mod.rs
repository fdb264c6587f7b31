//! Multi-mod intersection query engine
//!
//! The core of relicdb. An [`IndexQuery`] walks one descending cursor per
//! queried mod over the mod-value index, accumulating a bounded partial
//! intersection until enough items satisfy every mod or the cursors are
//! spent.
//!
//! # Design
//!
//! Strides, not materialization: because the index orders each bucket by
//! value, the most promising items surface first, and a bucket whose next
//! key falls below the scaled minimum can never contribute again. One
//! bounded stride per live cursor per pass keeps a dense mod from
//! starving the others; cursor invalidation terminates doomed mods
//! cheaply. The alternative (materialize every mod's satisfying set, then
//! intersect) touches the whole index to answer a query that wants a
//! handful of items.

mod accumulator;
mod errors;
mod index_query;

pub use errors::{QueryError, QueryResult};
pub use index_query::IndexQuery;

/// Target number of item ids observed per cursor per stride pass.
///
/// Longer strides mean fewer passes but more potentially useless entries
/// decoded past the point where the result is already full.
pub const STRIDE_LENGTH: usize = 32;

/// Upper bound on mods per query, fixed by the accumulator's bitmap width.
pub const MAX_QUERY_MODS: usize = 64;
