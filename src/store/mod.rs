//! Transactional bucket store
//!
//! The substrate under every relicdb subsystem: an ordered key-value store
//! addressed by named buckets, with snapshot-isolated reads and a single
//! logical writer. Buckets nest; index buckets, heap buckets and item
//! buckets are all children of one root bucket.
//!
//! # Invariants
//!
//! - A [`Snapshot`] is an immutable, point-in-time view. Opening one never
//!   blocks a writer and is never blocked by one.
//! - Commits are atomic: a snapshot observes either none or all of an
//!   `update` closure's effects.
//! - A [`DescendingCursor`] borrows its bucket from a snapshot and cannot
//!   outlive it.
//! - Missing buckets are `Ok(None)`, never an error.

mod bucket;
mod checkpoint;
mod cursor;
mod errors;
#[allow(clippy::module_inception)]
mod store;

pub use bucket::{Bucket, Slot};
pub use cursor::{CursorEntry, DescendingCursor};
pub use errors::{StoreError, StoreResult};
pub use store::{CommitId, Snapshot, Store, WriteTxn};
