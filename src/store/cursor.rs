//! Descending cursors over buckets
//!
//! A cursor walks a bucket's keys from highest to lowest. The contract
//! every caller relies on:
//!
//! - `last()` positions at the greatest key and yields it
//! - `prev()` steps to the next-lower key and yields it
//! - nested child buckets are yielded as [`CursorEntry::Nested`] and must
//!   be skipped by callers that want values
//! - a `None` return means start-of-bucket; the cursor stays exhausted
//!
//! The cursor borrows its bucket, which in practice is borrowed from a
//! [`super::Snapshot`]; the borrow chain makes it impossible for a cursor
//! to outlive the snapshot that produced it.

use super::bucket::{Bucket, Slot};

/// One entry yielded by a cursor.
#[derive(Debug)]
pub enum CursorEntry<'b> {
    /// Plain key/value pair
    Pair {
        /// Entry key
        key: &'b [u8],
        /// Entry value
        value: &'b [u8],
    },
    /// Nested child bucket; carries no value
    Nested {
        /// Key naming the child bucket
        key: &'b [u8],
    },
}

enum CursorPos {
    /// Fresh cursor, not yet positioned
    Start,
    /// Positioned at this key
    At(Vec<u8>),
    /// Walked past the first key; stays exhausted
    Exhausted,
}

/// A descending cursor over one bucket.
pub struct DescendingCursor<'b> {
    bucket: &'b Bucket,
    pos: CursorPos,
}

impl<'b> DescendingCursor<'b> {
    pub(crate) fn new(bucket: &'b Bucket) -> Self {
        Self {
            bucket,
            pos: CursorPos::Start,
        }
    }

    /// Positions at the greatest key and yields its entry.
    ///
    /// `None` means the bucket is empty; the cursor is then exhausted.
    pub fn last(&mut self) -> Option<CursorEntry<'b>> {
        match self.bucket.slots().iter().next_back() {
            Some((key, slot)) => {
                self.pos = CursorPos::At(key.clone());
                Some(Self::entry(key, slot))
            }
            None => {
                self.pos = CursorPos::Exhausted;
                None
            }
        }
    }

    /// Steps to the next-lower key and yields its entry.
    ///
    /// On a fresh cursor this behaves as `last()`. `None` means the cursor
    /// walked past the first key; every later call returns `None` too.
    pub fn prev(&mut self) -> Option<CursorEntry<'b>> {
        let upper = match &self.pos {
            CursorPos::Start => return self.last(),
            CursorPos::Exhausted => return None,
            CursorPos::At(key) => key.clone(),
        };

        match self.bucket.slots().range(..upper).next_back() {
            Some((key, slot)) => {
                self.pos = CursorPos::At(key.clone());
                Some(Self::entry(key, slot))
            }
            None => {
                self.pos = CursorPos::Exhausted;
                None
            }
        }
    }

    fn entry(key: &'b [u8], slot: &'b Slot) -> CursorEntry<'b> {
        match slot {
            Slot::Value(v) => CursorEntry::Pair { key, value: v },
            Slot::Nested(_) => CursorEntry::Nested { key },
        }
    }
}
