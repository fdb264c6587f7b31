//! Buckets: ordered maps of byte keys to slots
//!
//! A slot holds either a plain value or a nested child bucket. Values and
//! nested buckets are reference-counted so cloning a bucket for a
//! copy-on-write commit is shallow: the key map is copied, the payloads
//! are shared.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::cursor::DescendingCursor;
use super::errors::{StoreError, StoreResult};

/// One entry in a bucket: a value or a nested bucket.
#[derive(Debug, Clone)]
pub enum Slot {
    /// Plain byte payload
    Value(Arc<[u8]>),
    /// Nested child bucket
    Nested(Arc<Bucket>),
}

/// An ordered map of byte keys to slots.
///
/// Key order is plain lexicographic byte order; every codec that feeds a
/// bucket (index keys, heap sequence keys) is designed so that byte order
/// matches its domain order.
#[derive(Debug, Clone, Default)]
pub struct Bucket {
    slots: BTreeMap<Vec<u8>, Slot>,
}

impl Bucket {
    /// Creates an empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots (values and nested buckets).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the bucket holds no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the value at `key`, or `None` when the key is absent or
    /// holds a nested bucket.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        match self.slots.get(key) {
            Some(Slot::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// Returns the nested bucket at `key`.
    ///
    /// `Ok(None)` when the key is absent; an error when the key holds a
    /// plain value.
    pub fn nested(&self, key: &[u8]) -> StoreResult<Option<&Bucket>> {
        match self.slots.get(key) {
            None => Ok(None),
            Some(Slot::Nested(b)) => Ok(Some(b)),
            Some(Slot::Value(_)) => Err(StoreError::slot_is_value(key)),
        }
    }

    /// Stores `value` at `key`, replacing any existing value.
    ///
    /// Errors when the key already holds a nested bucket.
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Arc<[u8]>>) -> StoreResult<()> {
        let key = key.into();
        if let Some(Slot::Nested(_)) = self.slots.get(&key) {
            return Err(StoreError::slot_is_bucket(&key));
        }
        self.slots.insert(key, Slot::Value(value.into()));
        Ok(())
    }

    /// Removes the slot at `key`, value or nested bucket alike.
    /// Absent keys are a no-op.
    pub fn delete(&mut self, key: &[u8]) {
        self.slots.remove(key);
    }

    /// Returns the nested bucket at `key`, creating it when absent.
    ///
    /// Errors when the key holds a plain value. Shared nested buckets are
    /// copied on first write (`Arc::make_mut`), so mutations never leak
    /// into live snapshots.
    pub fn nested_mut(&mut self, key: &[u8]) -> StoreResult<&mut Bucket> {
        match self
            .slots
            .entry(key.to_vec())
            .or_insert_with(|| Slot::Nested(Arc::new(Bucket::new())))
        {
            Slot::Nested(b) => Ok(Arc::make_mut(b)),
            Slot::Value(_) => Err(StoreError::slot_is_value(key)),
        }
    }

    /// Opens a descending cursor over this bucket.
    pub fn cursor_descending(&self) -> DescendingCursor<'_> {
        DescendingCursor::new(self)
    }

    pub(crate) fn slots(&self) -> &BTreeMap<Vec<u8>, Slot> {
        &self.slots
    }
}
