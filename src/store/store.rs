//! Store, snapshots, and write transactions
//!
//! Concurrency model:
//!
//! - Readers call [`Store::snapshot`] and get an `Arc` of the current
//!   generation. They hold no lock afterwards; a snapshot stays valid and
//!   unchanged for as long as the caller keeps it.
//! - Writers are serialized by a write gate. A commit builds a new
//!   generation beside the current one (copy-on-write at bucket
//!   granularity) and swaps it in atomically.
//!
//! A snapshot opened before a commit never observes that commit; one
//! opened after always does.

use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use super::bucket::Bucket;
use super::checkpoint;
use super::errors::{StoreError, StoreResult};

/// Monotone identity of a committed generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommitId(u64);

impl CommitId {
    /// First commit id of an empty store.
    pub const ZERO: CommitId = CommitId(0);

    pub(crate) fn new(raw: u64) -> Self {
        CommitId(raw)
    }

    /// Raw numeric form, for logging and checkpoint headers.
    pub fn raw(&self) -> u64 {
        self.0
    }

    fn next(&self) -> CommitId {
        CommitId(self.0 + 1)
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct Generation {
    commit_id: CommitId,
    root: Bucket,
}

/// The bucket store.
pub struct Store {
    current: RwLock<Arc<Generation>>,
    write_gate: Mutex<()>,
}

impl Store {
    /// Creates an empty store at commit 0.
    pub fn new() -> Self {
        Self::from_parts(CommitId::ZERO, Bucket::new())
    }

    fn from_parts(commit_id: CommitId, root: Bucket) -> Self {
        Store {
            current: RwLock::new(Arc::new(Generation { commit_id, root })),
            write_gate: Mutex::new(()),
        }
    }

    /// Loads a store from a checkpoint file.
    pub fn load(path: &Path) -> StoreResult<Store> {
        let (commit_id, root) = checkpoint::read_checkpoint(path)?;
        Ok(Self::from_parts(commit_id, root))
    }

    /// Writes the current generation to `path` (temp file + atomic rename)
    /// and returns the commit id it captured.
    pub fn checkpoint(&self, path: &Path) -> StoreResult<CommitId> {
        let snapshot = self.snapshot()?;
        checkpoint::write_checkpoint(path, snapshot.commit_id(), snapshot.root())?;
        Ok(snapshot.commit_id())
    }

    /// Opens a point-in-time read snapshot.
    pub fn snapshot(&self) -> StoreResult<Snapshot> {
        let current = self.current.read().map_err(|_| StoreError::Poisoned)?;
        Ok(Snapshot {
            generation: Arc::clone(&current),
        })
    }

    /// Runs `f` inside a write transaction and commits its effects.
    ///
    /// Writers are serialized. When `f` returns an error nothing is
    /// committed and the error is passed through. The error type only has
    /// to absorb [`StoreError`], so subsystem closures keep their own
    /// error enums.
    pub fn update<T, E>(&self, f: impl FnOnce(&mut WriteTxn) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let _gate = self
            .write_gate
            .lock()
            .map_err(|_| E::from(StoreError::Poisoned))?;

        let base = {
            let current = self
                .current
                .read()
                .map_err(|_| E::from(StoreError::Poisoned))?;
            Arc::clone(&current)
        };

        let mut txn = WriteTxn {
            commit_id: base.commit_id.next(),
            root: base.root.clone(),
        };
        let out = f(&mut txn)?;

        let mut current = self
            .current
            .write()
            .map_err(|_| E::from(StoreError::Poisoned))?;
        *current = Arc::new(Generation {
            commit_id: txn.commit_id,
            root: txn.root,
        });
        Ok(out)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time read-only view of the store.
pub struct Snapshot {
    generation: Arc<Generation>,
}

impl Snapshot {
    /// Commit id this snapshot observes.
    pub fn commit_id(&self) -> CommitId {
        self.generation.commit_id
    }

    /// Root bucket of the snapshot.
    pub fn root(&self) -> &Bucket {
        &self.generation.root
    }

    /// Opens the named top-level bucket. `Ok(None)` when absent.
    pub fn bucket(&self, name: &[u8]) -> StoreResult<Option<&Bucket>> {
        self.generation.root.nested(name)
    }
}

/// A write transaction over a copy of the current generation.
///
/// Handed to the closure passed to [`Store::update`]; dropped without
/// effect when the closure errors.
pub struct WriteTxn {
    commit_id: CommitId,
    root: Bucket,
}

impl WriteTxn {
    /// Commit id this transaction will publish.
    pub fn commit_id(&self) -> CommitId {
        self.commit_id
    }

    /// Reads the named top-level bucket, observing writes made earlier in
    /// this same transaction.
    pub fn bucket(&self, name: &[u8]) -> StoreResult<Option<&Bucket>> {
        self.root.nested(name)
    }

    /// Returns the named top-level bucket, creating it when absent.
    pub fn bucket_mut(&mut self, name: &[u8]) -> StoreResult<&mut Bucket> {
        self.root.nested_mut(name)
    }

    /// Deletes the named top-level bucket and everything under it.
    pub fn delete_bucket(&mut self, name: &[u8]) {
        self.root.delete(name);
    }
}
