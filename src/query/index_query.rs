//! The index query: driver, cursor set, stride engine
//!
//! A run opens one read snapshot and walks one descending cursor per
//! queried mod over that mod's index bucket. Each pass gives every live
//! cursor one stride; each stride decodes up to [`STRIDE_LENGTH`] ids
//! worth of entries, registering the ids of entries whose primary value
//! clears the scaled minimum. The run ends as soon as the result list
//! reaches `max_desired` or no cursor remains live.
//!
//! # Cursor invalidation
//!
//! Invalidation is monotone: a slot, once cleared, is never repopulated
//! within a run. A cursor dies for exactly two reasons:
//!
//! - it walked past the start of its bucket, or
//! - it surfaced a key whose primary value is below the mod's scaled
//!   minimum. Keys descend by primary value, so nothing further down can
//!   satisfy the mod either, and with one conjunct dead the query can
//!   only be finished off by ids already registered.
//!
//! A mod with no index bucket at all starts with its slot empty, which is
//! the same thing: no bucket, no candidates.

use crate::heap::{LeagueHeapId, StringHeapId};
use crate::index::{
    decode_mod_index_key, open_mod_index_ro, scale_min_value, IndexEntry,
};
use crate::item::ItemId;
use crate::store::{CursorEntry, DescendingCursor, Snapshot, Store};

use super::accumulator::Accumulator;
use super::errors::{QueryError, QueryResult};
use super::{MAX_QUERY_MODS, STRIDE_LENGTH};

/// A conjunctive multi-mod query against the mod-value index.
///
/// Immutable once built; one query value can be run any number of times,
/// each run on its own snapshot.
#[derive(Debug, Clone)]
pub struct IndexQuery {
    root_type: StringHeapId,
    root_flavor: StringHeapId,
    /// Queried mods, positionally tied to `scaled_min_values`
    mods: Vec<StringHeapId>,
    /// Minimum values, already scaled at construction
    scaled_min_values: Vec<u16>,
    league: LeagueHeapId,
    max_desired: usize,
}

/// Transient per-run state; built at the top of a run, dropped on every
/// exit path.
struct QueryContext<'s> {
    /// One slot per queried mod; `None` is an invalidated slot
    cursors: Vec<Option<DescendingCursor<'s>>>,
    /// Count of live slots; 0 is terminal
    valid_cursors: usize,
    accumulator: Accumulator,
}

impl QueryContext<'_> {
    fn invalidate(&mut self, index: usize) {
        if self.cursors[index].take().is_some() {
            self.valid_cursors -= 1;
        }
    }
}

/// What a decoded (key, value) pair did for its mod.
enum PairOutcome {
    /// Primary cleared the minimum; this many ids were registered
    Registered(usize),
    /// Primary fell below the minimum; the cursor is spent
    BelowMin,
}

impl IndexQuery {
    /// Builds a query. Minimum values are scaled here, once.
    ///
    /// # Panics
    ///
    /// When `mods` is empty, when `mods` and `min_values` differ in
    /// length, or when more than [`MAX_QUERY_MODS`] mods are queried.
    /// All three are programmer errors, not runtime conditions.
    pub fn new(
        root_type: StringHeapId,
        root_flavor: StringHeapId,
        mods: Vec<StringHeapId>,
        min_values: &[u16],
        league: LeagueHeapId,
        max_desired: usize,
    ) -> IndexQuery {
        assert!(!mods.is_empty(), "index query needs at least one mod");
        assert_eq!(
            mods.len(),
            min_values.len(),
            "each queried mod needs a minimum value"
        );
        assert!(
            mods.len() <= MAX_QUERY_MODS,
            "at most {} mods per query",
            MAX_QUERY_MODS
        );

        let scaled_min_values = min_values.iter().map(|m| scale_min_value(*m)).collect();

        IndexQuery {
            root_type,
            root_flavor,
            mods,
            scaled_min_values,
            league,
            max_desired,
        }
    }

    /// League this query is partitioned to.
    pub fn league(&self) -> LeagueHeapId {
        self.league
    }

    /// Result size bound.
    pub fn max_desired(&self) -> usize {
        self.max_desired
    }

    /// Runs the query on a fresh snapshot of `store`.
    ///
    /// Returns up to `max_desired` item ids in the order they completed
    /// all mods. An empty result is not an error.
    pub fn run(&self, store: &Store) -> QueryResult<Vec<ItemId>> {
        let snapshot = store
            .snapshot()
            .map_err(|source| QueryError::Snapshot { source })?;
        self.run_on(&snapshot)
    }

    /// Runs the query on a caller-held snapshot.
    pub fn run_on(&self, snapshot: &Snapshot) -> QueryResult<Vec<ItemId>> {
        let mut ctx = self.init_context(snapshot)?;

        self.prime_cursors(&mut ctx)?;

        while ctx.accumulator.result_count() < self.max_desired && ctx.valid_cursors > 0 {
            self.stride(&mut ctx)?;
        }

        Ok(ctx.accumulator.take_results())
    }

    /// Opens one cursor per mod. A missing bucket leaves its slot empty.
    fn init_context<'s>(&self, snapshot: &'s Snapshot) -> QueryResult<QueryContext<'s>> {
        let mut cursors = Vec::with_capacity(self.mods.len());
        let mut valid_cursors = 0;

        for (index, mod_id) in self.mods.iter().enumerate() {
            let bucket = open_mod_index_ro(
                snapshot,
                self.root_type,
                self.root_flavor,
                *mod_id,
                self.league,
            )
            .map_err(|source| QueryError::BucketOpen {
                mod_index: index,
                source,
            })?;

            match bucket {
                Some(bucket) => {
                    cursors.push(Some(bucket.cursor_descending()));
                    valid_cursors += 1;
                }
                None => cursors.push(None),
            }
        }

        Ok(QueryContext {
            cursors,
            valid_cursors,
            accumulator: Accumulator::acquire(self.mods.len(), self.max_desired),
        })
    }

    /// Positions every cursor at its tail and runs the tail pair through
    /// the ordinary predicate, so the highest-valued entry is considered
    /// and an immediately-unsatisfiable mod dies before the first stride.
    fn prime_cursors(&self, ctx: &mut QueryContext<'_>) -> QueryResult<()> {
        for index in 0..self.mods.len() {
            let entry = match ctx.cursors[index].as_mut() {
                None => continue,
                Some(cursor) => cursor.last(),
            };

            match entry {
                // Empty bucket: nothing this mod can contribute
                None => ctx.invalidate(index),
                // Nested child at the tail; later strides walk below it
                Some(CursorEntry::Nested { .. }) => {}
                Some(CursorEntry::Pair { key, value }) => {
                    match self.check_pair(&mut ctx.accumulator, key, value, index)? {
                        PairOutcome::Registered(_) => {}
                        PairOutcome::BelowMin => ctx.invalidate(index),
                    }
                }
            }
        }
        Ok(())
    }

    /// One pass: advances every live cursor by one stride.
    fn stride(&self, ctx: &mut QueryContext<'_>) -> QueryResult<()> {
        for index in 0..self.mods.len() {
            let mut observed = 0;

            while observed < STRIDE_LENGTH {
                let entry = match ctx.cursors[index].as_mut() {
                    None => break,
                    Some(cursor) => cursor.prev(),
                };

                match entry {
                    // Start of bucket: this cursor is done for good
                    None => {
                        ctx.invalidate(index);
                        break;
                    }
                    // Nested child buckets carry no index entries
                    Some(CursorEntry::Nested { .. }) => continue,
                    Some(CursorEntry::Pair { key, value }) => {
                        match self.check_pair(&mut ctx.accumulator, key, value, index)? {
                            PairOutcome::Registered(count) => observed += count,
                            PairOutcome::BelowMin => {
                                ctx.invalidate(index);
                                break;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Decodes a pair and applies the minimum-value predicate for the mod
    /// at `mod_index`, registering packed ids on success.
    ///
    /// Decode failures abort the query: they mean the bucket holds
    /// something the writer never produces.
    fn check_pair(
        &self,
        accumulator: &mut Accumulator,
        key: &[u8],
        value: &[u8],
        mod_index: usize,
    ) -> QueryResult<PairOutcome> {
        let values = decode_mod_index_key(key)?;
        let primary = values[0];

        if primary < self.scaled_min_values[mod_index] {
            return Ok(PairOutcome::BelowMin);
        }

        let entry = IndexEntry::new(value)?;
        entry.for_each_id(|id| accumulator.register(id, mod_index));
        Ok(PairOutcome::Registered(entry.id_count()))
    }
}
