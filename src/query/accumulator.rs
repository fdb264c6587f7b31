//! Intersection accumulator
//!
//! Tracks, per candidate item, which of the query's mods have been
//! satisfied so far. Satisfaction is a bitmap keyed by mod position, not
//! a counter: an id that appears under several keys of the *same* mod
//! sets the same bit twice and cannot be promoted early. When the bitmap
//! fills, the id moves to the result list exactly once, in completion
//! order; the full mask stays behind as a tombstone, so an id the scan
//! keeps surfacing (an item can legitimately sit under several keys of
//! every queried mod) is never rebuilt from scratch and re-promoted.
//!
//! The pending map is the dominant per-query allocation, so spent maps
//! are parked in a process-wide pool and handed to later queries after a
//! full reset. The result list is small (capacity = maxDesired) and is
//! returned to the caller, so it is not pooled.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::item::ItemId;

use super::STRIDE_LENGTH;

/// Parked pending maps, cleared before parking.
static MAP_POOL: Mutex<Vec<HashMap<ItemId, u64>>> = Mutex::new(Vec::new());

/// Maps parked at most; beyond this, drop on the floor.
const MAP_POOL_LIMIT: usize = 16;

/// Accumulates mod satisfaction per item until full, then promotes.
pub(crate) struct Accumulator {
    pending: HashMap<ItemId, u64>,
    results: Vec<ItemId>,
    full_mask: u64,
    max_desired: usize,
}

impl Accumulator {
    /// Draws an accumulator for a query over `mod_count` mods.
    ///
    /// The pending map is pooled; its capacity hint absorbs one stride's
    /// worth of candidates per mod without rehashing.
    pub fn acquire(mod_count: usize, max_desired: usize) -> Accumulator {
        debug_assert!(mod_count >= 1 && mod_count <= 64);

        let mut pending = match MAP_POOL.lock() {
            Ok(mut pool) => pool.pop().unwrap_or_default(),
            Err(_) => HashMap::new(),
        };
        pending.reserve(STRIDE_LENGTH * 3 * mod_count);

        let full_mask = if mod_count == 64 {
            u64::MAX
        } else {
            (1u64 << mod_count) - 1
        };

        Accumulator {
            pending,
            results: Vec::with_capacity(max_desired),
            full_mask,
            max_desired,
        }
    }

    /// Records that `id` satisfied the mod at `mod_index`.
    ///
    /// Promotes the id to the result list when every mod position has
    /// been seen, unless the list already holds `max_desired` ids. A
    /// full mask is terminal: later registrations of a promoted id are
    /// no-ops.
    pub fn register(&mut self, id: ItemId, mod_index: usize) {
        let mask = self.pending.entry(id).or_insert(0);
        if *mask == self.full_mask {
            return;
        }

        *mask |= 1u64 << mod_index;
        if *mask == self.full_mask && self.results.len() < self.max_desired {
            self.results.push(id);
        }
    }

    /// Number of fully-satisfied ids so far.
    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    /// Takes the result list, in completion order.
    pub fn take_results(&mut self) -> Vec<ItemId> {
        std::mem::take(&mut self.results)
    }
}

impl Drop for Accumulator {
    fn drop(&mut self) {
        let mut map = std::mem::take(&mut self.pending);
        map.clear();
        if let Ok(mut pool) = MAP_POOL.lock() {
            if pool.len() < MAP_POOL_LIMIT {
                pool.push(map);
            }
        }
    }
}
