//! Index bucket naming
//!
//! One bucket per (rootType, rootFlavor, mod, league):
//!
//! ```text
//! +--------+-----------+--------------+----------------+------------+
//! | "idx/" | league BE | rootType BE  | rootFlavor BE  | mod BE     |
//! | 4B     | u16, 2B   | u32, 4B      | u32, 4B        | u32, 4B    |
//! +--------+-----------+--------------+----------------+------------+
//! ```
//!
//! The league comes first so one league's index buckets are contiguous in
//! the root bucket, which keeps checkpoint files grouped by partition.
//! A missing bucket means the tuple never held an item; opening is
//! `Ok(None)`, never an error.

use crate::heap::{LeagueHeapId, StringHeapId};
use crate::store::{Bucket, Snapshot, StoreResult};

/// Bucket name for a mod index tuple.
pub fn mod_index_bucket_name(
    root_type: StringHeapId,
    root_flavor: StringHeapId,
    mod_id: StringHeapId,
    league: LeagueHeapId,
) -> Vec<u8> {
    let mut name = Vec::with_capacity(4 + 2 + 4 + 4 + 4);
    name.extend_from_slice(b"idx/");
    name.extend_from_slice(&league.to_be_bytes());
    name.extend_from_slice(&root_type.to_be_bytes());
    name.extend_from_slice(&root_flavor.to_be_bytes());
    name.extend_from_slice(&mod_id.to_be_bytes());
    name
}

/// Opens a mod index bucket read-only from a snapshot.
pub fn open_mod_index_ro<'s>(
    snapshot: &'s Snapshot,
    root_type: StringHeapId,
    root_flavor: StringHeapId,
    mod_id: StringHeapId,
    league: LeagueHeapId,
) -> StoreResult<Option<&'s Bucket>> {
    snapshot.bucket(&mod_index_bucket_name(root_type, root_flavor, mod_id, league))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{HeapError, LeagueHeap, StringHeap};
    use crate::store::Store;

    fn heap_ids(store: &Store) -> (StringHeapId, StringHeapId, StringHeapId, LeagueHeapId) {
        store
            .update(|txn| {
                let root = StringHeap::intern(txn, "Armour")?;
                let flavor = StringHeap::intern(txn, "Boots")?;
                let mod_id = StringHeap::intern(txn, "#% increased Movement Speed")?;
                let league = LeagueHeap::intern(txn, "Legacy")?;
                Ok::<_, HeapError>((root, flavor, mod_id, league))
            })
            .unwrap()
    }

    #[test]
    fn test_name_is_deterministic_and_tuple_unique() {
        let store = Store::new();
        let (root, flavor, mod_id, league) = heap_ids(&store);

        let name = mod_index_bucket_name(root, flavor, mod_id, league);
        assert_eq!(name, mod_index_bucket_name(root, flavor, mod_id, league));
        assert_eq!(name.len(), 18);
        assert!(name.starts_with(b"idx/"));

        // Swapping any tuple position changes the name
        let swapped = mod_index_bucket_name(flavor, root, mod_id, league);
        assert_ne!(name, swapped);
    }

    #[test]
    fn test_open_missing_is_none() {
        let store = Store::new();
        let (root, flavor, mod_id, league) = heap_ids(&store);

        let snapshot = store.snapshot().unwrap();
        assert!(open_mod_index_ro(&snapshot, root, flavor, mod_id, league)
            .unwrap()
            .is_none());
    }
}
