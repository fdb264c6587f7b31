//! Item body storage
//!
//! One bucket per league, named `items/` + league id (u16 BE). Keys are
//! the 32 raw id bytes; values are the JSON-encoded [`CompactItem`].

use crate::heap::LeagueHeapId;
use crate::store::{Snapshot, WriteTxn};

use super::errors::ItemResult;
use super::types::{CompactItem, ItemId};

/// Bucket name for a league's item bodies.
pub fn items_bucket_name(league: LeagueHeapId) -> Vec<u8> {
    let mut name = Vec::with_capacity(8);
    name.extend_from_slice(b"items/");
    name.extend_from_slice(&league.to_be_bytes());
    name
}

/// Stores (or replaces) an item body.
pub fn put_body(
    txn: &mut WriteTxn,
    league: LeagueHeapId,
    id: ItemId,
    body: &CompactItem,
) -> ItemResult<()> {
    let encoded = serde_json::to_vec(body)?;
    txn.bucket_mut(&items_bucket_name(league))?
        .put(id.as_bytes().to_vec(), encoded)?;
    Ok(())
}

/// Reads an item body from a snapshot. `Ok(None)` when absent.
pub fn get_body(
    snapshot: &Snapshot,
    league: LeagueHeapId,
    id: &ItemId,
) -> ItemResult<Option<CompactItem>> {
    let Some(bucket) = snapshot.bucket(&items_bucket_name(league))? else {
        return Ok(None);
    };
    bucket
        .get(id.as_bytes())
        .map(|raw| serde_json::from_slice(raw).map_err(Into::into))
        .transpose()
}

/// Reads an item body from within a write transaction. `Ok(None)` when
/// absent. Removal needs this: the delta deindexes exactly the mods the
/// stored body carries.
pub fn get_body_in_txn(
    txn: &WriteTxn,
    league: LeagueHeapId,
    id: &ItemId,
) -> ItemResult<Option<CompactItem>> {
    let Some(bucket) = txn.bucket(&items_bucket_name(league))? else {
        return Ok(None);
    };
    bucket
        .get(id.as_bytes())
        .map(|raw| serde_json::from_slice(raw).map_err(Into::into))
        .transpose()
}

/// Deletes an item body. Absent ids are a no-op.
pub fn delete_body(txn: &mut WriteTxn, league: LeagueHeapId, id: &ItemId) -> ItemResult<()> {
    txn.bucket_mut(&items_bucket_name(league))?
        .delete(id.as_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::heap::{HeapError, LeagueHeap, StringHeap};
    use crate::item::types::CompactMod;
    use crate::store::Store;

    fn sample_id(fill: u8) -> ItemId {
        ItemId::from_bytes([fill; 32])
    }

    fn sample_body(store: &Store) -> (LeagueHeapId, CompactItem) {
        let (league, root, flavor, template) = store
            .update(|txn| {
                let league = LeagueHeap::intern(txn, "Legacy")?;
                let root = StringHeap::intern(txn, "Armour")?;
                let flavor = StringHeap::intern(txn, "Boots")?;
                let template = StringHeap::intern(txn, "#% increased Movement Speed")?;
                Ok::<_, HeapError>((league, root, flavor, template))
            })
            .unwrap();

        (
            league,
            CompactItem {
                root_type: root,
                root_flavor: flavor,
                league,
                mods: vec![CompactMod {
                    template,
                    values: vec![25],
                }],
                added_at: Utc::now(),
            },
        )
    }

    #[test]
    fn test_body_roundtrip() {
        let store = Store::new();
        let (league, body) = sample_body(&store);
        let id = sample_id(1);

        store
            .update(|txn| put_body(txn, league, id, &body))
            .unwrap();

        let snapshot = store.snapshot().unwrap();
        let loaded = get_body(&snapshot, league, &id).unwrap().unwrap();
        assert_eq!(loaded, body);
    }

    #[test]
    fn test_missing_body_is_none() {
        let store = Store::new();
        let (league, _) = sample_body(&store);

        let snapshot = store.snapshot().unwrap();
        assert!(get_body(&snapshot, league, &sample_id(9)).unwrap().is_none());
    }

    #[test]
    fn test_delete_body() {
        let store = Store::new();
        let (league, body) = sample_body(&store);
        let id = sample_id(2);

        store
            .update(|txn| put_body(txn, league, id, &body))
            .unwrap();
        store
            .update(|txn| delete_body(txn, league, &id))
            .unwrap();

        let snapshot = store.snapshot().unwrap();
        assert!(get_body(&snapshot, league, &id).unwrap().is_none());
    }

    #[test]
    fn test_leagues_are_partitioned() {
        let store = Store::new();
        let (league_a, body) = sample_body(&store);
        let league_b = store
            .update(|txn| LeagueHeap::intern(txn, "Standard"))
            .unwrap();
        let id = sample_id(3);

        store
            .update(|txn| put_body(txn, league_a, id, &body))
            .unwrap();

        let snapshot = store.snapshot().unwrap();
        assert!(get_body(&snapshot, league_a, &id).unwrap().is_some());
        assert!(get_body(&snapshot, league_b, &id).unwrap().is_none());
    }
}
