//! Index writer
//!
//! Keeps the mod-value index in lockstep with the item bodies. Both run
//! inside the same write transaction, so a snapshot either sees an item's
//! body and all of its index entries, or none of them.
//!
//! Removal reverses ingestion exactly: the caller reads the stored body
//! and hands it back here, so the writer deletes precisely the keys it
//! once created even when the public form of the item has changed
//! upstream.

use crate::item::{CompactItem, ItemId};
use crate::store::WriteTxn;

use super::entry::IndexEntryBuf;
use super::key::encode_mod_index_key;
use super::layout::mod_index_bucket_name;
use super::{scaled_average, IndexResult};

/// Adds every mod of `body` to the index under `id`.
///
/// Mods without values carry no primary and are not indexed.
pub fn index_item(txn: &mut WriteTxn, id: ItemId, body: &CompactItem) -> IndexResult<()> {
    for item_mod in &body.mods {
        let Some(primary) = scaled_average(&item_mod.values) else {
            continue;
        };

        let name = mod_index_bucket_name(
            body.root_type,
            body.root_flavor,
            item_mod.template,
            body.league,
        );
        let key = mod_index_key(primary, &item_mod.values);

        let bucket = txn.bucket_mut(&name)?;
        let mut entry = match bucket.get(&key) {
            Some(raw) => IndexEntryBuf::from_raw(raw)?,
            None => IndexEntryBuf::new(),
        };
        entry.push_id(id);
        bucket.put(key, entry.into_raw())?;
    }
    Ok(())
}

/// Removes every mod of `body` from the index under `id`.
///
/// Ids or keys already gone are a no-op, so replaying a removal delta is
/// idempotent. Keys whose last id is removed are deleted.
pub fn deindex_item(txn: &mut WriteTxn, id: ItemId, body: &CompactItem) -> IndexResult<()> {
    for item_mod in &body.mods {
        let Some(primary) = scaled_average(&item_mod.values) else {
            continue;
        };

        let name = mod_index_bucket_name(
            body.root_type,
            body.root_flavor,
            item_mod.template,
            body.league,
        );
        let key = mod_index_key(primary, &item_mod.values);

        let bucket = txn.bucket_mut(&name)?;
        let Some(raw) = bucket.get(&key) else {
            continue;
        };

        let mut entry = IndexEntryBuf::from_raw(raw)?;
        entry.remove_id(id);
        if entry.is_empty() {
            bucket.delete(&key);
        } else {
            bucket.put(key, entry.into_raw())?;
        }
    }
    Ok(())
}

/// Index key for one mod: primary first, raw values after.
fn mod_index_key(primary: u16, values: &[u16]) -> Vec<u8> {
    let mut sequence = Vec::with_capacity(1 + values.len());
    sequence.push(primary);
    sequence.extend_from_slice(values);
    encode_mod_index_key(&sequence)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::heap::{HeapError, LeagueHeap, StringHeap};
    use crate::index::{decode_mod_index_key, open_mod_index_ro, IndexEntry};
    use crate::item::CompactMod;
    use crate::store::Store;

    fn id(fill: u8) -> ItemId {
        ItemId::from_bytes([fill; 32])
    }

    struct Fixture {
        store: Store,
        body: CompactItem,
    }

    fn fixture() -> Fixture {
        let store = Store::new();
        let body = store
            .update(|txn| {
                let root = StringHeap::intern(txn, "Armour")?;
                let flavor = StringHeap::intern(txn, "Boots")?;
                let speed = StringHeap::intern(txn, "#% increased Movement Speed")?;
                let league = LeagueHeap::intern(txn, "Legacy")?;
                Ok::<_, HeapError>(CompactItem {
                    root_type: root,
                    root_flavor: flavor,
                    league,
                    mods: vec![CompactMod {
                        template: speed,
                        values: vec![25],
                    }],
                    added_at: Utc::now(),
                })
            })
            .unwrap();
        Fixture { store, body }
    }

    fn indexed_ids(fixture: &Fixture) -> Vec<ItemId> {
        let snapshot = fixture.store.snapshot().unwrap();
        let item_mod = &fixture.body.mods[0];
        let bucket = open_mod_index_ro(
            &snapshot,
            fixture.body.root_type,
            fixture.body.root_flavor,
            item_mod.template,
            fixture.body.league,
        )
        .unwrap();

        let Some(bucket) = bucket else {
            return Vec::new();
        };
        let key = mod_index_key(scaled_average(&item_mod.values).unwrap(), &item_mod.values);
        let Some(raw) = bucket.get(&key) else {
            return Vec::new();
        };

        let mut ids = Vec::new();
        IndexEntry::new(raw).unwrap().for_each_id(|i| ids.push(i));
        ids
    }

    #[test]
    fn test_index_item_creates_bucket_and_entry() {
        let fixture = fixture();
        fixture
            .store
            .update(|txn| index_item(txn, id(1), &fixture.body))
            .unwrap();

        assert_eq!(indexed_ids(&fixture), vec![id(1)]);
    }

    #[test]
    fn test_index_key_carries_primary_then_raw_values() {
        let key = mod_index_key(250, &[25]);
        assert_eq!(decode_mod_index_key(&key).unwrap(), vec![250, 25]);
    }

    #[test]
    fn test_items_sharing_values_share_a_key() {
        let fixture = fixture();
        fixture
            .store
            .update(|txn| {
                index_item(txn, id(1), &fixture.body)?;
                index_item(txn, id(2), &fixture.body)
            })
            .unwrap();

        assert_eq!(indexed_ids(&fixture), vec![id(1), id(2)]);
    }

    #[test]
    fn test_reindexing_same_item_is_idempotent() {
        let fixture = fixture();
        fixture
            .store
            .update(|txn| {
                index_item(txn, id(1), &fixture.body)?;
                index_item(txn, id(1), &fixture.body)
            })
            .unwrap();

        assert_eq!(indexed_ids(&fixture), vec![id(1)]);
    }

    #[test]
    fn test_deindex_removes_only_the_given_id() {
        let fixture = fixture();
        fixture
            .store
            .update(|txn| {
                index_item(txn, id(1), &fixture.body)?;
                index_item(txn, id(2), &fixture.body)?;
                deindex_item(txn, id(1), &fixture.body)
            })
            .unwrap();

        assert_eq!(indexed_ids(&fixture), vec![id(2)]);
    }

    #[test]
    fn test_deindex_last_id_deletes_the_key() {
        let fixture = fixture();
        fixture
            .store
            .update(|txn| {
                index_item(txn, id(1), &fixture.body)?;
                deindex_item(txn, id(1), &fixture.body)
            })
            .unwrap();

        assert!(indexed_ids(&fixture).is_empty());
    }

    #[test]
    fn test_deindex_absent_item_is_noop() {
        let fixture = fixture();
        fixture
            .store
            .update(|txn| deindex_item(txn, id(9), &fixture.body))
            .unwrap();

        assert!(indexed_ids(&fixture).is_empty());
    }

    #[test]
    fn test_valueless_mod_is_not_indexed() {
        let fixture = fixture();
        let mut body = fixture.body.clone();
        body.mods[0].values.clear();

        fixture
            .store
            .update(|txn| index_item(txn, id(1), &body))
            .unwrap();

        let snapshot = fixture.store.snapshot().unwrap();
        let bucket = open_mod_index_ro(
            &snapshot,
            body.root_type,
            body.root_flavor,
            body.mods[0].template,
            body.league,
        )
        .unwrap();
        assert!(bucket.is_none());
    }
}
