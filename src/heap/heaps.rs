//! String and league heaps
//!
//! Bucket layout:
//!
//! - `heap/strings`      name bytes -> StringHeapId (u32 BE)
//! - `heap/strings.inv`  StringHeapId (u32 BE) -> name bytes
//! - `heap/leagues`      name bytes -> LeagueHeapId (u16 BE)
//! - `heap/leagues.inv`  LeagueHeapId (u16 BE) -> name bytes
//! - `heap/meta`         `strings.seq` / `leagues.seq`, last assigned id
//!
//! Leagues get their own, narrower heap: there are only ever a handful of
//! leagues, and the 2-byte id keeps every index bucket name short.

use serde::{Deserialize, Serialize};

use crate::store::{Snapshot, WriteTxn};

use super::errors::{HeapError, HeapResult};

const STRINGS_FWD: &[u8] = b"heap/strings";
const STRINGS_INV: &[u8] = b"heap/strings.inv";
const LEAGUES_FWD: &[u8] = b"heap/leagues";
const LEAGUES_INV: &[u8] = b"heap/leagues.inv";
const META: &[u8] = b"heap/meta";
const STRINGS_SEQ: &[u8] = b"strings.seq";
const LEAGUES_SEQ: &[u8] = b"leagues.seq";

/// Compact identifier of an interned string.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct StringHeapId(u32);

impl StringHeapId {
    /// Raw numeric form.
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Big-endian encoding used in bucket keys and names.
    pub fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

/// Compact identifier of an interned league.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LeagueHeapId(u16);

impl LeagueHeapId {
    /// Raw numeric form.
    pub fn raw(&self) -> u16 {
        self.0
    }

    /// Big-endian encoding used in bucket keys and names.
    pub fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

/// The string heap: mod templates, root types, flavors.
pub struct StringHeap;

impl StringHeap {
    /// Returns the id for `name`, assigning the next one when unseen.
    pub fn intern(txn: &mut WriteTxn, name: &str) -> HeapResult<StringHeapId> {
        if let Some(existing) = Self::lookup_in_txn(txn, name)? {
            return Ok(existing);
        }

        let last = read_seq(txn, STRINGS_SEQ)? as u32;
        let id = StringHeapId(last.checked_add(1).ok_or(HeapError::Exhausted {
            heap: "strings",
        })?);

        write_seq(txn, STRINGS_SEQ, id.0 as u64)?;
        txn.bucket_mut(STRINGS_FWD)?
            .put(name.as_bytes().to_vec(), id.to_be_bytes().to_vec())?;
        txn.bucket_mut(STRINGS_INV)?
            .put(id.to_be_bytes().to_vec(), name.as_bytes().to_vec())?;
        Ok(id)
    }

    /// Batch form of [`StringHeap::intern`], preserving input order.
    pub fn intern_all(txn: &mut WriteTxn, names: &[&str]) -> HeapResult<Vec<StringHeapId>> {
        names.iter().map(|name| Self::intern(txn, name)).collect()
    }

    /// Read-only lookup. `Ok(None)` when the name was never interned.
    pub fn resolve(snapshot: &Snapshot, name: &str) -> HeapResult<Option<StringHeapId>> {
        let Some(bucket) = snapshot.bucket(STRINGS_FWD)? else {
            return Ok(None);
        };
        bucket
            .get(name.as_bytes())
            .map(decode_u32_id)
            .transpose()
            .map(|opt| opt.map(StringHeapId))
    }

    /// Batch form of [`StringHeap::resolve`]; `Ok(None)` when any name is
    /// unknown.
    pub fn resolve_all(snapshot: &Snapshot, names: &[&str]) -> HeapResult<Option<Vec<StringHeapId>>> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            match Self::resolve(snapshot, name)? {
                Some(id) => ids.push(id),
                None => return Ok(None),
            }
        }
        Ok(Some(ids))
    }

    /// Inverse lookup: the name an id was assigned for.
    pub fn name_of(snapshot: &Snapshot, id: StringHeapId) -> HeapResult<Option<String>> {
        let Some(bucket) = snapshot.bucket(STRINGS_INV)? else {
            return Ok(None);
        };
        bucket
            .get(&id.to_be_bytes())
            .map(|raw| {
                String::from_utf8(raw.to_vec())
                    .map_err(|_| HeapError::Corrupt("non-utf8 interned string".into()))
            })
            .transpose()
    }

    fn lookup_in_txn(txn: &WriteTxn, name: &str) -> HeapResult<Option<StringHeapId>> {
        let Some(bucket) = txn.bucket(STRINGS_FWD)? else {
            return Ok(None);
        };
        bucket
            .get(name.as_bytes())
            .map(decode_u32_id)
            .transpose()
            .map(|opt| opt.map(StringHeapId))
    }
}

/// The league heap.
pub struct LeagueHeap;

impl LeagueHeap {
    /// Returns the id for `name`, assigning the next one when unseen.
    pub fn intern(txn: &mut WriteTxn, name: &str) -> HeapResult<LeagueHeapId> {
        if let Some(existing) = Self::lookup_in_txn(txn, name)? {
            return Ok(existing);
        }

        let last = read_seq(txn, LEAGUES_SEQ)? as u16;
        let id = LeagueHeapId(last.checked_add(1).ok_or(HeapError::Exhausted {
            heap: "leagues",
        })?);

        write_seq(txn, LEAGUES_SEQ, id.0 as u64)?;
        txn.bucket_mut(LEAGUES_FWD)?
            .put(name.as_bytes().to_vec(), id.to_be_bytes().to_vec())?;
        txn.bucket_mut(LEAGUES_INV)?
            .put(id.to_be_bytes().to_vec(), name.as_bytes().to_vec())?;
        Ok(id)
    }

    /// Read-only lookup. `Ok(None)` when the league was never interned.
    pub fn resolve(snapshot: &Snapshot, name: &str) -> HeapResult<Option<LeagueHeapId>> {
        let Some(bucket) = snapshot.bucket(LEAGUES_FWD)? else {
            return Ok(None);
        };
        bucket
            .get(name.as_bytes())
            .map(decode_u16_id)
            .transpose()
            .map(|opt| opt.map(LeagueHeapId))
    }

    /// Inverse lookup: the name an id was assigned for.
    pub fn name_of(snapshot: &Snapshot, id: LeagueHeapId) -> HeapResult<Option<String>> {
        let Some(bucket) = snapshot.bucket(LEAGUES_INV)? else {
            return Ok(None);
        };
        bucket
            .get(&id.to_be_bytes())
            .map(|raw| {
                String::from_utf8(raw.to_vec())
                    .map_err(|_| HeapError::Corrupt("non-utf8 league name".into()))
            })
            .transpose()
    }

    /// Lookup within a write transaction, without assigning.
    ///
    /// The removal path needs this: removing items from a league that was
    /// never interned must not mint an id for it.
    pub fn resolve_in_txn(txn: &WriteTxn, name: &str) -> HeapResult<Option<LeagueHeapId>> {
        Self::lookup_in_txn(txn, name)
    }

    fn lookup_in_txn(txn: &WriteTxn, name: &str) -> HeapResult<Option<LeagueHeapId>> {
        let Some(bucket) = txn.bucket(LEAGUES_FWD)? else {
            return Ok(None);
        };
        bucket
            .get(name.as_bytes())
            .map(decode_u16_id)
            .transpose()
            .map(|opt| opt.map(LeagueHeapId))
    }
}

fn read_seq(txn: &WriteTxn, key: &[u8]) -> HeapResult<u64> {
    let Some(meta) = txn.bucket(META)? else {
        return Ok(0);
    };
    match meta.get(key) {
        None => Ok(0),
        Some(raw) => {
            let arr: [u8; 8] = raw
                .try_into()
                .map_err(|_| HeapError::Corrupt("bad sequence width".into()))?;
            Ok(u64::from_le_bytes(arr))
        }
    }
}

fn write_seq(txn: &mut WriteTxn, key: &[u8], value: u64) -> HeapResult<()> {
    txn.bucket_mut(META)?
        .put(key.to_vec(), value.to_le_bytes().to_vec())?;
    Ok(())
}

fn decode_u32_id(raw: &[u8]) -> HeapResult<u32> {
    let arr: [u8; 4] = raw
        .try_into()
        .map_err(|_| HeapError::Corrupt("bad string id width".into()))?;
    Ok(u32::from_be_bytes(arr))
}

fn decode_u16_id(raw: &[u8]) -> HeapResult<u16> {
    let arr: [u8; 2] = raw
        .try_into()
        .map_err(|_| HeapError::Corrupt("bad league id width".into()))?;
    Ok(u16::from_be_bytes(arr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[test]
    fn test_intern_assigns_dense_ids_in_first_seen_order() {
        let store = Store::new();
        let ids = store
            .update(|txn| {
                StringHeap::intern_all(txn, &["Movement Speed", "Fire Resistance", "Movement Speed"])
            })
            .unwrap();

        assert_eq!(ids[0].raw(), 1);
        assert_eq!(ids[1].raw(), 2);
        assert_eq!(ids[2], ids[0]);
    }

    #[test]
    fn test_intern_is_stable_across_transactions() {
        let store = Store::new();
        let first = store
            .update(|txn| StringHeap::intern(txn, "Boots"))
            .unwrap();
        let second = store
            .update(|txn| StringHeap::intern(txn, "Boots"))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_and_name_of_roundtrip() {
        let store = Store::new();
        let id = store
            .update(|txn| StringHeap::intern(txn, "Armour"))
            .unwrap();

        let snapshot = store.snapshot().unwrap();
        assert_eq!(StringHeap::resolve(&snapshot, "Armour").unwrap(), Some(id));
        assert_eq!(
            StringHeap::name_of(&snapshot, id).unwrap().as_deref(),
            Some("Armour")
        );
    }

    #[test]
    fn test_resolve_unknown_is_none() {
        let store = Store::new();
        let snapshot = store.snapshot().unwrap();
        assert_eq!(StringHeap::resolve(&snapshot, "never seen").unwrap(), None);
    }

    #[test]
    fn test_resolve_all_is_none_when_any_missing() {
        let store = Store::new();
        store
            .update(|txn| StringHeap::intern(txn, "known"))
            .unwrap();

        let snapshot = store.snapshot().unwrap();
        assert!(StringHeap::resolve_all(&snapshot, &["known", "unknown"])
            .unwrap()
            .is_none());
        assert!(StringHeap::resolve_all(&snapshot, &["known"])
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_league_heap_is_independent_of_string_heap() {
        let store = Store::new();
        let (string_id, league_id) = store
            .update(|txn| {
                let s = StringHeap::intern(txn, "Legacy")?;
                let l = LeagueHeap::intern(txn, "Legacy")?;
                Ok::<_, HeapError>((s, l))
            })
            .unwrap();

        assert_eq!(string_id.raw(), 1);
        assert_eq!(league_id.raw(), 1);

        let snapshot = store.snapshot().unwrap();
        assert_eq!(
            LeagueHeap::name_of(&snapshot, league_id).unwrap().as_deref(),
            Some("Legacy")
        );
    }

    #[test]
    fn test_zero_id_is_never_assigned() {
        let store = Store::new();
        let id = store
            .update(|txn| LeagueHeap::intern(txn, "Standard"))
            .unwrap();
        assert!(id.raw() > 0);
    }
}
