//! Database facade
//!
//! Owns the store and speaks both forms of every concept: public names
//! and items on the outside, heap IDs and compact bodies on the inside.
//! Writes (ingest, removal) run in one transaction each, so item bodies
//! and index entries never drift apart; reads translate and query under
//! a single snapshot.

use std::fs;

use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::heap::{HeapError, LeagueHeap, StringHeap, StringHeapId};
use crate::index::{deindex_item, index_item, IndexError};
use crate::item::{
    delete_body, get_body, get_body_in_txn, put_body, CompactItem, CompactMod, Item, ItemError,
    ItemId, ItemMod,
};
use crate::observability::Logger;
use crate::query::{IndexQuery, QueryError};
use crate::search::ModSearch;
use crate::store::{CommitId, Snapshot, Store, StoreError};

/// Database result type
pub type DbResult<T> = Result<T, DbError>;

/// Errors surfaced by the database facade.
#[derive(Debug, Error)]
pub enum DbError {
    /// Bucket store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Interning heap failure
    #[error(transparent)]
    Heap(#[from] HeapError),

    /// Item body failure
    #[error(transparent)]
    Item(#[from] ItemError),

    /// Index layout or writer failure
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Query engine failure
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A result id has no stored body
    #[error("item {id} not found in league {league}")]
    MissingItem {
        /// The dangling id
        id: ItemId,
        /// League that was searched
        league: String,
    },

    /// A checkpoint was requested on an in-memory database
    #[error("database was opened without a data_dir")]
    NotPersistent,
}

/// An open relicdb database.
pub struct Database {
    store: Store,
    config: DatabaseConfig,
}

impl Database {
    /// Opens a database.
    ///
    /// With a `data_dir` configured, an existing checkpoint is loaded;
    /// otherwise the directory is created and the database starts empty.
    pub fn open(config: DatabaseConfig) -> DbResult<Database> {
        let store = match config.checkpoint_path() {
            Some(path) if path.exists() => Store::load(&path)?,
            Some(path) => {
                if let Some(dir) = path.parent() {
                    fs::create_dir_all(dir).map_err(StoreError::from)?;
                }
                Store::new()
            }
            None => Store::new(),
        };

        let commit = store.snapshot()?.commit_id().to_string();
        Logger::info(
            "DB_OPEN",
            &[
                ("commit_id", &commit),
                ("persistent", if config.data_dir.is_some() { "true" } else { "false" }),
            ],
        );

        Ok(Database { store, config })
    }

    /// The underlying bucket store.
    ///
    /// Exposed for callers that run [`IndexQuery`] values directly or
    /// need snapshots of their own.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Ingests items: interns names, stores bodies, indexes mods.
    ///
    /// One transaction for the whole batch. Re-ingesting an id replaces
    /// its body and re-indexes it idempotently. Returns the batch size.
    pub fn add_items(&self, items: &[Item]) -> DbResult<usize> {
        self.store.update(|txn| {
            for item in items {
                let league = LeagueHeap::intern(txn, &item.league)?;
                let root_type = StringHeap::intern(txn, &item.root_type)?;
                let root_flavor = StringHeap::intern(txn, &item.root_flavor)?;

                let mut mods = Vec::with_capacity(item.mods.len());
                for item_mod in &item.mods {
                    mods.push(CompactMod {
                        template: StringHeap::intern(txn, &item_mod.template)?,
                        values: item_mod.values.clone(),
                    });
                }

                let body = CompactItem {
                    root_type,
                    root_flavor,
                    league,
                    mods,
                    added_at: item.added_at,
                };

                // Replacing an existing body must first unwind its index
                // entries; the old and new body may disagree on values
                if let Some(previous) = get_body_in_txn(txn, league, &item.id)? {
                    deindex_item(txn, item.id, &previous)?;
                }

                put_body(txn, league, item.id, &body)?;
                index_item(txn, item.id, &body)?;
            }
            Ok::<_, DbError>(())
        })?;

        let count = items.len().to_string();
        Logger::info("ITEMS_ADDED", &[("count", &count)]);
        Ok(items.len())
    }

    /// Applies a removal delta: deletes bodies and index entries for the
    /// given ids. Unknown leagues and absent ids are no-ops. Returns how
    /// many items were actually removed.
    pub fn remove_items(&self, league: &str, ids: &[ItemId]) -> DbResult<usize> {
        let removed = self.store.update(|txn| {
            let Some(league_id) = LeagueHeap::resolve_in_txn(txn, league)? else {
                return Ok::<_, DbError>(0);
            };

            let mut removed = 0;
            for id in ids {
                let Some(body) = get_body_in_txn(txn, league_id, id)? else {
                    continue;
                };
                deindex_item(txn, *id, &body)?;
                delete_body(txn, league_id, id)?;
                removed += 1;
            }
            Ok(removed)
        })?;

        let count = removed.to_string();
        Logger::info("ITEMS_REMOVED", &[("count", &count), ("league", league)]);
        Ok(removed)
    }

    /// Reads one item back in public form. `Ok(None)` when absent.
    pub fn get_item(&self, league: &str, id: &ItemId) -> DbResult<Option<Item>> {
        let snapshot = self.store.snapshot()?;
        let Some(league_id) = LeagueHeap::resolve(&snapshot, league)? else {
            return Ok(None);
        };
        let Some(body) = get_body(&snapshot, league_id, id)? else {
            return Ok(None);
        };
        Ok(Some(resolve_item(&snapshot, league, *id, &body)?))
    }

    /// Resolves query results to public items, erroring on dangling ids.
    pub fn items_for(&self, league: &str, ids: &[ItemId]) -> DbResult<Vec<Item>> {
        let Some(first) = ids.first() else {
            return Ok(Vec::new());
        };

        let snapshot = self.store.snapshot()?;
        let league_id =
            LeagueHeap::resolve(&snapshot, league)?.ok_or_else(|| DbError::MissingItem {
                id: *first,
                league: league.to_string(),
            })?;

        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            let body =
                get_body(&snapshot, league_id, id)?.ok_or_else(|| DbError::MissingItem {
                    id: *id,
                    league: league.to_string(),
                })?;
            items.push(resolve_item(&snapshot, league, *id, &body)?);
        }
        Ok(items)
    }

    /// Translates a search into an [`IndexQuery`] under a fresh snapshot.
    ///
    /// `Ok(None)` when any name in the search was never interned or the
    /// search has no mods; such a search can match nothing, and that is
    /// not an error.
    pub fn index_query_for(&self, search: &ModSearch) -> DbResult<Option<IndexQuery>> {
        let snapshot = self.store.snapshot()?;
        translate_search(&snapshot, search)
    }

    /// Runs a search end to end: translate, query, done. One snapshot
    /// covers both steps, so the name resolution and the index walk agree
    /// on what the database looks like.
    pub fn run_search(&self, search: &ModSearch) -> DbResult<Vec<ItemId>> {
        let snapshot = self.store.snapshot()?;
        let result = match translate_search(&snapshot, search)? {
            None => Vec::new(),
            Some(query) => query.run_on(&snapshot)?,
        };

        let found = result.len().to_string();
        let mods = search.mods.len().to_string();
        Logger::trace("INDEX_QUERY_RUN", &[("found", &found), ("mods", &mods)]);
        Ok(result)
    }

    /// Writes a checkpoint and returns the commit id it captured.
    pub fn checkpoint(&self) -> DbResult<CommitId> {
        let path = self.config.checkpoint_path().ok_or(DbError::NotPersistent)?;
        let commit_id = self.store.checkpoint(&path)?;

        let commit = commit_id.to_string();
        let rendered = path.display().to_string();
        Logger::info(
            "CHECKPOINT_WRITTEN",
            &[("commit_id", &commit), ("path", &rendered)],
        );
        Ok(commit_id)
    }
}

/// Rebuilds the public form of an item from its compact body.
fn resolve_item(
    snapshot: &Snapshot,
    league: &str,
    id: ItemId,
    body: &CompactItem,
) -> DbResult<Item> {
    let root_type = resolve_name(snapshot, body.root_type)?;
    let root_flavor = resolve_name(snapshot, body.root_flavor)?;

    let mut mods = Vec::with_capacity(body.mods.len());
    for compact in &body.mods {
        mods.push(ItemMod {
            template: resolve_name(snapshot, compact.template)?,
            values: compact.values.clone(),
        });
    }

    Ok(Item {
        id,
        league: league.to_string(),
        root_type,
        root_flavor,
        mods,
        added_at: body.added_at,
    })
}

fn resolve_name(snapshot: &Snapshot, id: StringHeapId) -> DbResult<String> {
    StringHeap::name_of(snapshot, id)?
        .ok_or_else(|| DbError::Heap(HeapError::Corrupt(format!("dangling string id {}", id.raw()))))
}

fn translate_search(snapshot: &Snapshot, search: &ModSearch) -> DbResult<Option<IndexQuery>> {
    if search.mods.is_empty() {
        return Ok(None);
    }

    let Some(root_type) = StringHeap::resolve(snapshot, &search.root_type)? else {
        return Ok(None);
    };
    let Some(root_flavor) = StringHeap::resolve(snapshot, &search.root_flavor)? else {
        return Ok(None);
    };
    let Some(league) = LeagueHeap::resolve(snapshot, &search.league)? else {
        return Ok(None);
    };

    let mod_names: Vec<&str> = search.mods.iter().map(String::as_str).collect();
    let Some(mods) = StringHeap::resolve_all(snapshot, &mod_names)? else {
        return Ok(None);
    };

    Ok(Some(IndexQuery::new(
        root_type,
        root_flavor,
        mods,
        &search.min_values,
        league,
        search.max_desired,
    )))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn item(fill: u8, speed: u16, fire: u16) -> Item {
        Item {
            id: ItemId::from_bytes([fill; 32]),
            league: "Legacy".into(),
            root_type: "Armour".into(),
            root_flavor: "Boots".into(),
            mods: vec![
                ItemMod::single("#% increased Movement Speed", speed),
                ItemMod::single("+#% to Fire Resistance", fire),
            ],
            added_at: Utc::now(),
        }
    }

    fn search(min_speed: u16, min_fire: u16, max_desired: usize) -> ModSearch {
        ModSearch {
            max_desired,
            root_type: "Armour".into(),
            root_flavor: "Boots".into(),
            league: "Legacy".into(),
            mods: vec![
                "#% increased Movement Speed".into(),
                "+#% to Fire Resistance".into(),
            ],
            min_values: vec![min_speed, min_fire],
        }
    }

    #[test]
    fn test_add_and_get_roundtrip() {
        let db = Database::open(DatabaseConfig::in_memory()).unwrap();
        let original = item(1, 25, 30);
        db.add_items(std::slice::from_ref(&original)).unwrap();

        let loaded = db.get_item("Legacy", &original.id).unwrap().unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_get_unknown_league_is_none() {
        let db = Database::open(DatabaseConfig::in_memory()).unwrap();
        let id = ItemId::from_bytes([1; 32]);
        assert!(db.get_item("Nowhere", &id).unwrap().is_none());
    }

    #[test]
    fn test_search_end_to_end() {
        let db = Database::open(DatabaseConfig::in_memory()).unwrap();
        db.add_items(&[item(1, 25, 30), item(2, 10, 30)]).unwrap();

        let result = db.run_search(&search(20, 20, 10)).unwrap();
        assert_eq!(result, vec![ItemId::from_bytes([1; 32])]);

        let items = db.items_for("Legacy", &result).unwrap();
        assert!(search(20, 20, 10).satisfies(&items));
    }

    #[test]
    fn test_search_with_unknown_mod_is_empty_not_error() {
        let db = Database::open(DatabaseConfig::in_memory()).unwrap();
        db.add_items(&[item(1, 25, 30)]).unwrap();

        let mut unknown = search(20, 20, 10);
        unknown.mods[1] = "#% chance to never exist".into();
        unknown.min_values[1] = 1;

        assert!(db.run_search(&unknown).unwrap().is_empty());
    }

    #[test]
    fn test_remove_items_unwinds_index_and_body() {
        let db = Database::open(DatabaseConfig::in_memory()).unwrap();
        let first = item(1, 25, 30);
        let second = item(2, 26, 31);
        db.add_items(&[first.clone(), second.clone()]).unwrap();

        let removed = db.remove_items("Legacy", &[first.id]).unwrap();
        assert_eq!(removed, 1);

        assert!(db.get_item("Legacy", &first.id).unwrap().is_none());
        let result = db.run_search(&search(20, 20, 10)).unwrap();
        assert_eq!(result, vec![second.id]);
    }

    #[test]
    fn test_reingest_with_new_values_replaces_index_entries() {
        let db = Database::open(DatabaseConfig::in_memory()).unwrap();
        db.add_items(&[item(1, 25, 30)]).unwrap();
        // Same id, lower movement speed
        db.add_items(&[item(1, 10, 30)]).unwrap();

        assert!(db.run_search(&search(20, 20, 10)).unwrap().is_empty());
        let result = db.run_search(&search(5, 20, 10)).unwrap();
        assert_eq!(result, vec![ItemId::from_bytes([1; 32])]);
    }

    #[test]
    fn test_checkpoint_on_in_memory_database_errors() {
        let db = Database::open(DatabaseConfig::in_memory()).unwrap();
        assert!(matches!(db.checkpoint(), Err(DbError::NotPersistent)));
    }

    #[test]
    fn test_checkpoint_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::at(dir.path());

        {
            let db = Database::open(config.clone()).unwrap();
            db.add_items(&[item(1, 25, 30)]).unwrap();
            db.checkpoint().unwrap();
        }

        let reopened = Database::open(config).unwrap();
        let result = reopened.run_search(&search(20, 20, 10)).unwrap();
        assert_eq!(result, vec![ItemId::from_bytes([1; 32])]);
    }
}
