//! relicdb - an embedded, deterministic item-index database
//!
//! relicdb stores append-dominated corpora of game items and answers
//! conjunctive multi-mod queries over them: "within league L, among items
//! of (rootType, rootFlavor), return up to K item identifiers whose mod m
//! has value >= min(m), for every mod m in the query, preferring the
//! highest-valued items".
//!
//! The subsystems, substrate first:
//!
//! - `store`: transactional, snapshot-isolated, bucket-addressed ordered
//!   key-value store (in-memory, checkpoint-persisted)
//! - `heap`: string and league interning heaps (names -> compact IDs)
//! - `item`: the item model and per-league item bodies
//! - `index`: per-(rootType, flavor, mod, league) value-ordered index
//!   buckets and the writer that maintains them
//! - `query`: the index-backed multi-mod intersection engine
//! - `search`: the user-facing, JSON-serializable mod-search predicate
//! - `db`: the database facade tying the above together

pub mod config;
pub mod db;
pub mod heap;
pub mod index;
pub mod item;
pub mod observability;
pub mod query;
pub mod search;
pub mod store;

pub use config::DatabaseConfig;
pub use db::{Database, DbError, DbResult};
pub use item::{Item, ItemId, ItemMod};
pub use query::IndexQuery;
pub use search::ModSearch;
