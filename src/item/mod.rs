//! Item model and per-league item bodies
//!
//! Two forms of the same item:
//!
//! - [`Item`]: the public form. Names are strings, mod values are the
//!   raw, unscaled numbers the outside world sees.
//! - [`CompactItem`]: the stored form. Names are heap IDs, serialized as
//!   JSON into the per-league items bucket under the item's fixed-width
//!   id.
//!
//! The conversion between them lives in the database facade, which owns
//! both the heaps and the store.

mod bodies;
mod errors;
mod types;

pub use bodies::{delete_body, get_body, get_body_in_txn, items_bucket_name, put_body};
pub use errors::{ItemError, ItemResult};
pub use types::{CompactItem, CompactMod, Item, ItemId, ItemMod};
