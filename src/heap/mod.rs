//! Interning heaps
//!
//! Human-readable names (mod templates, root types, flavors, league
//! names) are long and repeated millions of times across items. The heaps
//! intern them into compact identifiers once, at write time; everything
//! downstream (item bodies, index bucket names) speaks IDs.
//!
//! # Invariants
//!
//! - IDs are dense, assigned in first-seen order, and never reused
//! - Forward (`name -> id`) and inverse (`id -> name`) buckets stay in
//!   lockstep within one write transaction
//! - ID 0 is reserved; a zero ID never appears in the store

mod errors;
mod heaps;

pub use errors::{HeapError, HeapResult};
pub use heaps::{LeagueHeap, LeagueHeapId, StringHeap, StringHeapId};
