//! Repository layer for reads and maintenance against the store.
//!
//! Writes go through [`crate::sync`]; repositories only read, count and
//! purge.

mod filter;
mod store;

pub use filter::FilterSet;
pub use store::{StoreCounts, StoreRepository, StoredEdge, StoredNode, DELETE_BATCH_SIZE};
