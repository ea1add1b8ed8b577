#![forbid(unsafe_code)]
//! dedup-collections: the ordered in-memory set the `Deduper` spills from.

pub mod btree_set;
pub mod ordered_set;

pub use btree_set::BTreeOrderedSet;
pub use ordered_set::{InsertOutcome, OrderedSet};
