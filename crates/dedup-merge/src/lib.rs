#![forbid(unsafe_code)]
//! dedup-merge: the external merge primitive and the bounded fan-in driver
//! that keeps the run directory small.

pub mod heap_merge;
pub mod merger;
pub mod reduce;

pub use heap_merge::HeapMerger;
pub use merger::Merger;
pub use reduce::reduce_many;
