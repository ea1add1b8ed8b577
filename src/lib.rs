#![forbid(unsafe_code)]
//! A bounded-memory duplicate-eliminating key set for collecting row
//! identifiers inside a relational execution engine.
//!
//! Re-exports the public surface of the `dedup-*` crates so a caller can
//! depend on this one package.

pub use dedup_collections::{BTreeOrderedSet, InsertOutcome, OrderedSet};
pub use dedup_core::{
    Comparator, CostConfig, Error, KeyWidth, LexicographicComparator, Result, TempConfig, F, F2,
};
pub use dedup_engine::{BufferSink, Deduper, ExtractSink, StreamSink};
pub use dedup_merge::{reduce_many, HeapMerger, Merger};
pub use dedup_planner::estimate_cost;
pub use dedup_storage::{checksum, BufferedFile, FsBufferedFile, RunDescriptor, RunDirectory};
