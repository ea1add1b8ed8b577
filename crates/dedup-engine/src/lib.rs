#![forbid(unsafe_code)]
//! dedup-engine: the `Deduper` facade, tying the comparator, ordered set,
//! spill file, run directory, and merger together.

pub mod deduper;
pub mod sink;

pub use deduper::Deduper;
pub use sink::{BufferSink, ExtractSink, StreamSink};
