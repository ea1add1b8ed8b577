//! The merger contract: the k-way merge over sorted, on-disk runs.
//!
//! A k-way merge that reads `W`-byte keys out of a set of runs already
//! resident in one spill file and emits them, in ascending order, to a
//! caller-supplied sink -- optionally suppressing adjacent-equal keys.

use dedup_core::{Comparator, Result};
use dedup_storage::{BufferedFile, RunDescriptor};

pub trait Merger: Send + Sync {
    /// Merge `runs` (byte ranges within `file`, each already sorted and
    /// duplicate-free) into one ascending sequence of `width`-byte keys,
    /// calling `emit` for each surviving key.
    ///
    /// When `drop_duplicates` is set, keys equal under `cmp` across run
    /// boundaries collapse to a single emission; which source run supplied
    /// the survivor is unspecified.
    fn k_way_merge(
        &self,
        file: &dyn BufferedFile,
        runs: &[RunDescriptor],
        width: usize,
        cmp: &dyn Comparator,
        drop_duplicates: bool,
        emit: &mut dyn FnMut(&[u8]) -> Result<()>,
    ) -> Result<()>;
}
