//! The Deduper facade: ties the comparator, ordered set, spill file, run
//! directory, and merger into `put` / `extract_into`.

use std::sync::Arc;

use dedup_collections::{BTreeOrderedSet, InsertOutcome, OrderedSet};
use dedup_core::{Comparator, Error, KeyWidth, Result, TempConfig};
use dedup_merge::{reduce_many, HeapMerger, Merger};
use dedup_storage::{BufferedFile, FsBufferedFile, RunDescriptor, RunDirectory};

use crate::sink::{BufferSink, ExtractSink};

/// Lifecycle phase. `Accumulating` is the only
/// phase `put` and `extract_into` accept; both terminal phases only accept
/// destruction, which in Rust is just letting the value drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Accumulating,
    Extracted,
    Poisoned,
}

/// A bounded-memory duplicate-eliminating key set.
///
/// Owns its tree, spill file, and run directory exclusively; the comparator
/// is shared (`Arc`) since the caller may hold its own reference to
/// configure other collaborators with the same order.
pub struct Deduper {
    cmp: Arc<dyn Comparator>,
    width: KeyWidth,
    k_max: usize,
    tree: Box<dyn OrderedSet>,
    file: Box<dyn BufferedFile>,
    merger: Box<dyn Merger>,
    runs: RunDirectory,
    phase: Phase,
}

impl Deduper {
    /// Construct a Deduper with the default collaborators: a `BTreeSet`-backed
    /// tree and a local-filesystem spill file.
    ///
    /// `width` is the fixed key width in bytes, `memory_budget` bounds the
    /// in-memory tree; `unique_id` must be distinct across concurrently-live
    /// Dedupers sharing `temp_cfg.dir` so their spill files don't collide.
    pub fn new(
        cmp: Arc<dyn Comparator>,
        width: KeyWidth,
        memory_budget: usize,
        temp_cfg: &TempConfig,
        unique_id: u64,
    ) -> Result<Self> {
        let tree: Box<dyn OrderedSet> = Box::new(BTreeOrderedSet::new(Arc::clone(&cmp)));
        let file: Box<dyn BufferedFile> = Box::new(FsBufferedFile::open(temp_cfg, unique_id)?);
        let merger: Box<dyn Merger> = Box::new(HeapMerger);
        Self::with_collaborators(cmp, width, memory_budget, tree, file, merger)
    }

    /// Construct with injected collaborators, for hosts that supply their
    /// own tree, spill file, or merger implementation.
    pub fn with_collaborators(
        cmp: Arc<dyn Comparator>,
        width: KeyWidth,
        memory_budget: usize,
        tree: Box<dyn OrderedSet>,
        file: Box<dyn BufferedFile>,
        merger: Box<dyn Merger>,
    ) -> Result<Self> {
        let node_overhead = tree.node_overhead();
        let per_key = width.get() + node_overhead;
        if memory_budget < per_key {
            return Err(Error::InvalidArgument(
                "memory_budget must be >= width + node_overhead",
            ));
        }
        let k_max = memory_budget / per_key;

        Ok(Self {
            cmp,
            width,
            k_max,
            tree,
            file,
            merger,
            runs: RunDirectory::new(),
            phase: Phase::Accumulating,
        })
    }

    /// Live element count currently held in memory (not yet spilled).
    pub fn resident_count(&self) -> usize {
        self.tree.size()
    }

    /// The in-memory tree's capacity, `memory_budget / (width + node_overhead)`.
    pub fn k_max(&self) -> usize {
        self.k_max
    }

    /// Total keys written to spilled runs (may include duplicates across
    /// runs; duplicate elimination across runs only completes at extraction).
    pub fn spilled_count(&self) -> usize {
        self.runs.spilled_count()
    }

    /// Number of spilled runs currently in the run directory.
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Insert a fixed-width key.
    ///
    /// A duplicate already present in the in-memory tree is absorbed and
    /// does not grow memory. Spills the tree first if it is already at
    /// capacity, then inserts; the Deduper remains `Accumulating` and
    /// usable even if this call returns an error.
    pub fn put(&mut self, key: &[u8]) -> Result<()> {
        self.require_phase(Phase::Accumulating)?;
        if key.len() != self.width.get() {
            return Err(Error::InvalidArgument("key length does not match declared width"));
        }

        if self.tree.size() == self.k_max {
            self.spill()?;
        }
        self.tree.insert(key)?;
        Ok(())
    }

    /// Flush the in-memory tree to the spill file as one sorted run. A
    /// descriptor is appended only after the walk completes without error,
    /// so an aborted spill leaves no partial run visible.
    fn spill(&mut self) -> Result<()> {
        if self.tree.size() == 0 {
            return Ok(());
        }

        let width = self.width.get();
        let mut bytes = Vec::with_capacity(width * self.tree.size());
        self.tree.walk_in_order(&mut |key| bytes.extend_from_slice(key));
        let count = bytes.len() / width;

        let offset = self.file.append(&bytes)?;
        self.file.sync()?;

        #[cfg(feature = "tracing")]
        tracing::trace!(offset, count, "spilled run");

        self.runs.push(RunDescriptor {
            offset,
            count,
            byte_len: bytes.len() as u64,
            checksum: dedup_storage::checksum(&bytes),
        });
        self.tree.clear();
        Ok(())
    }

    /// Finalise the set and emit sorted, duplicate-free keys to `sink`.
    /// Transitions to `Extracted` on success, `Poisoned` on any I/O or
    /// allocation failure encountered past this point.
    pub fn extract_into<S: ExtractSink>(&mut self, sink: &mut S) -> Result<()> {
        self.require_phase(Phase::Accumulating)?;

        let result = if self.runs.is_empty() {
            self.try_fast_path(sink)
        } else {
            self.slow_path(sink)
        };

        match result {
            Ok(()) => {
                self.phase = Phase::Extracted;
                Ok(())
            }
            Err(e) => {
                self.phase = Phase::Poisoned;
                Err(e)
            }
        }
    }

    /// No spills yet: try to push every resident key straight into `sink`.
    /// A buffer-allocation failure here is not fatal -- it falls through to
    /// the slow path, which will spill the residual tree and merge as
    /// usual.
    fn try_fast_path<S: ExtractSink>(&mut self, sink: &mut S) -> Result<()> {
        let width = self.width.get();
        match BufferSink::try_with_capacity(width * self.tree.size()) {
            Ok(mut scratch) => {
                self.tree.walk_in_order(&mut |key| {
                    // `push` on `BufferSink` never fails; the capacity was
                    // already reserved above.
                    let _ = scratch.push(key);
                });
                for key in scratch.into_inner().chunks(width) {
                    sink.push(key)?;
                }
                sink.finalize()?;
                self.tree.clear();
                Ok(())
            }
            Err(_) => self.slow_path(sink),
        }
    }

    /// At least one run exists (or the fast path's buffer allocation
    /// failed): spill the residual tree, reduce the run directory with
    /// bounded fan-in, then merge what remains straight into `sink`.
    fn slow_path<S: ExtractSink>(&mut self, sink: &mut S) -> Result<()> {
        self.spill()?;

        reduce_many(
            &mut *self.file,
            &mut self.runs,
            self.width.get(),
            &*self.cmp,
            &*self.merger,
        )?;

        #[cfg(feature = "tracing")]
        tracing::debug!(runs = self.runs.len(), "entering final merge");

        let runs = self.runs.as_slice().to_vec();
        self.merger.k_way_merge(
            &*self.file,
            &runs,
            self.width.get(),
            &*self.cmp,
            true,
            &mut |key| sink.push(key),
        )?;
        sink.finalize()
    }

    fn require_phase(&self, expected: Phase) -> Result<()> {
        if self.phase != expected {
            let name = match self.phase {
                Phase::Accumulating => "Accumulating",
                Phase::Extracted => "Extracted",
                Phase::Poisoned => "Poisoned",
            };
            return Err(Error::InvalidPhase(name));
        }
        Ok(())
    }
}

impl Drop for Deduper {
    fn drop(&mut self) {
        let _ = self.file.close_and_unlink();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dedup_core::LexicographicComparator;

    fn temp(prefix: &str) -> (tempfile::TempDir, TempConfig) {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TempConfig::new(dir.path(), prefix);
        (dir, cfg)
    }

    fn deduper(width: usize, m: usize, cfg: &TempConfig, id: u64) -> Deduper {
        Deduper::new(Arc::new(LexicographicComparator), KeyWidth::new(width).unwrap(), m, cfg, id)
            .unwrap()
    }

    #[test]
    fn fast_path_sorts_and_dedups_without_spilling() {
        let (_guard, cfg) = temp("s1");
        let mut d = deduper(4, 1024 * 1024, &cfg, 1);
        for n in [5u32, 1, 3, 1, 5, 2, 4] {
            d.put(&n.to_be_bytes()).unwrap();
        }
        assert_eq!(d.spilled_count(), 0);

        let mut sink = BufferSink::new();
        d.extract_into(&mut sink).unwrap();
        let out: Vec<u32> = sink
            .into_inner()
            .chunks(4)
            .map(|c| u32::from_be_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn forced_spill_still_yields_sorted_unique_output() {
        let (_guard, cfg) = temp("forced-spill");
        // node_overhead for BTreeOrderedSet is 48; pick M so K_max == 3.
        let width = 8usize;
        let m = 3 * (width + 48);
        let mut d = deduper(width, m, &cfg, 2);
        for n in [9u64, 2, 7, 2, 5, 1, 4, 8, 6, 3, 7, 2] {
            d.put(&n.to_be_bytes()).unwrap();
        }

        let mut sink = BufferSink::new();
        d.extract_into(&mut sink).unwrap();
        let out: Vec<u64> = sink
            .into_inner()
            .chunks(8)
            .map(|c| u64::from_be_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn all_duplicate_keys_collapse_to_one() {
        let (_guard, cfg) = temp("all-dupes");
        let width = 16usize;
        let m = 100 * (width + 48);
        let mut d = deduper(width, m, &cfg, 3);
        let key = [7u8; 16];
        for _ in 0..10_000 {
            d.put(&key).unwrap();
        }
        assert_eq!(d.resident_count(), 1);
        assert_eq!(d.spilled_count(), 0);

        let mut sink = BufferSink::new();
        d.extract_into(&mut sink).unwrap();
        assert_eq!(sink.into_inner(), key.to_vec());
    }

    // Reverse-order insertion is the worst case for tree balance.
    #[test]
    fn reverse_order_insertion_still_sorts() {
        let (_guard, cfg) = temp("reverse-order");
        let width = 2usize;
        let m = 50 * (width + 48);
        let mut d = deduper(width, m, &cfg, 4);
        for n in (1u16..=500).rev() {
            d.put(&n.to_be_bytes()).unwrap();
        }

        let mut sink = BufferSink::new();
        d.extract_into(&mut sink).unwrap();
        let out: Vec<u16> = sink
            .into_inner()
            .chunks(2)
            .map(|c| u16::from_be_bytes(c.try_into().unwrap()))
            .collect();
        let expected: Vec<u16> = (1..=500).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn put_after_extraction_is_rejected() {
        let (_guard, cfg) = temp("phase");
        let mut d = deduper(4, 1024, &cfg, 5);
        d.put(&[0u8; 4]).unwrap();
        let mut sink = BufferSink::new();
        d.extract_into(&mut sink).unwrap();

        let err = d.put(&[1u8; 4]).unwrap_err();
        assert!(matches!(err, Error::InvalidPhase(_)));
    }

    #[test]
    fn wrong_key_width_is_rejected() {
        let (_guard, cfg) = temp("width");
        let mut d = deduper(4, 1024, &cfg, 6);
        let err = d.put(&[1u8, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    // An injected write failure poisons the Deduper; extract_into surfaces
    // the error and the sink receives no partial output.
    #[cfg(feature = "failpoints")]
    #[test]
    fn injected_spill_failure_poisons_and_blocks_extraction() {
        use dedup_storage::failpoints::{arm, disarm};

        let (_guard, cfg) = temp("injected-failure");
        let width = 4usize;
        let m = 2 * (width + 48); // K_max == 2
        let mut d = deduper(width, m, &cfg, 7);

        // First spill (2 keys) succeeds normally.
        d.put(&1u32.to_be_bytes()).unwrap();
        d.put(&2u32.to_be_bytes()).unwrap();
        assert_eq!(d.spilled_count(), 0);
        d.put(&3u32.to_be_bytes()).unwrap(); // triggers the first spill
        assert_eq!(d.spilled_count(), 2);

        arm("spill_write");
        d.put(&4u32.to_be_bytes()).unwrap();
        let err = d.put(&5u32.to_be_bytes()).unwrap_err(); // forces the second spill, which fails
        assert!(matches!(err, Error::SpillWriteFailure(_)));

        let mut sink = BufferSink::new();
        let err = d.extract_into(&mut sink).unwrap_err();
        assert!(matches!(err, Error::SpillWriteFailure(_)));
        assert!(sink.into_inner().is_empty());

        disarm("spill_write");
    }
}
