//! Default `Merger`: a binary-heap k-way merge with a single
//! last-emitted-key scratch for cross-run duplicate suppression.
//!
//! A min-heap of `(key, run_idx)` always holds the next candidate key from
//! each run still contributing; popping the minimum and refilling from its
//! source run produces the merged order in `O(n log k)`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use dedup_core::{Comparator, Error, Result};
use dedup_storage::{BufferedFile, RunDescriptor};

use crate::merger::Merger;

struct HeapEntry<'a> {
    key: Vec<u8>,
    run_idx: usize,
    cmp: &'a dyn Comparator,
}

impl PartialEq for HeapEntry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp.equal(&self.key, &other.key)
    }
}
impl Eq for HeapEntry<'_> {}

impl PartialOrd for HeapEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // `BinaryHeap` is a max-heap; reverse the comparison to pop the
        // smallest key first.
        other.cmp.compare(&other.key, &self.key)
    }
}

struct Cursor {
    next_offset: u64,
    remaining: usize,
    hasher: blake3::Hasher,
    checksum: [u8; 32],
}

/// Binary-heap k-way merge over runs already written into one spill file.
pub struct HeapMerger;

impl Merger for HeapMerger {
    fn k_way_merge(
        &self,
        file: &dyn BufferedFile,
        runs: &[RunDescriptor],
        width: usize,
        cmp: &dyn Comparator,
        drop_duplicates: bool,
        emit: &mut dyn FnMut(&[u8]) -> Result<()>,
    ) -> Result<()> {
        if runs.is_empty() {
            return Ok(());
        }

        let mut cursors: Vec<Cursor> = Vec::with_capacity(runs.len());
        let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::with_capacity(runs.len());

        for (idx, run) in runs.iter().enumerate() {
            let mut cursor = Cursor {
                next_offset: run.offset,
                remaining: run.count,
                hasher: blake3::Hasher::new(),
                checksum: run.checksum,
            };
            if cursor.remaining > 0 {
                let key = read_key(file, width, &mut cursor)?;
                heap.push(HeapEntry {
                    key,
                    run_idx: idx,
                    cmp,
                });
            }
            cursors.push(cursor);
        }

        let mut last_emitted: Option<Vec<u8>> = None;
        while let Some(top) = heap.pop() {
            let HeapEntry { key, run_idx, .. } = top;

            let is_dup = drop_duplicates
                && last_emitted
                    .as_deref()
                    .map(|prev| cmp.equal(prev, &key))
                    .unwrap_or(false);
            if !is_dup {
                emit(&key)?;
                last_emitted = Some(key);
            }

            let cursor = &mut cursors[run_idx];
            if cursor.remaining > 0 {
                let next_key = read_key(file, width, cursor)?;
                heap.push(HeapEntry {
                    key: next_key,
                    run_idx,
                    cmp,
                });
            }
        }

        Ok(())
    }
}

/// Read the next key from `cursor`'s run, feeding it into the run's running
/// hash. Once the run's last key has been read, the accumulated hash is
/// compared against the run's recorded checksum; a mismatch means the spill
/// file was truncated or corrupted and must not be merged silently.
fn read_key(file: &dyn BufferedFile, width: usize, cursor: &mut Cursor) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; width];
    file.read_at(cursor.next_offset, &mut buf)?;
    cursor.hasher.update(&buf);
    cursor.next_offset += width as u64;
    cursor.remaining -= 1;

    if cursor.remaining == 0 {
        let computed: [u8; 32] = cursor.hasher.finalize().into();
        if computed != cursor.checksum {
            return Err(Error::MergeFailure(format!(
                "run checksum mismatch at offset {}: spill file truncated or corrupted",
                cursor.next_offset
            )));
        }
    }

    Ok(buf)
}
