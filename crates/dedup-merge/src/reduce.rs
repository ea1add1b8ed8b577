//! Bounded fan-in reduction: collapse many runs into few before the final
//! emit-to-sink merge.

use dedup_core::{Comparator, Result, F, F2};
use dedup_storage::{checksum, BufferedFile, RunDescriptor, RunDirectory};

use crate::merger::Merger;

/// Reduce `dir` in place, via repeated bounded-fan-in passes, until at most
/// `F2` runs remain. Each pass merges the runs into fewer, larger runs,
/// appended to `file`; it never touches the final emit-to-sink merge.
pub fn reduce_many(
    file: &mut dyn BufferedFile,
    dir: &mut RunDirectory,
    width: usize,
    cmp: &dyn Comparator,
    merger: &dyn Merger,
) -> Result<()> {
    while dir.len() > F2 {
        let runs = dir.as_slice().to_vec();
        let sizes = group_sizes(runs.len(), F);

        let mut new_dir = RunDirectory::new();
        let mut consumed = 0usize;
        for size in sizes {
            let group = &runs[consumed..consumed + size];
            consumed += size;
            new_dir.push(merge_group(file, group, width, cmp, merger)?);
        }
        *dir = new_dir;
    }
    Ok(())
}

/// Merge one group of runs into a single new run appended to `file`.
///
/// Drops duplicates even at this intermediate stage: every on-disk run, not
/// just the final output, must be duplicate-free, so a key shared by two
/// runs in this group must collapse here rather than waiting for the final
/// emit-to-sink merge. Global duplicate elimination only completes once the
/// last runs are merged into the sink, since a duplicate can still be split
/// across two different reduction groups.
fn merge_group(
    file: &mut dyn BufferedFile,
    group: &[RunDescriptor],
    width: usize,
    cmp: &dyn Comparator,
    merger: &dyn Merger,
) -> Result<RunDescriptor> {
    if group.len() == 1 {
        // Nothing to merge; the run carries forward unchanged.
        return Ok(group[0]);
    }

    file.sync()?;

    let mut merged_bytes: Vec<u8> = Vec::with_capacity(width * group.iter().map(|r| r.count).sum::<usize>());
    let mut count = 0usize;
    merger.k_way_merge(file, group, width, cmp, true, &mut |key| {
        merged_bytes.extend_from_slice(key);
        count += 1;
        Ok(())
    })?;

    let offset = file.append(&merged_bytes)?;
    file.sync()?;

    Ok(RunDescriptor {
        offset,
        count,
        byte_len: merged_bytes.len() as u64,
        checksum: checksum(&merged_bytes),
    })
}

/// Split `n` runs into left-to-right groups of `f`, folding a small
/// straggler group into the last regular group instead of leaving a
/// pathologically small final group.
fn group_sizes(n: usize, f: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let half = f / 2;
    let full_groups = n / f;
    let remainder = n % f;

    if remainder == 0 {
        vec![f; full_groups]
    } else if full_groups == 0 || remainder >= half {
        let mut sizes = vec![f; full_groups];
        sizes.push(remainder);
        sizes
    } else {
        let mut sizes = vec![f; full_groups - 1];
        sizes.push(f + remainder);
        sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dedup_core::{LexicographicComparator, TempConfig};
    use dedup_storage::FsBufferedFile;

    use crate::heap_merge::HeapMerger;

    fn spill_run(file: &mut FsBufferedFile, keys: &[&[u8]]) -> RunDescriptor {
        let mut bytes = Vec::new();
        for k in keys {
            bytes.extend_from_slice(k);
        }
        let offset = file.append(&bytes).unwrap();
        RunDescriptor {
            offset,
            count: keys.len(),
            byte_len: bytes.len() as u64,
            checksum: checksum(&bytes),
        }
    }

    #[test]
    fn reduces_many_single_key_runs_down_to_at_most_f2() {
        let dir_guard = tempfile::tempdir().unwrap();
        let cfg = TempConfig::new(dir_guard.path(), "reduce-test");
        let mut file = FsBufferedFile::open(&cfg, 1).unwrap();

        let mut dir = RunDirectory::new();
        // One run per key, well above F2, forces at least one reduction pass.
        for i in 0..40u32 {
            let key = i.to_be_bytes();
            dir.push(spill_run(&mut file, &[&key]));
        }

        let cmp = LexicographicComparator;
        let merger = HeapMerger;
        reduce_many(&mut file, &mut dir, 4, &cmp, &merger).unwrap();

        assert!(dir.len() <= F2, "expected <= {F2} runs, got {}", dir.len());
        assert_eq!(dir.spilled_count(), 40);
    }

    #[test]
    fn each_reduced_run_is_internally_sorted_and_nothing_is_lost() {
        let dir_guard = tempfile::tempdir().unwrap();
        let cfg = TempConfig::new(dir_guard.path(), "reduce-test");
        let mut file = FsBufferedFile::open(&cfg, 2).unwrap();

        let mut dir = RunDirectory::new();
        for i in (0..30u32).rev() {
            let key = i.to_be_bytes();
            dir.push(spill_run(&mut file, &[&key]));
        }

        let cmp = LexicographicComparator;
        let merger = HeapMerger;
        reduce_many(&mut file, &mut dir, 4, &cmp, &merger).unwrap();

        let mut total = 0usize;
        for run in dir.as_slice() {
            let mut prev: Option<u32> = None;
            merger
                .k_way_merge(&file, std::slice::from_ref(run), 4, &cmp, false, &mut |k| {
                    let v = u32::from_be_bytes(k.try_into().unwrap());
                    if let Some(p) = prev {
                        assert!(p < v, "run out of order: {p} before {v}");
                    }
                    prev = Some(v);
                    total += 1;
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(total, 30);
    }

    #[test]
    fn evenly_divisible_runs_split_into_equal_groups() {
        assert_eq!(group_sizes(14, 7), vec![7, 7]);
    }

    #[test]
    fn small_remainder_absorbed_into_last_group() {
        // 7*3 + 1 = 22; remainder 1 < half(3), absorbed: [7, 7, 8]
        assert_eq!(group_sizes(22, 7), vec![7, 7, 8]);
    }

    #[test]
    fn large_remainder_kept_as_own_group() {
        // 7*2 + 5 = 19; remainder 5 >= half(3): [7, 7, 5]
        assert_eq!(group_sizes(19, 7), vec![7, 7, 5]);
    }

    #[test]
    fn fewer_runs_than_fan_in_is_one_group() {
        assert_eq!(group_sizes(4, 7), vec![4]);
    }

    #[test]
    fn max_final_group_bound() {
        // remainder just below half should yield a final group under 3F/2.
        let sizes = group_sizes(8 * 7 + 2, 7); // remainder 2 < half(3)
        let last = *sizes.last().unwrap();
        assert!(last < (3 * 7) / 2, "last group {last} exceeds 3F/2-1 bound");
    }
}
