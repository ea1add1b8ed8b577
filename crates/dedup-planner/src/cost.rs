//! Pure cost estimation: `estimate_cost` predicts the seek-equivalent work a
//! `Deduper` run of a given shape would spend, without ever constructing
//! one. The formulas are the closed-form tree-build/spill/merge/read costs
//! of the duplicate-eliminating key set.

use dedup_core::CostConfig;

const MERGE_FAN_IN: usize = 7;

/// Estimate the seek-equivalent cost of deduplicating `n` keys of `w` bytes
/// each through a Deduper budgeted at `m` bytes of tree memory.
///
/// `n`, `w`, and `m` are the input count, key width, and memory budget;
/// `cfg` supplies the seek/compare/I/O constants the core itself never
/// hardcodes.
pub fn estimate_cost(n: u64, w: usize, m: usize, cfg: &CostConfig) -> f64 {
    let node_overhead = cfg.node_overhead;
    let k_max = (m / (w + node_overhead)).max(1) as u64;

    let n_full = n / k_max;
    let n_last = n % k_max;

    let tree_build = tree_build_cost(n_full, k_max, n_last, cfg);
    let spill_write = spill_write_cost(n_full, k_max, n_last, w, cfg);
    let merge = merge_cost(n_full, k_max, n_last, w, cfg);
    let output_read = output_read_cost(n, w, cfg);

    tree_build + spill_write + merge + output_read
}

/// `log2(n!)` via Stirling's approximation: `(log2(2*pi*n)/2 + n*log2(n/e)) / ln(2)`
/// folded into base-2 logs throughout, with the `n == 0` and `n == 1` base
/// cases handled exactly (`0! == 1! == 1`, so `log2(n!) == 0`).
fn log2_factorial(n: u64) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    let two_pi_n = 2.0 * std::f64::consts::PI * n;
    (two_pi_n.ln() / 2.0 + n * (n / std::f64::consts::E).ln()) / std::f64::consts::LN_2
}

fn tree_build_cost(n_full: u64, k_max: u64, n_last: u64, cfg: &CostConfig) -> f64 {
    let comparisons =
        n_full as f64 * log2_factorial(k_max + 1) + log2_factorial(n_last + 1);
    comparisons / cfg.t_cmp
}

fn spill_write_cost(n_full: u64, k_max: u64, n_last: u64, w: usize, cfg: &CostConfig) -> f64 {
    if n_full == 0 {
        return 0.0;
    }
    let full_blocks = ceil_div(w as u64 * k_max, cfg.io_size);
    let last_blocks = ceil_div(w as u64 * n_last, cfg.io_size);
    cfg.seek_cost * (n_full as f64 * full_blocks as f64 + last_blocks as f64)
}

fn output_read_cost(n: u64, w: usize, cfg: &CostConfig) -> f64 {
    ceil_div(w as u64 * n, cfg.io_size) as f64
}

fn ceil_div(a: u64, b: u64) -> u64 {
    if b == 0 {
        0
    } else {
        (a + b - 1) / b
    }
}

/// Simulate `reduce_many`'s bounded fan-in passes over the per-run sizes a
/// full accumulation would have spilled, summing each pass's merge cost
/// until one run remains.
fn merge_cost(n_full: u64, k_max: u64, n_last: u64, w: usize, cfg: &CostConfig) -> f64 {
    let mut runs: Vec<u64> = Vec::with_capacity(n_full as usize + 1);
    runs.extend(std::iter::repeat(k_max).take(n_full as usize));
    runs.push(n_last);

    let mut total = 0.0;
    while runs.len() > 1 {
        let sizes = fan_in_groups(runs.len(), MERGE_FAN_IN);
        let mut next = Vec::with_capacity(sizes.len());
        let mut consumed = 0usize;
        for group_len in sizes {
            let group = &runs[consumed..consumed + group_len];
            consumed += group_len;
            let sum: u64 = group.iter().sum();
            total += merge_buffers_cost(sum, group_len, w, cfg);
            next.push(sum);
        }
        runs = next;
    }
    total
}

fn merge_buffers_cost(sum: u64, group_size: usize, w: usize, cfg: &CostConfig) -> f64 {
    let sum = sum as f64;
    let io_cost = 2.0 * sum * w as f64 / cfg.io_size as f64;
    let cmp_cost = if group_size > 1 {
        sum * (group_size as f64).ln() / (cfg.t_cmp * std::f64::consts::LN_2)
    } else {
        0.0
    };
    io_cost + cmp_cost
}

/// Same left-to-right, straggler-absorbing grouping rule `dedup-merge`
/// applies to the run directory, replayed here over plain run counts.
fn fan_in_groups(n: usize, f: usize) -> Vec<usize> {
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
