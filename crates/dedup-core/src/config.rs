//! Configuration the host engine must supply explicitly.
//!
//! `CostConfig` and `TempConfig` are passed to the constructor and the cost
//! function directly; there are no hidden globals in the core. `Default`
//! gives sane standalone values, and `from_env` lets a host override them
//! from the process environment instead.

/// Abstract cost constants for the disk-seek cost model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostConfig {
    /// Bytes per I/O unit used to convert byte counts into block counts.
    pub io_size: u64,
    /// Cost, in seek-equivalents, of one I/O block.
    pub seek_cost: f64,
    /// Average wall-clock cost of one comparator invocation, in the same
    /// units as `seek_cost`.
    pub t_cmp: f64,
    /// Per-element bookkeeping overhead charged by the ordered in-memory
    /// set.
    pub node_overhead: usize,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            io_size: 64 * 1024,
            seek_cost: 1.0,
            t_cmp: 1e-4,
            node_overhead: 48,
        }
    }
}

impl CostConfig {
    /// Build from environment variables, falling back to defaults.
    ///
    /// - `DEDUP_IO_SIZE`: bytes per I/O unit
    /// - `DEDUP_SEEK_COST`: seek-equivalents per I/O unit
    /// - `DEDUP_T_CMP`: comparator cost, in seek-equivalents
    /// - `DEDUP_NODE_OVERHEAD`: per-element tree bookkeeping bytes
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("DEDUP_IO_SIZE").and_then(|s| {
            s.parse::<u64>().map_err(|_| std::env::VarError::NotPresent)
        }) {
            cfg.io_size = v;
        }
        if let Ok(v) = std::env::var("DEDUP_SEEK_COST").and_then(|s| {
            s.parse::<f64>().map_err(|_| std::env::VarError::NotPresent)
        }) {
            cfg.seek_cost = v;
        }
        if let Ok(v) = std::env::var("DEDUP_T_CMP").and_then(|s| {
            s.parse::<f64>().map_err(|_| std::env::VarError::NotPresent)
        }) {
            cfg.t_cmp = v;
        }
        if let Ok(v) = std::env::var("DEDUP_NODE_OVERHEAD").and_then(|s| {
            s.parse::<usize>().map_err(|_| std::env::VarError::NotPresent)
        }) {
            cfg.node_overhead = v;
        }
        cfg
    }
}

/// Where and under what name prefix a `Deduper` creates its spill file.
#[derive(Debug, Clone)]
pub struct TempConfig {
    pub dir: std::path::PathBuf,
    pub prefix: String,
}

impl TempConfig {
    pub fn new(dir: impl Into<std::path::PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Build from `DEDUP_TMPDIR` (falling back to the process temp dir) and
    /// `DEDUP_TMP_PREFIX` (falling back to `"dedup"`).
    pub fn from_env() -> Self {
        let dir = std::env::var("DEDUP_TMPDIR")
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir());
        let prefix = std::env::var("DEDUP_TMP_PREFIX").unwrap_or_else(|_| "dedup".to_string());
        Self { dir, prefix }
    }
}
