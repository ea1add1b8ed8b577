//! Fan-in constants for the bounded-fan-in merge driver.

/// Standard fan-in: merge this many runs at a time during reduction.
pub const F: usize = 7;

/// Fan-in threshold: once this many runs or fewer remain, stop reducing --
/// the next call is the final emit-to-sink merge.
pub const F2: usize = 15;
