#![forbid(unsafe_code)]
//! dedup-planner: the cost model a surrounding planner consults to choose a
//! memory budget before ever constructing a `Deduper`.

pub mod cost;

pub use cost::estimate_cost;
