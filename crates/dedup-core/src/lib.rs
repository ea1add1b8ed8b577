#![forbid(unsafe_code)]
//! dedup-core: comparator contract, error taxonomy, and the configuration
//! objects the rest of the `dedup-*` crates depend on.
//!
//! No I/O, no allocation policy, no spill logic lives here -- those are
//! the concern of `dedup-collections`, `dedup-storage`, and `dedup-merge`.

pub mod comparator;
pub mod config;
pub mod constants;
pub mod error;

pub use comparator::{Comparator, KeyWidth, LexicographicComparator};
pub use config::{CostConfig, TempConfig};
pub use constants::{F, F2};
pub use error::{Error, Result};
