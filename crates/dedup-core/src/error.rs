use thiserror::Error;

/// Result type shared by every dedup crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The five error kinds a `Deduper` and its collaborators can surface.
///
/// Propagation policy: every error here is handed to the caller untouched.
/// Nothing in this crate family recovers from an error internally.
#[derive(Debug, Error)]
pub enum Error {
    #[error("allocation failed for {bytes} bytes (tag '{tag}')")]
    AllocationFailure { tag: &'static str, bytes: usize },

    #[error("spill write failed: {0}")]
    SpillWriteFailure(String),

    #[error("merge failed: {0}")]
    MergeFailure(String),

    #[error("invalid phase: {0}")]
    InvalidPhase(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}
