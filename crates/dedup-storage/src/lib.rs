#![forbid(unsafe_code)]
//! dedup-storage: the spill file and run directory the `Deduper` uses during
//! its external-memory phase.

pub mod buffered_file;
pub mod failpoints;
pub mod fs;
pub mod run_directory;

pub use buffered_file::BufferedFile;
pub use fs::FsBufferedFile;
pub use run_directory::{checksum, RunDescriptor, RunDirectory};
