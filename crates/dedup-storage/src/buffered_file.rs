//! The spill file contract.
//!
//! Two discrete phases rather than coincidental state derived from a byte
//! offset: an **append phase**, tracked by `append` and `len`, and a
//! **random-access read phase**, entered by calling `sync` once the bytes a
//! reader needs are durable. Unlike a single seek cursor, `read_at` takes an
//! explicit offset, so the merge driver can interleave appends (writing a
//! freshly merged run) with reads of earlier runs on the very same file,
//! without needing to track which phase the file is in.

use dedup_core::{Result, TempConfig};

pub trait BufferedFile: Send {
    /// Open a fresh scratch file under `cfg.dir` named from `cfg.prefix` and
    /// `unique_id`.
    fn open(cfg: &TempConfig, unique_id: u64) -> Result<Self>
    where
        Self: Sized;

    /// Append bytes at the current end of file; returns the offset they
    /// were written at.
    fn append(&mut self, bytes: &[u8]) -> Result<u64>;

    /// Current length in bytes (the offset the next `append` will use).
    fn len(&self) -> u64;

    /// Make all appended bytes durable and visible to `read_at`. This is
    /// the write-phase-to-read-phase transition.
    fn sync(&mut self) -> Result<()>;

    /// Fill `buf` from `offset`, or error if fewer than `buf.len()` bytes
    /// are available.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Close the underlying handle and remove the file from disk.
    fn close_and_unlink(&mut self) -> Result<()>;
}
