//! Sink contract: two concrete destinations for extracted keys, chosen by
//! the caller, not by the `Deduper`.

use std::io::Write;

use dedup_core::{Error, Result};

/// A destination for extracted keys, already in final ascending,
/// duplicate-free order.
///
/// `Deduper::extract_into` is generic over this trait rather than taking a
/// `Box<dyn ExtractSink>`: the fast path and slow path both call `push` (and
/// `finalize` once, at the end), so a static bound resolves the dispatch at
/// compile time instead of adding another `dyn` pointer to the facade.
pub trait ExtractSink {
    /// Append one key.
    fn push(&mut self, key: &[u8]) -> Result<()>;

    /// Called once, after the last `push`, only on success. Buffer sinks
    /// have nothing to do here; stream sinks flush.
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Fast-path destination: a single growable buffer the Deduper fills, then
/// hands over on success.
#[derive(Debug, Default)]
pub struct BufferSink {
    bytes: Vec<u8>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve room for `bytes` bytes up front; fails (instead of aborting
    /// the process) if the allocator cannot satisfy the request, so the
    /// fast path can fall through to the slow path.
    pub fn try_with_capacity(bytes: usize) -> Result<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(bytes)
            .map_err(|_| Error::AllocationFailure { tag: "buffer_sink", bytes })?;
        Ok(Self { bytes: buf })
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

impl ExtractSink for BufferSink {
    fn push(&mut self, key: &[u8]) -> Result<()> {
        self.bytes.extend_from_slice(key);
        Ok(())
    }
}

/// Slow-path destination: a caller-supplied writer the merger streams keys
/// into. `finalize` flushes; switching the stream
/// into a read cache for the caller to iterate is the caller's concern once
/// `extract_into` returns.
pub struct StreamSink<W: Write> {
    writer: W,
    count: usize,
}

impl<W: Write> StreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, count: 0 }
    }

    /// Number of keys written so far.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ExtractSink for StreamSink<W> {
    fn push(&mut self, key: &[u8]) -> Result<()> {
        self.writer
            .write_all(key)
            .map_err(|e| Error::MergeFailure(format!("stream sink write: {e}")))?;
        self.count += 1;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::MergeFailure(format!("stream sink flush: {e}")))
    }
}
