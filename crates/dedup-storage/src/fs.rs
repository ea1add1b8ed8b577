//! Local-filesystem `BufferedFile`, using `pread`/`pwrite`-style positioned
//! I/O (`FileExt::read_at`/`write_all_at` instead of a shared seek cursor)
//! so the merge driver can append a new run while still reading earlier
//! runs from the same file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;

use dedup_core::{Error, Result, TempConfig};

use crate::buffered_file::BufferedFile;
use crate::fail_point;

pub struct FsBufferedFile {
    path: PathBuf,
    file: File,
    len: u64,
}

impl FsBufferedFile {
    fn map_io(context: &'static str, e: std::io::Error) -> Error {
        Error::SpillWriteFailure(format!("{context}: {e}"))
    }
}

impl BufferedFile for FsBufferedFile {
    fn open(cfg: &TempConfig, unique_id: u64) -> Result<Self> {
        fs::create_dir_all(&cfg.dir).map_err(|e| Self::map_io("mkdir", e))?;
        let path = cfg.dir.join(format!("{}-{unique_id}.spill", cfg.prefix));
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| Self::map_io("create", e))?;
        Ok(Self { path, file, len: 0 })
    }

    fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        fail_point!("spill_write");
        let offset = self.len;
        self.file
            .write_all_at(bytes, offset)
            .map_err(|e| Self::map_io("write", e))?;
        self.len += bytes.len() as u64;
        Ok(offset)
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn sync(&mut self) -> Result<()> {
        self.file.flush().map_err(|e| Self::map_io("flush", e))?;
        self.file
            .sync_data()
            .map_err(|e| Self::map_io("sync", e))?;
        Ok(())
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.file
            .read_exact_at(buf, offset)
            .map_err(|e| Error::MergeFailure(format!("read at {offset}: {e}")))
    }

    fn close_and_unlink(&mut self) -> Result<()> {
        let _ = fs::remove_file(&self.path);
        Ok(())
    }
}

impl Drop for FsBufferedFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
