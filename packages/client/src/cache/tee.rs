//! Copying a network body into the cache while the consumer reads it.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use super::{CacheEntry, DiskCache};

/// Pending cache entry being filled from a network body.
///
/// Dropped without [`commit`](Self::commit) it deletes its temporary file.
#[derive(Debug)]
pub struct CacheWriter {
    cache: Arc<DiskCache>,
    hash: String,
    body_file: String,
    entry: Option<CacheEntry>,
    temp_path: PathBuf,
    file: Option<BufWriter<File>>,
    written: u64,
}

impl CacheWriter {
    pub(crate) fn new(
        cache: Arc<DiskCache>,
        hash: String,
        body_file: String,
        entry: CacheEntry,
        temp_path: PathBuf,
        file: File,
    ) -> Self {
        Self {
            cache,
            hash,
            body_file,
            entry: Some(entry),
            temp_path,
            file: Some(BufWriter::new(file)),
            written: 0,
        }
    }

    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => {
                file.write_all(data)?;
                self.written += data.len() as u64;
                Ok(())
            }
            None => Err(io::Error::other("cache writer already closed")),
        }
    }

    /// Flush the body and publish the entry.
    pub fn commit(mut self) -> crate::Result<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        file.flush().map_err(crate::error::cache)?;
        drop(file);

        let Some(entry) = self.entry.take() else {
            return Ok(());
        };
        let body_file = std::mem::take(&mut self.body_file);
        let result = self
            .cache
            .commit(&self.hash, entry, &self.temp_path, body_file, self.written);
        if result.is_err() {
            let _ = fs::remove_file(&self.temp_path);
        }
        result.map_err(crate::error::cache)
    }
}

impl Drop for CacheWriter {
    fn drop(&mut self) {
        if self.file.take().is_some() {
            tracing::trace!(target: "courier::cache", hash = %self.hash, "Cache write abandoned");
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

/// Reads through `inner`, copying every byte into an optional [`CacheWriter`].
///
/// A read error abandons the pending entry; [`finish`](Self::finish) drains the rest
/// of the body and commits.
pub struct CacheTee<R> {
    inner: R,
    writer: Option<CacheWriter>,
}

impl<R: Read> CacheTee<R> {
    pub fn new(inner: R, writer: Option<CacheWriter>) -> Self {
        Self { inner, writer }
    }

    /// Consume the remainder of the body and commit the entry, if one is pending.
    pub fn finish(mut self) -> crate::Result<()> {
        let Some(writer) = self.writer.as_ref() else {
            return Ok(());
        };
        let hash = writer.hash.clone();
        io::copy(&mut self, &mut io::sink()).map_err(crate::error::cache)?;
        match self.writer.take() {
            Some(writer) => writer.commit(),
            None => Err(crate::error::cache(io::Error::other(format!(
                "cache entry {hash} abandoned while draining"
            )))),
        }
    }
}

impl<R: Read> Read for CacheTee<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = match self.inner.read(buf) {
            Ok(len) => len,
            Err(e) => {
                if e.kind() != io::ErrorKind::Interrupted {
                    self.writer = None;
                }
                return Err(e);
            }
        };
        if len > 0 {
            if let Some(writer) = self.writer.as_mut() {
                if let Err(e) = writer.write(&buf[..len]) {
                    tracing::warn!(target: "courier::cache", error = %e, "Cache body write failed");
                    self.writer = None;
                }
            }
        }
        Ok(len)
    }
}
