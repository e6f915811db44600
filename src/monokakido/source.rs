//! Byte sources backing the container readers.
//!
//! Every read in these formats is positional (`(offset, length) → bytes`);
//! no source carries a shared seek position, so a `Ready` reader can serve
//! concurrent queries from multiple threads.

use std::fs::File;
use std::path::Path;

use memmap2::{Mmap, MmapOptions};

use super::types::error::{MonokakidoError, Result};

/// A random-access, immutable byte source.
///
/// Implemented for anything that dereferences to a byte slice (in-memory
/// buffers, [`MmapSource`]). All reads are bounds-checked against the
/// source length and fail with [`MonokakidoError::OutOfBounds`].
pub trait ByteSource {
    /// Total length of the source in bytes.
    fn len(&self) -> u64;

    /// Fills `buf` from the source starting at `offset`.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: AsRef<[u8]> + ?Sized> ByteSource for T {
    fn len(&self) -> u64 {
        self.as_ref().len() as u64
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let data = self.as_ref();
        let end = offset.checked_add(buf.len() as u64);
        match end {
            Some(end) if end <= data.len() as u64 => {
                let start = offset as usize;
                buf.copy_from_slice(&data[start..start + buf.len() as usize]);
                Ok(())
            }
            _ => Err(MonokakidoError::OutOfBounds {
                offset,
                len: buf.len() as u64,
                size: data.len() as u64,
            }),
        }
    }
}

/// A read-only memory-mapped file.
///
/// Containers are immutable for the process lifetime, so the mapping is
/// never remapped or flushed.
pub struct MmapSource {
    mmap: Mmap,
    len: usize,
}

impl MmapSource {
    /// Maps `path` read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let len = file.metadata()?.len() as usize;

        // Safety: the mapping is private and read-only; the container
        // files are not modified while a reader handle is alive.
        let mmap = unsafe { MmapOptions::new().len(len).map(&file)? };

        Ok(MmapSource { mmap, len })
    }
}

impl AsRef<[u8]> for MmapSource {
    fn as_ref(&self) -> &[u8] {
        &self.mmap[..self.len]
    }
}
