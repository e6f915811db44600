//! The flat blob container (NRSC) reader.
//!
//! `index.nidx` holds fixed 16-byte records followed by a pool of
//! null-terminated id strings; each record addresses a byte range inside
//! one of the numbered data files, stored raw or as one whole-entry zlib
//! stream. No blocks, no global offsets: this is a plain id → bytes
//! lookup.

use std::collections::HashMap;
use std::io::Read;

use flate2::read::ZlibDecoder;
use log::{info, warn};

use super::cursor::Cursor;
use super::source::ByteSource;
use super::types::error::{MonokakidoError, Result};

/// How one blob is stored in its data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NrscFormat {
    Raw,
    Zlib,
}

impl NrscFormat {
    fn parse(value: u16, offset: u64) -> Result<Self> {
        match value {
            0 => Ok(NrscFormat::Raw),
            1 => Ok(NrscFormat::Zlib),
            other => Err(MonokakidoError::UnrecognizedEncoding {
                field: "nrsc format",
                value: other as u32,
                offset,
            }),
        }
    }
}

/// One `index.nidx` record.
#[derive(Debug, Clone, Copy)]
pub struct NrscEntry {
    pub format: NrscFormat,
    /// 0-based index into the data file family.
    pub fileseq: u16,
    pub file_offset: u32,
    pub len: u32,
}

/// A reader over one NRSC container.
pub struct Nrsc<S: ByteSource> {
    entries: Vec<NrscEntry>,
    /// Id strings parallel to `entries`.
    ids: Vec<String>,
    by_id: HashMap<String, usize>,
    segments: Vec<S>,
}

impl<S: ByteSource> Nrsc<S> {
    /// Opens a container from its `index.nidx` source and the data files
    /// in sequence order.
    pub fn open(index: S, segments: Vec<S>) -> Result<Self> {
        let mut cur = Cursor::new(&index, 0);
        let reserved = cur.read_u32()?;
        if reserved != 0 {
            warn!("index.nidx reserved word is nonzero: {:#x}", reserved);
        }
        let count = cur.read_u32()? as u64;
        let pool_start = 8 + count * 16;
        if pool_start > index.len() {
            return Err(MonokakidoError::OutOfBounds {
                offset: 8,
                len: count * 16,
                size: index.len(),
            });
        }

        let mut entries = Vec::with_capacity(count as usize);
        let mut ids = Vec::with_capacity(count as usize);
        let mut by_id = HashMap::with_capacity(count as usize);
        for position in 0..count as usize {
            let record_offset = cur.absolute();
            let format = NrscFormat::parse(cur.read_u16()?, record_offset)?;
            let fileseq = cur.read_u16()?;
            let id_str_offset = cur.read_u32()?;
            let file_offset = cur.read_u32()?;
            let len = cur.read_u32()?;

            let id = read_id(&index, pool_start, id_str_offset)?;
            by_id.insert(id.clone(), position);
            ids.push(id);
            entries.push(NrscEntry {
                format,
                fileseq,
                file_offset,
                len,
            });
        }

        info!(
            "NRSC container ready: {} entries, {} data files",
            entries.len(),
            segments.len()
        );

        Ok(Nrsc {
            entries,
            ids,
            by_id,
            segments,
        })
    }

    /// Number of blobs in the container.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetches a blob by its id string.
    pub fn get(&self, id: &str) -> Result<Vec<u8>> {
        let position = *self
            .by_id
            .get(id)
            .ok_or_else(|| MonokakidoError::NotFound(format!("blob id {:?}", id)))?;
        self.read_entry(&self.entries[position])
    }

    /// Returns `(id, bytes)` for the record at table position `index`.
    pub fn get_by_index(&self, index: usize) -> Result<(&str, Vec<u8>)> {
        let entry = self.entries.get(index).ok_or_else(|| {
            MonokakidoError::NotFound(format!("blob position {}", index))
        })?;
        Ok((self.ids[index].as_str(), self.read_entry(entry)?))
    }

    fn read_entry(&self, entry: &NrscEntry) -> Result<Vec<u8>> {
        let segment = self.segments.get(entry.fileseq as usize).ok_or_else(|| {
            MonokakidoError::OutOfBounds {
                offset: entry.file_offset as u64,
                len: entry.len as u64,
                size: 0,
            }
        })?;
        let mut stored = vec![0u8; entry.len as usize];
        segment.read_at(entry.file_offset as u64, &mut stored)?;

        match entry.format {
            NrscFormat::Raw => Ok(stored),
            NrscFormat::Zlib => {
                let mut inflated = Vec::new();
                let mut decoder = ZlibDecoder::new(stored.as_slice());
                decoder.read_to_end(&mut inflated).map_err(|e| {
                    MonokakidoError::CorruptBlock {
                        offset: entry.file_offset as u64,
                        reason: format!("zlib inflate failed: {}", e),
                    }
                })?;
                Ok(inflated)
            }
        }
    }
}

/// Reads the id string a record points at, after checking the offset
/// lands on a string boundary (pool start, or right after a terminator).
fn read_id<S: ByteSource + ?Sized>(index: &S, pool_start: u64, id_str_offset: u32) -> Result<String> {
    let offset = id_str_offset as u64;
    if offset < pool_start {
        return Err(MonokakidoError::MalformedHeader {
            reason: format!(
                "id string offset {:#x} falls inside the record table",
                id_str_offset
            ),
        });
    }
    if offset > pool_start {
        let mut before = [0u8; 1];
        index.read_at(offset - 1, &mut before)?;
        if before[0] != 0 {
            return Err(MonokakidoError::MalformedHeader {
                reason: format!(
                    "id string offset {:#x} is not on a string boundary",
                    id_str_offset
                ),
            });
        }
    }
    let mut cur = Cursor::new(index, 0);
    cur.seek(offset);
    cur.read_cstring()
}
