//! The compressed segmented content store (RSC) reader.
//!
//! Content lives in a numbered family of segment files holding
//! length-prefixed zlib blocks, addressed by a *global* offset as if all
//! segments were concatenated in sequence order. Two flat tables resolve a
//! content id: `contents.idx` maps ids to map positions (optional; when
//! absent an id is its own position) and `contents.map` pairs each
//! position with a global compressed offset and an offset into the
//! decompressed payload.
//!
//! Decompression dominates lookup cost, so decoded payloads are kept in a
//! small LRU cache keyed by `(segment, offset)`. The cache is
//! read-through and never invalidated; a race decompressing the same
//! block twice wastes work but stays correct.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use log::{debug, info, warn};
use lru::LruCache;
use parking_lot::Mutex;

use super::codec::block;
use super::cursor::Cursor;
use super::source::ByteSource;
use super::types::error::{MonokakidoError, Result};

/// Decoded payloads kept hot; decompression dominates, entries are small.
const DEFAULT_CACHE_BLOCKS: usize = 16;

/// One `contents.map` entry.
#[derive(Debug, Clone, Copy)]
pub struct MapEntry {
    /// Global compressed offset of the owning block.
    pub zoffset: u32,
    /// Offset of the entry inside the decompressed payload.
    pub ioffset: u32,
}

/// One `contents.idx` entry.
#[derive(Debug, Clone, Copy)]
struct IdxEntry {
    id: u32,
    map_index: u32,
}

/// A reader over one RSC store.
pub struct Rsc<S: ByteSource> {
    segments: Vec<S>,
    /// Global offset at which each segment starts, in sequence order.
    segment_starts: Vec<u64>,
    total_len: u64,
    map: Vec<MapEntry>,
    /// Positional idx table plus its id lookup; `None` when the store has
    /// no idx file and ids are their own map positions.
    idx: Option<(Vec<IdxEntry>, HashMap<u32, u32>)>,
    cache: Mutex<LruCache<(usize, u64), Arc<Vec<u8>>>>,
}

impl<S: ByteSource> Rsc<S> {
    /// Opens a store from its index tables and ordered segment sources.
    ///
    /// `idx` is the optional `contents.idx`; `map` is `contents.map`;
    /// `segments` must be in file-sequence order.
    pub fn open(idx: Option<S>, map: S, segments: Vec<S>) -> Result<Self> {
        Self::with_cache_blocks(idx, map, segments, DEFAULT_CACHE_BLOCKS)
    }

    /// Like [`open`](Rsc::open) with an explicit block-cache capacity.
    pub fn with_cache_blocks(
        idx: Option<S>,
        map: S,
        segments: Vec<S>,
        cache_blocks: usize,
    ) -> Result<Self> {
        let idx = idx.map(|source| parse_idx(&source)).transpose()?;
        let map = parse_map(&map)?;

        let mut segment_starts = Vec::with_capacity(segments.len());
        let mut total_len = 0u64;
        for segment in &segments {
            segment_starts.push(total_len);
            total_len += segment.len();
        }

        let capacity = NonZeroUsize::new(cache_blocks.max(1)).unwrap_or(NonZeroUsize::MIN);

        info!(
            "RSC store ready: {} map entries, {} ids, {} segments, {} bytes",
            map.len(),
            idx.as_ref().map_or(map.len(), |(table, _)| table.len()),
            segments.len(),
            total_len
        );

        Ok(Rsc {
            segments,
            segment_starts,
            total_len,
            map,
            idx,
            cache: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// Number of content entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Resolves a global compressed offset to `(segment index, offset
    /// within that segment)` via the prefix-sum table.
    pub fn resolve_segment(&self, global_offset: u64) -> Result<(usize, u64)> {
        if global_offset >= self.total_len {
            return Err(MonokakidoError::OutOfBounds {
                offset: global_offset,
                len: 0,
                size: self.total_len,
            });
        }
        let segment = self
            .segment_starts
            .partition_point(|&start| start <= global_offset)
            - 1;
        Ok((segment, global_offset - self.segment_starts[segment]))
    }

    /// Reads and inflates the block at a global offset, through the cache.
    pub fn read_block(&self, global_offset: u64) -> Result<Arc<Vec<u8>>> {
        let (segment, within) = self.resolve_segment(global_offset)?;

        if let Some(payload) = self.cache.lock().get(&(segment, within)) {
            return Ok(Arc::clone(payload));
        }

        // Lock released while inflating; a concurrent miss on the same
        // block decompresses twice, which is wasteful but correct.
        let source = &self.segments[segment];
        let mut cur = Cursor::new(source, 0);
        cur.seek(within);
        let compressed_len = cur.read_u32()? as u64;
        if within + 4 + compressed_len > source.len() {
            return Err(MonokakidoError::OutOfBounds {
                offset: within + 4,
                len: compressed_len,
                size: source.len(),
            });
        }
        let mut compressed = vec![0u8; compressed_len as usize];
        source.read_at(within + 4, &mut compressed)?;

        let payload = Arc::new(block::inflate_block(&compressed, global_offset)?);
        self.cache.lock().put((segment, within), Arc::clone(&payload));
        Ok(payload)
    }

    /// Fetches the bytes of one content id: the owning block's payload
    /// from the entry's decompressed offset to the payload end. Entry
    /// length is not stored at this layer; callers that know a shorter
    /// length slice the result themselves.
    pub fn fetch(&self, content_id: u32) -> Result<Vec<u8>> {
        let map_index = match &self.idx {
            Some((_, by_id)) => *by_id.get(&content_id).ok_or_else(|| {
                MonokakidoError::NotFound(format!("content id {}", content_id))
            })?,
            None => content_id,
        };
        let entry = self.map_entry(map_index)?;
        self.slice_entry(&entry)
    }

    /// Returns `(content id, bytes)` for the entry at map position
    /// `index`, iterating the store in logical order.
    pub fn get_by_index(&self, index: usize) -> Result<(u32, Vec<u8>)> {
        let content_id = match &self.idx {
            Some((table, _)) => {
                let record = table.get(index).ok_or_else(|| {
                    MonokakidoError::NotFound(format!("map position {}", index))
                })?;
                // A position is addressable only when the idx row agrees
                // with its own position.
                if record.map_index as usize != index {
                    return Err(MonokakidoError::NotFound(format!(
                        "map position {} (idx row points at {})",
                        index, record.map_index
                    )));
                }
                record.id
            }
            None => index as u32,
        };
        let entry = self.map_entry(index as u32)?;
        Ok((content_id, self.slice_entry(&entry)?))
    }

    fn map_entry(&self, map_index: u32) -> Result<MapEntry> {
        self.map.get(map_index as usize).copied().ok_or_else(|| {
            MonokakidoError::NotFound(format!(
                "map index {} in a map of {}",
                map_index,
                self.map.len()
            ))
        })
    }

    fn slice_entry(&self, entry: &MapEntry) -> Result<Vec<u8>> {
        let payload = self.read_block(entry.zoffset as u64)?;
        let start = entry.ioffset as usize;
        if start > payload.len() {
            return Err(MonokakidoError::OutOfBounds {
                offset: entry.ioffset as u64,
                len: 0,
                size: payload.len() as u64,
            });
        }
        Ok(payload[start..].to_vec())
    }
}

/// Parses `contents.idx`: count, a reserved word, then `(id, mapIndex)`
/// pairs in unspecified id order.
fn parse_idx<S: ByteSource + ?Sized>(source: &S) -> Result<(Vec<IdxEntry>, HashMap<u32, u32>)> {
    let mut cur = Cursor::new(source, 0);
    let count = cur.read_u32()? as u64;
    let reserved = cur.read_u32()?;
    if reserved != 0 {
        warn!("contents.idx reserved word is nonzero: {:#x}", reserved);
    }
    check_table_fits(source, 8, count)?;

    let mut table = Vec::with_capacity(count as usize);
    let mut by_id = HashMap::with_capacity(count as usize);
    for _ in 0..count {
        let id = cur.read_u32()?;
        let map_index = cur.read_u32()?;
        by_id.insert(id, map_index);
        table.push(IdxEntry { id, map_index });
    }
    debug!("Parsed contents.idx: {} entries", table.len());
    Ok((table, by_id))
}

/// Parses `contents.map`: a reserved word, count, then `(zoffset,
/// ioffset)` pairs whose position is their logical index.
fn parse_map<S: ByteSource + ?Sized>(source: &S) -> Result<Vec<MapEntry>> {
    let mut cur = Cursor::new(source, 0);
    let reserved = cur.read_u32()?;
    if reserved != 0 {
        warn!("contents.map reserved word is nonzero: {:#x}", reserved);
    }
    let count = cur.read_u32()? as u64;
    check_table_fits(source, 8, count)?;

    let mut map = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let zoffset = cur.read_u32()?;
        let ioffset = cur.read_u32()?;
        map.push(MapEntry { zoffset, ioffset });
    }
    debug!("Parsed contents.map: {} entries", map.len());
    Ok(map)
}

/// Refuses a declared pair count that cannot fit in the source, before
/// allocating for it.
fn check_table_fits<S: ByteSource + ?Sized>(source: &S, preamble: u64, count: u64) -> Result<()> {
    let needed = count * 8;
    if preamble + needed > source.len() {
        return Err(MonokakidoError::OutOfBounds {
            offset: preamble,
            len: needed,
            size: source.len(),
        });
    }
    Ok(())
}
