//! Search sub-index parsing.
//!
//! The index section header is a count (always 4) and four sub-offsets
//! relative to the section start, in role order: length-then-lexical,
//! lexical, suffix-lexical, char-multiset. A zero sub-offset marks an
//! absent index. Each present sub-index is a count followed by that many
//! 32-bit word-table slots.

use log::debug;

use crate::monokakido::cursor::Cursor;
use crate::monokakido::source::ByteSource;
use crate::monokakido::types::error::{MonokakidoError, Result};

use super::header::KeystoreHeader;

/// Number of sub-indexes in every keystore.
pub const SUB_INDEX_COUNT: usize = 4;

/// Parses the four sub-index slot arrays. Absent sub-indexes come back
/// as empty vectors.
pub fn parse<S: ByteSource + ?Sized>(
    source: &S,
    header: &KeystoreHeader,
) -> Result<[Vec<u32>; SUB_INDEX_COUNT]> {
    let base = header.idx_offset as u64;
    let idx_end = header.idx_end(source.len());
    let mut cur = Cursor::new(source, base);

    let count = cur.read_u32()?;
    if count as usize != SUB_INDEX_COUNT {
        return Err(MonokakidoError::MalformedHeader {
            reason: format!("index header declares {} sub-indexes, expected {}", count, SUB_INDEX_COUNT),
        });
    }

    let mut sub_offsets = [0u32; SUB_INDEX_COUNT];
    for slot in sub_offsets.iter_mut() {
        *slot = cur.read_u32()?;
    }

    // Nonzero sub-offsets must ascend, and the last must stay below the
    // section end (next_offset, or file end when next_offset is 0).
    let in_order = |l: u32, r: u64| (l as u64) < r || r == 0;
    let chain_ok = in_order(sub_offsets[0], sub_offsets[1] as u64)
        && in_order(sub_offsets[1], sub_offsets[2] as u64)
        && in_order(sub_offsets[2], sub_offsets[3] as u64)
        && in_order(sub_offsets[3], idx_end.saturating_sub(base));
    if !chain_ok {
        return Err(MonokakidoError::MalformedHeader {
            reason: format!("sub-index offsets not ascending: {:#x?}", sub_offsets),
        });
    }

    let mut indexes: [Vec<u32>; SUB_INDEX_COUNT] =
        [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
    for (role, &sub_offset) in sub_offsets.iter().enumerate() {
        if sub_offset == 0 {
            continue;
        }
        indexes[role] = read_slot_array(source, base + sub_offset as u64)?;
    }

    debug!(
        "Parsed sub-indexes: lengths {:?}",
        indexes.iter().map(Vec::len).collect::<Vec<_>>()
    );
    Ok(indexes)
}

/// Reads a `count:u32` prefixed array of 32-bit slots, refusing counts
/// that would run past the source before allocating for them.
fn read_slot_array<S: ByteSource + ?Sized>(source: &S, base: u64) -> Result<Vec<u32>> {
    let mut cur = Cursor::new(source, base);
    let count = cur.read_u32()? as u64;
    let end = base + 4 + count * 4;
    if end > source.len() {
        return Err(MonokakidoError::OutOfBounds {
            offset: base + 4,
            len: count * 4,
            size: source.len(),
        });
    }
    let mut slots = Vec::with_capacity(count as usize);
    for _ in 0..count {
        slots.push(cur.read_u32()?);
    }
    Ok(slots)
}
