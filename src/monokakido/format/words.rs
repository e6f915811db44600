//! Word table parsing.
//!
//! The words section starts with a count and a table of entry offsets,
//! all relative to the section start. Each entry is a page-list offset
//! (also section-relative), one reserved byte, and the null-terminated
//! headword text.

use log::debug;

use crate::monokakido::cursor::Cursor;
use crate::monokakido::source::ByteSource;
use crate::monokakido::types::error::{MonokakidoError, Result};
use crate::monokakido::types::models::WordEntry;

use super::header::KeystoreHeader;

/// Parses the full word table. Entry offsets are resolved eagerly so a
/// `Ready` keystore never fails on plain table access; page lists stay
/// encoded until a word is resolved.
pub fn parse<S: ByteSource + ?Sized>(
    source: &S,
    header: &KeystoreHeader,
) -> Result<Vec<WordEntry>> {
    let base = header.words_offset as u64;
    let mut cur = Cursor::new(source, base);

    let count = cur.read_u32()? as u64;
    // The offset table must fit below the index section.
    let table_end = base + 4 + count * 4;
    if table_end > header.idx_offset as u64 {
        return Err(MonokakidoError::MalformedHeader {
            reason: format!(
                "word offset table of {} entries overruns the index section at {:#x}",
                count, header.idx_offset
            ),
        });
    }

    let mut offsets = Vec::with_capacity(count as usize);
    for _ in 0..count {
        offsets.push(cur.read_u32()?);
    }

    let mut entries = Vec::with_capacity(count as usize);
    for offset in offsets {
        let mut entry_cur = Cursor::new(source, base);
        entry_cur.seek(offset as u64);
        let page_list_offset = entry_cur.read_u32()?;
        let _reserved = entry_cur.read_u8()?;
        let text = entry_cur.read_cstring()?;
        entries.push(WordEntry {
            text,
            page_list_offset,
        });
    }

    debug!("Parsed word table: {} entries", entries.len());
    Ok(entries)
}
