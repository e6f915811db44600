//! The headline store reader: `(page, item) → display string`.
//!
//! A fixed 32-byte header, a table of 24-byte records sorted by
//! `(page_id, item_id)`, then a UTF-16LE string pool. Records keep only an
//! offset into the pool; strings end at an aligned 0x0000 unit.

use log::{debug, info, warn};

use super::cursor::Cursor;
use super::source::ByteSource;
use super::types::error::{MonokakidoError, Result};

const RECORD_BYTES: u32 = 0x18;

/// One headline record.
#[derive(Debug, Clone, Copy)]
pub struct HeadlineRecord {
    pub page_id: u32,
    pub item_id: u8,
    pub item_type: u8,
    /// Offset of the display string, relative to the words section.
    offset: u32,
}

/// A reader over one `.headlinestore` file.
pub struct HeadlineStore<S: ByteSource> {
    source: S,
    words_offset: u32,
    records: Vec<HeadlineRecord>,
}

impl<S: ByteSource> HeadlineStore<S> {
    /// Opens a headline store, loading the record table and keeping the
    /// string pool region for on-demand decoding.
    pub fn open(source: S) -> Result<Self> {
        let mut cur = Cursor::new(&source, 0);
        let magic1 = read_header_field(&mut cur)?;
        let magic2 = read_header_field(&mut cur)?;
        let declared_len = read_header_field(&mut cur)?;
        let rec_offset = read_header_field(&mut cur)?;
        let words_offset = read_header_field(&mut cur)?;
        let rec_bytes = read_header_field(&mut cur)?;
        let magic4 = read_header_field(&mut cur)?;
        let magic5 = read_header_field(&mut cur)?;

        if magic2 != 2 || rec_bytes != RECORD_BYTES {
            return Err(MonokakidoError::MalformedHeader {
                reason: format!(
                    "unexpected structure fields: magic2={:#x}, recBytes={:#x}",
                    magic2, rec_bytes
                ),
            });
        }
        for (name, value) in [("magic1", magic1), ("magic4", magic4), ("magic5", magic5)] {
            if value != 0 {
                warn!("Headline reserved field {} is nonzero: {:#x}", name, value);
            }
        }

        if rec_offset > words_offset {
            return Err(MonokakidoError::MalformedHeader {
                reason: format!(
                    "record section {:#x} starts after words section {:#x}",
                    rec_offset, words_offset
                ),
            });
        }
        let table_bytes = (words_offset - rec_offset) as u64;
        if table_bytes % RECORD_BYTES as u64 != 0 {
            return Err(MonokakidoError::MalformedHeader {
                reason: format!("record section of {} bytes is not a whole record count", table_bytes),
            });
        }

        let count = table_bytes / RECORD_BYTES as u64;
        let mut records = Vec::with_capacity(count as usize);
        let mut rec_cur = Cursor::new(&source, rec_offset as u64);
        for _ in 0..count {
            let page_id = rec_cur.read_u32()?;
            let item_id = rec_cur.read_u8()?;
            let item_type = rec_cur.read_u8()?;
            let _reserved16 = rec_cur.read_u16()?;
            let offset = rec_cur.read_u32()?;
            for _ in 0..3 {
                let _reserved32 = rec_cur.read_u32()?;
            }
            records.push(HeadlineRecord {
                page_id,
                item_id,
                item_type,
                offset,
            });
        }

        if declared_len as u64 != count {
            debug!(
                "Headline header declares {} records, table holds {}",
                declared_len, count
            );
        }
        info!("Headline store ready: {} records", records.len());

        Ok(HeadlineStore {
            source,
            words_offset,
            records,
        })
    }

    /// Number of headline records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up the display string for a `(page, item)` pair. The record
    /// table is sorted by that pair, so this is one binary search.
    pub fn get(&self, page_id: u32, item_id: u8) -> Result<String> {
        let found = self
            .records
            .binary_search_by(|record| (record.page_id, record.item_id).cmp(&(page_id, item_id)));
        match found {
            Ok(position) => self.read_text(&self.records[position]),
            Err(_) => Err(MonokakidoError::NotFound(format!(
                "headline for page {} item {}",
                page_id, item_id
            ))),
        }
    }

    /// Yields `(page_id, item_id, text)` in record order.
    pub fn iter(&self) -> impl Iterator<Item = Result<(u32, u8, String)>> + '_ {
        self.records.iter().map(|record| {
            Ok((record.page_id, record.item_id, self.read_text(record)?))
        })
    }

    fn read_text(&self, record: &HeadlineRecord) -> Result<String> {
        let mut cur = Cursor::new(&self.source, self.words_offset as u64);
        cur.seek(record.offset as u64);
        cur.read_utf16_cstring()
    }
}

fn read_header_field<S: ByteSource + ?Sized>(cur: &mut Cursor<'_, S>) -> Result<u32> {
    cur.read_u32().map_err(|e| match e {
        MonokakidoError::OutOfBounds { size, .. } => MonokakidoError::MalformedHeader {
            reason: format!("source of {} bytes is shorter than the fixed header", size),
        },
        other => other,
    })
}
