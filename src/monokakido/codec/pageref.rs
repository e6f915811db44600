//! The packed variable-width page-reference codec.
//!
//! Each record opens with one selector byte: the high nibble chooses the
//! page-id width (`1 → 1`, `2 → 2`, `4 → 3` bytes; the gap at 3 is part of
//! the source format and is preserved exactly), the low nibble chooses the
//! item-id width (`0 → absent`, `1 → 1`, `2 → 2` bytes). Both ids are
//! big-endian. Any selector outside the documented sets is an
//! [`UnrecognizedEncoding`](crate::monokakido::types::error::MonokakidoError::UnrecognizedEncoding)
//! error, never a guessed mapping.

use byteorder::{BigEndian, ByteOrder};

use crate::monokakido::cursor::Cursor;
use crate::monokakido::source::ByteSource;
use crate::monokakido::types::error::{MonokakidoError, Result};
use crate::monokakido::types::models::PageRef;

/// Decodes one page reference at the cursor position.
pub fn decode<S: ByteSource + ?Sized>(cur: &mut Cursor<'_, S>) -> Result<PageRef> {
    let selector_offset = cur.absolute();
    let (type_sel, item_len) = cur.read_nibbles()?;

    let page_width = match type_sel {
        1 => 1,
        2 => 2,
        4 => 3,
        other => {
            return Err(MonokakidoError::UnrecognizedEncoding {
                field: "page width",
                value: other as u32,
                offset: selector_offset,
            });
        }
    };
    let page_id = cur.read_be_uint(page_width)? as u32;

    let item_id = match item_len {
        0 => None,
        1 => Some(cur.read_be_uint(1)? as u16),
        2 => Some(cur.read_be_uint(2)? as u16),
        other => {
            return Err(MonokakidoError::UnrecognizedEncoding {
                field: "item width",
                value: other as u32,
                offset: selector_offset,
            });
        }
    };

    Ok(PageRef { page_id, item_id })
}

/// Decodes a page list: a 16-bit count followed by that many records.
///
/// Records are packed with no padding; each occupies 2–6 bytes depending
/// on its selectors. An empty list is legal and yields an empty vector.
pub fn decode_list<S: ByteSource + ?Sized>(cur: &mut Cursor<'_, S>) -> Result<Vec<PageRef>> {
    let count = cur.read_u16()? as usize;
    let mut pages = Vec::with_capacity(count);
    for _ in 0..count {
        pages.push(decode(cur)?);
    }
    Ok(pages)
}

/// Encodes one page reference with minimal-width selectors, appending to
/// `out`. Used by fixture construction and round-trip tests.
pub fn encode(page_ref: &PageRef, out: &mut Vec<u8>) -> Result<()> {
    let (type_sel, page_width) = match page_ref.page_id {
        0..=0xff => (1u8, 1usize),
        0x100..=0xffff => (2, 2),
        0x1_0000..=0xff_ffff => (4, 3),
        other => {
            return Err(MonokakidoError::UnrecognizedEncoding {
                field: "page width",
                value: other,
                offset: out.len() as u64,
            });
        }
    };
    let (item_len, item_width) = match page_ref.item_id {
        None => (0u8, 0usize),
        Some(0..=0xff) => (1, 1),
        Some(_) => (2, 2),
    };

    out.push((type_sel << 4) | item_len);

    let mut buf = [0u8; 8];
    BigEndian::write_uint(&mut buf[..page_width], page_ref.page_id as u64, page_width);
    out.extend_from_slice(&buf[..page_width]);

    if let Some(item) = page_ref.item_id {
        BigEndian::write_uint(&mut buf[..item_width], item as u64, item_width);
        out.extend_from_slice(&buf[..item_width]);
    }
    Ok(())
}

/// Encodes a full page list (count prefix plus records).
pub fn encode_list(pages: &[PageRef], out: &mut Vec<u8>) -> Result<()> {
    out.extend_from_slice(&(pages.len() as u16).to_le_bytes());
    for page_ref in pages {
        encode(page_ref, out)?;
    }
    Ok(())
}
