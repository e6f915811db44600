//! Keystore file header parsing.
//!
//! Two header generations exist. Version `0x10000` uses a 16-byte header
//! whose words section starts at `0x10`; version `0x20000` uses a 32-byte
//! header whose words section starts at `0x20` and adds a `next_offset`
//! bounding the index section. Reserved magic fields are expected to be
//! zero; nonzero values are tolerated with a warning as long as the
//! section offsets still make sense.

use log::{debug, warn};

use crate::monokakido::cursor::Cursor;
use crate::monokakido::source::ByteSource;
use crate::monokakido::types::error::{MonokakidoError, Result};

pub const KEYSTORE_V1: u32 = 0x10000;
pub const KEYSTORE_V2: u32 = 0x20000;

/// Parsed keystore header. For v1 files the trailing fields are
/// implicitly zero.
#[derive(Debug, Clone, Copy)]
pub struct KeystoreHeader {
    pub version: u32,
    pub words_offset: u32,
    pub idx_offset: u32,
    /// End of the index section; `0` means "runs to end of file".
    pub next_offset: u32,
}

impl KeystoreHeader {
    /// Exclusive upper bound of the index section for a source of
    /// `source_len` bytes.
    pub fn idx_end(&self, source_len: u64) -> u64 {
        if self.next_offset != 0 {
            self.next_offset as u64
        } else {
            source_len
        }
    }
}

/// Parses and validates the header at the start of `source`.
pub fn parse<S: ByteSource + ?Sized>(source: &S) -> Result<KeystoreHeader> {
    let mut cur = Cursor::new(source, 0);
    let version = read_header_field(&mut cur)?;
    let magic1 = read_header_field(&mut cur)?;
    let words_offset = read_header_field(&mut cur)?;
    let idx_offset = read_header_field(&mut cur)?;

    let header = match (version, words_offset) {
        (KEYSTORE_V1, 0x10) => KeystoreHeader {
            version,
            words_offset,
            idx_offset,
            next_offset: 0,
        },
        (KEYSTORE_V2, 0x20) => {
            let next_offset = read_header_field(&mut cur)?;
            let magic5 = read_header_field(&mut cur)?;
            let magic6 = read_header_field(&mut cur)?;
            let magic7 = read_header_field(&mut cur)?;
            for (name, value) in [("magic5", magic5), ("magic6", magic6), ("magic7", magic7)] {
                if value != 0 {
                    warn!("Keystore reserved field {} is nonzero: {:#x}", name, value);
                }
            }
            KeystoreHeader {
                version,
                words_offset,
                idx_offset,
                next_offset,
            }
        }
        _ => {
            return Err(MonokakidoError::MalformedHeader {
                reason: format!(
                    "undocumented version/words-offset pairing: {:#x}/{:#x}",
                    version, words_offset
                ),
            });
        }
    };

    if magic1 != 0 {
        warn!("Keystore reserved field magic1 is nonzero: {:#x}", magic1);
    }

    if header.words_offset >= header.idx_offset {
        return Err(MonokakidoError::MalformedHeader {
            reason: format!(
                "words offset {:#x} not below index offset {:#x}",
                header.words_offset, header.idx_offset
            ),
        });
    }
    if header.next_offset != 0 && header.idx_offset >= header.next_offset {
        return Err(MonokakidoError::MalformedHeader {
            reason: format!(
                "index offset {:#x} not below next offset {:#x}",
                header.idx_offset, header.next_offset
            ),
        });
    }

    debug!(
        "Keystore header: version={:#x}, words={:#x}, idx={:#x}, next={:#x}",
        header.version, header.words_offset, header.idx_offset, header.next_offset
    );
    Ok(header)
}

/// Header fields become `MalformedHeader` on truncation rather than a
/// bare bounds error, since the fixed-size header is the one structure
/// with a known minimum length.
fn read_header_field<S: ByteSource + ?Sized>(cur: &mut Cursor<'_, S>) -> Result<u32> {
    cur.read_u32().map_err(|e| match e {
        MonokakidoError::OutOfBounds { size, .. } => MonokakidoError::MalformedHeader {
            reason: format!("source of {} bytes is shorter than the fixed header", size),
        },
        other => other,
    })
}
