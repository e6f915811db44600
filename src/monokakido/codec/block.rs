//! The RSC block codec.
//!
//! A stored block is `compressedLen:u32` followed by that many zlib bytes.
//! The inflated buffer re-declares its own length in its first 4 bytes;
//! the declaration is a consistency check against the actual inflated byte
//! count, and a mismatch is reported as corruption rather than tolerated.

use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};
use flate2::read::ZlibDecoder;
use log::trace;

use crate::monokakido::types::error::{MonokakidoError, Result};

/// Inflates one compressed block body and strips the embedded length
/// declaration, returning the payload bytes.
///
/// `global_offset` is the block's offset in the concatenated segment
/// space, carried for error context only.
pub fn inflate_block(compressed: &[u8], global_offset: u64) -> Result<Vec<u8>> {
    let mut inflated = Vec::new();
    let mut decoder = ZlibDecoder::new(compressed);
    decoder.read_to_end(&mut inflated).map_err(|e| MonokakidoError::CorruptBlock {
        offset: global_offset,
        reason: format!("zlib inflate failed: {}", e),
    })?;

    if inflated.len() < 4 {
        return Err(MonokakidoError::CorruptBlock {
            offset: global_offset,
            reason: format!("inflated to {} bytes, too short for a length declaration", inflated.len()),
        });
    }

    let declared = LittleEndian::read_u32(&inflated[..4]) as usize;
    let payload_len = inflated.len() - 4;
    if declared != payload_len {
        return Err(MonokakidoError::CorruptBlock {
            offset: global_offset,
            reason: format!("declared payload length {} but inflated {}", declared, payload_len),
        });
    }

    trace!(
        "Inflated block at {:#x}: {} -> {} payload bytes",
        global_offset,
        compressed.len(),
        payload_len
    );

    inflated.drain(..4);
    Ok(inflated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn round_trips_a_block() {
        let payload = b"hello block payload";
        let mut body = (payload.len() as u32).to_le_bytes().to_vec();
        body.extend_from_slice(payload);
        let compressed = deflate(&body);
        assert_eq!(inflate_block(&compressed, 0).unwrap(), payload);
    }

    #[test]
    fn length_mismatch_is_corrupt() {
        let payload = b"payload";
        let mut body = (payload.len() as u32 + 1).to_le_bytes().to_vec();
        body.extend_from_slice(payload);
        let compressed = deflate(&body);
        assert!(matches!(
            inflate_block(&compressed, 0),
            Err(MonokakidoError::CorruptBlock { .. })
        ));
    }

    #[test]
    fn truncated_input_is_corrupt() {
        let payload = b"a longer payload so truncation actually hurts";
        let mut body = (payload.len() as u32).to_le_bytes().to_vec();
        body.extend_from_slice(payload);
        let compressed = deflate(&body);
        let truncated = &compressed[..compressed.len() / 2];
        assert!(matches!(
            inflate_block(truncated, 0),
            Err(MonokakidoError::CorruptBlock { .. })
        ));
    }
}
