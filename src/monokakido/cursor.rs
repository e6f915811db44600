//! Bounds-checked positional decoding over a byte source.
//!
//! Every offset in these formats is relative to a named header field, never
//! absolute from file start. The cursor therefore captures a base offset at
//! construction and all seeks are expressed relative to it, which keeps the
//! base explicit at every call site instead of living in ambient state.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use encoding_rs::{UTF_8, UTF_16LE};

use super::source::ByteSource;
use super::types::error::{MonokakidoError, Result};

/// Chunk size used when scanning forward for a string terminator.
const SCAN_CHUNK: usize = 64;

/// A decoding cursor over a [`ByteSource`], anchored at a base offset.
///
/// The cursor holds its own position; it never mutates the source, so any
/// number of cursors may read the same source concurrently.
pub struct Cursor<'a, S: ByteSource + ?Sized> {
    source: &'a S,
    base: u64,
    pos: u64,
}

impl<'a, S: ByteSource + ?Sized> Cursor<'a, S> {
    /// Creates a cursor positioned at `base`.
    pub fn new(source: &'a S, base: u64) -> Self {
        Cursor { source, base, pos: 0 }
    }

    /// Seeks to `offset` relative to the base.
    pub fn seek(&mut self, offset: u64) {
        self.pos = offset;
    }

    /// Current position relative to the base.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Current absolute position within the source.
    pub fn absolute(&self) -> u64 {
        self.base + self.pos
    }

    fn take(&mut self, buf: &mut [u8]) -> Result<()> {
        self.source.read_at(self.base + self.pos, buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.take(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.take(&mut buf)?;
        Ok(LittleEndian::read_u16(&buf))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.take(&mut buf)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Reads one byte and splits it into its nibbles, high first.
    ///
    /// The page-reference layout packs a type/width selector into the high
    /// nibble and a secondary width selector into the low nibble.
    pub fn read_nibbles(&mut self) -> Result<(u8, u8)> {
        let byte = self.read_u8()?;
        Ok((byte >> 4, byte & 0x0f))
    }

    /// Reads a big-endian unsigned integer of `width` bytes (1–8).
    ///
    /// Page and item ids are the only big-endian fields in these formats.
    pub fn read_be_uint(&mut self, width: usize) -> Result<u64> {
        debug_assert!((1..=8).contains(&width));
        let mut buf = [0u8; 8];
        self.take(&mut buf[..width])?;
        Ok(BigEndian::read_uint(&buf[..width], width))
    }

    /// Reads a null-terminated UTF-8 string, lossy-decoded.
    ///
    /// Fails with `OutOfBounds` if the source ends before a terminator.
    pub fn read_cstring(&mut self) -> Result<String> {
        let bytes = self.scan_terminated(1, |unit| unit == [0])?;
        let (text, _, _) = UTF_8.decode(&bytes);
        Ok(text.into_owned())
    }

    /// Reads a null-terminated UTF-16LE string (aligned 0x0000 terminator).
    pub fn read_utf16_cstring(&mut self) -> Result<String> {
        let bytes = self.scan_terminated(2, |unit| unit == [0, 0])?;
        let (text, _, _) = UTF_16LE.decode(&bytes);
        Ok(text.into_owned())
    }

    /// Reads a UTF-16LE string prefixed by its length in 16-bit units.
    pub fn read_utf16_prefixed(&mut self) -> Result<String> {
        let units = self.read_u16()? as usize;
        let mut buf = vec![0u8; units * 2];
        self.take(&mut buf)?;
        let (text, _, _) = UTF_16LE.decode(&buf);
        Ok(text.into_owned())
    }

    /// Scans forward in `unit`-sized steps until `is_term` matches,
    /// returning the bytes before the terminator and consuming it.
    fn scan_terminated(
        &mut self,
        unit: usize,
        is_term: impl Fn(&[u8]) -> bool,
    ) -> Result<Vec<u8>> {
        let mut collected = Vec::new();
        let mut chunk = [0u8; SCAN_CHUNK];
        loop {
            let abs = self.base + self.pos + collected.len() as u64;
            let remaining = self.source.len().saturating_sub(abs);
            let want = (SCAN_CHUNK as u64).min(remaining) as usize / unit * unit;
            if want == 0 {
                // Ran off the end without seeing a terminator.
                return Err(MonokakidoError::OutOfBounds {
                    offset: abs,
                    len: unit as u64,
                    size: self.source.len(),
                });
            }
            self.source.read_at(abs, &mut chunk[..want])?;
            if let Some(at) = chunk[..want].chunks_exact(unit).position(&is_term) {
                collected.extend_from_slice(&chunk[..at * unit]);
                self.pos += (collected.len() + unit) as u64;
                return Ok(collected);
            }
            collected.extend_from_slice(&chunk[..want]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_primitives() {
        let data: Vec<u8> = vec![0x01, 0x02, 0x03, 0x04, 0xff];
        let mut cur = Cursor::new(&data, 0);
        assert_eq!(cur.read_u32().unwrap(), 0x04030201);
        assert_eq!(cur.read_u8().unwrap(), 0xff);
        assert!(cur.read_u8().is_err());
    }

    #[test]
    fn reads_relative_to_base() {
        let data: Vec<u8> = vec![0xaa, 0xbb, 0x34, 0x12];
        let mut cur = Cursor::new(&data, 2);
        assert_eq!(cur.read_u16().unwrap(), 0x1234);
        assert_eq!(cur.absolute(), 4);
    }

    #[test]
    fn cstring_stops_at_terminator() {
        let data = b"cat\0tail".to_vec();
        let mut cur = Cursor::new(&data, 0);
        assert_eq!(cur.read_cstring().unwrap(), "cat");
        assert_eq!(cur.position(), 4);
    }

    #[test]
    fn unterminated_cstring_is_out_of_bounds() {
        let data = b"cat".to_vec();
        let mut cur = Cursor::new(&data, 0);
        assert!(matches!(
            cur.read_cstring(),
            Err(MonokakidoError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn utf16_cstring_honors_alignment() {
        // "ab" in UTF-16LE, then an aligned terminator.
        let data = vec![b'a', 0x00, b'b', 0x00, 0x00, 0x00];
        let mut cur = Cursor::new(&data, 0);
        assert_eq!(cur.read_utf16_cstring().unwrap(), "ab");
        assert_eq!(cur.position(), 6);
    }

    #[test]
    fn big_endian_uint_widths() {
        let data = vec![0x01, 0x02, 0x03];
        let mut cur = Cursor::new(&data, 0);
        assert_eq!(cur.read_be_uint(3).unwrap(), 0x010203);
    }
}
