//! Custom error types for the monokakido-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum MonokakidoError {
    /// An error originating from I/O operations (file open, mapping).
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// A container header is structurally invalid: too short, an
    /// undocumented version/offset pairing, or unordered section offsets.
    #[error("Malformed header: {reason}")]
    MalformedHeader { reason: String },

    /// A computed offset/length pair exceeds the backing byte source.
    #[error("Read of {len} bytes at offset {offset:#x} exceeds source size {size}")]
    OutOfBounds { offset: u64, len: u64, size: u64 },

    /// A width or format selector outside the documented value set.
    /// Undocumented selectors fail loudly; the codec never guesses a mapping.
    #[error("Unrecognized {field} selector {value:#x} at offset {offset:#x}")]
    UnrecognizedEncoding {
        field: &'static str,
        value: u32,
        offset: u64,
    },

    /// A compressed block failed to inflate, or its declared decompressed
    /// length disagrees with the actual inflated byte count.
    #[error("Corrupt block at global offset {offset:#x}: {reason}")]
    CorruptBlock { offset: u64, reason: String },

    /// Lookup of a content id, word index, blob id, or page/item pair
    /// absent from its table.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// A convenience `Result` type alias using the crate's `MonokakidoError` type.
pub type Result<T> = std::result::Result<T, MonokakidoError>;
