//! Byte-level codecs shared by the container readers.
//!
//! - [`pageref`]: the packed variable-width `(page_id, item_id)` records
//! - [`block`]: length-prefixed zlib blocks with embedded size declarations

pub mod block;
pub mod pageref;
