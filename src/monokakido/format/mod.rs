//! File-structure parsing for the keystore container.
//!
//! - [`header`]: the fixed keystore header (two documented generations)
//! - [`words`]: the word offset table and entries
//! - [`index`]: the four search sub-index slot arrays

pub mod header;
pub mod index;
pub mod words;
