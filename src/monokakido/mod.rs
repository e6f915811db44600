//! Readers for the monokakido dictionary container family.
//!
//! # Module Organization
//!
//! - [`types`]: errors and plain data structures
//! - [`source`]: positional byte sources (in-memory, memory-mapped)
//! - [`cursor`]: bounds-checked primitive decoding with explicit bases
//! - [`codec`]: the page-reference and compressed-block codecs
//! - `format`: keystore file-structure parsing
//! - [`search`]: the four sorted offset indexes and their comparators
//! - [`keystore`] / [`rsc`] / [`nrsc`] / [`headline`]: the reader front-ends
//! - [`iter`]: query result iterators

pub mod codec;
pub mod cursor;
mod format;
pub mod headline;
pub mod iter;
pub mod keystore;
pub mod nrsc;
pub mod rsc;
pub mod search;
pub mod source;
pub mod types;

pub use types::error::{MonokakidoError, Result};
