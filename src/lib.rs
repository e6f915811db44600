//! # monokakido-reader
//!
//! Read-only access to monokakido dictionary containers: the searchable
//! keystore word index, the compressed segmented content store (RSC), the
//! flat blob container (NRSC), and the headline display-string table.
//!
//! Readers are opened from caller-supplied byte sources (in-memory buffers
//! or memory-mapped files); there is no discovery, configuration, or write
//! path. Searching a keystore yields `(page, item)` identifiers that the
//! content and headline readers consume as opaque keys.
pub mod monokakido;

// Re-export the main types for convenience
pub use monokakido::{
    MonokakidoError,
    Result,
    headline::HeadlineStore,
    keystore::Keystore,
    nrsc::{Nrsc, NrscFormat},
    rsc::Rsc,
    search::{IndexRole, SearchIndex},
    source::{ByteSource, MmapSource},
    types::models::{PageRef, WordEntry, WordRecord},
};
