//! The keystore reader: the searchable word index of a container.
//!
//! Opening runs header → word table → sub-indexes in one pass; a failure
//! at any stage aborts the open with the originating error, so every live
//! handle is fully parsed and ready. Queries never mutate the handle and
//! may run concurrently once it exists.

use log::info;

use super::codec::pageref;
use super::cursor::Cursor;
use super::format::{header, index, words};
use super::iter::{MatchIter, WordIter};
use super::search::{IndexRole, SearchIndex, SortKey};
use super::source::{ByteSource, MmapSource};
use super::types::error::{MonokakidoError, Result};
use super::types::models::{WordEntry, WordRecord};

pub use super::format::header::KeystoreHeader;

/// A parsed keystore over an immutable byte source.
pub struct Keystore<S: ByteSource> {
    source: S,
    header: KeystoreHeader,
    words: Vec<WordEntry>,
    indexes: [SearchIndex; index::SUB_INDEX_COUNT],
}

impl Keystore<MmapSource> {
    /// Maps and opens a `.keystore` file.
    pub fn open_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Keystore::open(MmapSource::open(path)?)
    }
}

impl<S: ByteSource> Keystore<S> {
    /// Opens a keystore: parses the header, the word table, and the four
    /// search sub-indexes. Any parse failure aborts the open and leaves
    /// no usable handle.
    pub fn open(source: S) -> Result<Self> {
        let header = header::parse(&source)?;
        let word_table = words::parse(&source, &header)?;
        let slot_arrays = index::parse(&source, &header)?;

        let [by_length, by_prefix, by_suffix, by_multiset] = slot_arrays;
        let indexes = [
            SearchIndex::new(IndexRole::LengthThenLexical, by_length),
            SearchIndex::new(IndexRole::Lexical, by_prefix),
            SearchIndex::new(IndexRole::SuffixLexical, by_suffix),
            SearchIndex::new(IndexRole::CharMultiset, by_multiset),
        ];

        info!(
            "Keystore ready: {} words, sub-index lengths {:?}",
            word_table.len(),
            indexes.iter().map(SearchIndex::len).collect::<Vec<_>>()
        );

        Ok(Keystore {
            source,
            header,
            words: word_table,
            indexes,
        })
    }

    /// Number of words in the table.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn header(&self) -> &KeystoreHeader {
        &self.header
    }

    /// The sub-index serving `role`. Absent sub-indexes are empty.
    pub fn index(&self, role: IndexRole) -> &SearchIndex {
        &self.indexes[role as usize]
    }

    /// Iterates every word record in word-table order.
    pub fn iter(&self) -> WordIter<'_, S> {
        WordIter::new(self)
    }

    /// All words whose text starts with `prefix`.
    pub fn search_prefix(&self, prefix: &str) -> MatchIter<'_, S> {
        let (lo, hi) = self
            .index(IndexRole::Lexical)
            .prefix_bracket(&self.words, prefix);
        MatchIter::new(self, IndexRole::Lexical, lo, hi)
    }

    /// All words whose text equals `text`.
    pub fn search_exact(&self, text: &str) -> MatchIter<'_, S> {
        let key = IndexRole::Lexical.sort_key(text);
        let (lo, hi) = self.index(IndexRole::Lexical).equal_bracket(&self.words, &key);
        MatchIter::new(self, IndexRole::Lexical, lo, hi)
    }

    /// All words whose text ends with `suffix`.
    ///
    /// The suffix index stores keys character-reversed, so this is the
    /// prefix bracket of the reversed query against that index.
    pub fn search_suffix(&self, suffix: &str) -> MatchIter<'_, S> {
        let reversed: String = suffix.chars().rev().collect();
        let (lo, hi) = self
            .index(IndexRole::SuffixLexical)
            .prefix_bracket(&self.words, &reversed);
        MatchIter::new(self, IndexRole::SuffixLexical, lo, hi)
    }

    /// All words that are anagrams of `text` (equal canonical character
    /// sort).
    pub fn search_anagram(&self, text: &str) -> MatchIter<'_, S> {
        let key = IndexRole::CharMultiset.sort_key(text);
        let (lo, hi) = self
            .index(IndexRole::CharMultiset)
            .equal_bracket(&self.words, &key);
        MatchIter::new(self, IndexRole::CharMultiset, lo, hi)
    }

    /// All words whose scalar count lies in `min..=max`. An inverted
    /// range yields nothing.
    pub fn search_length_range(&self, min: usize, max: usize) -> MatchIter<'_, S> {
        if min > max {
            return MatchIter::empty(self, IndexRole::LengthThenLexical);
        }
        let idx = self.index(IndexRole::LengthThenLexical);
        let lo = idx.lower_bound(&self.words, &SortKey::length_bound(min));
        let hi = match max.checked_add(1) {
            Some(above) => idx.lower_bound(&self.words, &SortKey::length_bound(above)),
            None => idx.len(),
        };
        MatchIter::new(self, IndexRole::LengthThenLexical, lo, hi)
    }

    /// Resolves a word-table index to its record, decoding the page list
    /// on demand.
    pub fn resolve(&self, word_index: usize) -> Result<WordRecord> {
        let entry = self.words.get(word_index).ok_or_else(|| {
            MonokakidoError::NotFound(format!(
                "word index {} in a table of {}",
                word_index,
                self.words.len()
            ))
        })?;
        let mut cur = Cursor::new(&self.source, self.header.words_offset as u64);
        cur.seek(entry.page_list_offset as u64);
        let pages = pageref::decode_list(&mut cur)?;
        Ok(WordRecord {
            index: word_index,
            text: entry.text.clone(),
            pages,
        })
    }

    /// The word entries themselves, for callers that only need text.
    pub fn words(&self) -> &[WordEntry] {
        &self.words
    }
}
