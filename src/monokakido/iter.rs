//! Iterators over keystore query results.
//!
//! Both iterators borrow the keystore and hold only positions, so they are
//! finite, restartable (re-issuing a query walks the same bracket), and
//! yield per-item `Result`s: one bad record does not abort iteration over
//! the rest of the bracket.

use super::keystore::Keystore;
use super::search::IndexRole;
use super::source::ByteSource;
use super::types::error::Result;
use super::types::models::WordRecord;

/// Iterator over the words inside one sub-index bracket.
///
/// Vacant slots inside the bracket are skipped; they occupy sort-order
/// positions but reference no word.
pub struct MatchIter<'a, S: ByteSource> {
    store: &'a Keystore<S>,
    role: IndexRole,
    pos: usize,
    end: usize,
}

impl<'a, S: ByteSource> MatchIter<'a, S> {
    pub(crate) fn new(store: &'a Keystore<S>, role: IndexRole, pos: usize, end: usize) -> Self {
        MatchIter { store, role, pos, end }
    }

    /// An empty iterator (inverted ranges, absent indexes).
    pub(crate) fn empty(store: &'a Keystore<S>, role: IndexRole) -> Self {
        MatchIter { store, role, pos: 0, end: 0 }
    }
}

impl<'a, S: ByteSource> Iterator for MatchIter<'a, S> {
    type Item = Result<WordRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.end {
            let pos = self.pos;
            self.pos += 1;
            if let Some(word_index) = self.store.index(self.role).word_index_at(pos) {
                return Some(self.store.resolve(word_index));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.end - self.pos))
    }
}

/// Iterator over every word record in word-table order.
pub struct WordIter<'a, S: ByteSource> {
    store: &'a Keystore<S>,
    pos: usize,
}

impl<'a, S: ByteSource> WordIter<'a, S> {
    pub(crate) fn new(store: &'a Keystore<S>) -> Self {
        WordIter { store, pos: 0 }
    }
}

impl<'a, S: ByteSource> Iterator for WordIter<'a, S> {
    type Item = Result<WordRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.store.len() {
            return None;
        }
        let record = self.store.resolve(self.pos);
        self.pos += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.store.len() - self.pos;
        (remaining, Some(remaining))
    }
}
