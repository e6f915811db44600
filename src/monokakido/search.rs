//! The sorted offset indexes and their comparators.
//!
//! All four search modes run through one generic lower/upper-bound routine
//! over a slot array; the role only changes how a word's text is turned
//! into a sort key. Keys are derived on the fly during the binary search,
//! so the indexes stay plain `u32` arrays exactly as stored on disk.

use crate::monokakido::types::models::WordEntry;

/// The role of one sub-index, in on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexRole {
    /// Sorted by scalar count first, then lexically.
    LengthThenLexical = 0,
    /// Plain lexical order over the headword text.
    Lexical = 1,
    /// Lexical order over the character-reversed text.
    SuffixLexical = 2,
    /// Lexical order over the anagram key (characters sorted).
    CharMultiset = 3,
}

impl IndexRole {
    pub const ALL: [IndexRole; 4] = [
        IndexRole::LengthThenLexical,
        IndexRole::Lexical,
        IndexRole::SuffixLexical,
        IndexRole::CharMultiset,
    ];

    /// Derives the sort key this role compares by.
    ///
    /// "Length" counts Unicode scalar values; for the lexical stages,
    /// byte-wise and scalar-wise UTF-8 order coincide, so keys compare as
    /// plain strings.
    pub(crate) fn sort_key(&self, text: &str) -> SortKey {
        match self {
            IndexRole::LengthThenLexical => SortKey {
                length: Some(text.chars().count()),
                text: text.to_owned(),
            },
            IndexRole::Lexical => SortKey {
                length: None,
                text: text.to_owned(),
            },
            IndexRole::SuffixLexical => SortKey {
                length: None,
                text: text.chars().rev().collect(),
            },
            IndexRole::CharMultiset => SortKey {
                length: None,
                text: canonical_char_sort(text),
            },
        }
    }
}

/// Sorts a string's characters into canonical order, producing an
/// anagram-invariant key.
pub fn canonical_char_sort(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    chars.sort_unstable();
    chars.into_iter().collect()
}

/// A comparator key: optional length stage, then text stage.
///
/// Vacant slots compare as `SortKey::vacant()`, which orders before every
/// populated key under all four roles (`None < Some(_)`, `"" <= text`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct SortKey {
    length: Option<usize>,
    text: String,
}

impl SortKey {
    pub(crate) fn vacant() -> Self {
        SortKey {
            length: None,
            text: String::new(),
        }
    }

    /// A length-stage-only key, used to bracket length ranges.
    pub(crate) fn length_bound(length: usize) -> Self {
        SortKey {
            length: Some(length),
            text: String::new(),
        }
    }
}

/// One sub-index: a role and its slot array as stored on disk.
///
/// A slot is either a word-table index or the sentinel `0` meaning "this
/// position is intentionally unindexed". The sentinel overlaps with the
/// legitimate index 0, which only the first slot may carry; see
/// [`word_index_at`](SearchIndex::word_index_at) for the policy reading
/// and [`raw_slot`](SearchIndex::raw_slot) for the undecoded value.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    role: IndexRole,
    slots: Vec<u32>,
}

impl SearchIndex {
    pub(crate) fn new(role: IndexRole, slots: Vec<u32>) -> Self {
        SearchIndex { role, slots }
    }

    pub fn role(&self) -> IndexRole {
        self.role
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The slot value exactly as stored, without sentinel interpretation.
    pub fn raw_slot(&self, pos: usize) -> Option<u32> {
        self.slots.get(pos).copied()
    }

    /// The word-table index at `pos` under the sentinel policy: a `0`
    /// beyond the first slot means "vacant" and yields `None`; slot 0 may
    /// legitimately reference word 0.
    pub fn word_index_at(&self, pos: usize) -> Option<usize> {
        match self.slots.get(pos) {
            Some(0) if pos > 0 => None,
            Some(&slot) => Some(slot as usize),
            None => None,
        }
    }

    /// The sort key occupying `pos`. Vacant slots and slots pointing
    /// outside the word table both read as the vacant key; the latter
    /// surface as per-item errors at resolve time instead of breaking
    /// the search invariant here.
    fn key_at(&self, words: &[WordEntry], pos: usize) -> SortKey {
        match self.word_index_at(pos).and_then(|i| words.get(i)) {
            Some(entry) => self.role.sort_key(&entry.text),
            None => SortKey::vacant(),
        }
    }

    /// First position whose key is not below `key`.
    pub(crate) fn lower_bound(&self, words: &[WordEntry], key: &SortKey) -> usize {
        let (mut lo, mut hi) = (0, self.slots.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.key_at(words, mid) < *key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// First position whose key is above `key`.
    pub(crate) fn upper_bound(&self, words: &[WordEntry], key: &SortKey) -> usize {
        let (mut lo, mut hi) = (0, self.slots.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.key_at(words, mid) <= *key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Positions holding exactly `key`.
    pub(crate) fn equal_bracket(&self, words: &[WordEntry], key: &SortKey) -> (usize, usize) {
        (self.lower_bound(words, key), self.upper_bound(words, key))
    }

    /// Positions whose text stage starts with `needle` (already in key
    /// space, i.e. reversed for the suffix role).
    pub(crate) fn prefix_bracket(&self, words: &[WordEntry], needle: &str) -> (usize, usize) {
        let lo = self.lower_bound(
            words,
            &SortKey {
                length: None,
                text: needle.to_owned(),
            },
        );
        let hi = match prefix_successor(needle) {
            Some(successor) => self.lower_bound(
                words,
                &SortKey {
                    length: None,
                    text: successor,
                },
            ),
            None => self.slots.len(),
        };
        (lo, hi)
    }
}

/// The smallest string ordering strictly above every string starting with
/// `prefix`: the last scalar incremented (skipping the surrogate gap),
/// dropping trailing maximal scalars. `None` when no such string exists,
/// in which case the bracket runs to the end of the index.
fn prefix_successor(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.last_mut() {
        if let Some(next) = next_scalar(*last) {
            *last = next;
            return Some(chars.into_iter().collect());
        }
        chars.pop();
    }
    None
}

fn next_scalar(c: char) -> Option<char> {
    match c {
        char::MAX => None,
        '\u{D7FF}' => Some('\u{E000}'),
        _ => char::from_u32(c as u32 + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_keys_follow_roles() {
        assert_eq!(IndexRole::Lexical.sort_key("cat").text, "cat");
        assert_eq!(IndexRole::SuffixLexical.sort_key("cat").text, "tac");
        assert_eq!(IndexRole::CharMultiset.sort_key("cba").text, "abc");
        assert_eq!(IndexRole::LengthThenLexical.sort_key("日本").length, Some(2));
    }

    #[test]
    fn vacant_key_sorts_first() {
        assert!(SortKey::vacant() < IndexRole::Lexical.sort_key("a"));
        assert!(SortKey::vacant() < IndexRole::LengthThenLexical.sort_key(""));
    }

    #[test]
    fn prefix_successor_increments_last_scalar() {
        assert_eq!(prefix_successor("cat").unwrap(), "cau");
        assert_eq!(prefix_successor("a\u{D7FF}").unwrap(), "a\u{E000}");
        assert_eq!(
            prefix_successor(&format!("a{}", char::MAX)).unwrap(),
            "b"
        );
        assert_eq!(prefix_successor(&char::MAX.to_string()), None);
    }
}
