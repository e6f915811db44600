//! Core data structures shared across the container readers.

/// A reference from a word to a page of dictionary content, optionally
/// narrowed to one item within that page.
///
/// On the wire the page id occupies 1, 2, or 3 big-endian bytes and the
/// item id 0, 1, or 2, chosen by the selector nibbles of the leading byte
/// (see [`codec::pageref`](crate::monokakido::codec::pageref)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRef {
    pub page_id: u32,
    /// `None` means the reference addresses the whole page.
    pub item_id: Option<u16>,
}

/// One entry of the keystore word table: the headword text and the
/// offset of its page list (relative to the words section).
#[derive(Debug, Clone)]
pub struct WordEntry {
    pub text: String,
    pub page_list_offset: u32,
}

/// A fully resolved word: its table index, text, and decoded page list.
///
/// The page list is non-empty in well-formed data, but an empty list is
/// tolerated and simply yields no references.
#[derive(Debug, Clone)]
pub struct WordRecord {
    /// 0-based index into the keystore word table.
    pub index: usize,
    pub text: String,
    pub pages: Vec<PageRef>,
}
