#![allow(dead_code)]
//! Shared fixture builders: serialize synthetic container images in
//! memory so the integration tests can drive the readers end to end.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use monokakido_reader::PageRef;
use monokakido_reader::monokakido::codec::pageref;

/// Builds a keystore image from words and their page lists.
///
/// Sub-indexes default to all words sorted per role; explicit slot arrays
/// override that for sentinel and failure-injection tests.
pub struct KeystoreFixture {
    version: u32,
    words: Vec<(String, Vec<PageRef>)>,
    indexes: Option<[Vec<u32>; 4]>,
}

impl KeystoreFixture {
    pub fn new() -> Self {
        KeystoreFixture {
            version: 0x20000,
            words: Vec::new(),
            indexes: None,
        }
    }

    pub fn v1(mut self) -> Self {
        self.version = 0x10000;
        self
    }

    pub fn word(mut self, text: &str, pages: &[PageRef]) -> Self {
        self.words.push((text.to_owned(), pages.to_vec()));
        self
    }

    pub fn indexes(mut self, indexes: [Vec<u32>; 4]) -> Self {
        self.indexes = Some(indexes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let words_offset: u32 = if self.version == 0x10000 { 0x10 } else { 0x20 };
        let n = self.words.len();

        let page_blobs: Vec<Vec<u8>> = self
            .words
            .iter()
            .map(|(_, pages)| {
                let mut blob = Vec::new();
                pageref::encode_list(pages, &mut blob).unwrap();
                blob
            })
            .collect();

        // Words region layout: offset table, entries, page lists.
        let mut at = 4 + 4 * n;
        let mut entry_offsets = Vec::with_capacity(n);
        for (text, _) in &self.words {
            entry_offsets.push(at as u32);
            at += 4 + 1 + text.len() + 1;
        }
        let mut page_offsets = Vec::with_capacity(n);
        for blob in &page_blobs {
            page_offsets.push(at as u32);
            at += blob.len();
        }

        let mut region = Vec::new();
        region.extend((n as u32).to_le_bytes());
        for offset in &entry_offsets {
            region.extend(offset.to_le_bytes());
        }
        for (i, (text, _)) in self.words.iter().enumerate() {
            region.extend(page_offsets[i].to_le_bytes());
            region.push(0);
            region.extend(text.as_bytes());
            region.push(0);
        }
        for blob in &page_blobs {
            region.extend(blob);
        }

        let indexes = self
            .indexes
            .unwrap_or_else(|| default_indexes(&self.words));
        let mut idx_region = Vec::new();
        idx_region.extend(4u32.to_le_bytes());
        let mut sub_offset = 20u32;
        for slots in &indexes {
            idx_region.extend(sub_offset.to_le_bytes());
            sub_offset += 4 + 4 * slots.len() as u32;
        }
        for slots in &indexes {
            idx_region.extend((slots.len() as u32).to_le_bytes());
            for slot in slots {
                idx_region.extend(slot.to_le_bytes());
            }
        }

        let idx_offset = words_offset + region.len() as u32;
        let mut image = Vec::new();
        image.extend(self.version.to_le_bytes());
        image.extend(0u32.to_le_bytes());
        image.extend(words_offset.to_le_bytes());
        image.extend(idx_offset.to_le_bytes());
        if self.version != 0x10000 {
            for _ in 0..4 {
                image.extend(0u32.to_le_bytes());
            }
        }
        image.extend(&region);
        image.extend(&idx_region);
        image
    }
}

/// All words, sorted stably per role. Independent of the library's own
/// comparators so the fixtures pin expected behavior.
fn default_indexes(words: &[(String, Vec<PageRef>)]) -> [Vec<u32>; 4] {
    let by_key = |key: fn(&str) -> (usize, String)| {
        let mut order: Vec<u32> = (0..words.len() as u32).collect();
        order.sort_by_key(|&i| key(&words[i as usize].0));
        order
    };
    [
        by_key(|text| (text.chars().count(), text.to_owned())),
        by_key(|text| (0, text.to_owned())),
        by_key(|text| (0, text.chars().rev().collect())),
        by_key(|text| {
            let mut chars: Vec<char> = text.chars().collect();
            chars.sort_unstable();
            (0, chars.into_iter().collect())
        }),
    ]
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// One stored RSC block: compressed length prefix, then the zlib stream
/// of the self-declaring payload.
pub fn make_block(payload: &[u8]) -> Vec<u8> {
    let mut body = (payload.len() as u32).to_le_bytes().to_vec();
    body.extend_from_slice(payload);
    let compressed = deflate(&body);
    let mut stored = (compressed.len() as u32).to_le_bytes().to_vec();
    stored.extend(compressed);
    stored
}

pub fn make_rsc_idx(pairs: &[(u32, u32)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend((pairs.len() as u32).to_le_bytes());
    out.extend(0u32.to_le_bytes());
    for (id, map_index) in pairs {
        out.extend(id.to_le_bytes());
        out.extend(map_index.to_le_bytes());
    }
    out
}

pub fn make_rsc_map(entries: &[(u32, u32)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(0u32.to_le_bytes());
    out.extend((entries.len() as u32).to_le_bytes());
    for (zoffset, ioffset) in entries {
        out.extend(zoffset.to_le_bytes());
        out.extend(ioffset.to_le_bytes());
    }
    out
}

/// Builds an `index.nidx` image. `entries` are `(id, format, fileseq,
/// file_offset, length)`.
pub fn make_nidx(entries: &[(&str, u16, u16, u32, u32)]) -> Vec<u8> {
    let pool_start = 8 + entries.len() * 16;
    let mut pool = Vec::new();
    let mut id_offsets = Vec::new();
    for (id, ..) in entries {
        id_offsets.push((pool_start + pool.len()) as u32);
        pool.extend(id.as_bytes());
        pool.push(0);
    }

    let mut out = Vec::new();
    out.extend(0u32.to_le_bytes());
    out.extend((entries.len() as u32).to_le_bytes());
    for (i, (_, format, fileseq, file_offset, length)) in entries.iter().enumerate() {
        out.extend(format.to_le_bytes());
        out.extend(fileseq.to_le_bytes());
        out.extend(id_offsets[i].to_le_bytes());
        out.extend(file_offset.to_le_bytes());
        out.extend(length.to_le_bytes());
    }
    out.extend(pool);
    out
}

/// Builds a `.headlinestore` image from `(page_id, item_id, text)`
/// records, which must already be sorted by `(page, item)`.
pub fn make_headlinestore(records: &[(u32, u8, &str)]) -> Vec<u8> {
    let rec_offset = 32u32;
    let words_offset = rec_offset + 24 * records.len() as u32;

    let mut pool = Vec::new();
    let mut text_offsets = Vec::new();
    for (_, _, text) in records {
        text_offsets.push(pool.len() as u32);
        for unit in text.encode_utf16() {
            pool.extend(unit.to_le_bytes());
        }
        pool.extend([0u8, 0u8]);
    }

    let mut out = Vec::new();
    out.extend(0u32.to_le_bytes());
    out.extend(2u32.to_le_bytes());
    out.extend((records.len() as u32).to_le_bytes());
    out.extend(rec_offset.to_le_bytes());
    out.extend(words_offset.to_le_bytes());
    out.extend(0x18u32.to_le_bytes());
    out.extend(0u32.to_le_bytes());
    out.extend(0u32.to_le_bytes());
    for (i, (page_id, item_id, _)) in records.iter().enumerate() {
        out.extend(page_id.to_le_bytes());
        out.push(*item_id);
        out.push(0); // item_type
        out.extend(0u16.to_le_bytes());
        out.extend(text_offsets[i].to_le_bytes());
        for _ in 0..3 {
            out.extend(0u32.to_le_bytes());
        }
    }
    out.extend(pool);
    out
}
