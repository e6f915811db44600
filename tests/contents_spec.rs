mod common;

use common::{deflate, make_block, make_rsc_idx, make_rsc_map};
use monokakido_reader::{MmapSource, MonokakidoError, Rsc};

/// Two segments, three blocks: blocks A and B in segment 0, block C in
/// segment 1. Entries are sub-slices of the block payloads.
struct Store {
    idx: Option<Vec<u8>>,
    map: Vec<u8>,
    segments: Vec<Vec<u8>>,
}

fn two_segment_store() -> Store {
    let payload_a = b"first entry|second entry".to_vec();
    let payload_b = b"third entry".to_vec();
    let payload_c = b"fourth entry in its own segment".to_vec();

    let block_a = make_block(&payload_a);
    let block_b = make_block(&payload_b);
    let block_c = make_block(&payload_c);

    let segment0 = [block_a.clone(), block_b.clone()].concat();
    let segment1 = block_c;

    let block_b_offset = block_a.len() as u32;
    let block_c_offset = segment0.len() as u32;

    // Map positions: 0 and 1 inside block A, 2 in block B, 3 in block C.
    let map = make_rsc_map(&[
        (0, 0),
        (0, 12),
        (block_b_offset, 0),
        (block_c_offset, 0),
    ]);
    // Ids are deliberately not in sorted order.
    let idx = make_rsc_idx(&[(700, 2), (100, 0), (300, 1), (500, 3)]);

    Store {
        idx: Some(idx),
        map,
        segments: vec![segment0, segment1],
    }
}

fn open(store: Store) -> Rsc<Vec<u8>> {
    Rsc::open(store.idx, store.map, store.segments).unwrap()
}

#[test]
fn segment_resolution_uses_prefix_sums() {
    let rsc = Rsc::open(
        None,
        make_rsc_map(&[]),
        vec![vec![0u8; 1000], vec![0u8; 1000]],
    )
    .unwrap();

    assert_eq!(rsc.resolve_segment(0).unwrap(), (0, 0));
    assert_eq!(rsc.resolve_segment(999).unwrap(), (0, 999));
    assert_eq!(rsc.resolve_segment(1000).unwrap(), (1, 0));
    assert_eq!(rsc.resolve_segment(1500).unwrap(), (1, 500));
    assert!(matches!(
        rsc.resolve_segment(2000),
        Err(MonokakidoError::OutOfBounds { .. })
    ));
}

#[test]
fn fetch_slices_payload_at_entry_offset() {
    let rsc = open(two_segment_store());

    // Entry length is not stored at this layer; fetch returns from the
    // entry offset to the payload end.
    assert_eq!(rsc.fetch(100).unwrap(), b"first entry|second entry");
    assert_eq!(rsc.fetch(300).unwrap(), b"second entry");
    assert_eq!(rsc.fetch(700).unwrap(), b"third entry");
    assert_eq!(rsc.fetch(500).unwrap(), b"fourth entry in its own segment");
}

#[test]
fn fetch_is_idempotent() {
    let rsc = open(two_segment_store());
    let first = rsc.fetch(300).unwrap();
    let second = rsc.fetch(300).unwrap();
    let third = rsc.fetch(300).unwrap();
    assert_eq!(first, second);
    assert_eq!(second, third);
}

#[test]
fn unknown_content_id_is_not_found() {
    let rsc = open(two_segment_store());
    assert!(matches!(
        rsc.fetch(999),
        Err(MonokakidoError::NotFound(_))
    ));
}

#[test]
fn missing_idx_means_identity_mapping() {
    let mut store = two_segment_store();
    store.idx = None;
    let rsc = open(store);

    assert_eq!(rsc.len(), 4);
    assert_eq!(rsc.fetch(1).unwrap(), b"second entry");
    assert_eq!(rsc.fetch(3).unwrap(), b"fourth entry in its own segment");
    assert!(matches!(rsc.fetch(4), Err(MonokakidoError::NotFound(_))));
}

#[test]
fn get_by_index_walks_logical_order() {
    let store = two_segment_store();
    let rsc = open(store);

    // idx rows: (700,2) (100,0) (300,1) (500,3) — rows 0 and 2 disagree
    // with their own position and are not addressable by position.
    assert!(matches!(
        rsc.get_by_index(0),
        Err(MonokakidoError::NotFound(_))
    ));
    let (id, bytes) = rsc.get_by_index(3).unwrap();
    assert_eq!(id, 500);
    assert_eq!(bytes, b"fourth entry in its own segment");
    assert!(matches!(
        rsc.get_by_index(9),
        Err(MonokakidoError::NotFound(_))
    ));
}

#[test]
fn truncated_block_is_corrupt_not_garbage() {
    let payload = b"a payload long enough that truncation breaks the stream";
    let block = make_block(payload);
    let compressed_len = u32::from_le_bytes(block[..4].try_into().unwrap());

    // Keep the length prefix honest but cut the zlib stream short.
    let cut = 4 + compressed_len as usize / 2;
    let mut segment = ((cut - 4) as u32).to_le_bytes().to_vec();
    segment.extend(&block[4..cut]);

    let rsc = Rsc::open(None, make_rsc_map(&[(0, 0)]), vec![segment]).unwrap();
    assert!(matches!(
        rsc.fetch(0),
        Err(MonokakidoError::CorruptBlock { .. })
    ));
}

#[test]
fn declared_length_mismatch_is_corrupt() {
    // Inflates fine, but the embedded declaration lies about the size.
    let payload = b"payload";
    let mut body = (payload.len() as u32 + 3).to_le_bytes().to_vec();
    body.extend_from_slice(payload);
    let compressed = deflate(&body);
    let mut segment = (compressed.len() as u32).to_le_bytes().to_vec();
    segment.extend(compressed);

    let rsc = Rsc::open(None, make_rsc_map(&[(0, 0)]), vec![segment]).unwrap();
    assert!(matches!(
        rsc.fetch(0),
        Err(MonokakidoError::CorruptBlock { .. })
    ));
}

#[test]
fn block_length_past_segment_end_is_out_of_bounds() {
    let mut segment = 4096u32.to_le_bytes().to_vec();
    segment.extend([0u8; 8]);
    let rsc = Rsc::open(None, make_rsc_map(&[(0, 0)]), vec![segment]).unwrap();
    assert!(matches!(
        rsc.fetch(0),
        Err(MonokakidoError::OutOfBounds { .. })
    ));
}

#[test]
fn query_errors_do_not_poison_the_reader() {
    let rsc = open(two_segment_store());
    assert!(rsc.fetch(999).is_err());
    // A failed lookup leaves the handle fully usable.
    assert_eq!(rsc.fetch(100).unwrap(), b"first entry|second entry");
}

#[test]
fn opens_from_memory_mapped_files() {
    let store = two_segment_store();
    let dir = tempfile::tempdir().unwrap();
    let mut paths = Vec::new();
    for (name, bytes) in [
        ("contents.idx", store.idx.as_ref().unwrap()),
        ("contents.map", &store.map),
        ("contents-001.rsc", &store.segments[0]),
        ("contents-002.rsc", &store.segments[1]),
    ] {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        paths.push(path);
    }

    let rsc = Rsc::open(
        Some(MmapSource::open(&paths[0]).unwrap()),
        MmapSource::open(&paths[1]).unwrap(),
        vec![
            MmapSource::open(&paths[2]).unwrap(),
            MmapSource::open(&paths[3]).unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(rsc.fetch(300).unwrap(), b"second entry");
}
