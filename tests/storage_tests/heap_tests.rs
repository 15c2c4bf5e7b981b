//! Tests for HeapFile
//!
//! These tests verify:
//! - Header creation, persistence, and corruption detection
//! - Chain integrity after many inserts
//! - Block allocation never splits a record
//! - Field scans and key range scans
//! - Detection of looping or broken chains

use std::path::PathBuf;

use recfile::storage::codec::encode_address;
use recfile::storage::{
    FieldInfo, HeapFile, Metadata, Record, RecordAddress, StorageFile, BLOCK_SIZE,
};
use recfile::RecFileError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn student_fields() -> Vec<FieldInfo> {
    vec![
        FieldInfo::new("id", 4),
        FieldInfo::new("name", 10),
        FieldInfo::new("dept", 6),
    ]
}

fn setup_temp_heap() -> (TempDir, HeapFile, Metadata) {
    let temp_dir = TempDir::new().unwrap();
    let (heap, meta) = HeapFile::create(temp_dir.path().join("students.dat"), student_fields()).unwrap();
    (temp_dir, heap, meta)
}

/// Insert `count` records with zero-padded ascending keys
fn insert_numbered(heap: &HeapFile, meta: &mut Metadata, count: usize) -> Vec<RecordAddress> {
    (0..count)
        .map(|i| {
            let key = format!("{:04}", i);
            let name = format!("name{}", i);
            heap.insert_record(meta, Record::from_strs(&[key.as_str(), name.as_str(), "CS"])).unwrap()
        })
        .collect()
}

fn scan_keys(heap: &HeapFile) -> Vec<String> {
    heap.scan()
        .unwrap()
        .map(|item| item.unwrap().1.search_key().unwrap().to_string())
        .collect()
}

// =============================================================================
// Header Tests
// =============================================================================

#[test]
fn test_create_writes_full_header_block() {
    let (_temp, heap, meta) = setup_temp_heap();

    let file = StorageFile::open_for_read(heap.path()).unwrap();
    assert_eq!(file.len().unwrap(), BLOCK_SIZE as u64);

    let read = heap.read_header().unwrap();
    assert_eq!(read, meta);
    assert_eq!(read.head, None);
}

#[test]
fn test_create_rejects_invalid_schema() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.dat");

    let result = HeapFile::create(&path, vec![FieldInfo::new("id", 0)]);
    assert!(matches!(result, Err(RecFileError::Config(_))));

    let result = HeapFile::create(&path, vec![FieldInfo::new("id", 4), FieldInfo::new("ID", 4)]);
    assert!(matches!(result, Err(RecFileError::Config(_))));

    let result = HeapFile::create(&path, vec![FieldInfo::new("a_very_long_field_name", 4)]);
    assert!(matches!(result, Err(RecFileError::Config(_))));

    let result = HeapFile::create(&path, vec![FieldInfo::new("blob", BLOCK_SIZE as u32)]);
    assert!(matches!(result, Err(RecFileError::Config(_))));
}

#[test]
fn test_write_header_overwrites() {
    let (_temp, heap, mut meta) = setup_temp_heap();

    meta.head = Some(RecordAddress::new(4, 100));
    heap.write_header(&meta).unwrap();

    assert_eq!(heap.read_header().unwrap().head, Some(RecordAddress::new(4, 100)));
}

#[test]
fn test_read_header_short_file_is_corrupt() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("short.dat");
    {
        let mut file = StorageFile::create(&path).unwrap();
        file.write_at(0, &[0u8; 100]).unwrap();
    }

    let result = HeapFile::open(&path).read_header();
    assert!(matches!(result, Err(RecFileError::CorruptHeader { .. })));
}

#[test]
fn test_read_header_bad_field_count_is_corrupt() {
    let (_temp, heap, _meta) = setup_temp_heap();
    {
        let mut file = StorageFile::open_for_read_write(heap.path()).unwrap();
        file.write_at(8, &51i32.to_be_bytes()).unwrap();
    }

    assert!(matches!(
        heap.read_header(),
        Err(RecFileError::CorruptHeader { .. })
    ));
}

#[test]
fn test_read_header_missing_file_is_io() {
    let temp_dir = TempDir::new().unwrap();
    let path: PathBuf = temp_dir.path().join("missing.dat");

    assert!(matches!(
        HeapFile::open(&path).read_header(),
        Err(RecFileError::Io { .. })
    ));
}

// =============================================================================
// Insertion Tests
// =============================================================================

#[test]
fn test_chain_integrity_after_many_inserts() {
    let (_temp, heap, mut meta) = setup_temp_heap();

    let addresses = insert_numbered(&heap, &mut meta, 100);

    let visited: Vec<(RecordAddress, Record)> = heap.scan().unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(visited.len(), 100);

    // Insertion order, following the addresses handed out
    for (i, (address, record)) in visited.iter().enumerate() {
        assert_eq!(*address, addresses[i]);
        assert_eq!(record.search_key(), Some(format!("{:04}", i).as_str()));
    }

    // Tail points nowhere
    assert_eq!(visited.last().unwrap().1.next, None);
    assert_eq!(heap.read_header().unwrap().head, Some(addresses[0]));
}

#[test]
fn test_records_never_cross_block_boundary() {
    let (_temp, heap, mut meta) = setup_temp_heap();
    let record_size = meta.record_size() as u32;

    let addresses = insert_numbered(&heap, &mut meta, 120);

    for address in &addresses {
        assert!(address.block >= 1, "record in header block: {}", address);
        assert!(address.offset + record_size <= BLOCK_SIZE as u32, "overrun at {}", address);
    }

    // 29-byte records: 35 per block, the 36th starts block 2
    assert_eq!(addresses[34], RecordAddress::new(1, 34 * 29));
    assert_eq!(addresses[35], RecordAddress::new(2, 0));
}

#[test]
fn test_large_records_roll_to_next_block() {
    let temp_dir = TempDir::new().unwrap();
    let (heap, mut meta) = HeapFile::create(
        temp_dir.path().join("wide.dat"),
        vec![FieldInfo::new("k", 4), FieldInfo::new("payload", 487)],
    )
    .unwrap();
    assert_eq!(meta.record_size(), 500);

    let a = heap.insert_record(&mut meta, Record::from_strs(&["a", "x"])).unwrap();
    let b = heap.insert_record(&mut meta, Record::from_strs(&["b", "y"])).unwrap();
    let c = heap.insert_record(&mut meta, Record::from_strs(&["c", "z"])).unwrap();

    assert_eq!(a, RecordAddress::new(1, 0));
    assert_eq!(b, RecordAddress::new(1, 500));
    assert_eq!(c, RecordAddress::new(2, 0));
    assert_eq!(scan_keys(&heap), vec!["a", "b", "c"]);
}

#[test]
fn test_read_record_by_address() {
    let (_temp, heap, mut meta) = setup_temp_heap();

    let addresses = insert_numbered(&heap, &mut meta, 5);
    let record = heap.read_record(&meta, addresses[3]).unwrap();

    assert_eq!(record.values[0].as_deref(), Some("0003"));
    assert_eq!(record.values[1].as_deref(), Some("name3"));
    assert_eq!(record.next, Some(addresses[4]));
}

#[test]
fn test_insert_wrong_value_count_writes_nothing() {
    let (_temp, heap, mut meta) = setup_temp_heap();

    let result = heap.insert_record(&mut meta, Record::from_strs(&["0001"]));
    assert!(matches!(result, Err(RecFileError::Config(_))));

    assert_eq!(meta.head, None);
    assert_eq!(heap.scan().unwrap().count(), 0);
}

// =============================================================================
// Field Search Tests
// =============================================================================

#[test]
fn test_search_field_case_insensitive() {
    let (_temp, heap, mut meta) = setup_temp_heap();
    heap.insert_record(&mut meta, Record::from_strs(&["0001", "Alice", "CS"])).unwrap();
    heap.insert_record(&mut meta, Record::from_strs(&["0002", "Bob", "EE"])).unwrap();

    let values: Vec<String> = heap
        .search_field("NAME")
        .unwrap()
        .map(|hit| hit.unwrap().value.unwrap())
        .collect();

    assert_eq!(values, vec!["Alice", "Bob"]);
}

#[test]
fn test_search_field_reports_null() {
    let (_temp, heap, mut meta) = setup_temp_heap();
    heap.insert_record(
        &mut meta,
        Record::new(vec![Some("0001".to_string()), None, Some("CS".to_string())]),
    )
    .unwrap();

    let hits: Vec<_> = heap.search_field("name").unwrap().map(|h| h.unwrap()).collect();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].value, None);
    assert_eq!(hits[0].display_value(), "null");
    assert_eq!(hits[0].address, RecordAddress::new(1, 0));
}

#[test]
fn test_search_field_unknown() {
    let (_temp, heap, _meta) = setup_temp_heap();

    match heap.search_field("salary") {
        Err(RecFileError::FieldNotFound { field, .. }) => assert_eq!(field, "salary"),
        Err(e) => panic!("Expected FieldNotFound, got {:?}", e),
        Ok(_) => panic!("Expected FieldNotFound"),
    }
}

#[test]
fn test_search_field_empty_chain() {
    let (_temp, heap, _meta) = setup_temp_heap();
    assert_eq!(heap.search_field("id").unwrap().count(), 0);
}

// =============================================================================
// Range Search Tests
// =============================================================================

#[test]
fn test_range_search_inclusive_bounds() {
    let (_temp, heap, mut meta) = setup_temp_heap();
    insert_numbered(&heap, &mut meta, 20);

    let keys: Vec<String> = heap
        .search_records_by_key_range("0005", "0009")
        .unwrap()
        .map(|hit| hit.unwrap().record.search_key().unwrap().to_string())
        .collect();

    assert_eq!(keys, vec!["0005", "0006", "0007", "0008", "0009"]);
}

#[test]
fn test_range_search_no_matches() {
    let (_temp, heap, mut meta) = setup_temp_heap();
    insert_numbered(&heap, &mut meta, 5);

    assert_eq!(heap.search_records_by_key_range("1000", "2000").unwrap().count(), 0);
    // min > max is an empty range, not an error
    assert_eq!(heap.search_records_by_key_range("0004", "0001").unwrap().count(), 0);
}

#[test]
fn test_range_search_returns_full_records() {
    let (_temp, heap, mut meta) = setup_temp_heap();
    insert_numbered(&heap, &mut meta, 3);

    let hit = heap
        .search_records_by_key_range("0001", "0001")
        .unwrap()
        .next()
        .unwrap()
        .unwrap();

    assert_eq!(hit.record.value(1), Some("name1"));
    assert_eq!(hit.record.value(2), Some("CS"));
}

#[test]
fn test_range_search_unsorted_chain_follows_chain_order() {
    let (_temp, heap, mut meta) = setup_temp_heap();
    for key in ["0003", "0001", "0002"] {
        heap.insert_record(&mut meta, Record::from_strs(&[key, "x", "y"])).unwrap();
    }

    let keys: Vec<String> = heap
        .search_records_by_key_range("0001", "0002")
        .unwrap()
        .map(|hit| hit.unwrap().record.search_key().unwrap().to_string())
        .collect();

    assert_eq!(keys, vec!["0001", "0002"]);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_looping_chain_detected() {
    let (_temp, heap, mut meta) = setup_temp_heap();
    let addresses = insert_numbered(&heap, &mut meta, 2);

    // Point the tail back at itself
    {
        let mut file = StorageFile::open_for_read_write(heap.path()).unwrap();
        file.write_at(addresses[1].byte_offset(), &encode_address(Some(addresses[1])))
            .unwrap();
    }

    let results: Vec<_> = heap.scan().unwrap().collect();
    assert!(matches!(
        results.last(),
        Some(Err(RecFileError::CorruptChain { .. }))
    ));

    let insert = heap.insert_record(&mut meta, Record::from_strs(&["9999", "z", "z"]));
    assert!(matches!(insert, Err(RecFileError::CorruptChain { .. })));
}

#[test]
fn test_negative_pointer_detected() {
    let (_temp, heap, mut meta) = setup_temp_heap();
    let addresses = insert_numbered(&heap, &mut meta, 1);

    {
        let mut file = StorageFile::open_for_read_write(heap.path()).unwrap();
        let mut bad = Vec::new();
        bad.extend_from_slice(&(-5i32).to_be_bytes());
        bad.extend_from_slice(&0i32.to_be_bytes());
        file.write_at(addresses[0].byte_offset(), &bad).unwrap();
    }

    let results: Vec<_> = heap.scan().unwrap().collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(RecFileError::CorruptChain { .. })));
}
