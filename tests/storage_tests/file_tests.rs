//! Tests for StorageFile
//!
//! These tests verify:
//! - Positioned reads and writes
//! - File growth when writing past the end
//! - I/O failures carry the offending path

use std::path::PathBuf;

use recfile::storage::StorageFile;
use recfile::RecFileError;
use tempfile::TempDir;

fn setup_temp_file() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("blocks.dat");
    (temp_dir, path)
}

#[test]
fn test_write_then_read_at_offset() {
    let (_temp, path) = setup_temp_file();

    let mut file = StorageFile::create(&path).unwrap();
    file.write_at(0, b"header").unwrap();
    file.write_at(1024, b"record").unwrap();

    assert_eq!(file.read_at(0, 6).unwrap(), b"header");
    assert_eq!(file.read_at(1024, 6).unwrap(), b"record");
}

#[test]
fn test_write_past_end_extends_file() {
    let (_temp, path) = setup_temp_file();

    let mut file = StorageFile::create(&path).unwrap();
    assert!(file.is_empty().unwrap());

    file.write_at(2048, &[7u8; 10]).unwrap();
    assert_eq!(file.len().unwrap(), 2058);

    // The gap reads back as zeros
    assert_eq!(file.read_at(1000, 4).unwrap(), vec![0u8; 4]);
}

#[test]
fn test_reopen_read_only_sees_data() {
    let (_temp, path) = setup_temp_file();

    {
        let mut file = StorageFile::create(&path).unwrap();
        file.write_at(10, b"persisted").unwrap();
        file.sync().unwrap();
    }

    let mut file = StorageFile::open_for_read(&path).unwrap();
    assert_eq!(file.read_at(10, 9).unwrap(), b"persisted");
}

#[test]
fn test_short_read_is_io_error() {
    let (_temp, path) = setup_temp_file();

    let mut file = StorageFile::create(&path).unwrap();
    file.write_at(0, b"tiny").unwrap();

    match file.read_at(0, 100) {
        Err(RecFileError::Io { path: err_path, source }) => {
            assert_eq!(err_path, path);
            assert_eq!(source.kind(), std::io::ErrorKind::UnexpectedEof);
        }
        other => panic!("Expected Io error, got {:?}", other),
    }
}

#[test]
fn test_open_missing_file_reports_path() {
    let (_temp, path) = setup_temp_file();

    match StorageFile::open_for_read_write(&path) {
        Err(RecFileError::Io { path: err_path, .. }) => assert_eq!(err_path, path),
        other => panic!("Expected Io error, got {:?}", other),
    }
}

#[test]
fn test_create_truncates_existing() {
    let (_temp, path) = setup_temp_file();

    {
        let mut file = StorageFile::create(&path).unwrap();
        file.write_at(0, &[1u8; 500]).unwrap();
    }

    let file = StorageFile::create(&path).unwrap();
    assert_eq!(file.len().unwrap(), 0);
}
