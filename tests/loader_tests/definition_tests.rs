//! Tests for table definition parsing
//!
//! These tests verify:
//! - Parsing of the `name;count;names;lengths` line
//! - Rejection of malformed lines
//! - Table creation under the data directory

use std::fs;

use recfile::loader::TableDefinition;
use recfile::{Config, FieldInfo, RecFileError};
use tempfile::TempDir;

#[test]
fn test_parse_definition() {
    let def = TableDefinition::parse("students;3;id;name;dept;4;10;6").unwrap();

    assert_eq!(def.name, "students");
    assert_eq!(
        def.fields,
        vec![
            FieldInfo::new("id", 4),
            FieldInfo::new("name", 10),
            FieldInfo::new("dept", 6),
        ]
    );
}

#[test]
fn test_parse_trims_whitespace() {
    let def = TableDefinition::parse("  t ; 2 ; a ; b ; 1 ; 2  ").unwrap();

    assert_eq!(def.name, "t");
    assert_eq!(def.fields, vec![FieldInfo::new("a", 1), FieldInfo::new("b", 2)]);
}

#[test]
fn test_parse_rejects_too_few_parts() {
    assert!(matches!(
        TableDefinition::parse("students;1"),
        Err(RecFileError::Parse { line: 1, .. })
    ));
}

#[test]
fn test_parse_rejects_count_mismatch() {
    assert!(matches!(
        TableDefinition::parse("students;3;id;name;4;10"),
        Err(RecFileError::Parse { .. })
    ));
}

#[test]
fn test_parse_rejects_bad_numbers() {
    assert!(matches!(
        TableDefinition::parse("students;two;id;name;4;10"),
        Err(RecFileError::Parse { .. })
    ));
    assert!(matches!(
        TableDefinition::parse("students;2;id;name;4;wide"),
        Err(RecFileError::Parse { .. })
    ));
}

#[test]
fn test_parse_rejects_huge_field_count() {
    let line = format!("t;{};a;4", usize::MAX);

    assert!(matches!(
        TableDefinition::parse(&line),
        Err(RecFileError::Parse { line: 1, .. })
    ));
}

#[test]
fn test_parse_rejects_empty() {
    assert!(matches!(
        TableDefinition::parse("   "),
        Err(RecFileError::Parse { .. })
    ));
}

#[test]
fn test_from_file_and_create() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("students.txt");
    fs::write(&config_path, "students;2;id;name;4;10\nignored second line\n").unwrap();

    let config = Config::builder().data_dir(temp_dir.path().join("data")).build();
    let def = TableDefinition::from_file(&config_path).unwrap();
    let (heap, meta) = def.create(&config).unwrap();

    assert_eq!(heap.path(), config.table_path("students"));
    assert!(heap.path().exists());
    assert_eq!(heap.read_header().unwrap(), meta);
}

#[test]
fn test_create_rejects_zero_length_field() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().data_dir(temp_dir.path()).build();

    let def = TableDefinition::parse("t;1;id;0").unwrap();
    assert!(matches!(def.create(&config), Err(RecFileError::Config(_))));
}
