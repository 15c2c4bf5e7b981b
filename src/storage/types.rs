//! Storage types
//!
//! Schema, record, and address types shared by the codec, the heap file,
//! and the join output path.

use std::fmt;

use crate::error::{RecFileError, Result};

use super::{BLOCK_SIZE, FIELD_NAME_SIZE, MAX_FIELDS, NULL_BITMAP_BITS, RECORD_PREFIX_SIZE};

// =============================================================================
// Record Address
// =============================================================================

/// Location of a record: block number plus byte offset inside that block.
///
/// "No record" is `Option::<RecordAddress>::None`; the `(-1, -1)` pair only
/// exists in the on-disk encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordAddress {
    pub block: u32,
    pub offset: u32,
}

impl RecordAddress {
    pub fn new(block: u32, offset: u32) -> Self {
        Self { block, offset }
    }

    /// Absolute byte position of this address in the file
    pub fn byte_offset(&self) -> u64 {
        self.block as u64 * BLOCK_SIZE as u64 + self.offset as u64
    }

    /// Where a record of `record_size` bytes goes when appended to a file
    /// of `file_len` bytes.
    ///
    /// Records never straddle a block boundary: if the tail of the last
    /// block is too small, allocation rolls to offset 0 of the next block.
    pub fn next_append(file_len: u64, record_size: usize) -> Self {
        let block_size = BLOCK_SIZE as u64;
        let block = file_len / block_size;
        let offset = file_len % block_size;

        if offset + record_size as u64 > block_size {
            Self::new((block + 1) as u32, 0)
        } else {
            Self::new(block as u32, offset as u32)
        }
    }
}

impl fmt::Display for RecordAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block:{} Offset:{}", self.block, self.offset)
    }
}

// =============================================================================
// Schema
// =============================================================================

/// A named fixed-width field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Field name (at most 16 bytes of UTF-8, compared case-insensitively)
    pub name: String,
    /// Stored width in bytes
    pub length: u32,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, length: u32) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }

    /// Case-insensitive name match
    pub fn matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// Schema header stored in block 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Address of the first record, `None` while the chain is empty
    pub head: Option<RecordAddress>,
    /// Positional field list
    pub fields: Vec<FieldInfo>,
}

impl Metadata {
    /// Build a validated schema with an empty chain
    pub fn new(fields: Vec<FieldInfo>) -> Result<Self> {
        validate_fields(&fields)?;
        Ok(Self { head: None, fields })
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Serialized size of one record under this schema
    pub fn record_size(&self) -> usize {
        record_size(&self.fields)
    }

    /// Position of a field by case-insensitive name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.matches(name))
    }

    /// Field names in positional order
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

/// `8 (next pointer) + 1 (null bitmap) + sum of field widths`
pub fn record_size(fields: &[FieldInfo]) -> usize {
    RECORD_PREFIX_SIZE + fields.iter().map(|f| f.length as usize).sum::<usize>()
}

fn validate_fields(fields: &[FieldInfo]) -> Result<()> {
    if fields.is_empty() {
        return Err(RecFileError::Config("schema needs at least one field".to_string()));
    }

    if fields.len() > MAX_FIELDS {
        return Err(RecFileError::Config(format!(
            "{} fields do not fit in a {}-byte header (max {})",
            fields.len(),
            BLOCK_SIZE,
            MAX_FIELDS
        )));
    }

    for (i, field) in fields.iter().enumerate() {
        if field.name.is_empty() {
            return Err(RecFileError::Config(format!("field {} has an empty name", i)));
        }
        if field.name.len() > FIELD_NAME_SIZE {
            return Err(RecFileError::Config(format!(
                "field name '{}' exceeds {} bytes",
                field.name, FIELD_NAME_SIZE
            )));
        }
        if field.length == 0 {
            return Err(RecFileError::Config(format!(
                "field '{}' must have a positive length",
                field.name
            )));
        }
        if fields[..i].iter().any(|prev| prev.matches(&field.name)) {
            return Err(RecFileError::Config(format!(
                "duplicate field name '{}'",
                field.name
            )));
        }
    }

    let size = record_size(fields);
    if size > BLOCK_SIZE {
        return Err(RecFileError::Config(format!(
            "record size {} exceeds block size {}",
            size, BLOCK_SIZE
        )));
    }

    Ok(())
}

// =============================================================================
// Records
// =============================================================================

/// One bit per field; a set bit means the field is null.
///
/// Only the first 8 fields can be flagged; the on-disk bitmap is one byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullBitmap(u8);

impl NullBitmap {
    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_null(&self, index: usize) -> bool {
        index < NULL_BITMAP_BITS && (self.0 >> index) & 1 == 1
    }

    /// Flag a field as null. Returns false if the index has no bit.
    pub fn set(&mut self, index: usize) -> bool {
        if index >= NULL_BITMAP_BITS {
            return false;
        }
        self.0 |= 1 << index;
        true
    }
}

/// A decoded record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Address of the following record, `None` at the tail
    pub next: Option<RecordAddress>,
    /// One value per field; `None` is a null field, `Some("")` a blank one
    pub values: Vec<Option<String>>,
}

impl Record {
    /// A fresh tail record
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { next: None, values }
    }

    /// Convenience constructor for records without nulls
    pub fn from_strs(values: &[&str]) -> Self {
        Self::new(values.iter().map(|v| Some(v.to_string())).collect())
    }

    /// Bitmap derived from which values are `None`
    pub fn null_bitmap(&self) -> NullBitmap {
        let mut bitmap = NullBitmap::default();
        for (i, value) in self.values.iter().enumerate() {
            if value.is_none() {
                bitmap.set(i);
            }
        }
        bitmap
    }

    /// Value at a position, `None` when null or out of range
    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    /// Field 0
    pub fn search_key(&self) -> Option<&str> {
        self.value(0)
    }
}
