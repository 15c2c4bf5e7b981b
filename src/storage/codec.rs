//! Binary codec
//!
//! Pure encode/decode of the fixed-width header and record layouts.
//! Nothing here touches a file; callers hand in byte slices.
//!
//! All integers are 4-byte big-endian signed. Text is UTF-8, truncated to
//! the declared width on a character boundary.

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

use super::types::{record_size, FieldInfo, Metadata, NullBitmap, Record, RecordAddress};
use super::{
    ADDRESS_SIZE, BLOCK_SIZE, FIELD_ENTRY_SIZE, FIELD_NAME_SIZE, HEADER_PREFIX_SIZE, MAX_FIELDS,
    NO_ADDRESS,
};

/// Failures of the pure codec; the heap file attaches the path
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer too short: need {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    #[error("header with {fields} fields needs {needed} bytes, block holds {}", BLOCK_SIZE)]
    HeaderOverflow { fields: usize, needed: usize },

    #[error("field count {0} outside 1..={}", MAX_FIELDS)]
    FieldCount(i32),

    #[error("field '{name}' has non-positive length {length}")]
    FieldLength { name: String, length: i32 },

    #[error("invalid address ({block}, {offset})")]
    Address { block: i32, offset: i32 },

    #[error("record has {got} values, schema has {expected} fields")]
    ValueCount { expected: usize, got: usize },
}

// =============================================================================
// Addresses
// =============================================================================

/// Encode an optional address; `None` becomes the `(-1, -1)` sentinel
pub fn encode_address(address: Option<RecordAddress>) -> [u8; ADDRESS_SIZE] {
    let (block, offset) = match address {
        Some(a) => (a.block as i32, a.offset as i32),
        None => (NO_ADDRESS, NO_ADDRESS),
    };

    let mut out = [0u8; ADDRESS_SIZE];
    out[0..4].copy_from_slice(&block.to_be_bytes());
    out[4..8].copy_from_slice(&offset.to_be_bytes());
    out
}

/// Decode a raw `(block, offset)` pair
pub fn decode_address(block: i32, offset: i32) -> Result<Option<RecordAddress>, CodecError> {
    match (block, offset) {
        (NO_ADDRESS, NO_ADDRESS) => Ok(None),
        (b, o) if b >= 0 && o >= 0 && (o as usize) < BLOCK_SIZE => {
            Ok(Some(RecordAddress::new(b as u32, o as u32)))
        }
        (b, o) => Err(CodecError::Address { block: b, offset: o }),
    }
}

/// Decode just the next-pointer at the front of a record
pub fn decode_next_pointer(bytes: &[u8]) -> Result<Option<RecordAddress>, CodecError> {
    ensure_len(bytes, ADDRESS_SIZE)?;
    let mut buf = bytes;
    let block = buf.get_i32();
    let offset = buf.get_i32();
    decode_address(block, offset)
}

// =============================================================================
// Header
// =============================================================================

/// Encode a schema header into one full block.
///
/// ```text
/// [head block: i32][head offset: i32][field count: i32]
/// ([name: 16 bytes, NUL padded][length: i32]) * field count
/// [zero fill up to BLOCK_SIZE]
/// ```
pub fn encode_header(meta: &Metadata) -> Result<Vec<u8>, CodecError> {
    let needed = HEADER_PREFIX_SIZE + meta.fields.len() * FIELD_ENTRY_SIZE;
    if needed > BLOCK_SIZE {
        return Err(CodecError::HeaderOverflow {
            fields: meta.fields.len(),
            needed,
        });
    }

    let mut buf = BytesMut::with_capacity(BLOCK_SIZE);
    buf.put_slice(&encode_address(meta.head));
    buf.put_i32(meta.fields.len() as i32);

    for field in &meta.fields {
        put_fixed(&mut buf, &field.name, FIELD_NAME_SIZE, 0);
        buf.put_i32(field.length as i32);
    }

    buf.resize(BLOCK_SIZE, 0);
    Ok(buf.to_vec())
}

/// Decode a schema header, trimming padding from field names
pub fn decode_header(bytes: &[u8]) -> Result<Metadata, CodecError> {
    ensure_len(bytes, HEADER_PREFIX_SIZE)?;

    let mut buf = bytes;
    let head_block = buf.get_i32();
    let head_offset = buf.get_i32();
    let count = buf.get_i32();

    if count <= 0 || count as usize > MAX_FIELDS {
        return Err(CodecError::FieldCount(count));
    }
    ensure_len(bytes, HEADER_PREFIX_SIZE + count as usize * FIELD_ENTRY_SIZE)?;

    let mut fields = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = decode_name(&buf[..FIELD_NAME_SIZE]);
        buf.advance(FIELD_NAME_SIZE);
        let length = buf.get_i32();
        if length <= 0 {
            return Err(CodecError::FieldLength { name, length });
        }
        fields.push(FieldInfo::new(name, length as u32));
    }

    Ok(Metadata {
        head: decode_address(head_block, head_offset)?,
        fields,
    })
}

// =============================================================================
// Records
// =============================================================================

/// Encode a record under a schema.
///
/// Null values are written as all spaces; their bit is set when the field
/// index fits in the one-byte bitmap.
pub fn encode_record(record: &Record, fields: &[FieldInfo]) -> Result<Vec<u8>, CodecError> {
    if record.values.len() != fields.len() {
        return Err(CodecError::ValueCount {
            expected: fields.len(),
            got: record.values.len(),
        });
    }

    let mut buf = BytesMut::with_capacity(record_size(fields));
    buf.put_slice(&encode_address(record.next));
    buf.put_u8(record.null_bitmap().bits());

    for (value, field) in record.values.iter().zip(fields) {
        put_fixed(&mut buf, value.as_deref().unwrap_or(""), field.length as usize, b' ');
    }

    Ok(buf.to_vec())
}

/// Decode a record; values lose trailing whitespace, null bits become `None`
pub fn decode_record(bytes: &[u8], fields: &[FieldInfo]) -> Result<Record, CodecError> {
    ensure_len(bytes, record_size(fields))?;

    let mut buf = bytes;
    let block = buf.get_i32();
    let offset = buf.get_i32();
    let bitmap = NullBitmap::from_bits(buf.get_u8());

    let mut values = Vec::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        let width = field.length as usize;
        let raw = &buf[..width];
        buf.advance(width);

        if bitmap.is_null(i) {
            values.push(None);
        } else {
            values.push(Some(String::from_utf8_lossy(raw).trim_end().to_string()));
        }
    }

    Ok(Record {
        next: decode_address(block, offset)?,
        values,
    })
}

// =============================================================================
// Helpers
// =============================================================================

fn ensure_len(bytes: &[u8], needed: usize) -> Result<(), CodecError> {
    if bytes.len() < needed {
        return Err(CodecError::Truncated {
            needed,
            got: bytes.len(),
        });
    }
    Ok(())
}

/// Write `value` into exactly `width` bytes, padding with `pad`
fn put_fixed(buf: &mut BytesMut, value: &str, width: usize, pad: u8) {
    let bytes = truncate_utf8(value, width);
    buf.put_slice(bytes);
    buf.put_bytes(pad, width - bytes.len());
}

/// Longest prefix of `value` that fits in `width` bytes without splitting a char
fn truncate_utf8(value: &str, width: usize) -> &[u8] {
    if value.len() <= width {
        return value.as_bytes();
    }
    let mut end = width;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value.as_bytes()[..end]
}

fn decode_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}
