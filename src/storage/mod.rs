//! Storage Module
//!
//! Block-addressed heap files holding a linked chain of fixed-layout records.
//!
//! ## Responsibilities
//! - Encode/decode the schema header and records (pure codec)
//! - Positioned block I/O on a single file
//! - Append-only record insertion and chain traversal
//! - Field scans and search-key range scans
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Block 0: Header (1024 bytes)                            │
//! │   HeadBlock: i32 | HeadOffset: i32 | FieldCount: i32    │
//! │   [Name: 16 bytes | Length: i32] * FieldCount           │
//! │   (head = (-1, -1) while the chain is empty)            │
//! ├─────────────────────────────────────────────────────────┤
//! │ Block 1..N: Records, packed, never crossing a block     │
//! │   NextBlock: i32 | NextOffset: i32 | NullBitmap: u8     │
//! │   [Value: field length bytes, space padded] * fields    │
//! │   (next = (-1, -1) marks the tail)                      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//! All integers are big-endian.

pub mod codec;
mod file;
mod heap;
mod iterator;
mod types;

pub use codec::CodecError;
pub use file::StorageFile;
pub use heap::HeapFile;
pub use iterator::{ChainIterator, FieldHit, FieldScan, RangeHit, RangeScan};
pub use types::{record_size, FieldInfo, Metadata, NullBitmap, Record, RecordAddress};

// =============================================================================
// Shared Constants (used by codec, heap, iterators)
// =============================================================================

/// Size of one allocation block in bytes
pub const BLOCK_SIZE: usize = 1024;

/// Fixed width of a field name in the header
pub const FIELD_NAME_SIZE: usize = 16;

/// Encoded `(block, offset)` pair: two i32s
pub const ADDRESS_SIZE: usize = 8;

/// Head pointer (8) + field count (4)
pub const HEADER_PREFIX_SIZE: usize = ADDRESS_SIZE + 4;

/// Name (16) + length (4) per field in the header
pub const FIELD_ENTRY_SIZE: usize = FIELD_NAME_SIZE + 4;

/// Most fields a one-block header can describe
pub const MAX_FIELDS: usize = (BLOCK_SIZE - HEADER_PREFIX_SIZE) / FIELD_ENTRY_SIZE;

/// Next pointer (8) + null bitmap (1)
pub const RECORD_PREFIX_SIZE: usize = ADDRESS_SIZE + 1;

/// Fields addressable by the one-byte null bitmap
pub const NULL_BITMAP_BITS: usize = 8;

/// On-disk value of both halves of the "no record" address
pub(crate) const NO_ADDRESS: i32 = -1;
