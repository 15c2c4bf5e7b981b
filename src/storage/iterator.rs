//! Chain iterators
//!
//! Lazy walks over the record chain. Each iterator owns its file handle,
//! which is released when the iterator is dropped.
//!
//! ```text
//! START ──▶ head? ──None──▶ DONE
//!             │
//!           Some(addr)
//!             ▼
//!        READ RECORD ──▶ EMIT ──▶ next? ──None──▶ DONE
//!             ▲                     │
//!             └──────Some(addr)─────┘
//! ```

use tracing::warn;

use crate::error::{RecFileError, Result};

use super::codec;
use super::file::StorageFile;
use super::types::{Metadata, Record, RecordAddress};
use super::BLOCK_SIZE;

// =============================================================================
// Full chain walk
// =============================================================================

/// Iterator over every `(address, record)` in chain order
pub struct ChainIterator {
    file: StorageFile,
    meta: Metadata,
    /// Address of the next record to read, `None` once the tail is passed
    next: Option<RecordAddress>,
    /// Records emitted so far
    visited: u64,
    /// Most records the file could physically hold; more means a cycle
    limit: u64,
}

impl ChainIterator {
    pub(super) fn new(file: StorageFile, meta: Metadata) -> Result<Self> {
        let record_size = meta.record_size() as u64;
        let per_block = BLOCK_SIZE as u64 / record_size;
        let blocks = file.len()?.div_ceil(BLOCK_SIZE as u64);

        Ok(Self {
            next: meta.head,
            file,
            meta,
            visited: 0,
            limit: blocks * per_block,
        })
    }

    /// Schema the records are decoded with
    pub fn metadata(&self) -> &Metadata {
        &self.meta
    }

    fn read_next(&mut self, address: RecordAddress) -> Result<Record> {
        if self.visited >= self.limit {
            return Err(RecFileError::corrupt_chain(
                self.file.path(),
                format!("more than {} records reachable; chain loops", self.limit),
            ));
        }

        let bytes = self
            .file
            .read_at(address.byte_offset(), self.meta.record_size())?;
        let record = codec::decode_record(&bytes, &self.meta.fields).map_err(|e| {
            RecFileError::corrupt_chain(self.file.path(), format!("record at {}: {}", address, e))
        })?;

        self.visited += 1;
        Ok(record)
    }
}

impl Iterator for ChainIterator {
    type Item = Result<(RecordAddress, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        let address = self.next?;

        match self.read_next(address) {
            Ok(record) => {
                self.next = record.next;
                Some(Ok((address, record)))
            }
            Err(e) => {
                // Stop after the first failure
                self.next = None;
                Some(Err(e))
            }
        }
    }
}

// =============================================================================
// Field scan
// =============================================================================

/// One row of a field scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHit {
    pub address: RecordAddress,
    /// `None` when the field is null in this record
    pub value: Option<String>,
}

impl FieldHit {
    /// Value as shown to users: null prints as `null`
    pub fn display_value(&self) -> &str {
        self.value.as_deref().unwrap_or("null")
    }
}

/// Projects one field out of every record in the chain
pub struct FieldScan {
    chain: ChainIterator,
    field_index: usize,
}

impl FieldScan {
    pub(super) fn new(chain: ChainIterator, field_index: usize) -> Self {
        Self { chain, field_index }
    }

    pub fn field_index(&self) -> usize {
        self.field_index
    }
}

impl Iterator for FieldScan {
    type Item = Result<FieldHit>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.chain.next()?;
        Some(item.map(|(address, mut record)| FieldHit {
            address,
            value: record.values.swap_remove(self.field_index),
        }))
    }
}

// =============================================================================
// Range scan
// =============================================================================

/// One record whose search key fell inside the range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeHit {
    pub address: RecordAddress,
    pub record: Record,
}

/// Filters the chain on field 0 lying in `[min, max]`.
///
/// Assumes the chain is ascending by field 0; nothing is sorted here. An
/// out-of-order key is logged once and the walk carries on, so an unsorted
/// chain yields whatever matches in chain order.
pub struct RangeScan {
    chain: ChainIterator,
    min: String,
    max: String,
    last_key: Option<String>,
    warned_unsorted: bool,
}

impl RangeScan {
    pub(super) fn new(chain: ChainIterator, min: String, max: String) -> Self {
        Self {
            chain,
            min,
            max,
            last_key: None,
            warned_unsorted: false,
        }
    }

    fn check_order(&mut self, key: &str) {
        if let Some(last) = &self.last_key {
            if key < last.as_str() && !self.warned_unsorted {
                warn!(
                    path = %self.chain.file.path().display(),
                    previous = %last,
                    current = %key,
                    "range scan over a chain not sorted by search key"
                );
                self.warned_unsorted = true;
            }
        }
        self.last_key = Some(key.to_string());
    }
}

impl Iterator for RangeScan {
    type Item = Result<RangeHit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (address, record) = match self.chain.next()? {
                Ok(item) => item,
                Err(e) => return Some(Err(e)),
            };

            // Null search keys never fall inside a range
            let Some(key) = record.search_key() else {
                continue;
            };
            let key = key.to_string();
            self.check_order(&key);

            if key.as_str() >= self.min.as_str() && key.as_str() <= self.max.as_str() {
                return Some(Ok(RangeHit { address, record }));
            }
        }
    }
}
