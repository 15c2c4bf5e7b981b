//! Heap File
//!
//! A schema header in block 0 plus a singly-linked chain of fixed-size
//! records appended after it.
//!
//! ## Responsibilities
//! - Write and read the schema header
//! - Append records with a bump allocator (no free list, no reuse)
//! - Link each new record behind the current tail
//! - Field scans and search-key range scans over the chain
//!
//! ## Insertion cost
//! There is no cached tail pointer: every insert walks the chain from the
//! head to find the tail, so inserting N records one by one is O(N^2) in
//! total. The on-disk format has no slot for a tail pointer.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{RecFileError, Result};

use super::codec;
use super::file::StorageFile;
use super::iterator::{ChainIterator, FieldScan, RangeScan};
use super::types::{FieldInfo, Metadata, Record, RecordAddress};
use super::{ADDRESS_SIZE, BLOCK_SIZE};

/// Handle to a heap file on disk.
///
/// Holds only the path; every operation opens the file, does its work,
/// and releases the handle before returning (scans release on drop).
#[derive(Debug, Clone)]
pub struct HeapFile {
    path: PathBuf,
}

impl HeapFile {
    /// Refer to an existing heap file
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a heap file with an empty chain, replacing any existing file
    pub fn create(path: impl Into<PathBuf>, fields: Vec<FieldInfo>) -> Result<(Self, Metadata)> {
        let heap = Self { path: path.into() };
        let meta = Metadata::new(fields)?;

        let mut file = StorageFile::create(&heap.path)?;
        heap.write_header_to(&mut file, &meta)?;
        file.sync()?;

        info!(
            path = %heap.path.display(),
            fields = meta.field_count(),
            record_size = meta.record_size(),
            "created heap file"
        );
        Ok((heap, meta))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Header
    // =========================================================================

    /// Serialize `meta` into block 0, overwriting any existing header
    pub fn write_header(&self, meta: &Metadata) -> Result<()> {
        let mut file = StorageFile::open_for_read_write(&self.path)?;
        self.write_header_to(&mut file, meta)
    }

    /// Read and decode block 0
    pub fn read_header(&self) -> Result<Metadata> {
        let mut file = StorageFile::open_for_read(&self.path)?;
        self.read_header_from(&mut file)
    }

    fn write_header_to(&self, file: &mut StorageFile, meta: &Metadata) -> Result<()> {
        let bytes = codec::encode_header(meta).map_err(|e| RecFileError::Config(e.to_string()))?;
        file.write_at(0, &bytes)?;
        debug!(path = %self.path.display(), head = ?meta.head, "wrote header");
        Ok(())
    }

    fn read_header_from(&self, file: &mut StorageFile) -> Result<Metadata> {
        let len = file.len()?;
        if len < BLOCK_SIZE as u64 {
            return Err(RecFileError::corrupt_header(
                &self.path,
                format!("file is {} bytes, shorter than one {}-byte block", len, BLOCK_SIZE),
            ));
        }

        let bytes = file.read_at(0, BLOCK_SIZE)?;
        codec::decode_header(&bytes).map_err(|e| RecFileError::corrupt_header(&self.path, e.to_string()))
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Append a record to the end of the chain.
    ///
    /// The new record lands at end-of-file, or at offset 0 of the next block
    /// when it would cross a block boundary. An empty chain gets its head
    /// pointer set in the header; otherwise the tail's next pointer is
    /// rewritten. `meta.head` is updated in place when the chain was empty.
    pub fn insert_record(&self, meta: &mut Metadata, record: Record) -> Result<RecordAddress> {
        let mut file = StorageFile::open_for_read_write(&self.path)?;

        // Encode first so a bad value count fails before anything is written
        let mut record = record;
        record.next = None;
        let bytes = codec::encode_record(&record, &meta.fields)
            .map_err(|e| RecFileError::Config(e.to_string()))?;

        let address = RecordAddress::next_append(file.len()?, meta.record_size());

        match meta.head {
            None => {
                meta.head = Some(address);
                file.write_at(0, &codec::encode_address(meta.head))?;
            }
            Some(head) => {
                let tail = self.find_tail(&mut file, meta, head)?;
                file.write_at(tail.byte_offset(), &codec::encode_address(Some(address)))?;
            }
        }

        file.write_at(address.byte_offset(), &bytes)?;

        debug!(path = %self.path.display(), %address, "inserted record");
        Ok(address)
    }

    /// Direct read of the record at `address`.
    ///
    /// `address` must come from the header or a chain pointer; any other
    /// value reads whatever bytes happen to be there.
    pub fn read_record(&self, meta: &Metadata, address: RecordAddress) -> Result<Record> {
        let mut file = StorageFile::open_for_read(&self.path)?;
        let bytes = file.read_at(address.byte_offset(), meta.record_size())?;
        codec::decode_record(&bytes, &meta.fields).map_err(|e| {
            RecFileError::corrupt_chain(&self.path, format!("record at {}: {}", address, e))
        })
    }

    /// Follow next pointers from `head` until the sentinel
    fn find_tail(
        &self,
        file: &mut StorageFile,
        meta: &Metadata,
        head: RecordAddress,
    ) -> Result<RecordAddress> {
        let limit = file.len()?.div_ceil(BLOCK_SIZE as u64)
            * (BLOCK_SIZE / meta.record_size()) as u64;

        let mut current = head;
        let mut steps = 0u64;

        loop {
            let bytes = file.read_at(current.byte_offset(), ADDRESS_SIZE)?;
            let next = codec::decode_next_pointer(&bytes).map_err(|e| {
                RecFileError::corrupt_chain(&self.path, format!("record at {}: {}", current, e))
            })?;

            match next {
                None => return Ok(current),
                Some(next) => current = next,
            }

            steps += 1;
            if steps > limit {
                return Err(RecFileError::corrupt_chain(
                    &self.path,
                    format!("more than {} records reachable; chain loops", limit),
                ));
            }
        }
    }

    // =========================================================================
    // Scans
    // =========================================================================

    /// Lazily walk every record from the head
    pub fn scan(&self) -> Result<ChainIterator> {
        let mut file = StorageFile::open_for_read(&self.path)?;
        let meta = self.read_header_from(&mut file)?;
        debug!(path = %self.path.display(), head = ?meta.head, "starting chain scan");
        ChainIterator::new(file, meta)
    }

    /// Lazily yield `(address, value)` of `field_name` for every record.
    ///
    /// The name is matched case-insensitively against the schema.
    pub fn search_field(&self, field_name: &str) -> Result<FieldScan> {
        let chain = self.scan()?;
        let index = chain
            .metadata()
            .field_index(field_name)
            .ok_or_else(|| RecFileError::FieldNotFound {
                path: self.path.clone(),
                field: field_name.to_string(),
            })?;

        Ok(FieldScan::new(chain, index))
    }

    /// Lazily yield records whose search key lies in `[min_key, max_key]`.
    ///
    /// The chain must already be ascending by field 0 for the result to be
    /// the full matching range; nothing here sorts or verifies that.
    pub fn search_records_by_key_range(&self, min_key: &str, max_key: &str) -> Result<RangeScan> {
        let chain = self.scan()?;
        Ok(RangeScan::new(chain, min_key.to_string(), max_key.to_string()))
    }
}
