//! Bulk loader
//!
//! Reads a batch of records from a data file, sorts it by search key,
//! rejects duplicate keys, and appends the batch to a heap file.
//!
//! ## Data File Format
//! ```text
//! label,v1;v2;v3|v1;v2;v3|...
//! ```
//! Everything before the first comma is ignored. Records are separated by
//! `|`, values by `;`. An empty value or `null` (any case) is a null field.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use crate::error::{RecFileError, Result};
use crate::storage::{HeapFile, Record};

/// Outcome of a successful bulk load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkLoadSummary {
    /// Records appended to the chain
    pub inserted: usize,
    /// Smallest search key in the batch
    pub min_key: Option<String>,
    /// Largest search key in the batch
    pub max_key: Option<String>,
}

/// Loads record batches into one heap file
pub struct BulkLoader {
    heap: HeapFile,
    allow_duplicate_keys: bool,
}

impl BulkLoader {
    pub fn new(heap: HeapFile) -> Self {
        Self {
            heap,
            allow_duplicate_keys: false,
        }
    }

    /// Skip the duplicate search key check
    pub fn allow_duplicate_keys(mut self, allow: bool) -> Self {
        self.allow_duplicate_keys = allow;
        self
    }

    /// Parse a data file and insert its records
    pub fn load_file(&self, data_path: &Path) -> Result<BulkLoadSummary> {
        let file = File::open(data_path).map_err(|e| RecFileError::io(data_path, e))?;
        let field_count = self.heap.read_header()?.field_count();
        let records = parse_batch(BufReader::new(file), data_path, field_count)?;
        self.insert_batch(records)
    }

    /// Sort, validate, and insert a batch.
    ///
    /// Either every record is inserted or, on a duplicate key, none is.
    pub fn insert_batch(&self, mut records: Vec<Record>) -> Result<BulkLoadSummary> {
        let mut meta = self.heap.read_header()?;

        records.sort_by(|a, b| a.search_key().cmp(&b.search_key()));

        if !self.allow_duplicate_keys {
            self.check_duplicates(&records)?;
        }

        for record in &records {
            self.heap.insert_record(&mut meta, record.clone())?;
        }

        let summary = BulkLoadSummary {
            inserted: records.len(),
            min_key: records.first().and_then(|r| r.search_key()).map(str::to_string),
            max_key: records.last().and_then(|r| r.search_key()).map(str::to_string),
        };

        info!(
            path = %self.heap.path().display(),
            inserted = summary.inserted,
            "bulk load complete"
        );
        Ok(summary)
    }

    /// Reject keys repeated inside the sorted batch or already stored
    fn check_duplicates(&self, sorted: &[Record]) -> Result<()> {
        for pair in sorted.windows(2) {
            if pair[0].search_key() == pair[1].search_key() {
                return Err(duplicate(pair[0].search_key()));
            }
        }

        let mut stored = HashSet::new();
        for item in self.heap.scan()? {
            let (_, record) = item?;
            if let Some(key) = record.search_key() {
                stored.insert(key.to_string());
            }
        }

        match sorted
            .iter()
            .find(|r| r.search_key().is_some_and(|k| stored.contains(k)))
        {
            Some(record) => Err(duplicate(record.search_key())),
            None => Ok(()),
        }
    }
}

fn duplicate(key: Option<&str>) -> RecFileError {
    RecFileError::DuplicateKeyBatch {
        key: key.unwrap_or_default().to_string(),
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse every record in a data file.
///
/// Blank lines are skipped; lines without a comma are logged and skipped.
pub fn parse_batch<R: BufRead>(reader: R, source: &Path, field_count: usize) -> Result<Vec<Record>> {
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| RecFileError::io(source, e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((_, data)) = line.split_once(',') else {
            warn!(line = line_no, content = %line, "skipping record line without a comma");
            continue;
        };

        for raw in data.trim().split('|') {
            records.push(parse_record(raw, field_count, line_no)?);
        }
    }

    Ok(records)
}

/// Parse one `;`-separated record.
///
/// Missing trailing values are null; a null search key is an error.
pub fn parse_record(raw: &str, field_count: usize, line: usize) -> Result<Record> {
    let parts: Vec<&str> = raw.split(';').map(str::trim).collect();
    if parts.len() > field_count {
        return Err(RecFileError::Parse {
            line,
            reason: format!("record has {} values, schema has {} fields", parts.len(), field_count),
        });
    }

    let mut values: Vec<Option<String>> = parts
        .iter()
        .map(|v| {
            if v.is_empty() || v.eq_ignore_ascii_case("null") {
                None
            } else {
                Some(v.to_string())
            }
        })
        .collect();
    values.resize(field_count, None);

    if values.first().map_or(true, Option::is_none) {
        return Err(RecFileError::Parse {
            line,
            reason: format!("record '{}' has a null search key", raw.trim()),
        });
    }

    Ok(Record::new(values))
}
