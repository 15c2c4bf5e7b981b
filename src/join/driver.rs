//! Join driver
//!
//! Runs the merge join between two row sources and either persists the
//! result as a new heap file or compares it with a reference result set.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Config;
use crate::error::{RecFileError, Result};
use crate::storage::{FieldInfo, HeapFile, Record, FIELD_NAME_SIZE};

use super::merge::{key_index, SortMergeJoin};
use super::source::{row_key, Row, RowStream, SortedRowSource};

/// Merge join over two boxed row streams
pub type MergeRows<'a> = SortMergeJoin<RowStream<'a>, RowStream<'a>>;

/// Outcome of a persisted join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSummary {
    /// File the result was written to
    pub output: PathBuf,
    /// Output schema, left columns then new right columns
    pub fields: Vec<FieldInfo>,
    /// Rows produced by the merge, before deduplication
    pub rows_joined: usize,
    /// Rows written to the output file
    pub rows_persisted: usize,
}

impl JoinSummary {
    pub fn duplicates_skipped(&self) -> usize {
        self.rows_joined - self.rows_persisted
    }
}

/// Set comparison between the merge join and a reference result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Distinct rows in the reference
    pub reference_count: usize,
    /// Distinct rows produced by the merge join
    pub merge_count: usize,
    /// Rows only in the reference (total)
    pub only_in_reference_count: usize,
    /// Rows only in the merge result (total)
    pub only_in_merge_count: usize,
    /// First rows only in the reference, capped at the preview limit
    pub only_in_reference: Vec<String>,
    /// First rows only in the merge result, capped at the preview limit
    pub only_in_merge: Vec<String>,
    /// Every distinct reference row, ascending
    pub reference_rows: Vec<String>,
    /// Every distinct merge-join row, ascending
    pub merged_rows: Vec<String>,
}

impl ValidationReport {
    /// Both result sets hold exactly the same rows
    pub fn is_match(&self) -> bool {
        self.only_in_reference_count == 0 && self.only_in_merge_count == 0
    }
}

/// Drives merge joins with the configured output width and preview cap
pub struct JoinDriver {
    field_width: u32,
    preview_limit: usize,
}

impl JoinDriver {
    pub fn new(config: &Config) -> Self {
        Self {
            field_width: config.join_field_width,
            preview_limit: config.validation_preview_limit,
        }
    }

    /// Resolve the key on both sides and start the merge.
    ///
    /// Fails with `SchemaMismatch` before any rows are read if either side
    /// lacks the key column. A row whose width differs from its source's
    /// column list surfaces as a `SchemaMismatch` item.
    pub fn merge_rows<'a>(
        &self,
        left: &'a mut dyn SortedRowSource,
        right: &'a mut dyn SortedRowSource,
        key: &str,
    ) -> Result<MergeRows<'a>> {
        let left_key = key_index(left.columns(), key)?;
        let right_key = key_index(right.columns(), key)?;

        let left_width = left.columns().len();
        let right_width = right.columns().len();

        Ok(SortMergeJoin::new(
            checked_width(left.sorted_rows(left_key)?, left_width, "left"),
            left_key,
            checked_width(right.sorted_rows(right_key)?, right_width, "right"),
            right_key,
        ))
    }

    /// Join two sources on `key` and write distinct result rows to `output`.
    ///
    /// The output schema is every left column followed by each right column
    /// whose name is not already taken (case-insensitive); every field gets
    /// the configured fixed width, so longer values are truncated. Column
    /// names are cut to 16 bytes. An existing file at `output` is replaced.
    pub fn execute(
        &self,
        left: &mut dyn SortedRowSource,
        right: &mut dyn SortedRowSource,
        key: &str,
        output: &Path,
    ) -> Result<JoinSummary> {
        // Resolve before touching the output file
        key_index(left.columns(), key)?;
        key_index(right.columns(), key)?;

        let (fields, right_keep) = output_schema(left.columns(), right.columns(), self.field_width);
        let left_width = left.columns().len();

        let (heap, mut meta) = HeapFile::create(output, fields)?;

        let mut seen = HashSet::new();
        let mut rows_joined = 0;
        let mut rows_persisted = 0;

        for row in self.merge_rows(left, right, key)? {
            let row = row?;
            rows_joined += 1;

            if !seen.insert(row_key(&row)) {
                continue;
            }

            let projected = project(row, left_width, &right_keep);
            heap.insert_record(&mut meta, Record::new(projected))?;
            rows_persisted += 1;
        }

        info!(
            output = %output.display(),
            rows_joined,
            rows_persisted,
            "merge join complete"
        );

        Ok(JoinSummary {
            output: output.to_path_buf(),
            fields: meta.fields,
            rows_joined,
            rows_persisted,
        })
    }

    /// Compare the merge join with a reference result set.
    ///
    /// Both sides are reduced to sets of concatenated rows; the report
    /// carries both cardinalities and the symmetric differences.
    pub fn validate<I>(
        &self,
        reference: I,
        left: &mut dyn SortedRowSource,
        right: &mut dyn SortedRowSource,
        key: &str,
    ) -> Result<ValidationReport>
    where
        I: IntoIterator<Item = Row>,
    {
        let reference: BTreeSet<String> = reference.into_iter().map(|r| row_key(&r)).collect();

        let mut merged = BTreeSet::new();
        for row in self.merge_rows(left, right, key)? {
            merged.insert(row_key(&row?));
        }

        let only_in_reference: Vec<&String> = reference.difference(&merged).collect();
        let only_in_merge: Vec<&String> = merged.difference(&reference).collect();

        let report = ValidationReport {
            reference_count: reference.len(),
            merge_count: merged.len(),
            only_in_reference_count: only_in_reference.len(),
            only_in_merge_count: only_in_merge.len(),
            only_in_reference: preview(&only_in_reference, self.preview_limit),
            only_in_merge: preview(&only_in_merge, self.preview_limit),
            reference_rows: reference.iter().cloned().collect(),
            merged_rows: merged.iter().cloned().collect(),
        };

        info!(
            reference = report.reference_count,
            merge = report.merge_count,
            matched = report.is_match(),
            "join validation complete"
        );
        Ok(report)
    }
}

/// Output fields plus the indices of right columns that survive.
///
/// Names longer than a header slot are cut on a character boundary before
/// the collision check, so two right columns sharing a 16-byte prefix
/// collapse into the first.
pub fn output_schema(left: &[String], right: &[String], width: u32) -> (Vec<FieldInfo>, Vec<usize>) {
    let mut fields: Vec<FieldInfo> = left
        .iter()
        .map(|c| FieldInfo::new(fit_name(c), width))
        .collect();
    let mut keep = Vec::new();

    for (i, column) in right.iter().enumerate() {
        let name = fit_name(column);
        if !fields.iter().any(|f| f.matches(name)) {
            fields.push(FieldInfo::new(name, width));
            keep.push(i);
        }
    }

    (fields, keep)
}

/// Longest prefix of `name` that fits a header name slot
fn fit_name(name: &str) -> &str {
    if name.len() <= FIELD_NAME_SIZE {
        return name;
    }
    let mut end = FIELD_NAME_SIZE;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Reject rows whose width disagrees with the source's column list
fn checked_width<'a>(rows: RowStream<'a>, width: usize, side: &'static str) -> RowStream<'a> {
    Box::new(rows.map(move |row| {
        let row = row?;
        if row.len() != width {
            return Err(RecFileError::SchemaMismatch(format!(
                "{} row has {} values, source declares {} columns",
                side,
                row.len(),
                width
            )));
        }
        Ok(row)
    }))
}

/// Drop right-side columns whose names the left side already holds
fn project(mut row: Row, left_width: usize, right_keep: &[usize]) -> Row {
    let right = row.split_off(left_width);
    row.extend(right_keep.iter().map(|&i| right[i].clone()));
    row
}

fn preview(rows: &[&String], limit: usize) -> Vec<String> {
    rows.iter().take(limit).map(|r| r.to_string()).collect()
}
