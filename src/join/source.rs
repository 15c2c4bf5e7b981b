//! Row sources
//!
//! The merge join consumes rows from a `SortedRowSource`: anything that can
//! report its column names and hand back its rows ordered by one column.
//! A relational database, a CSV export, or another heap file all fit.

use tracing::debug;

use crate::error::Result;
use crate::storage::HeapFile;

/// One input row; `None` is a SQL-style null
pub type Row = Vec<Option<String>>;

/// Boxed stream of rows from a source
pub type RowStream<'a> = Box<dyn Iterator<Item = Result<Row>> + 'a>;

/// A source of rows that can be produced in key order
pub trait SortedRowSource {
    /// Column names in positional order
    fn columns(&self) -> &[String];

    /// Rows ascending by the column at `key_index` (nulls first)
    fn sorted_rows(&mut self, key_index: usize) -> Result<RowStream<'_>>;
}

/// Concatenated form of a row used for set comparisons: values joined
/// with `|`, nulls rendered as empty strings
pub fn row_key(row: &[Option<String>]) -> String {
    row.iter()
        .map(|v| v.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("|")
}

fn sort_by_column(rows: &mut [Row], key_index: usize) {
    rows.sort_by(|a, b| {
        let ka = a.get(key_index).and_then(|v| v.as_deref());
        let kb = b.get(key_index).and_then(|v| v.as_deref());
        ka.cmp(&kb)
    });
}

// =============================================================================
// In-memory source
// =============================================================================

/// Rows held in memory; sorted on demand
#[derive(Debug, Clone, Default)]
pub struct MemoryRowSource {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl MemoryRowSource {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Build from string literals; `"null"` is not special here
    pub fn from_strs(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|v| Some(v.to_string())).collect())
                .collect(),
        }
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }
}

impl SortedRowSource for MemoryRowSource {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn sorted_rows(&mut self, key_index: usize) -> Result<RowStream<'_>> {
        sort_by_column(&mut self.rows, key_index);
        Ok(Box::new(self.rows.iter().cloned().map(Ok)))
    }
}

// =============================================================================
// Heap file source
// =============================================================================

/// Reads a stored table as a join input.
///
/// Columns come from the schema header; rows are the full chain sorted in
/// memory by the key column.
pub struct HeapFileSource {
    heap: HeapFile,
    columns: Vec<String>,
}

impl HeapFileSource {
    pub fn open(heap: HeapFile) -> Result<Self> {
        let columns = heap.read_header()?.field_names();
        Ok(Self { heap, columns })
    }
}

impl SortedRowSource for HeapFileSource {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn sorted_rows(&mut self, key_index: usize) -> Result<RowStream<'_>> {
        let mut rows = Vec::new();
        for item in self.heap.scan()? {
            let (_, record) = item?;
            rows.push(record.values);
        }
        sort_by_column(&mut rows, key_index);

        debug!(path = %self.heap.path().display(), rows = rows.len(), "loaded join input");
        Ok(Box::new(rows.into_iter().map(Ok)))
    }
}
