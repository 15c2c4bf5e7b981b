//! Join Module
//!
//! Sort-merge equality join between two key-ordered row sources.
//!
//! ## Responsibilities
//! - Merge two sorted inputs, grouping runs of equal keys
//! - Skip null keys on either side
//! - Persist distinct joined rows into a new heap file
//! - Validate the merge result against a reference result set
//!
//! ## Data Flow
//! ```text
//!   left source ──sorted──┐
//!                         ├──▶ SortMergeJoin ──▶ dedup ──▶ HeapFile
//!   right source ─sorted──┘          │
//!                                    └──▶ set compare ◀── reference rows
//! ```

mod driver;
mod merge;
mod source;

pub use driver::{output_schema, JoinDriver, JoinSummary, MergeRows, ValidationReport};
pub use merge::{key_index, SortMergeJoin};
pub use source::{row_key, HeapFileSource, MemoryRowSource, Row, RowStream, SortedRowSource};
