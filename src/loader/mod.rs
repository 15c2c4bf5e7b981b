//! Loader Module
//!
//! Gets data into heap files.
//!
//! ## Responsibilities
//! - Parse table definitions and create empty heap files
//! - Parse bulk data files into records
//! - Sort batches by search key and reject duplicate keys before inserting

mod bulk;
mod definition;

pub use bulk::{parse_batch, parse_record, BulkLoadSummary, BulkLoader};
pub use definition::TableDefinition;
