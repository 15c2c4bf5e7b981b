//! # RecFile
//!
//! A small record-oriented file engine with:
//! - Fixed 1024-byte blocks holding fixed-layout records
//! - A schema header in block 0 rooting a singly-linked record chain
//! - Field scans and search-key range scans over the chain
//! - A sort-merge join that persists its result as another record file
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        recfile-cli                           │
//! │      (create / insert / search / schema / join / validate)   │
//! └───────────────┬─────────────────────────────┬───────────────┘
//!                 │                             │
//!                 ▼                             ▼
//!   ┌──────────────────────────┐   ┌──────────────────────────┐
//!   │          Loader          │   │           Join           │
//!   │ (definition, bulk load)  │   │ (sources, merge, driver) │
//!   └─────────────┬────────────┘   └─────────────┬────────────┘
//!                 │                              │
//!                 └──────────────┬───────────────┘
//!                                ▼
//!                       ┌─────────────────┐
//!                       │    HeapFile     │
//!                       │ (header, chain) │
//!                       └────────┬────────┘
//!                                │
//!                   ┌────────────┴────────────┐
//!                   ▼                         ▼
//!            ┌─────────────┐          ┌─────────────┐
//!            │    Codec    │          │ StorageFile │
//!            │   (pure)    │          │ (block I/O) │
//!            └─────────────┘          └─────────────┘
//! ```
//!
//! Single-threaded and synchronous. One writer at a time; concurrent use
//! of the same file can lose a tail-pointer update.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod loader;
pub mod join;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RecFileError, Result};
pub use config::Config;
pub use storage::{FieldInfo, HeapFile, Metadata, Record, RecordAddress};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of RecFile
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
