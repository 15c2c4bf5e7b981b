//! Configuration for RecFile
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a RecFile workspace
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all table files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── students.dat     (one heap file per table)
    ///     └── joined.dat       (join outputs land here too)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Bulk Load Configuration
    // -------------------------------------------------------------------------
    /// Accept batches whose search keys repeat (join test data only)
    pub allow_duplicate_keys: bool,

    // -------------------------------------------------------------------------
    // Join Configuration
    // -------------------------------------------------------------------------
    /// Fixed width given to every field of a join output file (bytes).
    /// Longer values are truncated.
    pub join_field_width: u32,

    /// Max rows shown per side when a validation finds differences
    pub validation_preview_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./recfile_data"),
            allow_duplicate_keys: false,
            join_field_width: 32,
            validation_preview_limit: 10,
        }
    }
}

impl Config {
    /// File extension used for table files
    pub const TABLE_EXTENSION: &'static str = "dat";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Resolve a table name to its file path inside `data_dir`
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", table, Self::TABLE_EXTENSION))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all table files)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Allow or reject duplicate search keys during bulk load
    pub fn allow_duplicate_keys(mut self, allow: bool) -> Self {
        self.config.allow_duplicate_keys = allow;
        self
    }

    /// Set the per-field width of join output files
    pub fn join_field_width(mut self, width: u32) -> Self {
        self.config.join_field_width = width;
        self
    }

    /// Set how many differing rows a validation report keeps per side
    pub fn validation_preview_limit(mut self, limit: usize) -> Self {
        self.config.validation_preview_limit = limit;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
