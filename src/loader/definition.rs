//! Table definitions
//!
//! Parses the one-line table configuration used to create a heap file:
//!
//! ```text
//! fileName;fieldCount;name1;...;nameN;len1;...;lenN
//! ```

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::error::{RecFileError, Result};
use crate::storage::{FieldInfo, HeapFile, Metadata};

/// A table name plus its positional field list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: String,
    pub fields: Vec<FieldInfo>,
}

impl TableDefinition {
    /// Parse a configuration line
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Err(parse_error("configuration line is empty"));
        }

        let parts: Vec<&str> = line.split(';').map(str::trim).collect();
        if parts.len() < 3 {
            return Err(parse_error(
                "expected fileName;fieldCount;fieldName...;fieldLength...",
            ));
        }

        let name = parts[0];
        if name.is_empty() {
            return Err(parse_error("file name is empty"));
        }

        let field_count: usize = parts[1]
            .parse()
            .map_err(|_| parse_error(format!("invalid field count '{}'", parts[1])))?;

        let expected = field_count
            .checked_mul(2)
            .and_then(|n| n.checked_add(2))
            .ok_or_else(|| parse_error(format!("field count {} is too large", field_count)))?;
        if parts.len() != expected {
            return Err(parse_error(format!(
                "field count {} needs {} parts, got {}",
                field_count,
                expected,
                parts.len()
            )));
        }

        let names = &parts[2..2 + field_count];
        let lengths = &parts[2 + field_count..];

        let fields = names
            .iter()
            .zip(lengths)
            .map(|(name, length)| {
                let length: u32 = length.parse().map_err(|_| {
                    parse_error(format!("invalid length '{}' for field '{}'", length, name))
                })?;
                Ok(FieldInfo::new(*name, length))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            fields,
        })
    }

    /// Parse the first line of a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| RecFileError::io(path, e))?;
        Self::parse(contents.lines().next().unwrap_or(""))
    }

    /// Create the table's heap file under `config.data_dir`
    pub fn create(&self, config: &Config) -> Result<(HeapFile, Metadata)> {
        fs::create_dir_all(&config.data_dir).map_err(|e| RecFileError::io(&config.data_dir, e))?;

        let path = config.table_path(&self.name);
        let created = HeapFile::create(&path, self.fields.clone())?;

        info!(table = %self.name, path = %path.display(), "table created");
        Ok(created)
    }
}

fn parse_error(reason: impl Into<String>) -> RecFileError {
    RecFileError::Parse {
        line: 1,
        reason: reason.into(),
    }
}
