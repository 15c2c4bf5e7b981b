//! Storage file
//!
//! Positioned reads and writes on a single file. The handle lives exactly
//! as long as the `StorageFile` value, so dropping it (on success or on an
//! early `?` return) releases the descriptor.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{RecFileError, Result};

/// An open file plus the path it was opened from (for error context)
#[derive(Debug)]
pub struct StorageFile {
    path: PathBuf,
    file: File,
}

impl StorageFile {
    /// Open an existing file read-only
    pub fn open_for_read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| RecFileError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Open an existing file for reading and writing
    pub fn open_for_read_write(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| RecFileError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Create (or truncate) a file for reading and writing
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| RecFileError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// A short file is an I/O failure (`UnexpectedEof`).
    pub fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.file.read_exact(&mut buf))
            .map_err(|e| RecFileError::io(&self.path, e))?;
        Ok(buf)
    }

    /// Write all of `bytes` at `offset`, extending the file if needed
    pub fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.file.write_all(bytes))
            .map_err(|e| RecFileError::io(&self.path, e))
    }

    /// Current file length in bytes
    pub fn len(&self) -> Result<u64> {
        self.file
            .metadata()
            .map(|m| m.len())
            .map_err(|e| RecFileError::io(&self.path, e))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Flush file contents to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file
            .sync_all()
            .map_err(|e| RecFileError::io(&self.path, e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
