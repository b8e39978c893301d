//! Read-only whole-file mappings.
//!
//! The executable under inspection is mapped once per scan and the mapping is
//! dropped when the returned `FileData` goes out of scope.

use crate::error::{Result, ScanError};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// File contents, either memory-mapped or owned.
pub enum FileData {
    /// Memory-mapped file
    Mapped(Mmap),
    /// Owned data (zero-length files cannot be mapped)
    Owned(Vec<u8>),
}

impl FileData {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            FileData::Mapped(mmap) => mmap,
            FileData::Owned(vec) => vec,
        }
    }
}

/// Map a file read-only in its entirety.
pub fn map_file(path: &Path) -> Result<FileData> {
    let file = File::open(path).map_err(|e| ScanError::io(path, e))?;
    let metadata = file.metadata().map_err(|e| ScanError::io(path, e))?;

    if metadata.len() == 0 {
        return Ok(FileData::Owned(Vec::new()));
    }

    // The mapping is private and read-only; a concurrent truncation of the
    // file is outside what a post-mortem scan can guard against.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| ScanError::io(path, e))?;
    tracing::debug!(
        "Memory-mapped {} ({:.2} KB)",
        path.display(),
        metadata.len() as f64 / 1024.0
    );
    Ok(FileData::Mapped(mmap))
}
