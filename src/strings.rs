//! Literal library-name candidates in read-only data.
//!
//! Reflective loaders and some injectors reference their payload library only
//! as plain data. This scanner is an independent signal; it does not take part
//! in the classifier's verdicts.

use crate::elf_sections::ElfSections;
use crate::error::{Result, ScanError};
use crate::file_io::map_file;
use std::path::Path;

/// Initial number of candidate slots; doubled whenever it runs out.
const INITIAL_CAPACITY: usize = 1024;

const LIBRARY_MARKER: &str = ".so";

/// Collect every NUL-terminated run in `data` that contains `.so`.
///
/// Candidates come back in scan order and duplicates are kept. A trailing run
/// without a terminating NUL is not a string and is ignored.
pub fn extract_library_name_strings(data: &[u8]) -> Result<Vec<String>> {
    let mut candidates: Vec<String> = Vec::new();
    candidates
        .try_reserve_exact(INITIAL_CAPACITY)
        .map_err(|e| ScanError::allocation(format!("candidate list: {}", e)))?;

    let mut start = 0;
    for (i, &byte) in data.iter().enumerate() {
        if byte != 0 {
            continue;
        }
        let run = String::from_utf8_lossy(&data[start..i]);
        start = i + 1;
        if !run.contains(LIBRARY_MARKER) {
            continue;
        }
        if candidates.len() == candidates.capacity() {
            let grow_by = candidates.capacity();
            candidates
                .try_reserve_exact(grow_by)
                .map_err(|e| ScanError::allocation(format!("candidate list: {}", e)))?;
            tracing::debug!("candidate list grown to {} slots", candidates.capacity());
        }
        candidates.push(run.into_owned());
    }

    Ok(candidates)
}

/// Run the scanner over a named section of an executable (usually `.rodata`).
///
/// An executable without that section has no candidates.
pub fn section_library_candidates(exe_path: &Path, section: &str) -> Result<Vec<String>> {
    let data = map_file(exe_path)?;
    let sections = ElfSections::parse(exe_path, data.as_slice())?;
    match sections.find(section)? {
        Some(shdr) => extract_library_name_strings(sections.section_data(shdr)?),
        None => Ok(Vec::new()),
    }
}

/// Candidates from `.rodata`.
pub fn rodata_library_candidates(exe_path: &Path) -> Result<Vec<String>> {
    section_library_candidates(exe_path, ".rodata")
}
