//! Mapped-library list from `/proc/<pid>/maps`-format text.
//!
//! ```text
//! 7f1c2a000000-7f1c2a022000 r--p 00000000 fd:01 1835082   /usr/lib/x86_64-linux-gnu/libc.so.6
//! ```

use crate::error::{Result, ScanError};
use crate::types::MappedLibrary;
use rustc_hash::FxHashSet;
use std::path::Path;

const DELETED_SUFFIX: &str = " (deleted)";

/// Parse mapping lines into one [`MappedLibrary`] per distinct shared-object
/// path, in first-seen order and initial (unclassified) state.
///
/// Anonymous, pseudo (`[heap]`, `[vdso]`) and non-`.so` file mappings are
/// skipped. More than `max` libraries is rejected.
pub fn parse_maps(text: &str, max: usize) -> Result<Vec<MappedLibrary>> {
    let mut seen = FxHashSet::default();
    let mut libs = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let Some(path) = parse_line(line).map_err(|reason| ScanError::maps(line_no, reason))? else {
            continue;
        };
        if !is_shared_object(path) || !seen.insert(path) {
            continue;
        }
        if libs.len() == max {
            return Err(ScanError::maps(line_no, format!("more than {} mapped libraries", max)));
        }
        libs.push(MappedLibrary::new(path));
    }

    tracing::debug!("{} mapped libraries read", libs.len());
    Ok(libs)
}

/// Read and parse a mapping list file.
pub fn read_maps(path: &Path, max: usize) -> Result<Vec<MappedLibrary>> {
    let text = std::fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
    parse_maps(&text, max)
}

/// The file path of a file-backed mapping, or `None` for anonymous ones.
fn parse_line(line: &str) -> std::result::Result<Option<&str>, String> {
    let mut rest = line.trim_start();
    let mut fields = [""; 5];
    for (i, field) in fields.iter_mut().enumerate() {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        if end == 0 {
            return Err(format!("expected 5 fields before the path, found {}", i));
        }
        *field = &rest[..end];
        rest = rest[end..].trim_start();
    }
    let [range, perms, offset, dev, inode] = fields;

    if !range.split_once('-').is_some_and(|(lo, hi)| is_hex(lo) && is_hex(hi)) {
        return Err(format!("bad address range {:?}", range));
    }
    if perms.len() != 4 {
        return Err(format!("bad permissions {:?}", perms));
    }
    if !is_hex(offset) {
        return Err(format!("bad offset {:?}", offset));
    }
    if !dev.contains(':') {
        return Err(format!("bad device {:?}", dev));
    }
    let inode: u64 = inode.parse().map_err(|_| format!("bad inode {:?}", inode))?;

    let path = rest.trim_end();
    let path = path.strip_suffix(DELETED_SUFFIX).unwrap_or(path);
    if inode == 0 || !path.starts_with('/') {
        return Ok(None);
    }
    Ok(Some(path))
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_shared_object(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|name| name.contains(".so"))
}
