//! Loader-API symbol detection in the on-disk executable.
//!
//! This is a structural presence check on `.dynsym`, not a call trace: a
//! referenced-but-never-called `dlopen` still counts, and a loader reached
//! through an internal entry point (e.g. `__libc_dlopen_mode`) does not.

use crate::elf_sections::{string_at, ElfSections};
use crate::error::{Result, ScanError};
use crate::file_io::map_file;
use std::path::Path;
use tracing::{debug, info, warn};

/// Symbol the classifier looks for unless configured otherwise.
pub const DEFAULT_LOADER_SYMBOL: &str = "dlopen";

/// Report whether the executable at `exe_path` has a dynamic symbol named
/// `symbol`.
///
/// The file is mapped for the duration of the call only. An executable with
/// no `.dynsym` section (static or stripped) yields `Ok(false)`.
pub fn loader_symbol_present(exe_path: &Path, symbol: &str) -> Result<bool> {
    let data = map_file(exe_path)?;
    let sections = ElfSections::parse(exe_path, data.as_slice())?;
    dynsym_contains(&sections, symbol)
}

/// Scan `.dynsym` of an already parsed image for `symbol`.
pub fn dynsym_contains(sections: &ElfSections<'_>, symbol: &str) -> Result<bool> {
    let path = sections.path();

    let Some(dynsym) = sections.find(".dynsym")? else {
        warn!(exe = %path.display(), "no .dynsym section, treating {} as absent", symbol);
        return Ok(false);
    };
    let dynstr = sections.find(".dynstr")?.ok_or_else(|| {
        ScanError::format(path, ".dynsym present without a .dynstr section")
    })?;

    let strings = sections.section_data(dynstr)?;
    let symtab = sections.symbols(dynsym)?;
    debug!(
        exe = %path.display(),
        sections = sections.headers().len(),
        "scanning {} dynamic symbols",
        symtab.len()
    );

    for sym in symtab.iter() {
        let name = string_at(strings, sym.st_name).ok_or_else(|| {
            ScanError::format(
                path,
                format!(
                    "symbol name offset {:#x} outside .dynstr ({:#x} bytes)",
                    sym.st_name,
                    strings.len()
                ),
            )
        })?;
        if name == symbol.as_bytes() {
            info!(exe = %path.display(), symbol, "loader API symbol referenced");
            return Ok(true);
        }
    }
    Ok(false)
}
