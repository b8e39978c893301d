//! Bounds-checked section view over an on-disk ELF image.
//!
//! The executable is attacker-influenced input: every offset and size read
//! from it is checked against the mapped length before it is used, and any
//! violation surfaces as `ScanError::Format`.

use crate::error::{Result, ScanError};
use goblin::container::{Container, Ctx};
use goblin::elf::section_header::{SectionHeader, SHN_UNDEF, SHN_XINDEX, SHT_NOBITS};
use goblin::elf::sym::{sym32, sym64, Symtab};
use goblin::elf::Elf;
use std::path::Path;

/// Section headers and section names of one ELF image.
pub struct ElfSections<'a> {
    path: &'a Path,
    data: &'a [u8],
    ctx: Ctx,
    headers: Vec<SectionHeader>,
    names: &'a [u8],
}

impl<'a> ElfSections<'a> {
    /// Parse the file header and section header table of `data`.
    ///
    /// A file without a section header table parses to an empty view.
    pub fn parse(path: &'a Path, data: &'a [u8]) -> Result<Self> {
        let header = Elf::parse_header(data)
            .map_err(|e| ScanError::format(path, format!("ELF header: {}", e)))?;
        let container = header
            .container()
            .map_err(|e| ScanError::format(path, e.to_string()))?;
        let endian = header
            .endianness()
            .map_err(|e| ScanError::format(path, e.to_string()))?;
        let ctx = Ctx::new(container, endian);

        let shoff = to_usize(path, header.e_shoff, "e_shoff")?;
        if shoff == 0 {
            return Ok(Self { path, data, ctx, headers: Vec::new(), names: &[] });
        }
        if shoff >= data.len() {
            return Err(ScanError::format(
                path,
                format!("section header table at {:#x} is past end of file ({:#x})", shoff, data.len()),
            ));
        }

        let headers = SectionHeader::parse(data, shoff, usize::from(header.e_shnum), ctx)
            .map_err(|e| ScanError::format(path, format!("section headers: {}", e)))?;

        let mut sections = Self { path, data, ctx, headers, names: &[] };
        if sections.headers.is_empty() {
            return Ok(sections);
        }

        let raw_index = u32::from(header.e_shstrndx);
        let shstrndx = if raw_index == SHN_XINDEX as u32 {
            sections.headers[0].sh_link as usize
        } else if raw_index == SHN_UNDEF as u32 {
            return Err(ScanError::format(
                path,
                "no section name string table (e_shstrndx is SHN_UNDEF)",
            ));
        } else {
            raw_index as usize
        };
        let shstrtab = sections.headers.get(shstrndx).cloned().ok_or_else(|| {
            ScanError::format(
                path,
                format!("e_shstrndx {} out of range ({} sections)", shstrndx, sections.headers.len()),
            )
        })?;
        sections.names = sections.section_data(&shstrtab)?;
        Ok(sections)
    }

    pub fn path(&self) -> &'a Path {
        self.path
    }

    pub fn headers(&self) -> &[SectionHeader] {
        &self.headers
    }

    /// Name of a section, from the section-header string table.
    pub fn name_of(&self, shdr: &SectionHeader) -> Result<&'a [u8]> {
        string_at(self.names, shdr.sh_name).ok_or_else(|| {
            ScanError::format(
                self.path,
                format!("section name offset {:#x} outside .shstrtab ({:#x} bytes)", shdr.sh_name, self.names.len()),
            )
        })
    }

    /// Look a section up by exact name. If the name occurs more than once the
    /// last header wins.
    pub fn find(&self, name: &str) -> Result<Option<&SectionHeader>> {
        let mut found = None;
        for shdr in &self.headers {
            if self.name_of(shdr)? == name.as_bytes() {
                found = Some(shdr);
            }
        }
        Ok(found)
    }

    /// File contents of a section. `SHT_NOBITS` sections are empty.
    pub fn section_data(&self, shdr: &SectionHeader) -> Result<&'a [u8]> {
        if shdr.sh_type == SHT_NOBITS {
            return Ok(&[]);
        }
        let start = to_usize(self.path, shdr.sh_offset, "sh_offset")?;
        let size = to_usize(self.path, shdr.sh_size, "sh_size")?;
        let data = self.data;
        start
            .checked_add(size)
            .filter(|end| *end <= data.len())
            .map(|end| &data[start..end])
            .ok_or_else(|| {
                ScanError::format(
                    self.path,
                    format!(
                        "section [{:#x}, +{:#x}) extends past end of file ({:#x})",
                        start,
                        size,
                        data.len()
                    ),
                )
            })
    }

    /// Symbol entries of a symbol-table section.
    pub fn symbols(&self, shdr: &SectionHeader) -> Result<Symtab<'a>> {
        let bytes = self.section_data(shdr)?;
        let entry_size = match self.ctx.container {
            Container::Big => sym64::SIZEOF_SYM,
            Container::Little => sym32::SIZEOF_SYM,
        };
        let count = bytes.len() / entry_size;
        Symtab::parse(bytes, 0, count, self.ctx)
            .map_err(|e| ScanError::format(self.path, format!("symbol table: {}", e)))
    }
}

/// NUL-terminated string starting at `offset` in a string table.
///
/// `None` when the offset is outside the table or the string runs off its end.
pub fn string_at(table: &[u8], offset: usize) -> Option<&[u8]> {
    let tail = table.get(offset..)?;
    let len = tail.iter().position(|&b| b == 0)?;
    Some(&tail[..len])
}

fn to_usize(path: &Path, value: u64, field: &str) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| ScanError::format(path, format!("{} {:#x} does not fit in memory", field, value)))
}
