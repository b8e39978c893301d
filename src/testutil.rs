//! Minimal little-endian ELF64 writer for tests.
//!
//! Produces images with a PT_LOAD covering the whole file at vaddr 0 (so file
//! offsets and virtual addresses coincide), an optional PT_DYNAMIC with
//! DT_NEEDED / DT_RPATH / DT_RUNPATH, and optional `.dynsym`, `.dynstr` and
//! `.rodata` sections. Shared with the integration tests via `#[path]`, so it
//! must not refer to the rest of the crate.

#![allow(dead_code)]

use std::path::Path;

const EHDR_SIZE: usize = 64;
const PHDR_SIZE: usize = 56;
const SHDR_SIZE: usize = 64;
const SYM_SIZE: usize = 24;
const DYN_SIZE: usize = 16;

const SHT_PROGBITS: u32 = 1;
const SHT_STRTAB: u32 = 3;
const SHT_DYNAMIC: u32 = 6;
const SHT_DYNSYM: u32 = 11;

const DT_NULL: u64 = 0;
const DT_NEEDED: u64 = 1;
const DT_STRTAB: u64 = 5;
const DT_STRSZ: u64 = 10;
const DT_RPATH: u64 = 15;
const DT_RUNPATH: u64 = 29;

#[derive(Debug, Clone, Default)]
pub struct ElfFixture {
    needed: Vec<String>,
    rpath: Option<String>,
    runpath: Option<String>,
    dynsyms: Option<Vec<String>>,
    rodata: Option<Vec<u8>>,
    omit_dynstr_section: bool,
}

struct Section {
    name: &'static str,
    sh_type: u32,
    offset: usize,
    size: usize,
    link: u32,
    entsize: u64,
}

impl ElfFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn needs(mut self, name: &str) -> Self {
        self.needed.push(name.to_string());
        self
    }

    pub fn rpath(mut self, value: &str) -> Self {
        self.rpath = Some(value.to_string());
        self
    }

    pub fn runpath(mut self, value: &str) -> Self {
        self.runpath = Some(value.to_string());
        self
    }

    pub fn dynsyms(mut self, names: &[&str]) -> Self {
        self.dynsyms = Some(names.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn rodata(mut self, bytes: &[u8]) -> Self {
        self.rodata = Some(bytes.to_vec());
        self
    }

    /// Keep `.dynsym` but drop the `.dynstr` section header.
    pub fn without_dynstr_section(mut self) -> Self {
        self.omit_dynstr_section = true;
        self
    }

    fn has_dynamic(&self) -> bool {
        !self.needed.is_empty() || self.rpath.is_some() || self.runpath.is_some()
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.build()).expect("write ELF fixture");
    }

    pub fn build(&self) -> Vec<u8> {
        let phnum = if self.has_dynamic() { 2 } else { 0 };
        let mut out = vec![0u8; EHDR_SIZE + phnum * PHDR_SIZE];
        let mut sections: Vec<Section> = Vec::new();

        let mut dynstr = vec![0u8];
        let needed: Vec<u32> = self.needed.iter().map(|n| add_str(&mut dynstr, n)).collect();
        let rpath = self.rpath.as_deref().map(|s| add_str(&mut dynstr, s));
        let runpath = self.runpath.as_deref().map(|s| add_str(&mut dynstr, s));
        let sym_names: Vec<u32> = self
            .dynsyms
            .iter()
            .flatten()
            .map(|s| add_str(&mut dynstr, s))
            .collect();

        let dynstr_off = out.len();
        out.extend_from_slice(&dynstr);
        let dynstr_index = if self.omit_dynstr_section {
            0
        } else {
            sections.push(Section {
                name: ".dynstr",
                sh_type: SHT_STRTAB,
                offset: dynstr_off,
                size: dynstr.len(),
                link: 0,
                entsize: 0,
            });
            sections.len() as u32
        };

        if self.dynsyms.is_some() {
            align(&mut out, 8);
            let off = out.len();
            out.extend_from_slice(&[0u8; SYM_SIZE]);
            for name in &sym_names {
                out.extend_from_slice(&name.to_le_bytes());
                out.push(0x12); // STB_GLOBAL | STT_FUNC
                out.push(0);
                out.extend_from_slice(&0u16.to_le_bytes());
                out.extend_from_slice(&0u64.to_le_bytes());
                out.extend_from_slice(&0u64.to_le_bytes());
            }
            sections.push(Section {
                name: ".dynsym",
                sh_type: SHT_DYNSYM,
                offset: off,
                size: out.len() - off,
                link: dynstr_index,
                entsize: SYM_SIZE as u64,
            });
        }

        if let Some(rodata) = &self.rodata {
            let off = out.len();
            out.extend_from_slice(rodata);
            sections.push(Section {
                name: ".rodata",
                sh_type: SHT_PROGBITS,
                offset: off,
                size: rodata.len(),
                link: 0,
                entsize: 0,
            });
        }

        let mut dynamic_range = None;
        if self.has_dynamic() {
            align(&mut out, 8);
            let off = out.len();
            let push_dyn = |out: &mut Vec<u8>, tag: u64, val: u64| {
                out.extend_from_slice(&tag.to_le_bytes());
                out.extend_from_slice(&val.to_le_bytes());
            };
            for offset in &needed {
                push_dyn(&mut out, DT_NEEDED, u64::from(*offset));
            }
            if let Some(offset) = rpath {
                push_dyn(&mut out, DT_RPATH, u64::from(offset));
            }
            if let Some(offset) = runpath {
                push_dyn(&mut out, DT_RUNPATH, u64::from(offset));
            }
            push_dyn(&mut out, DT_STRTAB, dynstr_off as u64);
            push_dyn(&mut out, DT_STRSZ, dynstr.len() as u64);
            push_dyn(&mut out, DT_NULL, 0);
            sections.push(Section {
                name: ".dynamic",
                sh_type: SHT_DYNAMIC,
                offset: off,
                size: out.len() - off,
                link: dynstr_index,
                entsize: DYN_SIZE as u64,
            });
            dynamic_range = Some((off, out.len() - off));
        }

        let mut shstrtab = vec![0u8];
        let mut name_offsets: Vec<u32> =
            sections.iter().map(|s| add_str(&mut shstrtab, s.name)).collect();
        let shstrtab_name = add_str(&mut shstrtab, ".shstrtab");
        let shstrtab_off = out.len();
        out.extend_from_slice(&shstrtab);
        sections.push(Section {
            name: ".shstrtab",
            sh_type: SHT_STRTAB,
            offset: shstrtab_off,
            size: shstrtab.len(),
            link: 0,
            entsize: 0,
        });
        name_offsets.push(shstrtab_name);

        align(&mut out, 8);
        let shoff = out.len();
        out.extend_from_slice(&[0u8; SHDR_SIZE]);
        for (section, name) in sections.iter().zip(&name_offsets) {
            out.extend_from_slice(&name.to_le_bytes());
            out.extend_from_slice(&section.sh_type.to_le_bytes());
            out.extend_from_slice(&0u64.to_le_bytes()); // sh_flags
            out.extend_from_slice(&(section.offset as u64).to_le_bytes()); // sh_addr
            out.extend_from_slice(&(section.offset as u64).to_le_bytes());
            out.extend_from_slice(&(section.size as u64).to_le_bytes());
            out.extend_from_slice(&section.link.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes()); // sh_info
            out.extend_from_slice(&1u64.to_le_bytes()); // sh_addralign
            out.extend_from_slice(&section.entsize.to_le_bytes());
        }
        let shnum = sections.len() + 1;
        let shstrndx = shnum - 1;
        let total = out.len() as u64;

        // ELF header
        out[0..4].copy_from_slice(b"\x7fELF");
        out[4] = 2; // ELFCLASS64
        out[5] = 1; // ELFDATA2LSB
        out[6] = 1; // EV_CURRENT
        put_u16(&mut out, 0x10, 3); // ET_DYN
        put_u16(&mut out, 0x12, 62); // EM_X86_64
        put_u32(&mut out, 0x14, 1);
        put_u64(&mut out, 0x20, if phnum > 0 { EHDR_SIZE as u64 } else { 0 });
        put_u64(&mut out, 0x28, shoff as u64);
        put_u16(&mut out, 0x34, EHDR_SIZE as u16);
        put_u16(&mut out, 0x36, PHDR_SIZE as u16);
        put_u16(&mut out, 0x38, phnum as u16);
        put_u16(&mut out, 0x3a, SHDR_SIZE as u16);
        put_u16(&mut out, 0x3c, shnum as u16);
        put_u16(&mut out, 0x3e, shstrndx as u16);

        if let Some((dyn_off, dyn_size)) = dynamic_range {
            // PT_LOAD over the whole file
            let ph = EHDR_SIZE;
            put_u32(&mut out, ph, 1);
            put_u32(&mut out, ph + 4, 5);
            put_u64(&mut out, ph + 0x08, 0);
            put_u64(&mut out, ph + 0x10, 0);
            put_u64(&mut out, ph + 0x18, 0);
            put_u64(&mut out, ph + 0x20, total);
            put_u64(&mut out, ph + 0x28, total);
            put_u64(&mut out, ph + 0x30, 0x1000);
            // PT_DYNAMIC
            let ph = EHDR_SIZE + PHDR_SIZE;
            put_u32(&mut out, ph, 2);
            put_u32(&mut out, ph + 4, 6);
            put_u64(&mut out, ph + 0x08, dyn_off as u64);
            put_u64(&mut out, ph + 0x10, dyn_off as u64);
            put_u64(&mut out, ph + 0x18, dyn_off as u64);
            put_u64(&mut out, ph + 0x20, dyn_size as u64);
            put_u64(&mut out, ph + 0x28, dyn_size as u64);
            put_u64(&mut out, ph + 0x30, 8);
        }

        out
    }
}

fn add_str(table: &mut Vec<u8>, s: &str) -> u32 {
    let offset = table.len() as u32;
    table.extend_from_slice(s.as_bytes());
    table.push(0);
    offset
}

fn align(out: &mut Vec<u8>, to: usize) {
    while out.len() % to != 0 {
        out.push(0);
    }
}

fn put_u16(out: &mut [u8], at: usize, v: u16) {
    out[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(out: &mut [u8], at: usize, v: u32) {
    out[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn put_u64(out: &mut [u8], at: usize, v: u64) {
    out[at..at + 8].copy_from_slice(&v.to_le_bytes());
}
