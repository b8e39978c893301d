//! `DT_NEEDED` walker over the local filesystem.

use super::ld_so_conf::configured_dirs;
use super::{DependencyWalker, IterStep, ResolveMode, SharedObjectEntry, SharedObjectIter};
use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::file_io::map_file;
use crate::types::ExecutableDescriptor;
use goblin::elf::header::EI_CLASS;
use goblin::elf::Elf;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Walks `DT_NEEDED` declarations breadth-first, locating each library the
/// way the dynamic linker searches: RPATH (when there is no RUNPATH),
/// LD_LIBRARY_PATH, RUNPATH, the `ld.so.conf` directories, then the system
/// directories.
#[derive(Debug, Clone)]
pub struct ElfDependencyWalker {
    library_path: Vec<PathBuf>,
    system_dirs: Vec<PathBuf>,
}

impl ElfDependencyWalker {
    pub fn new(config: &ScanConfig) -> Self {
        let mut system_dirs = config.ld_so_conf.as_deref().map(configured_dirs).unwrap_or_default();
        for dir in &config.default_dirs {
            if !system_dirs.contains(dir) {
                system_dirs.push(dir.clone());
            }
        }
        Self { library_path: config.library_path.clone(), system_dirs }
    }
}

impl Default for ElfDependencyWalker {
    fn default() -> Self {
        Self::new(&ScanConfig::default())
    }
}

impl DependencyWalker for ElfDependencyWalker {
    type Iter = ElfSharedObjectIter;

    fn walk(&self, exe: &ExecutableDescriptor, mode: ResolveMode) -> Result<ElfSharedObjectIter> {
        let root = DynamicDeps::load(exe.path())
            .map_err(|e| ScanError::initialization(exe.path(), e.to_string()))?;

        let mut iter = ElfSharedObjectIter {
            mode,
            class: root.class,
            machine: root.machine,
            library_path: self.library_path.clone(),
            system_dirs: self.system_dirs.clone(),
            queue: VecDeque::new(),
            visited: FxHashSet::default(),
            missing: FxHashSet::default(),
        };
        iter.enqueue(&root, exe.path());
        Ok(iter)
    }
}

/// A declared dependency waiting to be located, with the search directories
/// of the object that declared it.
struct Pending {
    name: String,
    search: Rc<[PathBuf]>,
}

pub struct ElfSharedObjectIter {
    mode: ResolveMode,
    class: u8,
    machine: u16,
    library_path: Vec<PathBuf>,
    system_dirs: Vec<PathBuf>,
    queue: VecDeque<Pending>,
    visited: FxHashSet<String>,
    missing: FxHashSet<String>,
}

impl SharedObjectIter for ElfSharedObjectIter {
    fn next_step(&mut self) -> IterStep {
        while let Some(pending) = self.queue.pop_front() {
            let Some(path) = self.locate(&pending) else {
                if self.missing.insert(pending.name.clone()) {
                    return IterStep::NotFound(pending.name);
                }
                continue;
            };

            let key = path.to_string_lossy().into_owned();
            if !self.visited.insert(key.clone()) {
                continue;
            }

            if self.mode == ResolveMode::Transitive {
                match DynamicDeps::load(&path) {
                    Ok(deps) => self.enqueue(&deps, &path),
                    Err(e) => return IterStep::Error(e.to_string()),
                }
            }
            return IterStep::Entry(SharedObjectEntry { path: key, basename: pending.name });
        }
        IterStep::Done
    }
}

impl ElfSharedObjectIter {
    fn enqueue(&mut self, deps: &DynamicDeps, object: &Path) {
        let origin = object.parent().unwrap_or_else(|| Path::new("/"));
        let search: Rc<[PathBuf]> = self.search_dirs(deps, origin).into();
        for name in &deps.needed {
            self.queue.push_back(Pending { name: name.clone(), search: Rc::clone(&search) });
        }
    }

    fn search_dirs(&self, deps: &DynamicDeps, origin: &Path) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if deps.runpath.is_empty() {
            dirs.extend(deps.rpath.iter().filter_map(|p| expand_origin(p, origin)));
        }
        dirs.extend(self.library_path.iter().cloned());
        dirs.extend(deps.runpath.iter().filter_map(|p| expand_origin(p, origin)));
        dirs.extend(self.system_dirs.iter().cloned());
        dirs
    }

    fn locate(&self, pending: &Pending) -> Option<PathBuf> {
        if pending.name.contains('/') {
            let path = PathBuf::from(&pending.name);
            return path.is_file().then_some(path);
        }
        pending
            .search
            .iter()
            .map(|dir| dir.join(&pending.name))
            .find(|candidate| candidate.is_file() && self.compatible(candidate))
    }

    /// Whether a candidate has the executable's ELF class and machine, so a
    /// 32-bit library in a shared directory is passed over.
    fn compatible(&self, candidate: &Path) -> bool {
        let mut header = [0u8; 64];
        let Ok(mut file) = File::open(candidate) else {
            return false;
        };
        let Ok(read) = file.read(&mut header) else {
            return false;
        };
        match Elf::parse_header(&header[..read]) {
            Ok(h) => h.e_ident[EI_CLASS] == self.class && h.e_machine == self.machine,
            Err(_) => false,
        }
    }
}

/// Substitute `$ORIGIN` / `${ORIGIN}`. Relative entries without it depend on
/// the process's working directory at run time and are dropped.
fn expand_origin(entry: &str, origin: &Path) -> Option<PathBuf> {
    let origin = origin.to_string_lossy();
    let expanded = entry.replace("${ORIGIN}", &origin).replace("$ORIGIN", &origin);
    expanded.starts_with('/').then(|| PathBuf::from(expanded))
}

/// The parts of an object's dynamic section the walk needs.
#[derive(Debug, Default)]
struct DynamicDeps {
    class: u8,
    machine: u16,
    needed: Vec<String>,
    rpath: Vec<String>,
    runpath: Vec<String>,
}

impl DynamicDeps {
    fn load(path: &Path) -> Result<Self> {
        let data = map_file(path)?;
        let elf = Elf::parse(data.as_slice())
            .map_err(|e| ScanError::format(path, format!("ELF parse: {}", e)))?;

        let mut deps = DynamicDeps {
            class: elf.header.e_ident[EI_CLASS],
            machine: elf.header.e_machine,
            ..Default::default()
        };

        if let Some(dynamic) = &elf.dynamic {
            for dyn_entry in &dynamic.dyns {
                let Ok(idx) = usize::try_from(dyn_entry.d_val) else {
                    continue;
                };
                match dyn_entry.d_tag {
                    goblin::elf::dynamic::DT_NEEDED => {
                        let name = elf.dynstrtab.get_at(idx).ok_or_else(|| {
                            ScanError::format(path, format!("DT_NEEDED offset {:#x} outside .dynstr", idx))
                        })?;
                        deps.needed.push(name.to_string());
                    }
                    goblin::elf::dynamic::DT_RPATH => {
                        if let Some(value) = elf.dynstrtab.get_at(idx) {
                            deps.rpath.extend(split_search_path(value));
                        }
                    }
                    goblin::elf::dynamic::DT_RUNPATH => {
                        if let Some(value) = elf.dynstrtab.get_at(idx) {
                            deps.runpath.extend(split_search_path(value));
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(deps)
    }
}

fn split_search_path(value: &str) -> impl Iterator<Item = String> + '_ {
    value.split(':').filter(|s| !s.is_empty()).map(str::to_string)
}
