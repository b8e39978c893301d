//! Transitive dependency resolution.
//!
//! The resolver drives a [`DependencyWalker`] over the executable's declared
//! dependencies and records every library it reports in a [`DependencySet`].
//! Walkers are pluggable; [`ElfDependencyWalker`] resolves `DT_NEEDED` on the
//! local filesystem the way the dynamic linker would.

mod elf_walker;
mod ld_so_conf;

pub use elf_walker::{ElfDependencyWalker, ElfSharedObjectIter};
pub use ld_so_conf::configured_dirs;

use crate::error::{Result, ScanError};
use crate::types::{DependencySet, ExecutableDescriptor, SharedObjectNode};
use std::fs;
use tracing::{debug, error};

/// How far a walker follows dependency declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Only the executable's own declarations
    Direct,
    /// Every level, including dependencies of dependencies
    Transitive,
}

/// A dependency the walker located on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedObjectEntry {
    /// On-disk path as located (may be a symlink)
    pub path: String,
    /// Name the dependency was declared under
    pub basename: String,
}

/// One step of a dependency walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterStep {
    Entry(SharedObjectEntry),
    Done,
    /// The walk cannot continue
    Error(String),
    /// A declared dependency has no backing file; the walk continues
    NotFound(String),
}

/// Iterator over the libraries a walk discovers.
pub trait SharedObjectIter {
    fn next_step(&mut self) -> IterStep;
}

/// Source of dependency walks for an executable.
pub trait DependencyWalker {
    type Iter: SharedObjectIter;

    /// Start a walk. Failing here is an initialization failure of the run.
    fn walk(&self, exe: &ExecutableDescriptor, mode: ResolveMode) -> Result<Self::Iter>;
}

/// Build the set of libraries the executable declares, at every level.
///
/// Iterator setup and step failures abort the resolution. Declared libraries
/// with no backing file are skipped.
pub fn resolve<W: DependencyWalker>(walker: &W, exe: &ExecutableDescriptor) -> Result<DependencySet> {
    let mut iter = walker.walk(exe, ResolveMode::Transitive).map_err(|e| match e {
        ScanError::Initialization { .. } => e,
        other => ScanError::initialization(exe.path(), other.to_string()),
    })?;

    let mut needed = DependencySet::new();
    loop {
        match iter.next_step() {
            IterStep::Done => {
                debug!(exe = %exe.path().display(), "dependency iteration done");
                break;
            }
            IterStep::Error(reason) => {
                error!(exe = %exe.path().display(), "dependency iteration error: {}", reason);
                return Err(ScanError::iteration(exe.path(), reason));
            }
            IterStep::NotFound(name) => {
                debug!(exe = %exe.path().display(), "dependency not found: {}", name);
                continue;
            }
            IterStep::Entry(entry) => {
                let path = canonical_path(&entry.path)?;
                debug!("Transitive DT_NEEDED insertion: {}", path);
                needed.push_front(SharedObjectNode { path, basename: entry.basename });
            }
        }
    }
    Ok(needed)
}

/// Resolve one level of symlink on a dependency path.
///
/// The link target is appended to the entry's directory (everything up to
/// and including the last `/`), whether or not the target is absolute. A
/// path that is not a symlink is returned as is.
pub fn canonical_path(path: &str) -> Result<String> {
    let target = match fs::read_link(path) {
        Ok(target) => target,
        Err(_) => return Ok(path.to_string()),
    };
    let target = target.to_string_lossy();
    let slash = path.rfind('/').ok_or_else(|| {
        ScanError::iteration(path, "symlinked dependency path has no directory component")
    })?;
    Ok(format!("{}{}", &path[..=slash], target))
}
