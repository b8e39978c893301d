//! soscope - post-mortem classification of the shared libraries mapped into a
//! process snapshot.
//!
//! Each mapped library is either explained by the executable's transitive
//! `DT_NEEDED` declarations, explained by the executable's use of the loader
//! API (`dlopen`), or unexplained and flagged as injected.
//!
//! # Example
//!
//! ```no_run
//! use soscope::{classify_snapshot, maps, ExecutableDescriptor, ScanConfig};
//!
//! let config = ScanConfig::default();
//! let mut libs = maps::read_maps("maps.txt".as_ref(), config.max_mapped_libraries).unwrap();
//! let report = classify_snapshot(&ExecutableDescriptor::new("/usr/bin/app"), &mut libs, config).unwrap();
//!
//! for lib in &libs {
//!     println!("{}: {}", lib.path, lib.verdict());
//! }
//! println!("{} injected", report.counts.injected);
//! ```

mod elf_sections;
mod file_io;
#[cfg(test)]
mod testutil;

pub mod batch;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod deps;
pub mod error;
pub mod maps;
pub mod output;
pub mod strings;
pub mod symbols;
pub mod types;

pub use classifier::Classifier;
pub use config::ScanConfig;
pub use deps::{resolve, DependencyWalker, ElfDependencyWalker, IterStep, ResolveMode, SharedObjectIter};
pub use error::{Result, ScanError};
pub use strings::extract_library_name_strings;
pub use symbols::loader_symbol_present;
pub use types::{
    DependencySet, ExecutableDescriptor, MappedLibrary, RunReport, SharedObjectNode, Verdict,
    VerdictCounts,
};

/// Classify `libs` with the filesystem dependency walker built from `config`.
pub fn classify_snapshot(
    exe: &ExecutableDescriptor,
    libs: &mut [MappedLibrary],
    config: ScanConfig,
) -> Result<RunReport> {
    let walker = ElfDependencyWalker::new(&config);
    Classifier::new(walker, config).classify(exe, libs)
}
