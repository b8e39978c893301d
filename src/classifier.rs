//! Verdicts for the libraries mapped into a snapshot.

use crate::config::ScanConfig;
use crate::deps::{resolve, DependencyWalker};
use crate::error::Result;
use crate::symbols::loader_symbol_present;
use crate::types::{ExecutableDescriptor, MappedLibrary, RunReport, VerdictCounts};
use tracing::{debug, info, warn};

/// Classifies mapped libraries against the executable's link metadata.
pub struct Classifier<W> {
    walker: W,
    config: ScanConfig,
}

impl<W: DependencyWalker> Classifier<W> {
    pub fn new(walker: W, config: ScanConfig) -> Self {
        Self { walker, config }
    }

    /// Run one classification over `libs`.
    ///
    /// The dependency set is fully built and the loader symbol checked before
    /// any record is written; a failed run leaves `libs` untouched.
    pub fn classify(&self, exe: &ExecutableDescriptor, libs: &mut [MappedLibrary]) -> Result<RunReport> {
        self.config.validate()?;

        let dependencies = resolve(&self.walker, exe)?;
        debug!(exe = %exe.path().display(), count = dependencies.len(), "dependency set built");

        let loader_present = loader_symbol_present(exe.path(), &self.config.loader_symbol)?;

        for lib in libs.iter_mut() {
            let member = dependencies.contains_path(&lib.path);
            lib.injected = !member && !loader_present;
            lib.dlopen = !member && loader_present;

            if lib.injected {
                warn!(path = %lib.path, exe = %exe.path().display(), "library is injected");
            } else if lib.dlopen {
                info!(path = %lib.path, "library loaded through {}", self.config.loader_symbol);
            }
        }

        Ok(RunReport {
            executable: exe.path().to_path_buf(),
            loader_symbol: self.config.loader_symbol.clone(),
            loader_present,
            dependencies,
            counts: VerdictCounts::tally(libs),
        })
    }
}
