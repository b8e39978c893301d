//! Parallel classification of independent snapshots.

use crate::classifier::Classifier;
use crate::deps::DependencyWalker;
use crate::error::Result;
use crate::types::{ExecutableDescriptor, MappedLibrary, RunReport};
use rayon::prelude::*;

/// One snapshot to classify: its executable and its own mapped-library list.
#[derive(Debug, Clone)]
pub struct Job {
    pub exe: ExecutableDescriptor,
    pub libs: Vec<MappedLibrary>,
}

impl Job {
    pub fn new(exe: ExecutableDescriptor, libs: Vec<MappedLibrary>) -> Self {
        Self { exe, libs }
    }
}

/// Classify every job in parallel. Results line up with `jobs`; one job's
/// failure does not affect the others.
pub fn classify_all<W>(classifier: &Classifier<W>, jobs: &mut [Job]) -> Vec<Result<RunReport>>
where
    W: DependencyWalker + Sync,
{
    jobs.par_iter_mut()
        .map(|job| classifier.classify(&job.exe, &mut job.libs))
        .collect()
}
