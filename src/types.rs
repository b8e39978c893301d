//! Data model shared by the resolver, the classifier and the report writers.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

pub(crate) fn is_false(b: &bool) -> bool {
    !*b
}

/// The snapshot's view of the original executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutableDescriptor {
    /// On-disk path of the executable the snapshot was taken from
    pub exe_path: PathBuf,
}

impl ExecutableDescriptor {
    pub fn new<P: Into<PathBuf>>(exe_path: P) -> Self {
        Self { exe_path: exe_path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.exe_path
    }
}

/// One resolved transitive dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedObjectNode {
    /// Absolute on-disk path, with a top-level symlink already resolved
    pub path: String,
    /// Name the dependency was declared under (e.g. `libc.so.6`)
    pub basename: String,
}

/// Dependencies of one run, most recently discovered first.
///
/// Duplicates are kept: the set records what the walker reported, in the
/// order it reported it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencySet {
    nodes: VecDeque<SharedObjectNode>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the head.
    pub fn push_front(&mut self, node: SharedObjectNode) {
        self.nodes.push_front(node);
    }

    /// Exact, case-sensitive path lookup.
    pub fn contains_path(&self, path: &str) -> bool {
        self.nodes.iter().any(|node| node.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedObjectNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A library mapping found in the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedLibrary {
    pub path: String,
    #[serde(skip_serializing_if = "is_false", default)]
    pub injected: bool,
    #[serde(skip_serializing_if = "is_false", default)]
    pub dlopen: bool,
}

impl MappedLibrary {
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self { path: path.into(), injected: false, dlopen: false }
    }

    pub fn verdict(&self) -> Verdict {
        match (self.injected, self.dlopen) {
            (true, _) => Verdict::Injected,
            (false, true) => Verdict::Dlopen,
            (false, false) => Verdict::Explained,
        }
    }
}

/// How a mapped library's presence is accounted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Declared by the executable's transitive link metadata
    Explained,
    /// Not declared, but the executable references the loader API
    Dlopen,
    /// Neither declared nor explainable by the loader API
    Injected,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Explained => "explained",
            Verdict::Dlopen => "dlopen",
            Verdict::Injected => "injected",
        };
        f.write_str(s)
    }
}

/// Per-verdict totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub explained: usize,
    pub dlopen: usize,
    pub injected: usize,
}

impl VerdictCounts {
    pub fn tally(libs: &[MappedLibrary]) -> Self {
        let mut counts = Self::default();
        for lib in libs {
            match lib.verdict() {
                Verdict::Explained => counts.explained += 1,
                Verdict::Dlopen => counts.dlopen += 1,
                Verdict::Injected => counts.injected += 1,
            }
        }
        counts
    }
}

/// Result of a successful run. The mapped-library records themselves are
/// mutated in place and not duplicated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub executable: PathBuf,
    pub loader_symbol: String,
    pub loader_present: bool,
    pub dependencies: DependencySet,
    pub counts: VerdictCounts,
}
