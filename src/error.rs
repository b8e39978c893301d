use std::path::PathBuf;
use thiserror::Error;

/// Failures of a classification run.
///
/// Every variant names the subject it was raised for so a failed run can be
/// written to an audit log without extra context.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("dependency iterator setup failed for {path}: {reason}")]
    Initialization { path: PathBuf, reason: String },

    #[error("dependency iteration failed for {path}: {reason}")]
    Iteration { path: PathBuf, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed ELF structure in {path}: {reason}")]
    Format { path: PathBuf, reason: String },

    #[error("allocation failed: {context}")]
    Allocation { context: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("invalid mapping list line {line}: {reason}")]
    Maps { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, ScanError>;

impl ScanError {
    pub fn initialization<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        Self::Initialization { path: path.into(), reason: reason.into() }
    }

    pub fn iteration<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        Self::Iteration { path: path.into(), reason: reason.into() }
    }

    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn format<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        Self::Format { path: path.into(), reason: reason.into() }
    }

    pub fn allocation<S: Into<String>>(context: S) -> Self {
        Self::Allocation { context: context.into() }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn maps<S: Into<String>>(line: usize, reason: S) -> Self {
        Self::Maps { line, reason: reason.into() }
    }

    /// Short machine-readable name of the failure class, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Initialization { .. } => "initialization",
            Self::Iteration { .. } => "iteration",
            Self::Io { .. } => "io",
            Self::Format { .. } => "format",
            Self::Allocation { .. } => "allocation",
            Self::Configuration { .. } => "configuration",
            Self::Maps { .. } => "maps",
        }
    }
}
