use crate::error::{Result, ScanError};
use crate::symbols::DEFAULT_LOADER_SYMBOL;
use std::path::PathBuf;

/// Upper bound on library records accepted from one snapshot's mapping list.
pub const MAX_MAPPED_LIBRARIES: usize = 4096;

/// Loader configuration whose directories are searched before the defaults.
pub const DEFAULT_LD_SO_CONF: &str = "/etc/ld.so.conf";

/// Directories searched after RPATH / LD_LIBRARY_PATH / RUNPATH, in order.
pub const DEFAULT_LIBRARY_DIRS: &[&str] = &[
    "/lib64",
    "/lib/x86_64-linux-gnu",
    "/usr/lib64",
    "/usr/lib/x86_64-linux-gnu",
    "/lib",
    "/usr/lib",
];

/// Settings for one classification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Loader API symbol whose presence turns unexplained mappings into dlopen verdicts
    pub loader_symbol: String,
    /// Extra search directories, as LD_LIBRARY_PATH would supply them
    pub library_path: Vec<PathBuf>,
    /// `ld.so.conf` to read configured directories from; `None` skips it
    pub ld_so_conf: Option<PathBuf>,
    /// System library directories
    pub default_dirs: Vec<PathBuf>,
    /// Maximum number of mapped libraries read from a mapping list
    pub max_mapped_libraries: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            loader_symbol: DEFAULT_LOADER_SYMBOL.to_string(),
            library_path: Vec::new(),
            ld_so_conf: Some(PathBuf::from(DEFAULT_LD_SO_CONF)),
            default_dirs: DEFAULT_LIBRARY_DIRS.iter().map(PathBuf::from).collect(),
            max_mapped_libraries: MAX_MAPPED_LIBRARIES,
        }
    }
}

impl ScanConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_loader_symbol<S: Into<String>>(mut self, symbol: S) -> Self {
        self.loader_symbol = symbol.into();
        self
    }

    #[must_use]
    pub fn with_library_path(mut self, dirs: Vec<PathBuf>) -> Self {
        self.library_path = dirs;
        self
    }

    #[must_use]
    pub fn with_ld_so_conf(mut self, conf: Option<PathBuf>) -> Self {
        self.ld_so_conf = conf;
        self
    }

    #[must_use]
    pub fn with_default_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.default_dirs = dirs;
        self
    }

    /// Validate the configuration and return errors for invalid settings
    pub fn validate(&self) -> Result<()> {
        if self.loader_symbol.is_empty() {
            return Err(ScanError::configuration("loader_symbol must not be empty"));
        }
        if self.loader_symbol.contains('\0') {
            return Err(ScanError::configuration("loader_symbol must not contain NUL"));
        }
        if self.default_dirs.is_empty() {
            return Err(ScanError::configuration("default_dirs must not be empty"));
        }
        if self.max_mapped_libraries == 0 {
            return Err(ScanError::configuration("max_mapped_libraries must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.loader_symbol, "dlopen");
        assert!(config.library_path.is_empty());
        assert_eq!(config.ld_so_conf, Some(PathBuf::from("/etc/ld.so.conf")));
    }

    #[test]
    fn test_config_validation() {
        assert!(ScanConfig::new().with_loader_symbol("").validate().is_err());
        assert!(ScanConfig::new().with_loader_symbol("dl\0open").validate().is_err());
        assert!(ScanConfig::new().with_default_dirs(Vec::new()).validate().is_err());

        let config = ScanConfig { max_mapped_libraries: 0, ..ScanConfig::default() };
        assert!(matches!(config.validate(), Err(ScanError::Configuration { .. })));
    }

    #[test]
    fn test_builder_overrides() {
        let config = ScanConfig::new()
            .with_loader_symbol("__libc_dlopen_mode")
            .with_library_path(vec![PathBuf::from("/opt/app/lib")]);
        assert_eq!(config.loader_symbol, "__libc_dlopen_mode");
        assert_eq!(config.library_path, vec![PathBuf::from("/opt/app/lib")]);
    }
}
