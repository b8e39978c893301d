//! Library directories configured in `/etc/ld.so.conf`.
//!
//! The loader cache is built from these; reading them directly covers
//! `/usr/local/lib`, multiarch and package-specific directories without
//! parsing `ld.so.cache`.

use rustc_hash::FxHashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// How deep `include` chains are followed.
const MAX_INCLUDE_DEPTH: usize = 8;

/// Directories listed in `conf` and everything it includes, in file order
/// with duplicates removed. A missing or unreadable file contributes nothing.
pub fn configured_dirs(conf: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let mut seen_files = FxHashSet::default();
    parse_file(conf, &mut dirs, &mut seen_files, MAX_INCLUDE_DEPTH);
    tracing::debug!(conf = %conf.display(), "{} configured library directories", dirs.len());
    dirs
}

fn parse_file(path: &Path, dirs: &mut Vec<PathBuf>, seen_files: &mut FxHashSet<PathBuf>, depth: usize) {
    if depth == 0 || !seen_files.insert(path.to_path_buf()) {
        return;
    }
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };
    let base = path.parent().unwrap_or_else(|| Path::new("/"));

    for raw_line in content.lines() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let mut words = line.split_whitespace();
        if words.next() == Some("include") {
            for pattern in words {
                parse_include(&base.join(pattern), dirs, seen_files, depth - 1);
            }
            continue;
        }

        // Entries may be separated by spaces, tabs, commas or colons.
        for entry in line.split(|c: char| c.is_whitespace() || c == ',' || c == ':') {
            push_dir(entry, dirs);
        }
    }
}

fn push_dir(entry: &str, dirs: &mut Vec<PathBuf>) {
    if !entry.starts_with('/') {
        return;
    }
    let trimmed = entry.trim_end_matches('/');
    let dir = PathBuf::from(if trimmed.is_empty() { "/" } else { trimmed });
    if !dirs.contains(&dir) {
        dirs.push(dir);
    }
}

/// Follow an `include` pattern. Only a `*` in the file name is expanded;
/// matches are read in sorted order.
fn parse_include(pattern: &Path, dirs: &mut Vec<PathBuf>, seen_files: &mut FxHashSet<PathBuf>, depth: usize) {
    let file_pattern = pattern.file_name().and_then(|name| name.to_str()).unwrap_or("");
    let Some((prefix, suffix)) = file_pattern.split_once('*') else {
        parse_file(pattern, dirs, seen_files, depth);
        return;
    };

    let parent = pattern.parent().unwrap_or_else(|| Path::new("/"));
    let Ok(entries) = fs::read_dir(parent) else {
        return;
    };
    let mut matches: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(prefix) && name.ends_with(suffix))
        })
        .collect();
    matches.sort();

    for path in matches {
        parse_file(&path, dirs, seen_files, depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directories_and_includes() {
        let root = TempDir::new().unwrap();
        let conf_d = root.path().join("ld.so.conf.d");
        fs::create_dir(&conf_d).unwrap();
        fs::write(conf_d.join("b-multiarch.conf"), "# Multiarch support\n/usr/lib/aarch64-linux-gnu\n").unwrap();
        fs::write(conf_d.join("a-local.conf"), "/usr/local/lib/\n/opt/first\n").unwrap();
        fs::write(conf_d.join("ignored.txt"), "/not/included\n").unwrap();

        let conf = root.path().join("ld.so.conf");
        fs::write(&conf, "/opt/first\ninclude ld.so.conf.d/*.conf\n/opt/last, /opt/tail\n").unwrap();

        let dirs = configured_dirs(&conf);
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/opt/first"),
                PathBuf::from("/usr/local/lib"),
                PathBuf::from("/usr/lib/aarch64-linux-gnu"),
                PathBuf::from("/opt/last"),
                PathBuf::from("/opt/tail"),
            ]
        );
    }

    #[test]
    fn test_include_cycle_terminates() {
        let root = TempDir::new().unwrap();
        let a = root.path().join("a.conf");
        let b = root.path().join("b.conf");
        fs::write(&a, format!("/dir/a\ninclude {}\n", b.display())).unwrap();
        fs::write(&b, format!("/dir/b\ninclude {}\n", a.display())).unwrap();

        assert_eq!(configured_dirs(&a), vec![PathBuf::from("/dir/a"), PathBuf::from("/dir/b")]);
    }

    #[test]
    fn test_missing_conf_is_empty() {
        assert!(configured_dirs(Path::new("/nonexistent/ld.so.conf")).is_empty());
    }

    #[test]
    fn test_relative_entries_ignored() {
        let root = TempDir::new().unwrap();
        let conf = root.path().join("ld.so.conf");
        fs::write(&conf, "lib\n  # comment only\n/usr/lib32 # trailing\n").unwrap();

        assert_eq!(configured_dirs(&conf), vec![PathBuf::from("/usr/lib32")]);
    }
}
