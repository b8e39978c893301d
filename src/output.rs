//! Output formatting for classification runs.
//!
//! - Human-readable terminal output with colored verdict tags
//! - JSON output for machine consumption

use crate::types::{DependencySet, MappedLibrary, RunReport, Verdict};
use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const SCHEMA_VERSION: &str = "1.0";

/// JSON document for one classification run.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput {
    pub schema_version: String,
    pub analysis_timestamp: DateTime<Utc>,
    pub executable: PathBuf,
    pub loader_symbol: String,
    pub loader_present: bool,
    pub dependencies: DependencySet,
    pub libraries: Vec<LibraryEntry>,
    #[serde(default)]
    pub rodata_candidates: Vec<String>,
}

/// A mapped library with its verdict spelled out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryEntry {
    #[serde(flatten)]
    pub library: MappedLibrary,
    pub verdict: Verdict,
}

/// Format a run as pretty-printed JSON.
pub fn format_json(report: &RunReport, libs: &[MappedLibrary], rodata_candidates: &[String]) -> Result<String> {
    let output = JsonOutput {
        schema_version: SCHEMA_VERSION.to_string(),
        analysis_timestamp: Utc::now(),
        executable: report.executable.clone(),
        loader_symbol: report.loader_symbol.clone(),
        loader_present: report.loader_present,
        dependencies: report.dependencies.clone(),
        libraries: libs
            .iter()
            .map(|lib| LibraryEntry { library: lib.clone(), verdict: lib.verdict() })
            .collect(),
        rodata_candidates: rodata_candidates.to_vec(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

fn verdict_tag(verdict: Verdict) -> colored::ColoredString {
    match verdict {
        Verdict::Explained => "explained".bright_green(),
        Verdict::Dlopen => "dlopen".bright_yellow(),
        Verdict::Injected => "INJECTED".bright_red().bold(),
    }
}

/// Format a run for the terminal. Injected libraries come first.
pub fn format_terminal(report: &RunReport, libs: &[MappedLibrary], rodata_candidates: &[String]) -> String {
    let mut output = String::new();

    output.push_str(&format!("├─ {}\n", report.executable.display().to_string().bright_white()));
    output.push_str(&format!(
        "│  {} {} ({} dependencies resolved)\n",
        report.loader_symbol.bright_black(),
        if report.loader_present { "referenced" } else { "not referenced" },
        report.dependencies.len()
    ));
    output.push_str("│\n");

    let mut sorted: Vec<&MappedLibrary> = libs.iter().collect();
    sorted.sort_by_key(|lib| match lib.verdict() {
        Verdict::Injected => 0,
        Verdict::Dlopen => 1,
        Verdict::Explained => 2,
    });

    if sorted.is_empty() {
        output.push_str("│  No mapped libraries\n");
    }
    for lib in sorted {
        output.push_str(&format!("│  [{}] {}\n", verdict_tag(lib.verdict()), lib.path));
    }

    if !rodata_candidates.is_empty() {
        output.push_str("│\n");
        output.push_str(&format!("│  {}\n", "library names in .rodata".bright_black()));
        for candidate in rodata_candidates {
            output.push_str(&format!("│    {}\n", candidate.bright_cyan()));
        }
    }

    let counts = &report.counts;
    output.push_str("│\n");
    output.push_str(&format!(
        "└─ {} explained, {} dlopen, {} injected\n",
        counts.explained,
        counts.dlopen,
        if counts.injected > 0 {
            counts.injected.to_string().bright_red().bold().to_string()
        } else {
            counts.injected.to_string()
        }
    ));
    output
}

/// Format string-scanner candidates for the terminal.
pub fn format_candidates_terminal(section: &str, candidates: &[String]) -> String {
    let mut output = format!("{} candidate(s) in {}\n", candidates.len(), section.bright_white());
    for candidate in candidates {
        output.push_str(&format!("  {}\n", candidate));
    }
    output
}
