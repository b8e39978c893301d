use anyhow::{Context, Result};
use clap::Parser;
use soscope::cli::{Args, Command};
use soscope::{
    maps, output, strings, Classifier, ElfDependencyWalker, ExecutableDescriptor, ScanConfig,
};
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins; otherwise --verbose picks debug.
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if args.verbose {
        EnvFilter::new("soscope=debug")
    } else {
        EnvFilter::new("soscope=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    debug!("Logging initialized (verbose={})", args.verbose);

    match args.command {
        Command::Classify { exe, maps, loader_symbol, library_path, ld_so_conf, fail_on_injected } => {
            let config = ScanConfig::default()
                .with_loader_symbol(loader_symbol)
                .with_library_path(library_path.into_iter().filter(|p| !p.as_os_str().is_empty()).collect())
                .with_ld_so_conf(Some(ld_so_conf));
            classify(&exe, &maps, config, fail_on_injected, args.json)
        }
        Command::Strings { file, section } => scan_strings(&file, &section, args.json),
    }
}

fn classify(
    exe: &Path,
    maps_path: &Path,
    config: ScanConfig,
    fail_on_injected: bool,
    json: bool,
) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let mut libs = maps::read_maps(maps_path, config.max_mapped_libraries)
        .with_context(|| format!("Failed to read mapping list {}", maps_path.display()))?;

    let exe_desc = ExecutableDescriptor::new(exe);
    let classifier = Classifier::new(ElfDependencyWalker::new(&config), config);
    let report = classifier
        .classify(&exe_desc, &mut libs)
        .with_context(|| format!("Failed to classify libraries for {}", exe.display()))?;

    // Informational only; a broken .rodata does not fail the run.
    let candidates = strings::rodata_library_candidates(exe).unwrap_or_else(|e| {
        debug!("rodata scan skipped: {}", e);
        Vec::new()
    });

    if json {
        println!("{}", output::format_json(&report, &libs, &candidates)?);
    } else {
        print!("{}", output::format_terminal(&report, &libs, &candidates));
    }

    if fail_on_injected && report.counts.injected > 0 {
        anyhow::bail!(
            "{} injected librar{} in snapshot of {}",
            report.counts.injected,
            if report.counts.injected == 1 { "y" } else { "ies" },
            exe.display()
        );
    }
    Ok(())
}

fn scan_strings(file: &Path, section: &str, json: bool) -> Result<()> {
    let candidates = strings::section_library_candidates(file, section)
        .with_context(|| format!("Failed to scan {} in {}", section, file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
    } else {
        print!("{}", output::format_candidates_terminal(section, &candidates));
    }
    Ok(())
}
