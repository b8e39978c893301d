use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "soscope")]
#[command(about = "Classify the shared libraries mapped into a process snapshot as explained, dlopen or injected")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// JSON output for machine consumption
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify the libraries mapped into a snapshot
    Classify {
        /// The executable the snapshot was taken from
        #[arg(long)]
        exe: PathBuf,

        /// Mapping list captured with the snapshot (/proc/<pid>/maps format)
        #[arg(long)]
        maps: PathBuf,

        /// Loader API symbol that explains runtime-loaded libraries
        #[arg(long, default_value = crate::symbols::DEFAULT_LOADER_SYMBOL)]
        loader_symbol: String,

        /// Extra library search directories (colon separated, like LD_LIBRARY_PATH)
        #[arg(long, env = "LD_LIBRARY_PATH", value_delimiter = ':')]
        library_path: Vec<PathBuf>,

        /// Loader configuration listing additional library directories
        #[arg(long, default_value = crate::config::DEFAULT_LD_SO_CONF)]
        ld_so_conf: PathBuf,

        /// Exit with an error if any library is classified injected
        #[arg(long)]
        fail_on_injected: bool,
    },

    /// List library-name strings found in a section of an executable
    Strings {
        /// Executable to scan
        file: PathBuf,

        /// Section to scan
        #[arg(long, default_value = ".rodata")]
        section: String,
    },
}
