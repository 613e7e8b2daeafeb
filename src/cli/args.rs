use crate::io::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cppsig")]
#[command(about = "C++ class method signature extractor for binding generators", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Inputs shared by the scanning commands.
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Header or source files to scan
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Configuration file (defaults to the nearest .cppsig.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Leave class templates out
    #[arg(long = "no-templates")]
    pub no_templates: bool,

    /// Number of parallel jobs (0 = all cores)
    #[arg(short = 'j', long = "jobs", default_value = "0")]
    pub jobs: usize,

    /// Compiler arguments for the frontend, after `--`
    #[arg(last = true)]
    pub compiler_args: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the method table of every class
    Methods {
        #[command(flatten)]
        scan: ScanArgs,

        /// Only this class (qualified or bare name)
        #[arg(long)]
        class: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep internal type tags (`int32`, `float64`) instead of `int32_t`/`double`
        #[arg(long = "raw-types")]
        raw_types: bool,

        /// Fail on the first method whose types cannot be resolved
        #[arg(long)]
        strict: bool,
    },

    /// List the classes found in each file
    Classes {
        #[command(flatten)]
        scan: ScanArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Initialize a .cppsig.toml configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
