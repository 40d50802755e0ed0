// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `runsample`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runsample",
    version,
    about = "Runs a single sample through the pipeline.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory that contains reads to be mapped.
    #[arg(value_name = "READSDIR")]
    pub readsdir: PathBuf,

    /// The path to the reference to map to.
    #[arg(value_name = "REFERENCE")]
    pub reference: PathBuf,

    /// The prefix to put before every output file generated. Probably the
    /// sample name.
    #[arg(value_name = "PREFIX")]
    pub prefix: String,

    /// Quality threshold passed to read trimming.
    #[arg(long, value_name = "Q")]
    pub trim_qual: Option<u32>,

    /// Number of bases to crop from the start of each read after trimming.
    #[arg(long, value_name = "N")]
    pub head_crop: Option<u32>,

    /// Minimum base frequency threshold for variant calling.
    #[arg(long, value_name = "FRACTION")]
    pub minth: Option<f64>,

    /// Sequencing center name recorded when tagging reads.
    #[arg(long = "cn", value_name = "NAME")]
    pub cn: Option<String>,

    /// The output directory for all files to be put.
    ///
    /// Default: the current working directory.
    #[arg(short = 'o', long, value_name = "DIR")]
    pub outdir: Option<PathBuf>,

    /// Pipeline config file (TOML). Also forwarded to every stage that
    /// accepts `-c`.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Where to allocate the scratch workspace.
    ///
    /// Default: `[workspace].tmpdir`, then `$TMPDIR`, then the platform temp dir.
    #[arg(long, value_name = "DIR")]
    pub tmpdir: Option<PathBuf>,

    /// Directory the pipeline stage scripts are resolved against.
    ///
    /// Default: stages are looked up on `PATH`.
    #[arg(long, value_name = "DIR")]
    pub script_dir: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNSAMPLE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate inputs and print the stages, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
