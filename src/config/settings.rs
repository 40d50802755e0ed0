// src/config/settings.rs

//! Effective settings for one run.
//!
//! Precedence for every tunable: CLI flag, then the config file, then the
//! built-in default.

use std::path::{Path, PathBuf};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::validate::{validate_cn, validate_minth};
use crate::errors::{Result, RunsampleError};
use crate::pipeline::RunPaths;

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub sample: String,
    pub readsdir: PathBuf,
    pub reference: PathBuf,
    pub outdir: PathBuf,
    pub trim_qual: u32,
    pub head_crop: u32,
    pub minth: f64,
    pub cn: String,
    /// Config file given on the command line, forwarded to stages as `-c`.
    pub config_path: Option<PathBuf>,
    pub tmpdir: Option<PathBuf>,
    pub script_dir: Option<PathBuf>,
}

impl RunSettings {
    /// Merge CLI arguments with the (optional) config file.
    pub fn resolve(args: &CliArgs) -> Result<Self> {
        let cfg = match args.config {
            Some(ref path) => load_and_validate(path)?,
            None => ConfigFile::try_from(RawConfigFile::default())?,
        };
        Self::from_parts(args, &cfg)
    }

    pub fn from_parts(args: &CliArgs, cfg: &ConfigFile) -> Result<Self> {
        validate_sample_name(&args.prefix, &args.reference)?;

        let minth = args.minth.unwrap_or(cfg.base_caller().minth);
        validate_minth(minth).map_err(RunsampleError::ConfigError)?;

        let cn = args.cn.clone().unwrap_or_else(|| cfg.tagreads().cn.clone());
        validate_cn(&cn).map_err(RunsampleError::ConfigError)?;

        let outdir = match args.outdir {
            Some(ref dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        Ok(Self {
            sample: args.prefix.clone(),
            readsdir: args.readsdir.clone(),
            reference: args.reference.clone(),
            outdir,
            trim_qual: args.trim_qual.unwrap_or(cfg.trim_reads().q),
            head_crop: args.head_crop.unwrap_or(cfg.trim_reads().headcrop),
            minth,
            cn,
            config_path: args.config.clone(),
            tmpdir: args
                .tmpdir
                .clone()
                .or_else(|| cfg.workspace().tmpdir.clone()),
            script_dir: args
                .script_dir
                .clone()
                .or_else(|| cfg.workspace().script_dir.clone()),
        })
    }
}

/// The sample name prefixes every output file, so it has to be a plain file
/// name component that keeps the workspace layout free of clashes.
fn validate_sample_name(sample: &str, reference: &Path) -> Result<()> {
    if sample.trim().is_empty() {
        return Err(RunsampleError::ConfigError(
            "sample prefix must not be empty".to_string(),
        ));
    }
    if sample.contains(std::path::is_separator) || sample == "." || sample == ".." {
        return Err(RunsampleError::ConfigError(format!(
            "sample prefix '{sample}' must not contain path separators"
        )));
    }
    if let Some((a, b)) = RunPaths::new("", sample, reference).collision() {
        return Err(RunsampleError::ConfigError(format!(
            "sample prefix '{sample}' with reference '{}' puts {a} and {b} on the same file",
            reference.display()
        )));
    }
    Ok(())
}
