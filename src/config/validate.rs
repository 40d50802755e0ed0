// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, RunsampleError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RunsampleError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_minth(cfg.base_caller.minth)
        .map_err(|e| RunsampleError::ConfigError(format!("[base_caller].{e}")))?;
    validate_cn(&cfg.tagreads.cn)
        .map_err(|e| RunsampleError::ConfigError(format!("[tagreads].{e}")))?;
    validate_workspace(cfg)?;
    Ok(())
}

/// `minth` is a fraction of depth: it must lie in `(0, 1]`.
pub fn validate_minth(minth: f64) -> std::result::Result<(), String> {
    if !(minth > 0.0 && minth <= 1.0) {
        return Err(format!("minth must be in (0, 1] (got {minth})"));
    }
    Ok(())
}

pub fn validate_cn(cn: &str) -> std::result::Result<(), String> {
    if cn.trim().is_empty() {
        return Err("CN must not be empty".to_string());
    }
    Ok(())
}

fn validate_workspace(cfg: &RawConfigFile) -> Result<()> {
    for (key, value) in [
        ("tmpdir", &cfg.workspace.tmpdir),
        ("script_dir", &cfg.workspace.script_dir),
    ] {
        if let Some(path) = value {
            if path.as_os_str().is_empty() {
                return Err(RunsampleError::ConfigError(format!(
                    "[workspace].{key} must not be an empty path"
                )));
            }
        }
    }
    Ok(())
}
