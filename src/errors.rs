// src/errors.rs

//! Crate-wide error type and `Result` alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunsampleError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0} is not an executable?")]
    CommandNotFound(String),

    #[error("failed to launch '{program}': {source}")]
    LaunchError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not create scratch workspace under {base:?}: {source}")]
    WorkspaceCreate {
        base: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0:?} already exists and is not empty")]
    WorkspaceConflict(PathBuf),

    #[error("Provenance error: {0}")]
    Provenance(String),

    #[error("stage '{stage}' needs parameter '{param}' but it has no value")]
    MissingParameter { stage: String, param: String },

    #[error("Invalid stage definition: {0}")]
    InvalidStage(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RunsampleError>;
