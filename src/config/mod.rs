// src/config/mod.rs

//! Configuration loading and validation for runsample.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate thresholds and paths (`validate.rs`).
//! - Merge CLI flags, config values and defaults (`settings.rs`).

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    BaseCallerSection, ConfigFile, RawConfigFile, TagReadsSection, TrimReadsSection,
    WorkspaceSection,
};
pub use settings::RunSettings;
