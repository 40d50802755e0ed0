// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Pipeline configuration as read from a TOML file.
///
/// ```toml
/// [trim_reads]
/// q = 25
/// headcrop = 5
///
/// [base_caller]
/// minth = 0.9
///
/// [tagreads]
/// CN = "Sequencing Core"
///
/// [workspace]
/// tmpdir = "/dev/shm"
/// script_dir = "/opt/pipeline/bin"
/// ```
///
/// All sections are optional and have the same defaults the CLI uses.
/// The stages receive the same file through `-c`, so unknown sections are
/// allowed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub trim_reads: TrimReadsSection,

    #[serde(default)]
    pub base_caller: BaseCallerSection,

    #[serde(default)]
    pub tagreads: TagReadsSection,

    #[serde(default)]
    pub workspace: WorkspaceSection,
}

/// Validated configuration. Only obtainable through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    raw: RawConfigFile,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self { raw }
    }

    pub fn trim_reads(&self) -> &TrimReadsSection {
        &self.raw.trim_reads
    }

    pub fn base_caller(&self) -> &BaseCallerSection {
        &self.raw.base_caller
    }

    pub fn tagreads(&self) -> &TagReadsSection {
        &self.raw.tagreads
    }

    pub fn workspace(&self) -> &WorkspaceSection {
        &self.raw.workspace
    }
}

/// `[trim_reads]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TrimReadsSection {
    /// Quality threshold to trim on.
    #[serde(default = "default_trim_qual")]
    pub q: u32,

    /// How many bases to crop off the beginning of the reads after quality
    /// trimming.
    #[serde(default)]
    pub headcrop: u32,
}

pub fn default_trim_qual() -> u32 {
    20
}

impl Default for TrimReadsSection {
    fn default() -> Self {
        Self {
            q: default_trim_qual(),
            headcrop: 0,
        }
    }
}

/// `[base_caller]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BaseCallerSection {
    /// Minimum fraction of the depth a base must reach to be called.
    #[serde(default = "default_minth")]
    pub minth: f64,
}

pub fn default_minth() -> f64 {
    0.8
}

impl Default for BaseCallerSection {
    fn default() -> Self {
        Self {
            minth: default_minth(),
        }
    }
}

/// `[tagreads]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TagReadsSection {
    /// Sequencing center name written into the read groups.
    #[serde(rename = "CN", default = "default_cn")]
    pub cn: String,
}

pub fn default_cn() -> String {
    "Unknown".to_string()
}

impl Default for TagReadsSection {
    fn default() -> Self {
        Self { cn: default_cn() }
    }
}

/// `[workspace]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceSection {
    /// Base directory for scratch workspaces. Falls back to `$TMPDIR`.
    #[serde(default)]
    pub tmpdir: Option<PathBuf>,

    /// Directory the stage scripts live in. Falls back to `PATH` lookup.
    #[serde(default)]
    pub script_dir: Option<PathBuf>,
}
