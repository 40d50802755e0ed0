#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use runsample::config::{ConfigFile, RawConfigFile, RunSettings};
use runsample::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn trim_qual(mut self, q: u32) -> Self {
        self.config.trim_reads.q = q;
        self
    }

    pub fn head_crop(mut self, n: u32) -> Self {
        self.config.trim_reads.headcrop = n;
        self
    }

    pub fn minth(mut self, minth: f64) -> Self {
        self.config.base_caller.minth = minth;
        self
    }

    pub fn cn(mut self, cn: &str) -> Self {
        self.config.tagreads.cn = cn.to_string();
        self
    }

    pub fn tmpdir(mut self, dir: &Path) -> Self {
        self.config.workspace.tmpdir = Some(dir.to_path_buf());
        self
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// On-disk inputs for one run, all under a single temporary directory:
///
/// ```text
/// <tmp>/reads/        two fastq files
/// <tmp>/ref.fasta
/// <tmp>/scratch/      workspace pool
/// <tmp>/out/<sample>  publish destination (not created)
/// ```
pub struct RunFixture {
    pub dir: TempDir,
    pub sample: String,
}

impl RunFixture {
    pub fn new(sample: &str) -> Self {
        let dir = tempfile::tempdir().expect("create fixture dir");
        let reads = dir.path().join("reads");
        fs::create_dir_all(&reads).unwrap();
        fs::write(reads.join("r1.fastq"), "@r1\nACGT\n+\nIIII\n").unwrap();
        fs::write(reads.join("r2.fastq"), "@r2\nTTGA\n+\nIIII\n").unwrap();
        fs::write(dir.path().join("ref.fasta"), ">ref\nACGTACGT\n").unwrap();
        fs::create_dir_all(dir.path().join("scratch")).unwrap();
        Self {
            dir,
            sample: sample.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn readsdir(&self) -> PathBuf {
        self.path().join("reads")
    }

    pub fn reference(&self) -> PathBuf {
        self.path().join("ref.fasta")
    }

    pub fn scratch(&self) -> PathBuf {
        self.path().join("scratch")
    }

    pub fn outdir(&self) -> PathBuf {
        self.path().join("out").join(&self.sample)
    }

    /// Entries currently in the scratch pool.
    pub fn scratch_entries(&self) -> Vec<PathBuf> {
        let mut entries: Vec<_> = fs::read_dir(self.scratch())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        entries.sort();
        entries
    }

    pub fn settings(&self) -> RunSettings {
        RunSettingsBuilder::new(&self.sample)
            .readsdir(&self.readsdir())
            .reference(&self.reference())
            .outdir(&self.outdir())
            .tmpdir(&self.scratch())
            .build()
    }
}

/// Builder for `RunSettings` with the built-in defaults.
pub struct RunSettingsBuilder {
    settings: RunSettings,
}

impl RunSettingsBuilder {
    pub fn new(sample: &str) -> Self {
        Self {
            settings: RunSettings {
                sample: sample.to_string(),
                readsdir: PathBuf::from("reads"),
                reference: PathBuf::from("ref.fasta"),
                outdir: PathBuf::from("out"),
                trim_qual: 20,
                head_crop: 0,
                minth: 0.8,
                cn: "Unknown".to_string(),
                config_path: None,
                tmpdir: None,
                script_dir: None,
            },
        }
    }

    pub fn readsdir(mut self, p: &Path) -> Self {
        self.settings.readsdir = p.to_path_buf();
        self
    }

    pub fn reference(mut self, p: &Path) -> Self {
        self.settings.reference = p.to_path_buf();
        self
    }

    pub fn outdir(mut self, p: &Path) -> Self {
        self.settings.outdir = p.to_path_buf();
        self
    }

    pub fn tmpdir(mut self, p: &Path) -> Self {
        self.settings.tmpdir = Some(p.to_path_buf());
        self
    }

    pub fn config_path(mut self, p: &Path) -> Self {
        self.settings.config_path = Some(p.to_path_buf());
        self
    }

    pub fn cn(mut self, cn: &str) -> Self {
        self.settings.cn = cn.to_string();
        self
    }

    pub fn build(self) -> RunSettings {
        self.settings
    }
}
