// src/pipeline/params.rs

//! Named substitution fields for stage argument templates.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::RunSettings;
use crate::workspace::PROVENANCE_DIR;

/// Every field a stage template may reference as `{name}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Param {
    SampleName,
    Workspace,
    ReadsDir,
    Reference,
    BamFile,
    FlagStats,
    Consensus,
    Vcf,
    ReadsPng,
    TrimOutdir,
    AlignLog,
    Transcript,
    Cn,
    TrimQual,
    HeadCrop,
    MinTh,
    Config,
}

impl Param {
    pub const ALL: [Param; 17] = [
        Param::SampleName,
        Param::Workspace,
        Param::ReadsDir,
        Param::Reference,
        Param::BamFile,
        Param::FlagStats,
        Param::Consensus,
        Param::Vcf,
        Param::ReadsPng,
        Param::TrimOutdir,
        Param::AlignLog,
        Param::Transcript,
        Param::Cn,
        Param::TrimQual,
        Param::HeadCrop,
        Param::MinTh,
        Param::Config,
    ];

    /// Placeholder name as written in templates.
    pub fn as_str(self) -> &'static str {
        match self {
            Param::SampleName => "samplename",
            Param::Workspace => "tdir",
            Param::ReadsDir => "readsdir",
            Param::Reference => "reference",
            Param::BamFile => "bamfile",
            Param::FlagStats => "flagstats",
            Param::Consensus => "consensus",
            Param::Vcf => "vcf",
            Param::ReadsPng => "reads_png",
            Param::TrimOutdir => "trim_outdir",
            Param::AlignLog => "bwalog",
            Param::Transcript => "stdlog",
            Param::Cn => "CN",
            Param::TrimQual => "trim_qual",
            Param::HeadCrop => "head_crop",
            Param::MinTh => "minth",
            Param::Config => "config",
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Param {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Param::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown template parameter '{{{s}}}'"))
    }
}

/// Fixed file layout of a run inside its workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub root: PathBuf,
    pub reference: PathBuf,
    pub bamfile: PathBuf,
    pub flagstats: PathBuf,
    pub consensus: PathBuf,
    pub vcf: PathBuf,
    pub reads_png: PathBuf,
    pub trim_outdir: PathBuf,
    pub align_log: PathBuf,
    pub transcript: PathBuf,
    pub run_log: PathBuf,
}

impl RunPaths {
    /// `reference` is the caller's reference file; only its file name is
    /// kept, since the reference is copied into the workspace.
    pub fn new(root: impl Into<PathBuf>, sample: &str, reference: &Path) -> Self {
        let root = root.into();
        let reference_name = reference
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("reference.fasta"));
        let bamfile = root.join(format!("{sample}.bam"));

        Self {
            reference: root.join(reference_name),
            consensus: with_suffix(&bamfile, ".consensus.fasta"),
            vcf: with_suffix(&bamfile, ".vcf"),
            bamfile,
            flagstats: root.join("flagstats.txt"),
            reads_png: root.join(format!("{sample}.reads.png")),
            trim_outdir: root.join("trimmed_reads"),
            align_log: root.join("bwa.log"),
            transcript: root.join(format!("{sample}.std.log")),
            run_log: root.join(format!("{sample}.log")),
            root,
        }
    }
}

impl RunPaths {
    /// First two entries of the layout that name the same file, if any.
    ///
    /// The sample name and the reference's file name feed the layout, so
    /// e.g. sample `bwa` would put the run log on top of the aligner's log.
    pub fn collision(&self) -> Option<(&'static str, &'static str)> {
        let provenance = self.root.join(PROVENANCE_DIR);
        let entries: [(&'static str, &Path); 11] = [
            ("reference", &self.reference),
            ("bamfile", &self.bamfile),
            ("flagstats", &self.flagstats),
            ("consensus", &self.consensus),
            ("vcf", &self.vcf),
            ("reads_png", &self.reads_png),
            ("trim_outdir", &self.trim_outdir),
            ("align_log", &self.align_log),
            ("transcript", &self.transcript),
            ("run_log", &self.run_log),
            ("provenance", &provenance),
        ];
        entries.iter().enumerate().find_map(|(i, (a, pa))| {
            entries[i + 1..]
                .iter()
                .find(|(_, pb)| pb == pa)
                .map(|(b, _)| (*a, *b))
        })
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

/// Values for the template parameters of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageParams {
    values: BTreeMap<Param, String>,
}

impl StageParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard parameter set for a run rooted at `paths.root`.
    pub fn for_run(settings: &RunSettings, paths: &RunPaths) -> Self {
        let mut params = Self::new()
            .with(Param::SampleName, &settings.sample)
            .with_path(Param::Workspace, &paths.root)
            .with_path(Param::ReadsDir, &settings.readsdir)
            .with_path(Param::Reference, &paths.reference)
            .with_path(Param::BamFile, &paths.bamfile)
            .with_path(Param::FlagStats, &paths.flagstats)
            .with_path(Param::Consensus, &paths.consensus)
            .with_path(Param::Vcf, &paths.vcf)
            .with_path(Param::ReadsPng, &paths.reads_png)
            .with_path(Param::TrimOutdir, &paths.trim_outdir)
            .with_path(Param::AlignLog, &paths.align_log)
            .with_path(Param::Transcript, &paths.transcript)
            .with(Param::Cn, &settings.cn)
            .with(Param::TrimQual, settings.trim_qual.to_string())
            .with(Param::HeadCrop, settings.head_crop.to_string())
            .with(Param::MinTh, settings.minth.to_string());
        if let Some(ref config) = settings.config_path {
            params = params.with_path(Param::Config, config);
        }
        params
    }

    pub fn with(mut self, param: Param, value: impl Into<String>) -> Self {
        self.set(param, value);
        self
    }

    pub fn with_path(self, param: Param, path: &Path) -> Self {
        self.with(param, path.to_string_lossy())
    }

    pub fn set(&mut self, param: Param, value: impl Into<String>) {
        self.values.insert(param, value.into());
    }

    pub fn get(&self, param: Param) -> Option<&str> {
        self.values.get(&param).map(String::as_str)
    }

    pub fn path(&self, param: Param) -> Option<PathBuf> {
        self.get(param).map(PathBuf::from)
    }

    pub fn contains(&self, param: Param) -> bool {
        self.values.contains_key(&param)
    }
}
