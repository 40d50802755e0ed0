#![allow(dead_code)]

use std::fs;
use std::path::Path;

use runsample::pipeline::{Param, Pipeline, Stage, StageSink};
use runsample::workspace::Commit;

pub use runsample_test_utils::init_tracing;

/// Six stages shaped like the standard pipeline: trim, a fatal alignment,
/// then four recoverable stages reading its output.
pub fn six_stage_pipeline() -> Pipeline {
    Pipeline::new(vec![
        Stage::builder("trim", "trim.sh")
            .args("{readsdir} -o {trim_outdir}")
            .build()
            .unwrap(),
        Stage::builder("align", "align.sh")
            .args("{trim_outdir} {reference} -o {bamfile}")
            .sink(StageSink::Dedicated(Param::AlignLog))
            .fatal()
            .build()
            .unwrap(),
        Stage::builder("tag", "tag.sh")
            .args("{bamfile} -CN {CN}")
            .build()
            .unwrap(),
        Stage::builder("call", "call.sh")
            .args("{bamfile} {reference} {vcf} -minth {minth}")
            .build()
            .unwrap(),
        Stage::builder("stats", "stats.sh")
            .args("{bamfile}")
            .sink(StageSink::CaptureStdout(Param::FlagStats))
            .build()
            .unwrap(),
        Stage::builder("consensus", "consensus.sh")
            .args("{vcf} -i {samplename} -o {consensus}")
            .build()
            .unwrap(),
    ])
    .unwrap()
}

/// Parse `.provenance/commits.jsonl` under `root`.
pub fn read_commits(root: &Path) -> Vec<Commit> {
    let text = fs::read_to_string(root.join(".provenance").join("commits.jsonl")).unwrap();
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

/// Sorted top-level entry names of `dir`.
pub fn entry_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
