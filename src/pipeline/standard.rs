// src/pipeline/standard.rs

//! The single-sample pipeline, in execution order.

use crate::errors::Result;
use crate::pipeline::params::Param;
use crate::pipeline::stage::{Stage, StageSink};
use crate::pipeline::Pipeline;

pub const TRIM_READS: &str = "trim_reads";
pub const ALIGN: &str = "run_bwa";
pub const TAG_READS: &str = "tagreads";
pub const BASE_CALLER: &str = "base_caller";
pub const FLAGSTAT: &str = "flagstat";
pub const GRAPH_SAMPLE: &str = "graphsample";
pub const READ_STATS: &str = "fqstats";
pub const CONSENSUS: &str = "vcf_consensus";

/// Build the standard pipeline.
///
/// Alignment is the only fatal stage: tagging, variant calling, statistics,
/// graphing and consensus all read the alignment it produces.
pub fn standard_pipeline() -> Result<Pipeline> {
    Pipeline::new(vec![
        Stage::builder(TRIM_READS, "trim_reads.py")
            .args("{readsdir} -q {trim_qual} -o {trim_outdir} --head-crop {head_crop}")
            .args_if_set(Param::Config, "-c {config}")
            .produces(Param::TrimOutdir)
            .build()?,
        Stage::builder(ALIGN, "run_bwa_on_samplename.py")
            .args("{trim_outdir} {reference} -o {bamfile}")
            .args_if_set(Param::Config, "-c {config}")
            .sink(StageSink::Dedicated(Param::AlignLog))
            .produces(Param::BamFile)
            .fatal()
            .build()?,
        Stage::builder(TAG_READS, "tagreads.py")
            .args("{bamfile} -CN {CN}")
            .args_if_set(Param::Config, "-c {config}")
            .build()?,
        Stage::builder(BASE_CALLER, "base_caller.py")
            .args("{bamfile} {reference} {vcf} -minth {minth}")
            .args_if_set(Param::Config, "-c {config}")
            .produces(Param::Vcf)
            .build()?,
        Stage::builder(FLAGSTAT, "samtools")
            .args("flagstat {bamfile}")
            .sink(StageSink::CaptureStdout(Param::FlagStats))
            .on_path()
            .produces(Param::FlagStats)
            .build()?,
        Stage::builder(GRAPH_SAMPLE, "graphsample.py")
            .args("{bamfile} -od {tdir}")
            .build()?,
        Stage::builder(READ_STATS, "fqstats.py")
            .args("-o {reads_png}")
            .glob(Param::TrimOutdir, "*.fastq")
            .produces(Param::ReadsPng)
            .build()?,
        Stage::builder(CONSENSUS, "vcf_consensus.py")
            .args("{vcf} -i {samplename} -o {consensus}")
            .produces(Param::Consensus)
            .build()?,
    ])
}
