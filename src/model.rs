use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Column order shared by merged and filtered dataset tables.
pub const DATASET_COLUMNS: [&str; 8] = [
    "sample", "contig", "position", "ref", "alt", "coverage", "vaf", "chunk",
];

/// Sort and dedup key for merged datasets: (contig, position, ref, alt, sample).
pub type DedupKey = (String, u64, String, String, String);

/// One mutation call parsed from a km find_mutation output table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub sample: String,
    pub contig: String,
    /// 1-based position on the contig.
    pub position: u64,
    #[serde(rename = "ref")]
    pub ref_allele: String,
    #[serde(rename = "alt")]
    pub alt_allele: String,
    pub coverage: u64,
    pub vaf: f32,
    /// Id of the chunk whose km run produced this record; 0 when unknown.
    #[serde(default)]
    pub chunk: usize,
}

impl MutationRecord {
    pub fn dedup_key(&self) -> DedupKey {
        (
            self.contig.clone(),
            self.position,
            self.ref_allele.clone(),
            self.alt_allele.clone(),
            self.sample.clone(),
        )
    }

    /// Patient id: the sample id up to the first underscore.
    pub fn patient(&self) -> &str {
        self.sample.split('_').next().unwrap_or(self.sample.as_str())
    }
}

/// A contiguous slice of the targets FASTA assigned to one worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSpec {
    pub id: usize,
    pub start_record: usize,
    pub n_records: usize,
    pub fasta: PathBuf,
}

impl ChunkSpec {
    /// Path of the km output table for this chunk.
    pub fn output_table(&self) -> PathBuf {
        self.fasta.with_extension("km.tsv")
    }
}
