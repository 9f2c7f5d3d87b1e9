use thiserror::Error;

#[derive(Debug, Error)]
pub enum KmtoolsError {
    #[error("could not read {path}")]
    ReadWithPath {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[error("could not write to {path}")]
    Write {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[error("could not create output directory {path}")]
    OutputDir {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[error("no FASTA records found in {path}")]
    EmptyFasta { path: std::path::PathBuf },

    #[error("missing or malformed header in km table {path}")]
    KmTableHeader { path: std::path::PathBuf },

    #[error("expected {expected} fields (got {n_fields}) in line {line_num} of km table {path}")]
    KmTableFields {
        path: std::path::PathBuf,
        line_num: usize,
        n_fields: usize,
        expected: usize,
    },

    #[error("could not parse {field} in line {line_num} of km table {path}")]
    KmTableInt {
        #[source]
        source: std::num::ParseIntError,
        path: std::path::PathBuf,
        line_num: usize,
        field: &'static str,
    },

    #[error("could not parse {field} in line {line_num} of km table {path}")]
    KmTableFloat {
        #[source]
        source: std::num::ParseFloatError,
        path: std::path::PathBuf,
        line_num: usize,
        field: &'static str,
    },

    #[error("VAF {vaf} out of range [0, 1] in line {line_num} of km table {path}")]
    VafRange {
        path: std::path::PathBuf,
        line_num: usize,
        vaf: f32,
    },

    #[error("could not read CSV {path}")]
    CsvRead {
        #[source]
        source: csv::Error,
        path: std::path::PathBuf,
    },

    #[error("could not write to CSV")]
    CsvWrite(#[from] csv::Error),

    #[error("could not write chunk manifest {path}")]
    ManifestWrite {
        #[source]
        source: serde_json::Error,
        path: std::path::PathBuf,
    },

    #[error("could not launch {program} for chunk {chunk_id}")]
    KmLaunch {
        #[source]
        source: std::io::Error,
        program: String,
        chunk_id: usize,
    },

    #[error("km find_mutation exited with status {} on chunk {chunk_id}: {stderr}", .code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    KmExit {
        chunk_id: usize,
        code: Option<i32>,
        stderr: String,
    },

    #[error("km find_mutation failed on chunk(s) {failed:?}: {first_stderr}")]
    ChunksFailed {
        failed: Vec<usize>,
        first_stderr: String,
    },

    #[error("could not build worker thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("could not render chart {path}")]
    Plot {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        path: std::path::PathBuf,
    },

    #[error("unknown chart '{name}' (valid charts: vaf, patient, sample, overall)")]
    UnknownChart { name: String },

    #[error("no result tables found in the given inputs")]
    NoMergeInputs,

    #[error("no records to plot in {path}")]
    EmptyDataset { path: std::path::PathBuf },
}

pub type Result<T> = std::result::Result<T, KmtoolsError>;
