use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use clap::Args;

use crate::chunk::{self, ChunkOptions};
use crate::error::Result;
use crate::filter;
use crate::merge;
use crate::plot;

fn default_chunk_dir() -> String {
    format!("kmtools_chunks_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

fn parse_threads(s: &str) -> std::result::Result<usize, String> {
    let threads: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if threads == 0 {
        return Err("thread count must be at least 1".to_string());
    }
    Ok(threads)
}

/// Runs a pipeline stage, logging its wall-clock time.
pub(crate) fn timed<T>(label: &str, stage: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let result = stage()?;
    log::info!("{label} completed in {:.2}s", start.elapsed().as_secs_f64());
    Ok(result)
}

/// Chunk input data and run km find_mutation over the chunks.
#[derive(Args, Debug)]
pub struct ChunkArgs {
    /// Targets FASTA to partition.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Number of worker threads (and chunks) to use.
    #[arg(long, value_parser = parse_threads)]
    pub threads: usize,

    /// Options passed to every km find_mutation invocation.
    #[arg(long, allow_hyphen_values = true)]
    pub km_find_mutation_options: String,

    /// Merge chunk outputs after processing.
    #[arg(long)]
    pub merge: bool,

    /// Directory for chunk FASTAs and km output tables.
    #[arg(long, default_value_t = default_chunk_dir())]
    pub output_dir: String,

    /// km executable to invoke.
    #[arg(long, default_value = "km")]
    pub km_bin: String,
}

impl ChunkArgs {
    pub fn run(&self) -> Result<()> {
        chunk::run(&ChunkOptions {
            input: self.input.clone(),
            output_dir: PathBuf::from(&self.output_dir),
            threads: self.threads,
            km_bin: self.km_bin.clone(),
            km_options: self.km_find_mutation_options.clone(),
            merge: self.merge,
        })
    }
}

/// Merge per-chunk result tables.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Result files, or directories scanned for *.tsv tables.
    #[arg(required = true, num_args = 1.., value_hint = clap::ValueHint::AnyPath)]
    pub inputs: Vec<PathBuf>,

    /// Merged output file.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,
}

impl MergeArgs {
    pub fn run(&self) -> Result<()> {
        merge::run(&self.inputs, &self.output)
    }
}

/// Filter a merged dataset against a reference.
#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Reference FASTA file.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub reference: PathBuf,

    /// Merged km output file to filter.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub km_output: PathBuf,

    /// Filtered output file.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,
}

impl FilterArgs {
    pub fn run(&self) -> Result<()> {
        filter::run(&self.reference, &self.km_output, &self.output)
    }
}

/// Plot summary charts from a filtered dataset.
#[derive(Args, Debug)]
pub struct PlotArgs {
    /// Filtered result file to plot.
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Directory to save plots.
    #[arg(long, default_value = ".", value_hint = clap::ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// Comma-separated list of charts to generate, or "all".
    #[arg(long, default_value = "all")]
    pub charts: String,
}

impl PlotArgs {
    pub fn run(&self) -> Result<()> {
        let charts = plot::parse_charts(&self.charts)?;
        plot::run(&self.file, &self.output_dir, &charts)
    }
}

/// Run the full pipeline: chunk -> merge -> filter -> plot.
#[derive(Args, Debug)]
pub struct RunallArgs {
    /// Targets FASTA to partition.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Number of threads for chunking.
    #[arg(long, value_parser = parse_threads)]
    pub threads: usize,

    /// Options passed to every km find_mutation invocation.
    #[arg(long, allow_hyphen_values = true)]
    pub km_find_mutation_options: String,

    /// Directory for chunk FASTAs and km output tables.
    #[arg(long, default_value_t = default_chunk_dir())]
    pub chunk_dir: String,

    /// km executable to invoke.
    #[arg(long, default_value = "km")]
    pub km_bin: String,

    /// Files or directories to merge after chunking.
    #[arg(long, required = true, num_args = 1.., value_hint = clap::ValueHint::AnyPath)]
    pub merge_inputs: Vec<PathBuf>,

    /// Output file for merged data.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub merge_output: PathBuf,

    /// Reference FASTA file.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub reference: PathBuf,

    /// Output file for filtered results.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub filtered_output: PathBuf,

    /// Directory to save plots.
    #[arg(long, default_value = ".", value_hint = clap::ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// Comma-separated list of charts to generate, or "all".
    #[arg(long, default_value = "all")]
    pub charts: String,
}

impl RunallArgs {
    pub fn run(&self) -> Result<()> {
        log::info!("running full pipeline (chunk -> merge -> filter -> plot)");
        // Reject a bad chart list before any work happens
        let charts = plot::parse_charts(&self.charts)?;

        timed("chunk", || {
            chunk::run(&ChunkOptions {
                input: self.input.clone(),
                output_dir: PathBuf::from(&self.chunk_dir),
                threads: self.threads,
                km_bin: self.km_bin.clone(),
                km_options: self.km_find_mutation_options.clone(),
                // runall always merges chunk outputs
                merge: true,
            })
        })?;
        timed("merge", || {
            merge::run(&self.merge_inputs, &self.merge_output)
        })?;
        timed("filter", || {
            filter::run(&self.reference, &self.merge_output, &self.filtered_output)
        })?;
        timed("plot", || {
            plot::run(&self.filtered_output, &self.output_dir, &charts)
        })?;

        log::info!("pipeline complete");
        Ok(())
    }
}
