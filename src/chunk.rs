//! Partitioning the targets FASTA and driving `km find_mutation` workers.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use bio::io::fasta;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::error::{KmtoolsError, Result};
use crate::merge;
use crate::model::ChunkSpec;
use crate::reader;

pub struct ChunkOptions {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub threads: usize,
    pub km_bin: String,
    pub km_options: String,
    pub merge: bool,
}

pub fn run(opts: &ChunkOptions) -> Result<()> {
    std::fs::create_dir_all(&opts.output_dir).map_err(|source| KmtoolsError::OutputDir {
        source,
        path: opts.output_dir.clone(),
    })?;

    let records = reader::read_fasta_records(&opts.input)?;
    log::info!(
        "partitioning {} record(s) from {} across {} worker(s)",
        records.len(),
        opts.input.display(),
        opts.threads
    );

    let specs = partition(&records, opts.threads, &opts.output_dir)?;
    write_manifest(&specs, &opts.output_dir)?;
    log::info!(
        "wrote {} chunk(s) to {}",
        specs.len(),
        opts.output_dir.display()
    );

    run_workers(&specs, opts)?;

    if opts.merge {
        let merged = opts.output_dir.join("merged.csv");
        merge::run(&[opts.output_dir.clone()], &merged)?;
    }
    Ok(())
}

/// Splits records into up to `n_chunks` contiguous, near-equal chunks and
/// writes each as a FASTA under `dir`. Chunk sizes differ by at most one
/// record; empty chunks are never created.
pub(crate) fn partition(
    records: &[fasta::Record],
    n_chunks: usize,
    dir: &Path,
) -> Result<Vec<ChunkSpec>> {
    let n_chunks = n_chunks.min(records.len());
    let base = records.len() / n_chunks;
    let remainder = records.len() % n_chunks;

    let mut specs = Vec::with_capacity(n_chunks);
    let mut start = 0;
    for id in 0..n_chunks {
        let n_records = if id < remainder { base + 1 } else { base };
        let path = dir.join(format!("chunk_{id:03}.fa"));
        write_chunk_fasta(&records[start..start + n_records], &path)?;
        specs.push(ChunkSpec {
            id,
            start_record: start,
            n_records,
            fasta: path,
        });
        start += n_records;
    }
    Ok(specs)
}

fn write_chunk_fasta(records: &[fasta::Record], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|source| KmtoolsError::Write {
        source,
        path: path.to_path_buf(),
    })?;
    let mut writer = fasta::Writer::new(file);
    for record in records {
        writer
            .write_record(record)
            .map_err(|source| KmtoolsError::Write {
                source,
                path: path.to_path_buf(),
            })?;
    }
    writer.flush().map_err(|source| KmtoolsError::Write {
        source,
        path: path.to_path_buf(),
    })?;
    Ok(())
}

fn write_manifest(specs: &[ChunkSpec], dir: &Path) -> Result<()> {
    let path = dir.join("manifest.json");
    let file = File::create(&path).map_err(|source| KmtoolsError::Write {
        source,
        path: path.clone(),
    })?;
    serde_json::to_writer_pretty(file, specs)
        .map_err(|source| KmtoolsError::ManifestWrite { source, path })
}

/// Runs km over every chunk on a pool of exactly `threads` workers. All
/// chunks run to completion; failures are reported together afterwards.
fn run_workers(specs: &[ChunkSpec], opts: &ChunkOptions) -> Result<()> {
    let pool = ThreadPoolBuilder::new().num_threads(opts.threads).build()?;
    let pb = ProgressBar::new(specs.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:30} {pos}/{len} chunks").unwrap(),
    );

    let results: Vec<(usize, Result<()>)> = pool.install(|| {
        specs
            .par_iter()
            .map(|spec| {
                let result = run_km(spec, &opts.km_bin, &opts.km_options);
                pb.inc(1);
                (spec.id, result)
            })
            .collect()
    });
    pb.abandon();

    let mut failed = Vec::new();
    let mut first_stderr = String::new();
    for (chunk_id, result) in results {
        if let Err(err) = result {
            if failed.is_empty() {
                if let KmtoolsError::KmExit { stderr, .. } = &err {
                    first_stderr = stderr.clone();
                }
            }
            log::warn!("chunk {chunk_id}: {err}");
            failed.push(chunk_id);
        }
    }
    if failed.is_empty() {
        Ok(())
    } else {
        Err(KmtoolsError::ChunksFailed {
            failed,
            first_stderr,
        })
    }
}

fn run_km(spec: &ChunkSpec, km_bin: &str, km_options: &str) -> Result<()> {
    let table = spec.output_table();
    let out = File::create(&table).map_err(|source| KmtoolsError::Write {
        source,
        path: table.clone(),
    })?;

    let mut cmd = Command::new(km_bin);
    cmd.arg("find_mutation")
        .arg(&spec.fasta)
        .args(km_options.split_whitespace());

    let child = cmd
        .stdout(Stdio::from(out))
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| KmtoolsError::KmLaunch {
            source,
            program: km_bin.to_string(),
            chunk_id: spec.id,
        })?;

    let output = child
        .wait_with_output()
        .map_err(|source| KmtoolsError::KmLaunch {
            source,
            program: km_bin.to_string(),
            chunk_id: spec.id,
        })?;
    if !output.status.success() {
        return Err(KmtoolsError::KmExit {
            chunk_id: spec.id,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
