//! Chart selection and summary aggregates over filtered datasets.

use std::path::Path;
use std::str::FromStr;

use itertools::Itertools;

use crate::error::{KmtoolsError, Result};
use crate::model::MutationRecord;
use crate::output;
use crate::reader;

/// Charts kmtools can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chart {
    Vaf,
    Patient,
    Sample,
    Overall,
}

impl Chart {
    pub const ALL: [Chart; 4] = [Chart::Vaf, Chart::Patient, Chart::Sample, Chart::Overall];

    pub fn name(self) -> &'static str {
        match self {
            Chart::Vaf => "vaf",
            Chart::Patient => "patient",
            Chart::Sample => "sample",
            Chart::Overall => "overall",
        }
    }
}

impl FromStr for Chart {
    type Err = KmtoolsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vaf" => Ok(Chart::Vaf),
            "patient" => Ok(Chart::Patient),
            "sample" => Ok(Chart::Sample),
            "overall" => Ok(Chart::Overall),
            _ => Err(KmtoolsError::UnknownChart {
                name: s.to_string(),
            }),
        }
    }
}

/// Parses a comma-separated chart list; `all` expands to every chart.
pub fn parse_charts(spec: &str) -> Result<Vec<Chart>> {
    if spec.trim() == "all" {
        return Ok(Chart::ALL.to_vec());
    }
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Chart::from_str)
        .collect()
}

pub fn run(file: &Path, output_dir: &Path, charts: &[Chart]) -> Result<()> {
    let records = reader::read_dataset(file)?;
    if records.is_empty() {
        return Err(KmtoolsError::EmptyDataset {
            path: file.to_path_buf(),
        });
    }
    std::fs::create_dir_all(output_dir).map_err(|source| KmtoolsError::OutputDir {
        source,
        path: output_dir.to_path_buf(),
    })?;

    for &chart in charts {
        let path = output_dir.join(format!("{}.png", chart.name()));
        log::info!("rendering {} chart to {}", chart.name(), path.display());
        match chart {
            Chart::Vaf => output::plot_vaf_histogram(&records, &path)?,
            Chart::Patient => output::plot_count_bars(
                "Mutations per Patient",
                "Patient",
                &patient_counts(&records),
                &path,
            )?,
            Chart::Sample => output::plot_count_bars(
                "Mutations per Sample",
                "Sample",
                &sample_counts(&records),
                &path,
            )?,
            Chart::Overall => output::plot_count_bars(
                "Mutations per Contig",
                "Contig",
                &contig_counts(&records),
                &path,
            )?,
        }
    }
    Ok(())
}

pub(crate) fn sample_counts(records: &[MutationRecord]) -> Vec<(String, usize)> {
    records
        .iter()
        .map(|r| r.sample.clone())
        .counts()
        .into_iter()
        .sorted()
        .collect()
}

pub(crate) fn patient_counts(records: &[MutationRecord]) -> Vec<(String, usize)> {
    records
        .iter()
        .map(|r| r.patient().to_string())
        .counts()
        .into_iter()
        .sorted()
        .collect()
}

pub(crate) fn contig_counts(records: &[MutationRecord]) -> Vec<(String, usize)> {
    records
        .iter()
        .map(|r| r.contig.clone())
        .counts()
        .into_iter()
        .sorted()
        .collect()
}
