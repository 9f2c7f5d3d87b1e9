//! Merging per-chunk km result tables into one ordered, deduplicated dataset.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{KmtoolsError, Result};
use crate::model::{DedupKey, MutationRecord};
use crate::output;
use crate::reader;

pub fn run(inputs: &[PathBuf], output: &Path) -> Result<()> {
    let files = discover_inputs(inputs)?;
    log::info!(
        "merging {} result table(s) into {}",
        files.len(),
        output.display()
    );

    let mut merged: BTreeMap<DedupKey, MutationRecord> = BTreeMap::new();
    let mut n_parsed = 0;
    for file in &files {
        let records = reader::read_km_table(file, chunk_id_from_path(file))?;
        n_parsed += records.len();
        for record in records {
            insert_record(&mut merged, record);
        }
    }

    let records: Vec<MutationRecord> = merged.into_values().collect();
    output::write_dataset(&records, output)?;
    log::info!(
        "merged {} record(s) into {} unique record(s)",
        n_parsed,
        records.len()
    );
    Ok(())
}

/// Duplicate keys keep the higher-coverage record.
fn insert_record(merged: &mut BTreeMap<DedupKey, MutationRecord>, record: MutationRecord) {
    match merged.entry(record.dedup_key()) {
        Entry::Vacant(slot) => {
            slot.insert(record);
        }
        Entry::Occupied(mut slot) => {
            if record.coverage > slot.get().coverage {
                slot.insert(record);
            }
        }
    }
}

/// Expands the input list: files are taken as-is, directories are walked
/// for `*.tsv` result tables in file-name order.
pub(crate) fn discover_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry.map_err(|err| walk_error(input, err))?;
                let path = entry.into_path();
                if path.extension().is_some_and(|ext| ext == "tsv") {
                    files.push(path);
                }
            }
        } else {
            files.push(input.clone());
        }
    }
    if files.is_empty() {
        return Err(KmtoolsError::NoMergeInputs);
    }
    Ok(files)
}

fn walk_error(dir: &Path, err: walkdir::Error) -> KmtoolsError {
    let source = err.into_io_error().unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop detected")
    });
    KmtoolsError::ReadWithPath {
        source,
        path: dir.to_path_buf(),
    }
}

/// Recovers chunk provenance from a `chunk_NNN` file-name stem; inputs
/// named differently get chunk id 0.
pub(crate) fn chunk_id_from_path(path: &Path) -> usize {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_prefix("chunk_"))
        .and_then(|rest| rest.split('.').next())
        .and_then(|id| id.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sample: &str, position: u64, coverage: u64) -> MutationRecord {
        MutationRecord {
            sample: sample.to_string(),
            contig: "chr1".to_string(),
            position,
            ref_allele: "A".to_string(),
            alt_allele: "T".to_string(),
            coverage,
            vaf: 0.5,
            chunk: 0,
        }
    }

    #[test]
    fn duplicate_keys_keep_higher_coverage() {
        let mut merged = BTreeMap::new();
        insert_record(&mut merged, record("S1", 10, 50));
        insert_record(&mut merged, record("S1", 10, 200));
        insert_record(&mut merged, record("S1", 10, 100));

        assert_eq!(merged.len(), 1);
        assert_eq!(merged.values().next().unwrap().coverage, 200);
    }

    #[test]
    fn distinct_samples_at_same_locus_are_kept() {
        let mut merged = BTreeMap::new();
        insert_record(&mut merged, record("S1", 10, 50));
        insert_record(&mut merged, record("S2", 10, 50));

        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merged_order_is_contig_position_alleles_sample() {
        let mut merged = BTreeMap::new();
        insert_record(&mut merged, record("S1", 200, 50));
        insert_record(&mut merged, record("S2", 10, 50));
        insert_record(&mut merged, record("S1", 10, 50));

        let positions: Vec<(u64, String)> = merged
            .into_values()
            .map(|r| (r.position, r.sample))
            .collect();
        assert_eq!(
            positions,
            vec![
                (10, "S1".to_string()),
                (10, "S2".to_string()),
                (200, "S1".to_string()),
            ]
        );
    }

    #[test]
    fn chunk_id_recovered_from_file_name() {
        assert_eq!(chunk_id_from_path(Path::new("/out/chunk_007.km.tsv")), 7);
        assert_eq!(chunk_id_from_path(Path::new("chunk_012.tsv")), 12);
        assert_eq!(chunk_id_from_path(Path::new("results.tsv")), 0);
    }

    #[test]
    fn discover_walks_directories_for_tsv_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chunk_001.km.tsv"), "").unwrap();
        std::fs::write(dir.path().join("chunk_000.km.tsv"), "").unwrap();
        std::fs::write(dir.path().join("manifest.json"), "{}").unwrap();

        let files = discover_inputs(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["chunk_000.km.tsv", "chunk_001.km.tsv"]);
    }

    #[test]
    fn discover_with_no_tables_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_inputs(&[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, KmtoolsError::NoMergeInputs));
    }
}
