use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bio::io::fasta;

use crate::error::{KmtoolsError, Result};
use crate::model::MutationRecord;

/// Header expected on every km find_mutation output table.
pub(crate) const KM_TABLE_COLUMNS: [&str; 7] =
    ["sample", "contig", "position", "ref", "alt", "coverage", "vaf"];

/// Reads all records from a FASTA file. Empty input is an error.
pub fn read_fasta_records(path: &Path) -> Result<Vec<fasta::Record>> {
    let file = File::open(path).map_err(|source| KmtoolsError::ReadWithPath {
        source,
        path: path.to_path_buf(),
    })?;

    let mut records = Vec::new();
    for result in fasta::Reader::new(file).records() {
        let record = result.map_err(|source| KmtoolsError::ReadWithPath {
            source,
            path: path.to_path_buf(),
        })?;
        records.push(record);
    }
    if records.is_empty() {
        return Err(KmtoolsError::EmptyFasta {
            path: path.to_path_buf(),
        });
    }
    Ok(records)
}

/// Loads a reference FASTA as a contig name to sequence map.
pub fn read_reference(path: &Path) -> Result<HashMap<String, Vec<u8>>> {
    let records = read_fasta_records(path)?;
    Ok(records
        .into_iter()
        .map(|record| (record.id().to_string(), record.seq().to_vec()))
        .collect())
}

/// Parses one km find_mutation output table, stamping every record with
/// the given chunk provenance.
pub fn read_km_table(path: &Path, chunk_id: usize) -> Result<Vec<MutationRecord>> {
    let file = File::open(path).map_err(|source| KmtoolsError::ReadWithPath {
        source,
        path: path.to_path_buf(),
    })?;
    let mut lines = BufReader::new(file).lines();

    let header = match lines.next() {
        Some(line) => line.map_err(|source| KmtoolsError::ReadWithPath {
            source,
            path: path.to_path_buf(),
        })?,
        None => {
            return Err(KmtoolsError::KmTableHeader {
                path: path.to_path_buf(),
            });
        }
    };
    if header.trim_end().split('\t').collect::<Vec<_>>() != KM_TABLE_COLUMNS {
        return Err(KmtoolsError::KmTableHeader {
            path: path.to_path_buf(),
        });
    }

    let mut records = Vec::new();
    for (line_idx, line) in lines.enumerate() {
        let line = line.map_err(|source| KmtoolsError::ReadWithPath {
            source,
            path: path.to_path_buf(),
        })?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        // Header occupies line 1
        let line_num = line_idx + 2;

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != KM_TABLE_COLUMNS.len() {
            return Err(KmtoolsError::KmTableFields {
                path: path.to_path_buf(),
                line_num,
                n_fields: fields.len(),
                expected: KM_TABLE_COLUMNS.len(),
            });
        }

        let position: u64 = fields[2].parse().map_err(|source| KmtoolsError::KmTableInt {
            source,
            path: path.to_path_buf(),
            line_num,
            field: "position",
        })?;
        let coverage: u64 = fields[5].parse().map_err(|source| KmtoolsError::KmTableInt {
            source,
            path: path.to_path_buf(),
            line_num,
            field: "coverage",
        })?;
        let vaf: f32 = fields[6]
            .parse()
            .map_err(|source| KmtoolsError::KmTableFloat {
                source,
                path: path.to_path_buf(),
                line_num,
                field: "vaf",
            })?;
        if !(0.0..=1.0).contains(&vaf) {
            return Err(KmtoolsError::VafRange {
                path: path.to_path_buf(),
                line_num,
                vaf,
            });
        }

        records.push(MutationRecord {
            sample: fields[0].to_string(),
            contig: fields[1].to_string(),
            position,
            ref_allele: fields[3].to_string(),
            alt_allele: fields[4].to_string(),
            coverage,
            vaf,
            chunk: chunk_id,
        });
    }
    Ok(records)
}

/// Reads a merged or filtered dataset CSV back into records.
pub fn read_dataset(path: &Path) -> Result<Vec<MutationRecord>> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| KmtoolsError::CsvRead {
        source,
        path: path.to_path_buf(),
    })?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: MutationRecord = result.map_err(|source| KmtoolsError::CsvRead {
            source,
            path: path.to_path_buf(),
        })?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_table(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn km_table_parses_records_with_provenance() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(
            &dir,
            "chunk_002.km.tsv",
            "sample\tcontig\tposition\tref\talt\tcoverage\tvaf\n\
             P01_S1\tchr2\t100\tA\tT\t250\t0.125\n",
        );

        let records = read_km_table(&path, 2).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sample, "P01_S1");
        assert_eq!(records[0].contig, "chr2");
        assert_eq!(records[0].position, 100);
        assert_eq!(records[0].coverage, 250);
        assert_eq!(records[0].chunk, 2);
    }

    #[test]
    fn km_table_rejects_bad_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(&dir, "bad.tsv", "a\tb\tc\n1\t2\t3\n");

        let err = read_km_table(&path, 0).unwrap_err();
        assert!(matches!(err, KmtoolsError::KmTableHeader { .. }));
    }

    #[test]
    fn km_table_rejects_wrong_field_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(
            &dir,
            "short.tsv",
            "sample\tcontig\tposition\tref\talt\tcoverage\tvaf\n\
             P01\tchr1\t10\tA\tT\n",
        );

        let err = read_km_table(&path, 0).unwrap_err();
        match err {
            KmtoolsError::KmTableFields {
                line_num, n_fields, ..
            } => {
                assert_eq!(line_num, 2);
                assert_eq!(n_fields, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn km_table_rejects_vaf_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(
            &dir,
            "vaf.tsv",
            "sample\tcontig\tposition\tref\talt\tcoverage\tvaf\n\
             P01\tchr1\t10\tA\tT\t100\t1.5\n",
        );

        let err = read_km_table(&path, 0).unwrap_err();
        assert!(matches!(err, KmtoolsError::VafRange { line_num: 2, .. }));
    }

    #[test]
    fn km_table_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(
            &dir,
            "blank.tsv",
            "sample\tcontig\tposition\tref\talt\tcoverage\tvaf\n\
             \n\
             P01\tchr1\t10\tA\tT\t100\t0.5\n\
             \n",
        );

        let records = read_km_table(&path, 0).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn empty_fasta_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(&dir, "empty.fa", "");

        let err = read_fasta_records(&path).unwrap_err();
        assert!(matches!(err, KmtoolsError::EmptyFasta { .. }));
    }

    #[test]
    fn reference_maps_contigs_to_sequences() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(&dir, "ref.fa", ">chr1\nACGT\n>chr2\nTTTT\n");

        let reference = read_reference(&path).unwrap();
        assert_eq!(reference.len(), 2);
        assert_eq!(reference["chr1"], b"ACGT".to_vec());
        assert_eq!(reference["chr2"], b"TTTT".to_vec());
    }
}
