use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Command for the kmtools binary with a clean logging environment.
pub fn kmtools_command() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_kmtools"));
    command.env_remove("RUST_LOG");
    command
}

/// Five single-record targets, so two chunks split 3 + 2.
pub fn write_targets_fasta(dir: &Path) -> PathBuf {
    let path = dir.join("targets.fa");
    fs::write(
        &path,
        ">t1\nACGTACGT\n>t2\nGGGGCCCC\n>t3\nTTTTAAAA\n>t4\nACACACAC\n>t5\nGTGTGTGT\n",
    )
    .unwrap();
    path
}

/// One contig, `A` at 1-based positions 10, 20 and 30.
pub fn write_reference_fasta(dir: &Path) -> PathBuf {
    let path = dir.join("reference.fa");
    fs::write(&path, ">chr1\nCCCCCCCCCACCCCCCCCCACCCCCCCCCA\n").unwrap();
    path
}

pub fn write_km_table(path: &Path, rows: &[&str]) {
    let mut table = String::from("sample\tcontig\tposition\tref\talt\tcoverage\tvaf\n");
    for row in rows {
        table.push_str(row);
        table.push('\n');
    }
    fs::write(path, table).unwrap();
}

pub fn write_dataset_csv(path: &Path, rows: &[&str]) {
    let mut table = String::from("sample,contig,position,ref,alt,coverage,vaf,chunk\n");
    for row in rows {
        table.push_str(row);
        table.push('\n');
    }
    fs::write(path, table).unwrap();
}

/// Data rows of a dataset CSV, header stripped.
pub fn read_dataset_rows(path: &Path) -> Vec<String> {
    let contents = fs::read_to_string(path).unwrap();
    contents
        .lines()
        .skip(1)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// A stand-in km executable: one mutation row per record in the chunk
/// FASTA, with positions relative to the chunk so that chunks overlap.
#[cfg(unix)]
pub fn write_stub_km(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "km",
        r#"#!/bin/sh
printf 'sample\tcontig\tposition\tref\talt\tcoverage\tvaf\n'
grep '^>' "$2" | awk '{ printf "S%d_T\tchr1\t%d\tA\tT\t100\t0.25\n", NR % 2 + 1, NR * 10 }'
"#,
    )
}

#[cfg(unix)]
pub fn write_failing_km(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "km",
        r#"#!/bin/sh
echo "no such k-mer database" >&2
exit 3
"#,
    )
}

#[cfg(unix)]
fn write_script(dir: &Path, name: &str, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}
