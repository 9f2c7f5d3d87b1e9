//! Reference-based filtering of merged mutation records.

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::model::MutationRecord;
use crate::output;
use crate::reader;

/// Why a record was rejected by the reference predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    UnknownContig,
    OutOfBounds,
    RefMismatch,
    MatchesReference,
}

/// Returns the rejection reason, or `None` when the record passes.
///
/// A record passes when its contig is known, its locus fits within the
/// contig, the reference sequence at the locus equals the ref allele, and
/// the alt allele differs from the reference there (a "variant" identical
/// to the reference is a false positive).
pub(crate) fn classify(
    record: &MutationRecord,
    reference: &HashMap<String, Vec<u8>>,
) -> Option<Rejection> {
    let Some(contig) = reference.get(&record.contig) else {
        return Some(Rejection::UnknownContig);
    };
    if record.position == 0 {
        return Some(Rejection::OutOfBounds);
    }
    let start = (record.position - 1) as usize;

    let ref_end = start + record.ref_allele.len();
    if ref_end > contig.len() {
        return Some(Rejection::OutOfBounds);
    }
    if !contig[start..ref_end].eq_ignore_ascii_case(record.ref_allele.as_bytes()) {
        return Some(Rejection::RefMismatch);
    }

    let alt_end = start + record.alt_allele.len();
    if alt_end <= contig.len()
        && contig[start..alt_end].eq_ignore_ascii_case(record.alt_allele.as_bytes())
    {
        return Some(Rejection::MatchesReference);
    }
    None
}

pub fn run(reference: &Path, km_output: &Path, output: &Path) -> Result<()> {
    log::info!(
        "filtering {} against reference {}",
        km_output.display(),
        reference.display()
    );
    let contigs = reader::read_reference(reference)?;
    let records = reader::read_dataset(km_output)?;
    let total = records.len();

    let mut kept = Vec::with_capacity(total);
    let mut unknown_contig = 0;
    let mut out_of_bounds = 0;
    let mut ref_mismatch = 0;
    let mut matches_reference = 0;
    for record in records {
        match classify(&record, &contigs) {
            None => kept.push(record),
            Some(Rejection::UnknownContig) => unknown_contig += 1,
            Some(Rejection::OutOfBounds) => out_of_bounds += 1,
            Some(Rejection::RefMismatch) => ref_mismatch += 1,
            Some(Rejection::MatchesReference) => matches_reference += 1,
        }
    }

    output::write_dataset(&kept, output)?;
    log::info!(
        "kept {}/{} record(s) ({unknown_contig} unknown contig, {out_of_bounds} out of bounds, \
         {ref_mismatch} ref mismatch, {matches_reference} identical to reference)",
        kept.len(),
        total
    );
    Ok(())
}
