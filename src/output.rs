use std::path::Path;

use plotters::prelude::*;

use crate::error::{KmtoolsError, Result};
use crate::model::{DATASET_COLUMNS, MutationRecord};

/// Writes a dataset CSV with the shared column layout. The header is
/// written even when there are no records.
pub fn write_dataset(records: &[MutationRecord], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(DATASET_COLUMNS)?;

    for record in records {
        wtr.serialize((
            record.sample.as_str(),
            record.contig.as_str(),
            record.position,
            record.ref_allele.as_str(),
            record.alt_allele.as_str(),
            record.coverage,
            record.vaf,
            record.chunk,
        ))?;
    }
    wtr.flush().map_err(|source| KmtoolsError::Write {
        source,
        path: path.to_path_buf(),
    })?;
    Ok(())
}

fn plot_error<E>(path: &Path) -> impl FnOnce(E) -> KmtoolsError + '_
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |source| KmtoolsError::Plot {
        source: Box::new(source),
        path: path.to_path_buf(),
    }
}

const CHART_SIZE: (u32, u32) = (1600, 1200);

pub fn plot_vaf_histogram(records: &[MutationRecord], path: &Path) -> Result<()> {
    const N_BINS: usize = 20;
    const BIN_SIZE: f32 = 1.0 / N_BINS as f32;

    let mut bin_counts = vec![0usize; N_BINS];
    for record in records {
        // VAF 1.0 lands in the final bin
        let bin = ((record.vaf / BIN_SIZE).floor() as usize).min(N_BINS - 1);
        bin_counts[bin] += 1;
    }
    let max_count = bin_counts.iter().copied().max().unwrap_or(0);

    let root_area = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root_area.fill(&WHITE).map_err(plot_error(path))?;

    let mut chart = ChartBuilder::on(&root_area)
        .set_label_area_size(LabelAreaPosition::Left, 90)
        .set_label_area_size(LabelAreaPosition::Bottom, 80)
        .margin(20)
        .caption("VAF Distribution", ("sans-serif", 48))
        .build_cartesian_2d(0f32..1f32, 0usize..max_count + 1)
        .map_err(plot_error(path))?;

    chart
        .configure_mesh()
        .label_style(("sans-serif", 28))
        .y_desc("Records")
        .x_desc("Variant allele frequency")
        .x_label_formatter(&|x| format!("{x:.2}"))
        .draw()
        .map_err(plot_error(path))?;

    chart
        .draw_series((0..N_BINS).map(|i| {
            let x0 = i as f32 * BIN_SIZE;
            let x1 = x0 + BIN_SIZE;
            Rectangle::new([(x0, 0usize), (x1, bin_counts[i])], BLUE.mix(0.4).filled())
        }))
        .map_err(plot_error(path))?;

    root_area.present().map_err(plot_error(path))?;
    Ok(())
}

/// Renders one labeled count per bar, in the order given.
pub fn plot_count_bars(
    caption: &str,
    x_desc: &str,
    counts: &[(String, usize)],
    path: &Path,
) -> Result<()> {
    let n = counts.len();
    let max_count = counts.iter().map(|(_, count)| *count).max().unwrap_or(0);

    let root_area = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root_area.fill(&WHITE).map_err(plot_error(path))?;

    let mut chart = ChartBuilder::on(&root_area)
        .set_label_area_size(LabelAreaPosition::Left, 90)
        .set_label_area_size(LabelAreaPosition::Bottom, 120)
        .margin(20)
        .caption(caption, ("sans-serif", 48))
        .build_cartesian_2d(0f32..n as f32, 0usize..max_count + 1)
        .map_err(plot_error(path))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .label_style(("sans-serif", 28))
        .y_desc("Records")
        .x_desc(x_desc)
        .x_labels(n.min(24))
        .x_label_formatter(&|x| {
            let idx = x.floor() as usize;
            counts
                .get(idx)
                .map_or_else(String::new, |(name, _)| name.clone())
        })
        .draw()
        .map_err(plot_error(path))?;

    chart
        .draw_series(counts.iter().enumerate().map(|(i, (_, count))| {
            let x0 = i as f32 + 0.1;
            let x1 = i as f32 + 0.9;
            Rectangle::new([(x0, 0usize), (x1, *count)], BLUE.mix(0.4).filled())
        }))
        .map_err(plot_error(path))?;

    root_area.present().map_err(plot_error(path))?;
    Ok(())
}
