//! Resistance-gene report: counts CARD hits per gene and charts the top genes.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::bio::Annotation;
use crate::config::GeneReportConfig;
use crate::count_table::{GroupTotals, TopN};
use crate::error::{ReportError, Result};
use crate::io::{self, load_alignments, AlignmentRecord};
use crate::visualization::{BarChart, ChartRenderer, Visualizer};

/// Outcome of a gene report run.
#[derive(Debug, Clone)]
pub struct GeneReport {
    pub hits: usize,
    pub distinct_genes: usize,
    pub top: TopN,
    pub outputs: Vec<PathBuf>,
}

/// Hits passing the optional identity and e-value cut-offs.
pub fn filter_hits<'a>(
    records: &'a [AlignmentRecord],
    min_identity: Option<f64>,
    max_e_value: Option<f64>,
) -> Vec<&'a AlignmentRecord> {
    records
        .iter()
        .filter(|hit| min_identity.map_or(true, |min| hit.percent_identity >= min))
        .filter(|hit| max_e_value.map_or(true, |max| hit.e_value <= max))
        .collect()
}

/// Counts hits per resistance gene, in first-seen order.
///
/// Returns the counts and the number of hits without an annotation.
pub fn count_resistance_genes<'a, I>(records: I) -> (GroupTotals, usize)
where
    I: IntoIterator<Item = &'a AlignmentRecord>,
{
    let mut counts = GroupTotals::new();
    let mut missing = 0;

    for record in records {
        match record.resistance_gene_name() {
            Annotation::Text(gene) => counts.count(&gene),
            Annotation::Missing => missing += 1,
        }
    }

    (counts, missing)
}

pub fn gene_chart(top: &TopN, config: &GeneReportConfig) -> BarChart {
    BarChart::new(config.title.clone(), top.entries())
        .axes(config.x_label.clone(), config.y_label.clone())
        .figure(config.figure)
}

/// Counts genes in already loaded hits and renders the chart.
///
/// Aggregated counts are also written as TSV when `tables_dir` is given.
pub fn run_gene_report(
    records: &[AlignmentRecord],
    config: &GeneReportConfig,
    renderer: &dyn ChartRenderer,
    tables_dir: Option<&Path>,
) -> Result<GeneReport> {
    let hits = filter_hits(records, config.min_identity, config.max_e_value);
    if hits.len() < records.len() {
        info!(
            "{} of {} hits pass the identity/e-value cut-offs",
            hits.len(),
            records.len()
        );
    }

    info!("Extracting resistance gene names from {} hits", hits.len());
    let (counts, missing_annotations) = count_resistance_genes(hits.iter().copied());
    if missing_annotations > 0 {
        warn!(
            "{} hits have no subject annotation and are not counted",
            missing_annotations
        );
    }
    if counts.is_empty() {
        warn!("No resistance genes found, the chart will be empty");
    } else {
        info!("Found {} distinct resistance genes", counts.len());
    }

    // The gene chart has no "Others" bar.
    let top = counts.top_n(config.top_n, false);
    for (rank, entry) in top.top().iter().enumerate() {
        info!("  {:>2}. {} ({} hits)", rank + 1, entry.label, entry.value);
    }

    info!("Generating chart...");
    let outputs = renderer.render(&gene_chart(&top, config), &config.file_stem)?;

    if let Some(dir) = tables_dir {
        let table_path = dir.join(format!("{}.tsv", config.file_stem));
        io::write_entries(&top.entries(), ("Gene", "Count"), &table_path)?;
        info!("Saved {}", table_path.display());
    }

    Ok(GeneReport {
        hits: hits.len(),
        distinct_genes: counts.len(),
        top,
        outputs,
    })
}

/// Runs the gene report from the configured input file.
///
/// A missing input file is checked up front and reported as
/// `FileNotFound` before anything is loaded.
pub fn run_gene_pipeline(config: &GeneReportConfig) -> Result<GeneReport> {
    if !config.input.exists() {
        return Err(ReportError::FileNotFound(config.input.clone()));
    }
    info!("Found {}, starting analysis...", config.input.display());

    let records = load_alignments(&config.input)?;
    let output_dir = io::output_dir_for(&config.input, config.output_dir.as_deref());
    let visualizer = Visualizer::new(&output_dir, &config.formats)?;
    let tables_dir = config.write_tables.then_some(output_dir.as_path());

    run_gene_report(&records, config, &visualizer, tables_dir)
}
