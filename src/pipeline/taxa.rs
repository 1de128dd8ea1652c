//! Taxonomy report: per-rank abundance charts, top genomes and a summary.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::bio::TaxonomicLevel;
use crate::config::{RankChartConfig, TaxaReportConfig};
use crate::count_table::{top_rows_by, ChartEntry, GroupTotals, TopN};
use crate::error::Result;
use crate::io::{self, load_taxonomy};
use crate::normalization::{drop_unparseable, AbundanceRow, AbundanceTable};
use crate::pipeline::summary::{summarize, TaxonomySummary};
use crate::visualization::{
    BarChart, ChartRenderer, Palette, ValueLabels, Visualizer, VALUE_LABEL_THRESHOLD,
};

/// Bar colour of the top-genomes chart (sky blue).
const GENOME_BAR_COLOR: Palette = Palette::Solid(135, 206, 235);

/// Outcome of a taxonomy report run.
#[derive(Debug, Clone)]
pub struct TaxaReport {
    pub genomes: usize,
    pub dropped: usize,
    pub total_abundance: f64,
    pub rank_tables: Vec<(TaxonomicLevel, TopN)>,
    pub top_genomes: Vec<AbundanceRow>,
    pub summary: Option<TaxonomySummary>,
    pub outputs: Vec<PathBuf>,
}

/// Sums abundance per taxon at `level` and keeps the top `n`, folding the
/// rest into "Others".
///
/// Rows with a blank name at `level` belong to no group and are skipped.
pub fn abundance_by_level(table: &AbundanceTable, level: TaxonomicLevel, n: usize) -> TopN {
    let totals: GroupTotals = table
        .rows
        .iter()
        .map(|row| (row.record.level(level), row.abundance))
        .filter(|(name, _)| !name.is_empty())
        .collect();
    totals.top_n(n, true)
}

/// The `n` most abundant rows, without grouping.
///
/// Strains of the same species are kept apart.
pub fn top_genomes(table: &AbundanceTable, n: usize) -> Vec<AbundanceRow> {
    top_rows_by(&table.rows, n, |row| row.abundance)
}

fn rank_chart(top: &TopN, chart: &RankChartConfig, config: &TaxaReportConfig) -> BarChart {
    BarChart::new(chart.title(), top.entries())
        .axes(config.x_label.clone(), chart.level.to_string())
        .annotate(ValueLabels::AboveThreshold(VALUE_LABEL_THRESHOLD), "%")
        .figure(config.figure)
}

fn genome_entries(rows: &[AbundanceRow]) -> Vec<ChartEntry> {
    rows.iter()
        .map(|row| ChartEntry::new(row.strain(), row.abundance))
        .collect()
}

fn genome_chart(rows: &[AbundanceRow], config: &TaxaReportConfig) -> BarChart {
    BarChart::new(config.species.title.clone(), genome_entries(rows))
        .axes(config.x_label.clone(), "Strain")
        .annotate(ValueLabels::All, "%")
        .palette(GENOME_BAR_COLOR)
        .figure(config.species.figure)
}

/// Builds every taxonomy chart from an already coerced table.
///
/// `figures_dir` is only reported in the summary; aggregated tables are
/// written to `tables_dir` when given.
pub fn run_taxa_report(
    table: &AbundanceTable,
    config: &TaxaReportConfig,
    renderer: &dyn ChartRenderer,
    figures_dir: &Path,
    tables_dir: Option<&Path>,
) -> Result<TaxaReport> {
    if table.is_empty() {
        warn!("No genome has a usable abundance, charts will be empty");
    }
    let total_abundance = table.total_abundance();
    info!("Genomes detected: {}", table.len());
    info!("Total abundance: {:.2}%", total_abundance);

    let mut outputs = Vec::new();
    let mut rank_tables = Vec::with_capacity(config.charts.len());

    for chart in &config.charts {
        info!("=== Most abundant {} (top {}) ===", chart.level, chart.top_n);
        let top = abundance_by_level(table, chart.level, chart.top_n);
        if top.is_empty() {
            warn!("No {} values to chart", chart.level);
        } else {
            debug!("{} chart has {} bars", chart.level, top.len());
        }
        let file_stem = chart.file_stem();

        outputs.extend(renderer.render(&rank_chart(&top, chart, config), &file_stem)?);
        if let Some(dir) = tables_dir {
            write_table(dir, &file_stem, &top.entries(), chart.level.column_name())?;
        }
        rank_tables.push((chart.level, top));
    }

    info!("=== Top {} species/strains ===", config.species.top_n);
    let genomes = top_genomes(table, config.species.top_n);
    for row in &genomes {
        info!("  {} | {} ({:.2}%)", row.species(), row.strain(), row.abundance);
    }
    outputs.extend(renderer.render(&genome_chart(&genomes, config), &config.species.file_stem)?);
    if let Some(dir) = tables_dir {
        write_table(dir, &config.species.file_stem, &genome_entries(&genomes), "Strain")?;
    }

    let summary = config
        .summary
        .enabled
        .then(|| summarize(table, &config.summary, figures_dir.to_path_buf()));

    Ok(TaxaReport {
        genomes: table.len(),
        dropped: table.dropped,
        total_abundance,
        rank_tables,
        top_genomes: genomes,
        summary,
        outputs,
    })
}

fn write_table(dir: &Path, file_stem: &str, entries: &[ChartEntry], label: &str) -> Result<()> {
    let path = dir.join(format!("{}.tsv", file_stem));
    io::write_entries(entries, (label, "Abundance"), &path)?;
    info!("Saved {}", path.display());
    Ok(())
}

/// Runs the taxonomy report from the configured input file.
///
/// A missing or malformed input is returned as an error before any chart is
/// drawn.
pub fn run_taxa_pipeline(config: &TaxaReportConfig) -> Result<TaxaReport> {
    let raw = load_taxonomy(&config.input, &config.abundance_column)?;
    let table = drop_unparseable(&raw);

    let output_dir = io::output_dir_for(&config.input, config.output_dir.as_deref());
    let visualizer = Visualizer::new(&output_dir, &config.formats)?;
    let tables_dir = config.write_tables.then_some(output_dir.as_path());

    run_taxa_report(&table, config, &visualizer, &output_dir, tables_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::io::TaxonomyRecord;
    use crate::pipeline::testing::RecordingRenderer;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    fn row(genus: &str, species: &str, strain: &str, abundance: f64) -> AbundanceRow {
        AbundanceRow {
            record: TaxonomyRecord {
                phylum: "Proteobacteria".into(),
                class: "Gammaproteobacteria".into(),
                family: "Enterobacteriaceae".into(),
                genus: genus.into(),
                species: species.into(),
                strain: strain.into(),
                abundance: abundance.to_string(),
            },
            abundance,
        }
    }

    fn genus_table() -> AbundanceTable {
        AbundanceTable {
            rows: vec![
                row("A", "A a", "A a 1", 25.0),
                row("B", "B b", "B b 1", 30.0),
                row("A", "A a", "A a 2", 15.0),
                row("C", "C c", "C c 1", 20.0),
                row("D", "D d", "D d 1", 5.0),
                row("E", "E e", "E e 1", 5.0),
            ],
            dropped: 0,
        }
    }

    #[test]
    fn test_abundance_by_level_folds_others() {
        let top = abundance_by_level(&genus_table(), TaxonomicLevel::Genus, 3);

        assert_eq!(top.len(), 4);
        assert_eq!(
            top.top(),
            &[
                ChartEntry::new("A", 40.0),
                ChartEntry::new("B", 30.0),
                ChartEntry::new("C", 20.0)
            ]
        );
        assert_relative_eq!(top.others().unwrap(), 10.0);
    }

    #[test]
    fn test_abundance_by_level_without_others() {
        let top = abundance_by_level(&genus_table(), TaxonomicLevel::Phylum, 10);
        assert_eq!(top.entries(), vec![ChartEntry::new("Proteobacteria", 100.0)]);
    }

    #[test]
    fn test_blank_rank_cells_are_not_a_group() {
        let mut table = genus_table();
        table.rows.push(row("", "X x", "X x 1", 50.0));

        let top = abundance_by_level(&table, TaxonomicLevel::Genus, 10);
        assert_eq!(top.top()[0], ChartEntry::new("A", 40.0));
        assert!(top.entries().iter().all(|entry| !entry.label.is_empty()));
        assert_relative_eq!(top.entries().iter().map(|e| e.value).sum::<f64>(), 100.0);

        // Still a genome of its own, and part of the total
        assert_eq!(top_genomes(&table, 1)[0].strain(), "X x 1");
        assert_relative_eq!(table.total_abundance(), 150.0);
    }

    #[test]
    fn test_top_genomes_keeps_strains() {
        let genomes = top_genomes(&genus_table(), 3);
        let strains: Vec<&str> = genomes.iter().map(|row| row.strain()).collect();
        assert_eq!(strains, vec!["B b 1", "A a 1", "C c 1"]);

        let all = top_genomes(&genus_table(), 20);
        assert_eq!(all.len(), 6);
        assert_eq!(all.iter().filter(|row| row.species() == "A a").count(), 2);
    }

    #[test]
    fn test_report_renders_every_chart() {
        let renderer = RecordingRenderer::default();
        let config = TaxaReportConfig::default();

        let report =
            run_taxa_report(&genus_table(), &config, &renderer, Path::new("run1"), None).unwrap();

        let charts = renderer.charts.borrow();
        let stems: Vec<&str> = charts.iter().map(|(stem, _)| stem.as_str()).collect();
        assert_eq!(
            stems,
            vec![
                "01_Phylum_Top10",
                "02_Class_Top12",
                "03_Family_Top15",
                "04_Genus_Top15",
                "05_Top20_Species"
            ]
        );

        let (_, genus_chart) = &charts[3];
        assert_eq!(genus_chart.title, "Abundance by Genus");
        assert_eq!(genus_chart.y_label, "Genus");
        assert_eq!(genus_chart.value_labels()[0], (0, "40.00%".to_string()));

        let (_, species_chart) = &charts[4];
        assert_eq!(species_chart.entries.len(), 6);
        assert_eq!(species_chart.entries[0], ChartEntry::new("B b 1", 30.0));
        assert_eq!(species_chart.value_labels().len(), 6);

        assert_eq!(report.rank_tables.len(), 4);
        assert_relative_eq!(report.total_abundance, 100.0);
        let summary = report.summary.unwrap();
        assert_eq!(summary.figures_dir, PathBuf::from("run1"));
        assert_relative_eq!(summary.family.abundance, 100.0);
    }

    #[test]
    fn test_writes_rank_tables() {
        let dir = tempdir().unwrap();
        let renderer = RecordingRenderer::default();
        let mut config = TaxaReportConfig::default();
        config.summary.enabled = false;

        let report =
            run_taxa_report(&genus_table(), &config, &renderer, dir.path(), Some(dir.path()))
                .unwrap();
        assert!(report.summary.is_none());

        let genus = std::fs::read_to_string(dir.path().join("04_Genus_Top15.tsv")).unwrap();
        assert!(genus.starts_with("Genus\tAbundance\nA\t40\nB\t30\n"));
        assert!(dir.path().join("05_Top20_Species.tsv").exists());
    }

    #[test]
    fn test_pipeline_missing_input_is_fatal() {
        let dir = tempdir().unwrap();
        let config = TaxaReportConfig {
            input: dir.path().join("output_All_levels.csv"),
            ..TaxaReportConfig::default()
        };
        assert!(matches!(
            run_taxa_pipeline(&config),
            Err(ReportError::FileNotFound(_))
        ));
        // No charts were attempted
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
