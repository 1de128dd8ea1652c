//! Textual taxonomy summary printed after the charts.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::bio::TaxonomicLevel;
use crate::config::SummaryConfig;
use crate::count_table::{ChartEntry, GroupTotals};
use crate::normalization::AbundanceTable;

/// Abundance of one named taxon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonAbundance {
    pub name: String,
    pub abundance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonomySummary {
    pub figures_dir: PathBuf,
    pub genomes: usize,
    pub total_abundance: f64,
    pub phylum: TaxonAbundance,
    pub class: TaxonAbundance,
    pub family: TaxonAbundance,
    /// Leading genera within `family`, most abundant first.
    pub genera: Vec<ChartEntry>,
}

/// Total abundance of the rows whose `level` column equals `name`.
pub fn abundance_where(table: &AbundanceTable, level: TaxonomicLevel, name: &str) -> f64 {
    table
        .rows
        .iter()
        .filter(|row| row.record.level(level) == name)
        .map(|row| row.abundance)
        .sum()
}

/// Genera of `family` ranked by total abundance. Rows without a genus are
/// left out.
pub fn genera_within_family(table: &AbundanceTable, family: &str, n: usize) -> Vec<ChartEntry> {
    let totals: GroupTotals = table
        .rows
        .iter()
        .filter(|row| row.record.family == family && !row.record.genus.is_empty())
        .map(|row| (row.record.genus.as_str(), row.abundance))
        .collect();
    totals.top_n(n, false).entries()
}

pub fn summarize(
    table: &AbundanceTable,
    config: &SummaryConfig,
    figures_dir: PathBuf,
) -> TaxonomySummary {
    let focus = |level: TaxonomicLevel, name: &str| TaxonAbundance {
        name: name.to_string(),
        abundance: abundance_where(table, level, name),
    };

    TaxonomySummary {
        figures_dir,
        genomes: table.len(),
        total_abundance: table.total_abundance(),
        phylum: focus(TaxonomicLevel::Phylum, &config.phylum),
        class: focus(TaxonomicLevel::Class, &config.class),
        family: focus(TaxonomicLevel::Family, &config.family),
        genera: genera_within_family(table, &config.family, config.genera),
    }
}

impl fmt::Display for TaxonomySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "TAXONOMIC SUMMARY - FIGURES SAVED IN:")?;
        writeln!(f, "{}", self.figures_dir.display())?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "Genomes detected: {} (total abundance {:.2}%)",
            self.genomes, self.total_abundance
        )?;
        writeln!(
            f,
            "Dominant phylum: {} ({:.2}%)",
            self.phylum.name, self.phylum.abundance
        )?;
        writeln!(f, " ├ {}: {:.2}%", self.class.name, self.class.abundance)?;
        writeln!(
            f,
            " └ Dominant family: {} ({:.2}%)",
            self.family.name, self.family.abundance
        )?;
        writeln!(f, " → Main genera in {}:", self.family.name)?;
        for genus in &self.genera {
            writeln!(f, "   • {}: {:.2}%", genus.label, genus.value)?;
        }
        write!(f, "{}", rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::TaxonomyRecord;
    use crate::normalization::AbundanceRow;
    use approx::assert_relative_eq;

    fn row(phylum: &str, class: &str, family: &str, genus: &str, abundance: f64) -> AbundanceRow {
        AbundanceRow {
            record: TaxonomyRecord {
                phylum: phylum.into(),
                class: class.into(),
                family: family.into(),
                genus: genus.into(),
                species: format!("{} sp.", genus),
                strain: format!("{} strain", genus),
                abundance: abundance.to_string(),
            },
            abundance,
        }
    }

    fn enterobacteria(genus: &str, abundance: f64) -> AbundanceRow {
        let (phylum, class) = ("Proteobacteria", "Gammaproteobacteria");
        row(phylum, class, "Enterobacteriaceae", genus, abundance)
    }

    fn table() -> AbundanceTable {
        AbundanceTable {
            rows: vec![
                enterobacteria("Escherichia", 30.0),
                enterobacteria("Klebsiella", 12.5),
                enterobacteria("Escherichia", 5.0),
                row(
                    "Proteobacteria",
                    "Betaproteobacteria",
                    "Burkholderiaceae",
                    "Burkholderia",
                    2.0,
                ),
                row(
                    "Firmicutes",
                    "Bacilli",
                    "Staphylococcaceae",
                    "Staphylococcus",
                    20.0,
                ),
            ],
            dropped: 1,
        }
    }

    #[test]
    fn test_abundance_where() {
        let table = table();
        let phylum = abundance_where(&table, TaxonomicLevel::Phylum, "Proteobacteria");
        assert_relative_eq!(phylum, 49.5);
        let class = abundance_where(&table, TaxonomicLevel::Class, "Gammaproteobacteria");
        assert_relative_eq!(class, 47.5);
        assert_eq!(abundance_where(&table, TaxonomicLevel::Family, "Unknown"), 0.0);
    }

    #[test]
    fn test_unnamed_genus_not_listed() {
        let mut table = table();
        table.rows.push(enterobacteria("", 40.0));

        let genera = genera_within_family(&table, "Enterobacteriaceae", 8);
        assert_eq!(genera[0], ChartEntry::new("Escherichia", 35.0));
        assert!(genera.iter().all(|genus| !genus.label.is_empty()));

        // The row still counts towards its family
        let family = abundance_where(&table, TaxonomicLevel::Family, "Enterobacteriaceae");
        assert_relative_eq!(family, 87.5);
    }

    #[test]
    fn test_genera_within_family() {
        let genera = genera_within_family(&table(), "Enterobacteriaceae", 8);
        assert_eq!(
            genera,
            vec![
                ChartEntry::new("Escherichia", 35.0),
                ChartEntry::new("Klebsiella", 12.5)
            ]
        );
        assert_eq!(genera_within_family(&table(), "Enterobacteriaceae", 1).len(), 1);
    }

    #[test]
    fn test_summary_text() {
        let summary = summarize(&table(), &SummaryConfig::default(), PathBuf::from("run1"));
        assert_eq!(summary.genomes, 5);
        assert_relative_eq!(summary.total_abundance, 69.5);

        let text = summary.to_string();
        assert!(text.contains("Dominant phylum: Proteobacteria (49.50%)"));
        assert!(text.contains(" ├ Gammaproteobacteria: 47.50%"));
        assert!(text.contains("Dominant family: Enterobacteriaceae (47.50%)"));
        assert!(text.contains("   • Escherichia: 35.00%"));
        assert!(text.contains("run1"));
    }
}
