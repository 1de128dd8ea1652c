//! Report configuration.
//!
//! Every field has a default matching the standard run layout, so an empty
//! JSON object (or no config file at all) is a valid configuration.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bio::TaxonomicLevel;
use crate::error::{ReportError, Result};
use crate::io::taxonomy_table::DEFAULT_ABUNDANCE_COLUMN;
use crate::visualization::{FigureSize, OutputFormat};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub genes: GeneReportConfig,
    pub taxa: TaxaReportConfig,
}

impl ReportConfig {
    /// Loads a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ReportError::FileNotFound(path.to_path_buf()),
            _ => e.into(),
        })?;
        let config: ReportConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.genes.validate()?;
        self.taxa.validate()
    }
}

/// Resistance-gene chart settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneReportConfig {
    /// DIAMOND/BLAST tabular output against CARD.
    pub input: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub top_n: usize,
    /// Minimum percent identity for a hit to be counted.
    pub min_identity: Option<f64>,
    /// Maximum e-value for a hit to be counted.
    pub max_e_value: Option<f64>,
    pub file_stem: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub formats: Vec<OutputFormat>,
    pub figure: FigureSize,
    pub write_tables: bool,
}

impl Default for GeneReportConfig {
    fn default() -> Self {
        GeneReportConfig {
            input: PathBuf::from("DRR199648_diamond/card_proteins_dmnd.out.tsv"),
            output_dir: None,
            top_n: 15,
            min_identity: None,
            max_e_value: None,
            file_stem: "top_resistance_genes".to_string(),
            title: "Most abundant antimicrobial resistance genes (ARGs)".to_string(),
            x_label: "Number of sequences detected".to_string(),
            y_label: "Resistance gene".to_string(),
            formats: vec![OutputFormat::Png],
            figure: FigureSize::new(12.0, 8.0, 300),
            write_tables: false,
        }
    }
}

impl GeneReportConfig {
    fn validate(&self) -> Result<()> {
        if let Some(identity) = self.min_identity {
            if !(0.0..=100.0).contains(&identity) {
                return Err(ReportError::Config(format!(
                    "genes: min_identity must be between 0 and 100, got {}",
                    identity
                )));
            }
        }
        validate_output("genes", &self.formats, &self.figure)
    }
}

/// One per-rank chart of the taxonomy report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankChartConfig {
    pub level: TaxonomicLevel,
    pub top_n: usize,
    pub title: Option<String>,
    pub file_stem: Option<String>,
}

impl RankChartConfig {
    pub fn new(level: TaxonomicLevel, top_n: usize, file_stem: &str) -> Self {
        RankChartConfig {
            level,
            top_n,
            title: Some(format!("Abundance by {}", level)),
            file_stem: Some(file_stem.to_string()),
        }
    }

    pub fn title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("Top {} - {}", self.top_n, self.level))
    }

    pub fn file_stem(&self) -> String {
        self.file_stem
            .clone()
            .unwrap_or_else(|| format!("Top_{}_{}", self.top_n, self.level))
    }
}

/// The top-genomes chart: rows ranked directly by abundance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesChartConfig {
    pub top_n: usize,
    pub title: String,
    pub file_stem: String,
    pub figure: FigureSize,
}

impl Default for SpeciesChartConfig {
    fn default() -> Self {
        SpeciesChartConfig {
            top_n: 20,
            title: "Top 20 genomes detected by abundance".to_string(),
            file_stem: "05_Top20_Species".to_string(),
            figure: FigureSize::new(12.0, 9.0, 300),
        }
    }
}

/// Focus taxa of the textual summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub enabled: bool,
    pub phylum: String,
    pub class: String,
    pub family: String,
    /// Number of genera listed within the focus family.
    pub genera: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        SummaryConfig {
            enabled: true,
            phylum: "Proteobacteria".to_string(),
            class: "Gammaproteobacteria".to_string(),
            family: "Enterobacteriaceae".to_string(),
            genera: 8,
        }
    }
}

/// Taxonomy report settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxaReportConfig {
    /// FOCUS `output_All_levels.csv`.
    pub input: PathBuf,
    pub abundance_column: String,
    pub output_dir: Option<PathBuf>,
    pub formats: Vec<OutputFormat>,
    pub figure: FigureSize,
    pub x_label: String,
    pub charts: Vec<RankChartConfig>,
    pub species: SpeciesChartConfig,
    pub summary: SummaryConfig,
    pub write_tables: bool,
}

impl Default for TaxaReportConfig {
    fn default() -> Self {
        TaxaReportConfig {
            input: PathBuf::from("DRR199648_focusTax/output_All_levels.csv"),
            abundance_column: DEFAULT_ABUNDANCE_COLUMN.to_string(),
            output_dir: None,
            formats: vec![OutputFormat::Png, OutputFormat::Pdf],
            figure: FigureSize::new(12.0, 8.0, 300),
            x_label: "Relative abundance (%)".to_string(),
            charts: vec![
                RankChartConfig::new(TaxonomicLevel::Phylum, 10, "01_Phylum_Top10"),
                RankChartConfig::new(TaxonomicLevel::Class, 12, "02_Class_Top12"),
                RankChartConfig::new(TaxonomicLevel::Family, 15, "03_Family_Top15"),
                RankChartConfig::new(TaxonomicLevel::Genus, 15, "04_Genus_Top15"),
            ],
            species: SpeciesChartConfig::default(),
            summary: SummaryConfig::default(),
            write_tables: false,
        }
    }
}

impl TaxaReportConfig {
    fn validate(&self) -> Result<()> {
        if self.charts.is_empty() {
            return Err(ReportError::Config(
                "taxa: at least one rank chart is required".to_string(),
            ));
        }
        if self.species.top_n == 0 {
            return Err(ReportError::Config(
                "taxa: species.top_n must be at least 1".to_string(),
            ));
        }
        validate_output("taxa", &self.formats, &self.figure)?;
        validate_output("taxa.species", &self.formats, &self.species.figure)
    }
}

fn validate_output(section: &str, formats: &[OutputFormat], figure: &FigureSize) -> Result<()> {
    if formats.is_empty() {
        return Err(ReportError::Config(format!(
            "{}: at least one output format is required",
            section
        )));
    }
    if figure.dpi == 0 || figure.width_in <= 0.0 || figure.height_in <= 0.0 {
        return Err(ReportError::Config(format!(
            "{}: figure size and dpi must be positive",
            section
        )));
    }
    Ok(())
}
