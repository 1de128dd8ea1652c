use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{error, info, LevelFilter};

use crate::config::{GeneReportConfig, ReportConfig, TaxaReportConfig};
use crate::error::ReportError;
use crate::pipeline::{run_gene_pipeline, run_taxa_pipeline, TaxaReport};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Resistance-gene and taxonomy charts for metagenomic runs",
    long_about = None
)]
pub struct Cli {
    /// JSON configuration file; command-line options override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chart the most frequent resistance genes in DIAMOND/BLAST hits against CARD
    Genes(GeneArgs),

    /// Chart taxa by abundance at several ranks and print a summary
    Taxa(TaxaArgs),

    /// Run the gene report, then the taxonomy report
    All {
        /// Tabular alignment hits (outfmt 6)
        #[arg(long)]
        genes_input: Option<PathBuf>,

        /// Taxonomic abundance table (CSV)
        #[arg(long)]
        taxa_input: Option<PathBuf>,

        /// Directory for all charts (default: next to each input)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Also write each aggregated table as TSV
        #[arg(long)]
        write_tables: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct GeneArgs {
    /// Tabular alignment hits (outfmt 6, no header)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Number of genes to chart
    #[arg(short = 'n', long)]
    pub top: Option<usize>,

    /// Minimum percent identity of counted hits
    #[arg(long)]
    pub min_identity: Option<f64>,

    /// Maximum e-value of counted hits
    #[arg(long)]
    pub max_evalue: Option<f64>,

    /// Directory for the chart (default: next to the input)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Also write the gene counts as TSV
    #[arg(long)]
    pub write_tables: bool,
}

impl GeneArgs {
    fn apply(&self, config: &mut GeneReportConfig) {
        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(top) = self.top {
            config.top_n = top;
        }
        if self.min_identity.is_some() {
            config.min_identity = self.min_identity;
        }
        if self.max_evalue.is_some() {
            config.max_e_value = self.max_evalue;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        config.write_tables |= self.write_tables;
    }
}

#[derive(Args, Debug, Default)]
pub struct TaxaArgs {
    /// Taxonomic abundance table (CSV with header)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Header of the abundance column
    #[arg(short, long)]
    pub abundance_column: Option<String>,

    /// Directory for the charts (default: next to the input)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Also write each aggregated table as TSV
    #[arg(long)]
    pub write_tables: bool,

    /// Skip the textual summary
    #[arg(long)]
    pub no_summary: bool,

    /// Write the summary as JSON to this file
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
}

impl TaxaArgs {
    fn apply(&self, config: &mut TaxaReportConfig) {
        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(column) = &self.abundance_column {
            config.abundance_column = column.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        config.write_tables |= self.write_tables;
        if self.no_summary {
            config.summary.enabled = false;
        }
    }
}

/// Main entry point for CLI
pub fn run_cli(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ReportConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => ReportConfig::default(),
    };

    match cli.command {
        Commands::Genes(args) => {
            args.apply(&mut config.genes);
            config.validate()?;
            gene_command(&config.genes);
            Ok(())
        }
        Commands::Taxa(args) => {
            args.apply(&mut config.taxa);
            config.validate()?;
            taxa_command(&config.taxa, args.summary_json.as_ref())
        }
        Commands::All {
            genes_input,
            taxa_input,
            output_dir,
            write_tables,
        } => {
            GeneArgs {
                input: genes_input,
                output_dir: output_dir.clone(),
                write_tables,
                ..GeneArgs::default()
            }
            .apply(&mut config.genes);
            TaxaArgs {
                input: taxa_input,
                output_dir,
                write_tables,
                ..TaxaArgs::default()
            }
            .apply(&mut config.taxa);
            config.validate()?;

            gene_command(&config.genes);
            taxa_command(&config.taxa, None)
        }
    }
}

/// Runs the gene report. Failures are reported, never propagated.
fn gene_command(config: &GeneReportConfig) {
    match run_gene_pipeline(config) {
        Ok(report) => {
            info!(
                "Resistance genes: {} hits, {} distinct genes",
                report.hits, report.distinct_genes
            );
            if let Some(leading) = report.top.top().first() {
                info!("Most frequent gene: {} ({} hits)", leading.label, leading.value);
            }
            for output in &report.outputs {
                info!("Done! Chart saved as {}", output.display());
            }
        }
        Err(ReportError::FileNotFound(path)) => {
            error!("ERROR: input file '{}' not found", path.display());
        }
        Err(e) => {
            error!("An error occurred: {}", e);
        }
    }
}

/// Runs the taxonomy report. Any failure aborts the run.
fn taxa_command(config: &TaxaReportConfig, summary_json: Option<&PathBuf>) -> Result<()> {
    let report = run_taxa_pipeline(config)
        .with_context(|| format!("Taxonomy report failed for {}", config.input.display()))?;
    log_taxa_report(&report);

    if let Some(summary) = &report.summary {
        println!("{}", summary);
        if let Some(path) = summary_json {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            serde_json::to_writer_pretty(BufWriter::new(file), summary)?;
            info!("Summary written to {}", path.display());
        }
    }
    Ok(())
}

fn log_taxa_report(report: &TaxaReport) {
    info!(
        "Taxonomy: {} genomes, total abundance {:.2}%, {} genomes in the top chart",
        report.genomes,
        report.total_abundance,
        report.top_genomes.len()
    );
    if report.dropped > 0 {
        info!(
            "{} genomes charted, {} rows without a usable abundance skipped",
            report.genomes, report.dropped
        );
    }
    for (level, top) in &report.rank_tables {
        if let Some(first) = top.top().first() {
            info!("Leading {}: {} ({:.2}%)", level, first.label, first.value);
        }
    }
    info!("Saved {} chart files", report.outputs.len());
}
