//! Main entry point for the argtax-report application.
//!
//! Produces two reports for a metagenomic run:
//! 1. Resistance genes: counts DIAMOND/BLAST hits against CARD per gene and
//!    charts the most frequent ones.
//! 2. Taxonomy: charts relative abundance at phylum, class, family and genus
//!    level, the most abundant genomes, and prints a short summary.

// Modules defined within the project
mod bio;
mod cli;
mod config;
mod count_table;
mod error;
mod io;
mod normalization;
mod pipeline;
mod visualization;

use cli::{run_cli, Cli};

// External Crate Imports
use anyhow::Result;
use clap::Parser;
use log::debug;

/// Main function: parses arguments and runs the requested report.
fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG still takes precedence
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();
    debug!("Arguments: {:?}", cli);

    run_cli(cli)
}
