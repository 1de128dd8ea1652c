//! Report pipelines: load, normalize, aggregate, render.
//!
//! Each pipeline has a `run_*_report` function working on an already loaded
//! table and a `run_*_pipeline` function that also does the file handling.

pub mod genes;
pub mod summary;
pub mod taxa;

pub use genes::run_gene_pipeline;
pub use taxa::{run_taxa_pipeline, TaxaReport};
