//! Bioinformatics domain types.
//!
//! Groups the resistance-gene annotation handling and the taxonomic ranks
//! used by the abundance table.

pub mod gene;
pub mod taxonomy;

pub use gene::{extract_gene_name, Annotation};
pub use taxonomy::TaxonomicLevel;
