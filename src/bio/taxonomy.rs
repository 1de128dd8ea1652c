//! Taxonomic ranks reported by the abundance profiler.
//!
//! The abundance table carries one column per rank; the ranks below are the
//! ones the taxonomy pipeline reads and charts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Taxonomic classification levels present in the abundance table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxonomicLevel {
    Phylum,
    Class,
    Family,
    Genus,
    Species,
    Strain,
}

impl TaxonomicLevel {
    /// Returns the column header used for this level in the abundance table.
    pub fn column_name(&self) -> &'static str {
        match self {
            TaxonomicLevel::Phylum => "Phylum",
            TaxonomicLevel::Class => "Class",
            TaxonomicLevel::Family => "Family",
            TaxonomicLevel::Genus => "Genus",
            TaxonomicLevel::Species => "Species",
            TaxonomicLevel::Strain => "Strain",
        }
    }

    /// Returns all taxonomic levels in hierarchical order.
    pub fn all_levels() -> [TaxonomicLevel; 6] {
        [
            TaxonomicLevel::Phylum,
            TaxonomicLevel::Class,
            TaxonomicLevel::Family,
            TaxonomicLevel::Genus,
            TaxonomicLevel::Species,
            TaxonomicLevel::Strain,
        ]
    }
}

impl fmt::Display for TaxonomicLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}
