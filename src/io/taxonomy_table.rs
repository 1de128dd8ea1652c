//! Taxonomic abundance tables (FOCUS-style `output_All_levels.csv`).
//!
//! The table has a header row with one column per rank and one column of
//! relative abundances named after the profiled sample.

use std::io::Read;
use std::path::Path;

use log::{debug, info};

use crate::bio::TaxonomicLevel;
use crate::error::{ReportError, Result};
use crate::io::open_input;

/// Header the profiler gives the abundance column when run on an assembly.
pub const DEFAULT_ABUNDANCE_COLUMN: &str = "final.contigs.fasta";

/// Canonical name of the abundance column.
pub const ABUNDANCE: &str = "Abundance";

/// One genome row. The abundance is kept as raw text until coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyRecord {
    pub phylum: String,
    pub class: String,
    pub family: String,
    pub genus: String,
    pub species: String,
    pub strain: String,
    pub abundance: String,
}

impl TaxonomyRecord {
    /// Returns the taxon name at the given rank.
    pub fn level(&self, level: TaxonomicLevel) -> &str {
        match level {
            TaxonomicLevel::Phylum => &self.phylum,
            TaxonomicLevel::Class => &self.class,
            TaxonomicLevel::Family => &self.family,
            TaxonomicLevel::Genus => &self.genus,
            TaxonomicLevel::Species => &self.species,
            TaxonomicLevel::Strain => &self.strain,
        }
    }
}

/// The loaded table in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxonomyTable {
    /// Header of the column the abundances were read from.
    pub abundance_column: String,
    pub records: Vec<TaxonomyRecord>,
}

/// Loads a taxonomy table from a file path.
///
/// `abundance_column` names the column holding abundances; see
/// [`read_taxonomy`] for the fallbacks when it is absent.
pub fn load_taxonomy(path: &Path, abundance_column: &str) -> Result<TaxonomyTable> {
    let reader = open_input(path)?;
    let table = read_taxonomy(reader, path, abundance_column)?;
    info!(
        "Loaded {} taxonomy rows from {} (abundance column '{}')",
        table.records.len(),
        path.display(),
        table.abundance_column
    );
    Ok(table)
}

/// Reads a comma-separated taxonomy table from any reader.
///
/// The abundance column is `abundance_column` if present, otherwise a column
/// named `Abundance`, otherwise the last column that is not a rank column.
pub fn read_taxonomy<R: Read>(
    reader: R,
    source: &Path,
    abundance_column: &str,
) -> Result<TaxonomyTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|e| parse_error(source, &e))?.clone();
    let find = |name: &str| headers.iter().position(|h| h == name);

    let mut rank_cols = [0usize; 6];
    for (slot, level) in rank_cols.iter_mut().zip(TaxonomicLevel::all_levels()) {
        *slot = find(level.column_name()).ok_or_else(|| ReportError::MissingColumn {
            column: level.column_name().to_string(),
            path: source.to_path_buf(),
        })?;
    }

    let abundance_col = find(abundance_column)
        .or_else(|| find(ABUNDANCE))
        .or_else(|| {
            (0..headers.len())
                .rev()
                .find(|idx| !rank_cols.contains(idx))
        })
        .ok_or_else(|| ReportError::MissingColumn {
            column: abundance_column.to_string(),
            path: source.to_path_buf(),
        })?;
    let resolved = headers.get(abundance_col).unwrap_or(ABUNDANCE).to_string();
    if resolved != abundance_column {
        debug!(
            "Abundance column '{}' not found, using '{}'",
            abundance_column, resolved
        );
    }

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(|e| parse_error(source, &e))?;
        let get = |idx: usize| row.get(idx).unwrap_or_default().trim().to_string();
        records.push(TaxonomyRecord {
            phylum: get(rank_cols[0]),
            class: get(rank_cols[1]),
            family: get(rank_cols[2]),
            genus: get(rank_cols[3]),
            species: get(rank_cols[4]),
            strain: get(rank_cols[5]),
            abundance: get(abundance_col),
        });
    }

    Ok(TaxonomyTable {
        abundance_column: resolved,
        records,
    })
}

fn parse_error(source: &Path, err: &csv::Error) -> ReportError {
    ReportError::Parse {
        path: source.to_path_buf(),
        line: err.position().map(|p| p.line()).unwrap_or(0),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
Kingdom,Phylum,Class,Order,Family,Genus,Species,Strain,final.contigs.fasta
Bacteria,Proteobacteria,Gammaproteobacteria,Enterobacterales,Enterobacteriaceae,Escherichia,Escherichia coli,Escherichia coli K-12,41.5
Bacteria,Firmicutes,Bacilli,Bacillales,Staphylococcaceae,Staphylococcus,Staphylococcus aureus,Staphylococcus aureus USA300,NA
";

    #[test]
    fn test_read_taxonomy_named_columns() {
        let table =
            read_taxonomy(TABLE.as_bytes(), Path::new("t.csv"), DEFAULT_ABUNDANCE_COLUMN).unwrap();

        assert_eq!(table.abundance_column, "final.contigs.fasta");
        assert_eq!(table.records.len(), 2);
        let first = &table.records[0];
        assert_eq!(first.level(TaxonomicLevel::Phylum), "Proteobacteria");
        assert_eq!(first.level(TaxonomicLevel::Strain), "Escherichia coli K-12");
        assert_eq!(first.abundance, "41.5");
        assert_eq!(table.records[1].abundance, "NA");
    }

    #[test]
    fn test_abundance_column_fallbacks() {
        let named = "Phylum,Abundance,Class,Family,Genus,Species,Strain\nP,1.0,C,F,G,S,T\n";
        let table = read_taxonomy(named.as_bytes(), Path::new("t.csv"), "sample_1").unwrap();
        assert_eq!(table.abundance_column, "Abundance");
        assert_eq!(table.records[0].abundance, "1.0");

        let other = read_taxonomy(TABLE.as_bytes(), Path::new("t.csv"), "sample_1").unwrap();
        assert_eq!(other.abundance_column, "final.contigs.fasta");
    }

    #[test]
    fn test_missing_rank_column() {
        let data = "Phylum,Class,Family,Genus,Species,Abundance\nP,C,F,G,S,1\n";
        match read_taxonomy(data.as_bytes(), Path::new("t.csv"), ABUNDANCE) {
            Err(ReportError::MissingColumn { column, .. }) => assert_eq!(column, "Strain"),
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn test_ragged_row_is_parse_error() {
        let data = "Phylum,Class,Family,Genus,Species,Strain,Abundance\nP,C,F,G,S,T,1\nP,C\n";
        assert!(matches!(
            read_taxonomy(data.as_bytes(), Path::new("t.csv"), ABUNDANCE),
            Err(ReportError::Parse { line: 3, .. })
        ));
    }
}
