//! Tabular alignment hits (BLAST/DIAMOND `outfmt 6`).
//!
//! The file has no header; the twelve columns are positional:
//! `qseqid sseqid pident length mismatch gapopen qstart qend sstart send evalue bitscore`.

use std::io::Read;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::bio::{extract_gene_name, Annotation};
use crate::error::{ReportError, Result};
use crate::io::open_input;

/// Number of positional columns in an `outfmt 6` row.
pub const ALIGNMENT_COLUMNS: usize = 12;

/// A single alignment hit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AlignmentRecord {
    pub query_id: String,
    /// Composite CARD annotation, e.g. `gnl|CARD|ARO:3000123|mecA`.
    pub subject_id: String,
    pub percent_identity: f64,
    pub alignment_length: u32,
    pub mismatch_count: u32,
    pub gap_openings: u32,
    pub query_start: u64,
    pub query_end: u64,
    pub subject_start: u64,
    pub subject_end: u64,
    pub e_value: f64,
    pub bit_score: f64,
}

impl AlignmentRecord {
    pub fn annotation(&self) -> Annotation {
        Annotation::from_field(&self.subject_id)
    }

    /// Short gene name derived from `subject_id`.
    pub fn resistance_gene_name(&self) -> Annotation {
        extract_gene_name(&self.annotation())
    }
}

/// Loads alignment hits from a file path.
pub fn load_alignments(path: &Path) -> Result<Vec<AlignmentRecord>> {
    let reader = open_input(path)?;
    let records = read_alignments(reader, path)?;
    info!("Loaded {} alignment hits from {}", records.len(), path.display());
    Ok(records)
}

/// Reads alignment hits from any reader. `source` is only used in errors.
pub fn read_alignments<R: Read>(reader: R, source: &Path) -> Result<Vec<AlignmentRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(|e| parse_error(source, &e))?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        if row.len() != ALIGNMENT_COLUMNS {
            return Err(ReportError::Parse {
                path: source.to_path_buf(),
                line,
                message: format!(
                    "expected {} tab-separated columns, found {}",
                    ALIGNMENT_COLUMNS,
                    row.len()
                ),
            });
        }

        let record: AlignmentRecord = row
            .deserialize(None)
            .map_err(|e| parse_error(source, &e))?;
        records.push(record);
    }

    Ok(records)
}

fn parse_error(source: &Path, err: &csv::Error) -> ReportError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    let message = match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
        _ => err.to_string(),
    };
    ReportError::Parse {
        path: source.to_path_buf(),
        line,
        message,
    }
}
