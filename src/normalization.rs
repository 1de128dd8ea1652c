//! Abundance coercion.
//!
//! The profiler writes abundances as text; some rows carry placeholders
//! (`NA`, `-`, empty) instead of a number. Those rows are removed from the
//! working table, never zero-filled, so totals only count real measurements.

use log::{debug, warn};

use crate::io::{TaxonomyRecord, TaxonomyTable};

/// Coerces a raw abundance to a non-negative finite value.
///
/// Returns `None` for anything that is not a float literal, and for NaN,
/// infinities and negative numbers.
pub fn coerce_abundance(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// A taxonomy row whose abundance has been coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct AbundanceRow {
    pub record: TaxonomyRecord,
    pub abundance: f64,
}

impl AbundanceRow {
    pub fn species(&self) -> &str {
        &self.record.species
    }

    pub fn strain(&self) -> &str {
        &self.record.strain
    }
}

/// Working table after coercion: only rows with a usable abundance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbundanceTable {
    pub rows: Vec<AbundanceRow>,
    /// Number of input rows removed because their abundance failed coercion.
    pub dropped: usize,
}

impl AbundanceTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_abundance(&self) -> f64 {
        self.rows.iter().map(|row| row.abundance).sum()
    }
}

/// Coerces every abundance and drops the rows that fail. Row order is kept.
pub fn drop_unparseable(table: &TaxonomyTable) -> AbundanceTable {
    let mut rows = Vec::with_capacity(table.records.len());
    let mut dropped = 0;

    for record in &table.records {
        match coerce_abundance(&record.abundance) {
            Some(abundance) => rows.push(AbundanceRow {
                record: record.clone(),
                abundance,
            }),
            None => {
                debug!(
                    "Dropping '{}' with unparseable abundance '{}'",
                    record.strain, record.abundance
                );
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        warn!(
            "Dropped {} of {} rows with a missing or invalid abundance.",
            dropped,
            table.records.len()
        );
    }

    AbundanceTable { rows, dropped }
}
