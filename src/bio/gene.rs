//! Resistance-gene names from CARD subject annotations.
//!
//! DIAMOND hits against the CARD protein database carry a composite subject
//! id such as `gnl|CARD|ARO:3000123|mecA`. Charts show only the short gene
//! name, taken from the last `|` segment and, when that segment is a
//! `tag:value` pair, from its value.

use serde::{Deserialize, Serialize};

/// A subject annotation as read from the alignment table.
///
/// Empty fields are kept as `Missing` rather than as an empty string so they
/// never show up as a gene of their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Annotation {
    Text(String),
    Missing,
}

impl Annotation {
    /// Wraps a raw field, mapping an empty field to `Missing`.
    ///
    /// Whitespace-only text is kept as text.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            Annotation::Missing
        } else {
            Annotation::Text(field.to_string())
        }
    }
}

/// Extracts the display gene name from a composite annotation.
///
/// Text without a `|` is returned unchanged, even when it contains `:`.
/// `Missing` passes through untouched.
pub fn extract_gene_name(annotation: &Annotation) -> Annotation {
    match annotation {
        Annotation::Text(text) => Annotation::Text(short_name(text).to_string()),
        Annotation::Missing => Annotation::Missing,
    }
}

fn short_name(text: &str) -> &str {
    match text.rsplit_once('|') {
        Some((_, tail)) => match tail.rsplit_once(':') {
            Some((_, value)) => value,
            None => tail,
        },
        None => text,
    }
}
