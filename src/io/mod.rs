//! Input/Output operations module.
//!
//! Handles reading the alignment and abundance tables (optionally
//! compressed) and writing aggregated tables next to the charts.

pub mod alignment;
pub mod taxonomy_table;

pub use alignment::{load_alignments, AlignmentRecord};
pub use taxonomy_table::{load_taxonomy, TaxonomyRecord, TaxonomyTable};

use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use crate::count_table::ChartEntry;
use crate::error::{ReportError, Result};

/// Opens an input table, decompressing `.gz`, `.bz2` and `.zst` files.
///
/// A path that does not exist is reported as `FileNotFound` rather than as a
/// plain IO error so callers can tell "no input" apart from "bad input".
pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ReportError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    let reader = BufReader::new(file);

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let stream: Box<dyn Read> = match extension.as_str() {
        "gz" => Box::new(flate2::read::MultiGzDecoder::new(reader)),
        "bz2" => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
        "zst" => Box::new(zstd::stream::read::Decoder::new(reader)?),
        _ => Box::new(reader),
    };
    Ok(stream)
}

/// Directory the charts for `input` are written to.
///
/// An explicit directory wins; otherwise charts go next to the input file,
/// or into the current directory when the input has no directory component.
pub fn output_dir_for(input: &Path, explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Writes chart entries as a two-column TSV (`label`, `value`).
pub fn write_entries(
    entries: &[ChartEntry],
    header: (&str, &str),
    output_path: &Path,
) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(BufWriter::new(file));

    writer.write_record([header.0, header.1])?;
    for entry in entries {
        let value = entry.value.to_string();
        writer.write_record([entry.label.as_str(), value.as_str()])?;
    }

    writer.flush()?; // Ensure all data is written to the file
    Ok(())
}
