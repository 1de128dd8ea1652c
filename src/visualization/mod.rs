//! Chart descriptions and the renderer seam.
//!
//! Pipelines describe *what* to draw as a [`BarChart`] and hand it to a
//! [`ChartRenderer`]; [`plotter::Visualizer`] draws it with plotters.

pub mod plotter;

pub use plotter::Visualizer;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::count_table::ChartEntry;
use crate::error::Result;

/// Bars whose value exceeds this get a value label.
pub const VALUE_LABEL_THRESHOLD: f64 = 0.1;

/// Image formats a chart can be written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Svg,
    /// Vector output, converted from the SVG rendering.
    Pdf,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Pdf => "pdf",
        }
    }
}

/// Physical figure size; pixel size is inches times DPI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FigureSize {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
}

impl FigureSize {
    pub fn new(width_in: f64, height_in: f64, dpi: u32) -> Self {
        FigureSize {
            width_in,
            height_in,
            dpi,
        }
    }

    pub fn pixels(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi as f64).round() as u32,
            (self.height_in * self.dpi as f64).round() as u32,
        )
    }

    /// Converts a font size in points to pixels at this DPI.
    pub fn font_px(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }
}

impl Default for FigureSize {
    fn default() -> Self {
        FigureSize::new(12.0, 8.0, 150)
    }
}

/// Which bars get a value label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueLabels {
    None,
    /// Only bars whose value exceeds the threshold.
    AboveThreshold(f64),
    All,
}

impl ValueLabels {
    pub fn applies_to(&self, value: f64) -> bool {
        match self {
            ValueLabels::None => false,
            ValueLabels::AboveThreshold(threshold) => value > *threshold,
            ValueLabels::All => true,
        }
    }
}

/// Bar fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Palette {
    /// Gradient from dark purple (first bar) to yellow (last bar).
    Viridis,
    Solid(u8, u8, u8),
}

/// A horizontal bar chart: first entry on top.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub entries: Vec<ChartEntry>,
    pub labelling: ValueLabels,
    /// Appended to value labels, e.g. `%`.
    pub value_suffix: String,
    pub palette: Palette,
    pub figure: FigureSize,
}

impl BarChart {
    pub fn new(title: impl Into<String>, entries: Vec<ChartEntry>) -> Self {
        BarChart {
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            entries,
            labelling: ValueLabels::None,
            value_suffix: String::new(),
            palette: Palette::Viridis,
            figure: FigureSize::default(),
        }
    }

    pub fn axes(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn annotate(mut self, labelling: ValueLabels, suffix: &str) -> Self {
        self.labelling = labelling;
        self.value_suffix = suffix.to_string();
        self
    }

    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn figure(mut self, figure: FigureSize) -> Self {
        self.figure = figure;
        self
    }

    /// Value labels for the bars that get one, as `(bar index, text)`.
    pub fn value_labels(&self) -> Vec<(usize, String)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| self.labelling.applies_to(entry.value))
            .map(|(i, entry)| (i, format!("{:.2}{}", entry.value, self.value_suffix)))
            .collect()
    }

    pub fn max_value(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| entry.value)
            .fold(0.0, f64::max)
    }
}

/// Draws charts and writes them to disk.
pub trait ChartRenderer {
    /// Renders `chart` to `<output dir>/<file_stem>.<ext>` for each
    /// configured format and returns the written paths.
    fn render(&self, chart: &BarChart, file_stem: &str) -> Result<Vec<PathBuf>>;
}
