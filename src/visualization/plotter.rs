use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::colors::colormaps::{ColorMap, ViridisRGB};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontStyle;
use svg2pdf::usvg;

use super::{BarChart, ChartRenderer, FigureSize, OutputFormat, Palette};
use crate::error::{ReportError, Result};

/// Visualization generator
pub struct Visualizer {
    /// Output directory for visualizations
    output_dir: PathBuf,
    formats: Vec<OutputFormat>,
}

impl Visualizer {
    /// Create a new visualizer writing every chart in each of `formats`
    pub fn new(output_dir: impl AsRef<Path>, formats: &[OutputFormat]) -> Result<Self> {
        let output_path = output_dir.as_ref().to_path_buf();

        if formats.is_empty() {
            return Err(ReportError::Config(
                "at least one output format is required".to_string(),
            ));
        }

        // Create output directory if it doesn't exist
        if !output_path.exists() {
            fs::create_dir_all(&output_path)?;
        }

        Ok(Visualizer {
            output_dir: output_path,
            formats: formats.to_vec(),
        })
    }

    pub fn output_path(&self, file_stem: &str, format: OutputFormat) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", file_stem, format.extension()))
    }
}

impl ChartRenderer for Visualizer {
    fn render(&self, chart: &BarChart, file_stem: &str) -> Result<Vec<PathBuf>> {
        let (width, height) = chart.figure.pixels();
        let mut written = Vec::with_capacity(self.formats.len());

        for &format in &self.formats {
            let output_file = self.output_path(file_stem, format);
            debug!(
                "Rendering '{}' ({}x{} px) to {}",
                chart.title,
                width,
                height,
                output_file.display()
            );
            match format {
                OutputFormat::Png => {
                    let root = BitMapBackend::new(&output_file, (width, height))
                        .into_drawing_area();
                    draw_bar_chart(&root, chart, chart.figure)?;
                }
                OutputFormat::Svg => {
                    let root =
                        SVGBackend::new(&output_file, (width, height)).into_drawing_area();
                    draw_bar_chart(&root, chart, chart.figure)?;
                }
                OutputFormat::Pdf => {
                    fs::write(&output_file, render_pdf(chart)?)?;
                }
            }
            info!("Saved {}", output_file.display());
            written.push(output_file);
        }

        Ok(written)
    }
}

/// Renders the chart as SVG at 72 DPI, so one pixel is one PDF point, and
/// converts it to a single-page PDF.
fn render_pdf(chart: &BarChart) -> Result<Vec<u8>> {
    let figure = FigureSize::new(chart.figure.width_in, chart.figure.height_in, 72);
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, figure.pixels()).into_drawing_area();
        draw_bar_chart(&root, chart, figure)?;
    }

    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(&svg, &options).map_err(plot_error)?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| ReportError::Plot(format!("PDF conversion failed: {:?}", e)))
}

/// Draws a horizontal bar chart, first entry at the top.
///
/// Entry `i` occupies row `n - 1 - i` of a segmented axis over `0..=n`; the
/// topmost segment is left empty.
fn draw_bar_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &BarChart,
    figure: FigureSize,
) -> Result<()> {
    let caption_font = ("sans-serif", figure.font_px(16.0));
    let label_font = ("sans-serif", figure.font_px(12.0));

    root.fill(&WHITE).map_err(plot_error)?;

    if chart.entries.is_empty() {
        // No data, draw the title with a message
        let (width, height) = root.dim_in_pixel();
        let area = root.titled(&chart.title, caption_font).map_err(plot_error)?;
        area.draw_text(
            "No data available",
            &TextStyle::from(label_font.into_font()).pos(Pos::new(HPos::Center, VPos::Center)),
            ((width / 2) as i32, (height / 2) as i32),
        )
        .map_err(plot_error)?;
        root.present().map_err(plot_error)?;
        return Ok(());
    }

    let n = chart.entries.len();
    let x_max = axis_limit(chart.max_value());
    let labels: Vec<&str> = chart.entries.iter().map(|e| e.label.as_str()).collect();
    let longest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let y_label_area = (figure.font_px(12.0) * (0.6 * longest as f64 + 3.0)) as u32;

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, caption_font)
        .margin(figure.font_px(10.0) as u32)
        .x_label_area_size(figure.font_px(36.0) as u32)
        .y_label_area_size(y_label_area)
        .build_cartesian_2d(0.0..x_max, (0..n).into_segmented())
        .map_err(plot_error)?;

    ctx.configure_mesh()
        .disable_y_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .y_labels(n + 1)
        .y_label_formatter(&|y| bar_label(&labels, y))
        .label_style(label_font)
        .axis_desc_style(label_font)
        .light_line_style(BLACK.mix(0.15))
        .draw()
        .map_err(plot_error)?;

    let (_, height) = root.dim_in_pixel();
    let bar_margin = (height as f64 * 0.08 / (n + 1) as f64) as u32;

    ctx.draw_series(chart.entries.iter().enumerate().map(|(i, entry)| {
        let row = n - 1 - i;
        let mut bar = Rectangle::new(
            [
                (0.0, SegmentValue::Exact(row)),
                (entry.value, SegmentValue::Exact(row + 1)),
            ],
            bar_color(chart.palette, i, n).filled(),
        );
        bar.set_margin(bar_margin, bar_margin, 0, 0);
        bar
    }))
    .map_err(plot_error)?;

    // Add values at the end of the bars
    let value_style = TextStyle::from(
        ("sans-serif", figure.font_px(11.0))
            .into_font()
            .style(FontStyle::Bold),
    )
    .pos(Pos::new(HPos::Left, VPos::Center));
    let offset = x_max * 0.01;
    ctx.draw_series(chart.value_labels().into_iter().map(|(i, text)| {
        let row = n - 1 - i;
        Text::new(
            text,
            (chart.entries[i].value + offset, SegmentValue::CenterOf(row)),
            value_style.clone(),
        )
    }))
    .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

/// Y-axis tick label for a bar row; rows count from the bottom.
fn bar_label(labels: &[&str], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::CenterOf(row) => labels
            .len()
            .checked_sub(row + 1)
            .and_then(|idx| labels.get(idx))
            .map(|label| label.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Upper x bound leaving room for value labels.
fn axis_limit(max_value: f64) -> f64 {
    if max_value > 0.0 {
        max_value * 1.15
    } else {
        1.0
    }
}

fn bar_color(palette: Palette, index: usize, count: usize) -> RGBColor {
    match palette {
        Palette::Solid(r, g, b) => RGBColor(r, g, b),
        Palette::Viridis => {
            let last = count.saturating_sub(1).max(1) as f64;
            ViridisRGB.get_color_normalized(index as f64, 0.0, last)
        }
    }
}

fn plot_error<E: std::fmt::Display>(err: E) -> ReportError {
    ReportError::Plot(err.to_string())
}
