//! Static figures rendered with `plotters`.
//!
//! The backend follows the file extension: `.svg` renders vector output,
//! anything else a bitmap. Text is laid out with a bundled DejaVu Sans
//! registered as the `sans-serif` family, so no system fonts are needed.

use std::error::Error;
use std::path::Path;
use std::sync::OnceLock;

use plotters::prelude::*;
use tracing::debug;

use crate::table::ResultTable;
use crate::{ResultsError, ResultsResult};

const FONT_FAMILY: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

const SERIES_COLORS: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(23, 190, 207),
];

/// Figure settings shared by line and bar plots.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOptions {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Only points with x inside this closed window are drawn.
    pub x_range: Option<(f64, f64)>,
    pub width: u32,
    pub height: u32,
    pub line_width: u32,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            x_range: None,
            width: 1024,
            height: 768,
            line_width: 2,
        }
    }
}

impl PlotOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_axes(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn with_x_range(mut self, range: Option<(f64, f64)>) -> Self {
        self.x_range = range;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

struct Series {
    name: String,
    points: Vec<(f64, f64)>,
}

/// Line plot of each `ys` column against column `x`.
///
/// Non-finite points (failed rows) are skipped.
pub fn plot_xy(
    table: &ResultTable,
    x: &str,
    ys: &[&str],
    path: &Path,
    options: &PlotOptions,
) -> ResultsResult<()> {
    let xs = table.column(x)?;
    let mut series = Vec::with_capacity(ys.len());
    for name in ys {
        let values = table.column(name)?;
        let points: Vec<(f64, f64)> = xs
            .iter()
            .zip(&values)
            .map(|(&x, &y)| (x, y))
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .filter(|(x, _)| options.x_range.is_none_or(|(lo, hi)| *x >= lo && *x <= hi))
            .collect();
        series.push(Series {
            name: name.to_string(),
            points,
        });
    }
    if series.iter().all(|s| s.points.is_empty()) {
        return Err(ResultsError::EmptyTable {
            what: format!("no finite points for {} against {x}", ys.join(", ")),
        });
    }

    let x_bounds = options
        .x_range
        .unwrap_or_else(|| padded_bounds(series.iter().flat_map(|s| s.points.iter().map(|p| p.0)), 0.0));
    let y_bounds = padded_bounds(series.iter().flat_map(|s| s.points.iter().map(|p| p.1)), 0.05);

    ensure_parent(path)?;
    ensure_font()?;
    let size = (options.width, options.height);
    if is_svg(path) {
        let root = SVGBackend::new(path, size).into_drawing_area();
        draw_lines_on_area(&root, &series, x_bounds, y_bounds, options).map_err(plot_error)?;
    } else {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        draw_lines_on_area(&root, &series, x_bounds, y_bounds, options).map_err(plot_error)?;
    }
    debug!(path = %path.display(), series = series.len(), "rendered line plot");
    Ok(())
}

/// Row indices of the `top_k` rows ranked by maximum absolute value across
/// `value_columns`, largest first. NaN counts as zero.
pub fn select_top_k(
    table: &ResultTable,
    value_columns: &[&str],
    top_k: usize,
) -> ResultsResult<Vec<usize>> {
    let columns = value_columns
        .iter()
        .map(|c| table.column(c))
        .collect::<ResultsResult<Vec<_>>>()?;
    let mut scored: Vec<(usize, f64)> = (0..table.len())
        .map(|row| {
            let score = columns
                .iter()
                .map(|col| col[row].abs())
                .filter(|v| v.is_finite())
                .fold(0.0, f64::max);
            (row, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(scored.into_iter().take(top_k).map(|(row, _)| row).collect())
}

/// Horizontal grouped bars: one group per selected row, labelled by
/// `label_column`, one bar per value column.
pub fn plot_barh(
    table: &ResultTable,
    label_column: &str,
    value_columns: &[&str],
    top_k: usize,
    path: &Path,
    options: &PlotOptions,
) -> ResultsResult<()> {
    if table.label_column() != Some(label_column) {
        return Err(ResultsError::UnknownColumn {
            name: label_column.to_string(),
        });
    }
    if value_columns.is_empty() {
        return Err(ResultsError::EmptyTable {
            what: "no value columns selected".to_string(),
        });
    }
    let rows = select_top_k(table, value_columns, top_k)?;
    if rows.is_empty() {
        return Err(ResultsError::EmptyTable {
            what: "no rows to rank".to_string(),
        });
    }

    let labels = table.labels();
    let columns = value_columns
        .iter()
        .map(|c| table.column(c))
        .collect::<ResultsResult<Vec<_>>>()?;
    let groups: Vec<(String, Vec<f64>)> = rows
        .iter()
        .map(|&row| {
            let values = columns
                .iter()
                .map(|col| if col[row].is_finite() { col[row] } else { 0.0 })
                .collect();
            (labels[row].to_string(), values)
        })
        .collect();

    let x_bounds = padded_bounds(
        groups.iter().flat_map(|(_, v)| v.iter().copied()).chain([0.0]),
        0.05,
    );
    let names: Vec<String> = value_columns.iter().map(|c| c.to_string()).collect();

    ensure_parent(path)?;
    ensure_font()?;
    let size = (options.width, options.height);
    if is_svg(path) {
        let root = SVGBackend::new(path, size).into_drawing_area();
        draw_bars_on_area(&root, &groups, &names, x_bounds, options).map_err(plot_error)?;
    } else {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        draw_bars_on_area(&root, &groups, &names, x_bounds, options).map_err(plot_error)?;
    }
    debug!(path = %path.display(), groups = groups.len(), "rendered bar plot");
    Ok(())
}

/// Register the bundled font once per process.
fn ensure_font() -> ResultsResult<()> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED.get_or_init(|| {
        plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES).is_ok()
    });
    if ok {
        Ok(())
    } else {
        Err(ResultsError::Plot(format!(
            "bundled {FONT_FAMILY} font could not be loaded"
        )))
    }
}

fn is_svg(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

fn plot_error(err: Box<dyn Error>) -> ResultsError {
    ResultsError::Plot(err.to_string())
}

fn ensure_parent(path: &Path) -> ResultsResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(ResultsError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("output directory {} does not exist", parent.display()),
            )))
        }
        _ => Ok(()),
    }
}

fn padded_bounds(values: impl Iterator<Item = f64>, pad: f64) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let span = hi - lo;
    if span <= f64::EPSILON * hi.abs().max(1.0) {
        let half = 0.5 * hi.abs().max(1.0);
        return (lo - half, hi + half);
    }
    (lo - pad * span, hi + pad * span)
}

fn draw_lines_on_area<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    series: &[Series],
    x_bounds: (f64, f64),
    y_bounds: (f64, f64),
    options: &PlotOptions,
) -> Result<(), Box<dyn Error>>
where
    <DB as DrawingBackend>::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(root)
        .caption(&options.title, (FONT_FAMILY, 40.0).into_font())
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_bounds.0..x_bounds.1, y_bounds.0..y_bounds.1)?;

    chart
        .configure_mesh()
        .x_desc(&options.x_label)
        .y_desc(&options.y_label)
        .draw()?;

    for (i, s) in series.iter().enumerate() {
        let color = SERIES_COLORS[i % SERIES_COLORS.len()];
        let width = options.line_width;
        chart
            .draw_series(LineSeries::new(
                s.points.iter().copied(),
                color.stroke_width(width),
            ))?
            .label(&s.name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width)));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_bars_on_area<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    groups: &[(String, Vec<f64>)],
    names: &[String],
    x_bounds: (f64, f64),
    options: &PlotOptions,
) -> Result<(), Box<dyn Error>>
where
    <DB as DrawingBackend>::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let n = groups.len();
    let mut chart = ChartBuilder::on(root)
        .caption(&options.title, (FONT_FAMILY, 40.0).into_font())
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(20)
        .build_cartesian_2d(x_bounds.0..x_bounds.1, 0.0..n as f64)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(0)
        .x_desc(&options.x_label)
        .y_desc(&options.y_label)
        .draw()?;

    let m = names.len();
    let slot = 0.8 / m as f64;
    for (j, name) in names.iter().enumerate() {
        let color = SERIES_COLORS[j % SERIES_COLORS.len()];
        // Highest-ranked group is drawn at the top.
        let bars = groups.iter().enumerate().map(move |(rank, (_, values))| {
            let base = (n - 1 - rank) as f64 + 0.1 + j as f64 * slot;
            Rectangle::new([(0.0, base), (values[j], base + slot)], color.filled())
        });
        chart
            .draw_series(bars)?
            .label(name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
    }

    let label_x = x_bounds.0 + 0.01 * (x_bounds.1 - x_bounds.0);
    chart.draw_series(groups.iter().enumerate().map(|(rank, (label, _))| {
        Text::new(
            label.clone(),
            (label_x, (n - 1 - rank) as f64 + 0.5),
            (FONT_FAMILY, 14.0).into_font(),
        )
    }))?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Record;

    fn sensitivity_table() -> ResultTable {
        let mut table = ResultTable::new().with_label_column("reaction");
        let rows = [("R1", 0.5, 0.45), ("R2", -0.9, 0.1), ("R3", 0.0, 0.0), ("R4", 0.2, f64::NAN)];
        for (label, a, b) in rows {
            table
                .append(Record::labeled(
                    label,
                    vec![("0.6".to_string(), a), ("1".to_string(), b)],
                ))
                .unwrap();
        }
        table
    }

    #[test]
    fn top_k_ranks_by_max_abs() {
        let table = sensitivity_table();
        assert_eq!(select_top_k(&table, &["0.6", "1"], 2).unwrap(), vec![1, 0]);
        assert_eq!(select_top_k(&table, &["1"], 10).unwrap(), vec![0, 1, 2, 3]);
        assert!(select_top_k(&table, &["2"], 1).is_err());
    }

    #[test]
    fn padded_bounds_handles_flat_data() {
        let (lo, hi) = padded_bounds([3.0, 3.0].into_iter(), 0.05);
        assert!(lo < 3.0 && hi > 3.0);
        let (lo, hi) = padded_bounds([0.0, 10.0].into_iter(), 0.1);
        assert_eq!((lo, hi), (-1.0, 11.0));
        assert_eq!(padded_bounds(std::iter::empty(), 0.1), (0.0, 1.0));
    }

    #[test]
    fn missing_directory_is_io_error() {
        let table = sensitivity_table();
        let path = std::env::temp_dir()
            .join("fs_results_no_such_dir")
            .join("bars.svg");
        let err = plot_barh(&table, "reaction", &["0.6"], 2, &path, &PlotOptions::default())
            .unwrap_err();
        assert!(matches!(err, ResultsError::Io(_)));
    }

    #[test]
    fn wrong_label_column_is_rejected() {
        let table = sensitivity_table();
        let path = std::env::temp_dir().join("fs_results_wrong_label.svg");
        let err = plot_barh(&table, "equation", &["0.6"], 2, &path, &PlotOptions::default())
            .unwrap_err();
        assert!(matches!(err, ResultsError::UnknownColumn { .. }));
    }
}
