//! PNG chart artifacts
//!
//! Eleven fixed charts in four subdirectories of the output directory. Chart
//! data comes from the finished [`AnalysisReport`] plus the trial records for
//! the trial-level distributions; nothing here recomputes a test statistic.
//!
//! Text is rasterized with DejaVu Sans, compiled into the binary and
//! registered with plotters as `sans-serif` before the first chart is drawn.

use crate::analysis::hypothesis::CHANCE_LEVEL;
use crate::analysis::AnalysisReport;
use crate::config::ChartConfig;
use crate::error::{AnalysisError, Result};
use crate::record::{Origin, TrialRecord};
use crate::stats;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;
use tracing::debug;

const AI_COLOR: RGBColor = RGBColor(0xe7, 0x4c, 0x3c);
const HUMAN_COLOR: RGBColor = RGBColor(0x34, 0x98, 0xdb);
const BAR_COLOR: RGBColor = RGBColor(0x4c, 0x72, 0xb0);

const FONT_FAMILY: &str = "sans-serif";
static FONT_BYTES: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

type DrawResult = std::result::Result<(), Box<dyn Error>>;

/// Make the embedded font available under [`FONT_FAMILY`]
///
/// Idempotent.
pub(crate) fn register_font() -> Result<()> {
    plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES).map_err(|_| {
        AnalysisError::Render {
            artifact: "DejaVuSans.ttf".to_string(),
            message: "embedded font could not be parsed".to_string(),
        }
    })
}

/// One chart artifact of the output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chart {
    AccuracyHistogram,
    AccuracyBoxplot,
    AccuracyByOrigin,
    ConfusionMatrix,
    ConfidenceDistribution,
    ConfidenceByCorrectness,
    ResponseTimeDistribution,
    ResponseTimeByCorrectness,
    ExperienceVsAccuracy,
    ConfidenceVsAccuracy,
    AccuracyByText,
}

impl Chart {
    /// Rendering order
    pub const ALL: [Chart; 11] = [
        Chart::AccuracyHistogram,
        Chart::AccuracyBoxplot,
        Chart::AccuracyByOrigin,
        Chart::ConfusionMatrix,
        Chart::ConfidenceDistribution,
        Chart::ConfidenceByCorrectness,
        Chart::ResponseTimeDistribution,
        Chart::ResponseTimeByCorrectness,
        Chart::ExperienceVsAccuracy,
        Chart::ConfidenceVsAccuracy,
        Chart::AccuracyByText,
    ];

    pub const DIRECTORIES: [&'static str; 4] =
        ["accuracy", "confidence_time", "correlations", "by_text"];

    pub fn directory(self) -> &'static str {
        match self {
            Chart::AccuracyHistogram
            | Chart::AccuracyBoxplot
            | Chart::AccuracyByOrigin
            | Chart::ConfusionMatrix => "accuracy",
            Chart::ConfidenceDistribution
            | Chart::ConfidenceByCorrectness
            | Chart::ResponseTimeDistribution
            | Chart::ResponseTimeByCorrectness => "confidence_time",
            Chart::ExperienceVsAccuracy | Chart::ConfidenceVsAccuracy => "correlations",
            Chart::AccuracyByText => "by_text",
        }
    }

    pub fn file_stem(self) -> &'static str {
        match self {
            Chart::AccuracyHistogram => "histogram",
            Chart::AccuracyBoxplot => "boxplot",
            Chart::AccuracyByOrigin => "by_origin",
            Chart::ConfusionMatrix => "confusion_matrix",
            Chart::ConfidenceDistribution => "confidence_distribution",
            Chart::ConfidenceByCorrectness => "confidence_by_correctness",
            Chart::ResponseTimeDistribution => "response_time_distribution",
            Chart::ResponseTimeByCorrectness => "response_time_by_correctness",
            Chart::ExperienceVsAccuracy => "experience_vs_accuracy",
            Chart::ConfidenceVsAccuracy => "confidence_vs_accuracy",
            Chart::AccuracyByText => "accuracy_by_text",
        }
    }

    /// Path relative to the output directory, always `/`-separated
    pub fn relative_path(self) -> String {
        format!("{}/{}.png", self.directory(), self.file_stem())
    }

    fn title(self) -> &'static str {
        match self {
            Chart::AccuracyHistogram => "Distribution of Participant Accuracy",
            Chart::AccuracyBoxplot => "Accuracy Distribution (Box Plot)",
            Chart::AccuracyByOrigin => "Accuracy by Text Origin",
            Chart::ConfusionMatrix => "Confusion Matrix",
            Chart::ConfidenceDistribution => "Distribution of Confidence Ratings",
            Chart::ConfidenceByCorrectness => "Confidence by Response Correctness",
            Chart::ResponseTimeDistribution => "Distribution of Response Times",
            Chart::ResponseTimeByCorrectness => "Response Time by Correctness",
            Chart::ExperienceVsAccuracy => "Teaching Experience vs. Accuracy",
            Chart::ConfidenceVsAccuracy => "Confidence vs. Accuracy",
            Chart::AccuracyByText => "Classification Accuracy by Text",
        }
    }
}

/// Render every chart under `dir`, returning the written relative paths
///
/// # Errors
/// * `Io` if a subdirectory cannot be created
/// * `Render` naming the first chart the backend failed on
pub fn render_charts(
    report: &AnalysisReport,
    records: &[TrialRecord],
    config: &ChartConfig,
    dir: &Path,
) -> Result<Vec<String>> {
    register_font()?;
    for sub in Chart::DIRECTORIES {
        let path = dir.join(sub);
        std::fs::create_dir_all(&path).map_err(|e| AnalysisError::io(&path, e))?;
    }

    let input = ChartInput {
        report,
        records,
        config,
    };
    let mut written = Vec::with_capacity(Chart::ALL.len());
    for chart in Chart::ALL {
        let relative = chart.relative_path();
        let path = dir.join(chart.directory()).join(format!("{}.png", chart.file_stem()));
        input.draw(chart, &path).map_err(|e| AnalysisError::Render {
            artifact: relative.clone(),
            message: e.to_string(),
        })?;
        debug!("Rendered {}", relative);
        written.push(relative);
    }
    Ok(written)
}

struct ChartInput<'a> {
    report: &'a AnalysisReport,
    records: &'a [TrialRecord],
    config: &'a ChartConfig,
}

impl ChartInput<'_> {
    fn draw(&self, chart: Chart, path: &Path) -> DrawResult {
        let root = BitMapBackend::new(path, (self.config.width, self.config.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let report = self.report;
        match chart {
            Chart::AccuracyHistogram => {
                let values = report.accuracy.participant_series();
                let bins = histogram(&values, 0.0, 100.0, self.config.accuracy_bins);
                let mean = report.hypothesis.mean;
                draw_histogram(
                    &root,
                    chart,
                    &bins,
                    "Accuracy (%)",
                    "Number of Participants",
                    &[(CHANCE_LEVEL, RED), (mean, GREEN)],
                )?;
            }
            Chart::AccuracyBoxplot => {
                let values = report.accuracy.participant_series();
                draw_boxplots(
                    &root,
                    chart,
                    &[("Participants", values.as_slice())],
                    "Accuracy (%)",
                    Some(CHANCE_LEVEL),
                )?;
            }
            Chart::AccuracyByOrigin => {
                let bars: Vec<(&str, f64, RGBColor)> = report
                    .accuracy
                    .by_origin
                    .iter()
                    .map(|o| (o.origin.label(), o.accuracy, origin_color(o.origin)))
                    .collect();
                draw_category_bars(&root, chart, &bars)?;
            }
            Chart::ConfusionMatrix => draw_confusion(&root, chart, report)?,
            Chart::ConfidenceDistribution => {
                let values: Vec<f64> = self.records.iter().map(|r| r.confidence as f64).collect();
                let bins = histogram(&values, 0.5, 5.5, 5);
                draw_histogram(&root, chart, &bins, "Confidence Rating", "Frequency", &[])?;
            }
            Chart::ConfidenceByCorrectness => {
                let (correct, incorrect) = split_by_correctness(self.records, |r| r.confidence as f64);
                draw_boxplots(
                    &root,
                    chart,
                    &[("Correct", correct.as_slice()), ("Incorrect", incorrect.as_slice())],
                    "Confidence Rating",
                    None,
                )?;
            }
            Chart::ResponseTimeDistribution => {
                let values: Vec<f64> = self.records.iter().map(|r| r.response_time_secs()).collect();
                let (lo, hi) = value_range(&values);
                let bins = histogram(&values, lo, hi, self.config.response_time_bins);
                draw_histogram(&root, chart, &bins, "Response Time (seconds)", "Frequency", &[])?;
            }
            Chart::ResponseTimeByCorrectness => {
                let (correct, incorrect) = split_by_correctness(self.records, |r| r.response_time_secs());
                draw_boxplots(
                    &root,
                    chart,
                    &[("Correct", correct.as_slice()), ("Incorrect", incorrect.as_slice())],
                    "Response Time (seconds)",
                    None,
                )?;
            }
            Chart::ExperienceVsAccuracy => {
                let points: Vec<(f64, f64)> = report
                    .correlation
                    .participants
                    .iter()
                    .map(|p| (p.experience_years, p.accuracy))
                    .collect();
                draw_scatter(&root, chart, &points, "Teaching Experience (years)", true)?;
            }
            Chart::ConfidenceVsAccuracy => {
                let points: Vec<(f64, f64)> = report
                    .correlation
                    .participants
                    .iter()
                    .map(|p| (p.mean_confidence, p.accuracy))
                    .collect();
                draw_scatter(&root, chart, &points, "Mean Confidence Rating", false)?;
            }
            Chart::AccuracyByText => draw_text_bars(&root, chart, report)?,
        }

        root.present()?;
        Ok(())
    }
}

type Root<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

fn origin_color(origin: Origin) -> RGBColor {
    match origin {
        Origin::Ai => AI_COLOR,
        Origin::Human => HUMAN_COLOR,
    }
}

fn split_by_correctness(
    records: &[TrialRecord],
    value: impl Fn(&TrialRecord) -> f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut correct = Vec::new();
    let mut incorrect = Vec::new();
    for record in records {
        if record.correct() {
            correct.push(value(record));
        } else {
            incorrect.push(value(record));
        }
    }
    (correct, incorrect)
}

/// Min and max of the values, widened to a unit range when they coincide
fn value_range(values: &[f64]) -> (f64, f64) {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo < f64::EPSILON {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

/// Equal-width bins over `[lo, hi]` as `(start, end, count)`
///
/// Values equal to `hi` fall into the last bin; values outside the range are
/// ignored.
fn histogram(values: &[f64], lo: f64, hi: f64, bins: usize) -> Vec<(f64, f64, u32)> {
    let bins = bins.max(1);
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0u32; bins];
    for &v in values {
        if v < lo || v > hi || width <= 0.0 {
            continue;
        }
        let index = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| (lo + i as f64 * width, lo + (i + 1) as f64 * width, c))
        .collect()
}

/// Five-number box summary with 1.5 IQR whiskers
#[derive(Debug, Clone, PartialEq)]
struct BoxStats {
    q1: f64,
    median: f64,
    q3: f64,
    whisker_low: f64,
    whisker_high: f64,
    outliers: Vec<f64>,
}

impl BoxStats {
    fn of(values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let q1 = stats::quantile(&sorted, 0.25)?;
        let median = stats::quantile(&sorted, 0.5)?;
        let q3 = stats::quantile(&sorted, 0.75)?;
        let fence = 1.5 * (q3 - q1);
        let (low_fence, high_fence) = (q1 - fence, q3 + fence);

        let inside: Vec<f64> = sorted
            .iter()
            .copied()
            .filter(|v| (low_fence..=high_fence).contains(v))
            .collect();
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| !(low_fence..=high_fence).contains(v))
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            whisker_low: inside.first().copied().unwrap_or(q1),
            whisker_high: inside.last().copied().unwrap_or(q3),
            outliers,
        })
    }
}

/// Maps category centers `i + 0.5` to their names
fn category_label(labels: &[&str], x: f64) -> String {
    let index = x.floor();
    if index < 0.0 || (x - index - 0.5).abs() > 1e-6 {
        return String::new();
    }
    labels.get(index as usize).map(|s| s.to_string()).unwrap_or_default()
}

fn draw_histogram(
    root: &Root<'_>,
    chart: Chart,
    bins: &[(f64, f64, u32)],
    x_desc: &str,
    y_desc: &str,
    markers: &[(f64, RGBColor)],
) -> DrawResult {
    let x_lo = bins.first().map(|b| b.0).unwrap_or(0.0);
    let x_hi = bins.last().map(|b| b.1).unwrap_or(1.0);
    let y_max = bins.iter().map(|b| b.2).max().unwrap_or(0).max(1) as f64;

    let mut ctx = ChartBuilder::on(root)
        .caption(chart.title(), (FONT_FAMILY, 24))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_max * 1.1)?;
    ctx.configure_mesh().x_desc(x_desc).y_desc(y_desc).draw()?;

    ctx.draw_series(bins.iter().map(|&(start, end, count)| {
        Rectangle::new([(start, 0.0), (end, count as f64)], BAR_COLOR.mix(0.7).filled())
    }))?;
    ctx.draw_series(bins.iter().map(|&(start, end, count)| {
        Rectangle::new([(start, 0.0), (end, count as f64)], BLACK.stroke_width(1))
    }))?;

    for &(x, color) in markers {
        if (x_lo..=x_hi).contains(&x) {
            ctx.draw_series(std::iter::once(PathElement::new(
                vec![(x, 0.0), (x, y_max * 1.1)],
                color.stroke_width(2),
            )))?;
        }
    }
    Ok(())
}

fn draw_boxplots(
    root: &Root<'_>,
    chart: Chart,
    groups: &[(&str, &[f64])],
    y_desc: &str,
    reference: Option<f64>,
) -> DrawResult {
    let labels: Vec<&str> = groups.iter().map(|g| g.0).collect();
    let all: Vec<f64> = groups.iter().flat_map(|g| g.1.iter().copied()).collect();
    let (mut lo, mut hi) = value_range(&all);
    if let Some(r) = reference {
        lo = lo.min(r);
        hi = hi.max(r);
    }
    let pad = (hi - lo) * 0.1;
    let width = groups.len().max(1) as f64;

    let mut ctx = ChartBuilder::on(root)
        .caption(chart.title(), (FONT_FAMILY, 24))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..width, (lo - pad)..(hi + pad))?;
    let formatter = |x: &f64| category_label(&labels, *x);
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(groups.len() * 2 + 1)
        .x_label_formatter(&formatter)
        .y_desc(y_desc)
        .draw()?;

    for (i, (_, values)) in groups.iter().enumerate() {
        let Some(b) = BoxStats::of(values) else {
            continue;
        };
        let center = i as f64 + 0.5;
        let (left, right) = (center - 0.2, center + 0.2);

        ctx.draw_series(std::iter::once(Rectangle::new(
            [(left, b.q1), (right, b.q3)],
            BAR_COLOR.mix(0.4).filled(),
        )))?;
        ctx.draw_series(std::iter::once(Rectangle::new(
            [(left, b.q1), (right, b.q3)],
            BLACK.stroke_width(1),
        )))?;
        ctx.draw_series([
            PathElement::new(vec![(left, b.median), (right, b.median)], RED.stroke_width(2)),
            PathElement::new(vec![(center, b.q3), (center, b.whisker_high)], BLACK.stroke_width(1)),
            PathElement::new(vec![(center, b.q1), (center, b.whisker_low)], BLACK.stroke_width(1)),
            PathElement::new(
                vec![(center - 0.1, b.whisker_high), (center + 0.1, b.whisker_high)],
                BLACK.stroke_width(1),
            ),
            PathElement::new(
                vec![(center - 0.1, b.whisker_low), (center + 0.1, b.whisker_low)],
                BLACK.stroke_width(1),
            ),
        ])?;
        ctx.draw_series(
            b.outliers
                .iter()
                .map(|&v| Circle::new((center, v), 4, BLACK.stroke_width(1))),
        )?;
    }

    if let Some(r) = reference {
        ctx.draw_series(std::iter::once(PathElement::new(
            vec![(0.0, r), (width, r)],
            RED.stroke_width(2),
        )))?;
    }
    Ok(())
}

fn draw_category_bars(root: &Root<'_>, chart: Chart, bars: &[(&str, f64, RGBColor)]) -> DrawResult {
    let labels: Vec<&str> = bars.iter().map(|b| b.0).collect();
    let width = bars.len().max(1) as f64;

    let mut ctx = ChartBuilder::on(root)
        .caption(chart.title(), (FONT_FAMILY, 24))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..width, 0.0..100.0)?;
    let formatter = |x: &f64| category_label(&labels, *x);
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len() * 2 + 1)
        .x_label_formatter(&formatter)
        .y_desc("Accuracy (%)")
        .draw()?;

    ctx.draw_series(bars.iter().enumerate().map(|(i, &(_, value, color))| {
        let x = i as f64;
        Rectangle::new([(x + 0.2, 0.0), (x + 0.8, value)], color.mix(0.7).filled())
    }))?;
    ctx.draw_series(std::iter::once(PathElement::new(
        vec![(0.0, CHANCE_LEVEL), (width, CHANCE_LEVEL)],
        RED.stroke_width(2),
    )))?;
    Ok(())
}

fn draw_confusion(root: &Root<'_>, chart: Chart, report: &AnalysisReport) -> DrawResult {
    let matrix = &report.accuracy.confusion;
    let max = Origin::ALL
        .iter()
        .flat_map(|&o| Origin::ALL.iter().map(move |&l| matrix.count(o, l)))
        .max()
        .unwrap_or(0)
        .max(1) as f64;
    let labels = ["AI", "Human"];

    let mut ctx = ChartBuilder::on(root)
        .caption(chart.title(), (FONT_FAMILY, 24))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..2.0, 0.0..2.0)?;
    let formatter = |x: &f64| category_label(&labels, *x);
    // Rows read top to bottom: AI, then human.
    let row_formatter = |y: &f64| category_label(&labels, 2.0 - *y);
    ctx.configure_mesh()
        .disable_mesh()
        .x_labels(5)
        .y_labels(5)
        .x_label_formatter(&formatter)
        .y_label_formatter(&row_formatter)
        .x_desc("Classified as")
        .y_desc("Actual origin")
        .draw()?;

    for (row, &origin) in Origin::ALL.iter().enumerate() {
        let top = 2.0 - row as f64;
        for (col, &label) in Origin::ALL.iter().enumerate() {
            let count = matrix.count(origin, label);
            let left = col as f64;
            let shade = 0.1 + 0.9 * count as f64 / max;
            ctx.draw_series(std::iter::once(Rectangle::new(
                [(left, top - 1.0), (left + 1.0, top)],
                BLUE.mix(shade).filled(),
            )))?;
            ctx.draw_series(std::iter::once(Text::new(
                count.to_string(),
                (left + 0.5, top - 0.5),
                (FONT_FAMILY, 28),
            )))?;
        }
    }
    Ok(())
}

fn draw_scatter(
    root: &Root<'_>,
    chart: Chart,
    points: &[(f64, f64)],
    x_desc: &str,
    trend: bool,
) -> DrawResult {
    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let (x_lo, x_hi) = value_range(&xs);
    let x_pad = (x_hi - x_lo) * 0.05;
    let (x_lo, x_hi) = (x_lo - x_pad, x_hi + x_pad);

    let mut ctx = ChartBuilder::on(root)
        .caption(chart.title(), (FONT_FAMILY, 24))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, 0.0..105.0)?;
    ctx.configure_mesh().x_desc(x_desc).y_desc("Accuracy (%)").draw()?;

    ctx.draw_series(
        points
            .iter()
            .map(|&p| Circle::new(p, 7, BAR_COLOR.mix(0.6).filled())),
    )?;
    ctx.draw_series(std::iter::once(PathElement::new(
        vec![(x_lo, CHANCE_LEVEL), (x_hi, CHANCE_LEVEL)],
        RED.stroke_width(2),
    )))?;

    if trend {
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
        if let Some((slope, intercept)) = stats::linear_fit(&xs, &ys) {
            ctx.draw_series(LineSeries::new(
                [x_lo, x_hi].map(|x| (x, slope * x + intercept)),
                RED.mix(0.5).stroke_width(2),
            ))?;
        }
    }
    Ok(())
}

fn draw_text_bars(root: &Root<'_>, chart: Chart, report: &AnalysisReport) -> DrawResult {
    // Difficulty order is ascending accuracy; the hardest text sits at the bottom.
    let entries = &report.difficulty;
    let labels: Vec<String> = entries.iter().map(|e| format!("Text {}", e.text_id)).collect();
    let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    let height = entries.len().max(1) as f64;

    let mut ctx = ChartBuilder::on(root)
        .caption(chart.title(), (FONT_FAMILY, 24))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(90)
        .build_cartesian_2d(0.0..100.0, 0.0..height)?;
    let formatter = |y: &f64| category_label(&label_refs, *y);
    ctx.configure_mesh()
        .disable_y_mesh()
        .y_labels(entries.len() * 2 + 1)
        .y_label_formatter(&formatter)
        .x_desc("Accuracy (%)")
        .draw()?;

    ctx.draw_series(entries.iter().enumerate().map(|(i, e)| {
        let y = i as f64;
        Rectangle::new(
            [(0.0, y + 0.15), (e.accuracy, y + 0.85)],
            origin_color(e.origin).mix(0.7).filled(),
        )
    }))?;
    ctx.draw_series(std::iter::once(PathElement::new(
        vec![(CHANCE_LEVEL, 0.0), (CHANCE_LEVEL, height)],
        RED.stroke_width(2),
    )))?;
    Ok(())
}
