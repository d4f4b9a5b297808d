//! Text output of evaluation results.

use crate::dataset_stats::DatasetStatistics;
use crate::error::{CocoMatchError, Result};
use crate::evaluator::EvaluationMetrics;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const COLUMN_WIDTH: usize = 20;

/// Resolve the metric names to display.
///
/// `"all"` selects every metric in evaluation order; otherwise `values` is a
/// comma-separated list of names such as `"AP_50,mAP,mF1"`.
///
/// # Errors
///
/// Returns `UnknownMetric` for the first name `metrics` does not contain.
pub fn select_metrics(metrics: &EvaluationMetrics, values: &str) -> Result<Vec<String>> {
    if values.trim() == "all" {
        return Ok(metrics.names().into_iter().map(String::from).collect());
    }

    values
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            if metrics.get(name).is_some() {
                Ok(name.to_string())
            } else {
                Err(CocoMatchError::UnknownMetric {
                    name: name.to_string(),
                    available: metrics.names().join(", "),
                })
            }
        })
        .collect()
}

fn tail(text: &str, n: usize) -> &str {
    let count = text.chars().count();
    match text.char_indices().nth(count.saturating_sub(n)) {
        Some((i, _)) if count > n => &text[i..],
        _ => text,
    }
}

/// Render the "Metrics \ Preds" comparison table.
///
/// One column per prediction file (names shortened to their last 20
/// characters), one row per metric. Metrics missing from a result are shown
/// as `-`.
pub fn format_table(truth_name: &str, results: &[(String, EvaluationMetrics)], keys: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Evaluation results");
    let _ = writeln!(out, "\nTruth: {}\n", truth_name);

    let header: Vec<String> = results
        .iter()
        .map(|(name, _)| format!("{:width$}", tail(name, COLUMN_WIDTH), width = COLUMN_WIDTH))
        .collect();
    let _ = writeln!(out, " {:20} | {}", "Metrics \\ Preds", header.join(" | "));

    for key in keys {
        let cells: Vec<String> = results
            .iter()
            .map(|(_, metrics)| {
                let value = metrics
                    .get(key)
                    .map_or_else(|| "-".to_string(), |v| format!("{:.4}", v));
                format!("{:width$}", value, width = COLUMN_WIDTH)
            })
            .collect();
        let _ = writeln!(out, " {:20} | {}", key, cells.join(" | "));
    }

    out
}

/// Path the report is written to: `.txt` is appended when missing.
pub fn report_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    if path.extension().is_some_and(|ext| ext == "txt") {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".txt");
        PathBuf::from(name)
    }
}

/// Write a plain-text report listing every metric of every result.
///
/// # Returns
///
/// Returns the path actually written (see [`report_path`]).
pub fn write_report<P: AsRef<Path>>(
    path: P,
    truth_name: &str,
    results: &[(String, EvaluationMetrics)],
) -> Result<PathBuf> {
    let path = report_path(path);
    let mut writer = BufWriter::new(File::create(&path)?);

    writeln!(writer, "Truth: {}", truth_name)?;
    for (name, metrics) in results {
        writeln!(writer, "vs preds: {}", name)?;
        for (metric, value) in metrics.iter() {
            writeln!(writer, "  * {} = {}", metric, value)?;
        }
    }
    writer.flush()?;

    log::info!("wrote report to {}", path.display());
    Ok(path)
}

/// Render dataset statistics. Sizes are labelled `px` unless a scale rule was
/// applied, in which case `unit` is used.
pub fn format_statistics(name: &str, stats: &DatasetStatistics, unit: &str) -> String {
    let unit = if stats.scaled { unit } else { "px" };
    let mut out = String::new();
    let _ = writeln!(out, "Dataset: {}", name);
    let _ = writeln!(
        out,
        "Annotated images: {}/{} ({:.1}%)",
        stats.num_annotated_images,
        stats.num_images,
        stats.annotated_percent()
    );
    let _ = writeln!(out, "Annotations by class:");
    for (class, count) in &stats.annotations_by_class {
        let _ = writeln!(out, " - {}: {}", class, count);
    }
    let _ = writeln!(
        out,
        "Mean length {:.1} {unit} (\u{3c3}={:.2} {unit})",
        stats.length.mean, stats.length.stddev
    );
    let _ = writeln!(
        out,
        "Mean width {:.1} {unit} (\u{3c3}={:.2} {unit})",
        stats.width.mean, stats.width.stddev
    );
    let _ = writeln!(
        out,
        "Mean aspect_ratio {:.3} (\u{3c3}={:.4})",
        stats.aspect_ratio.mean, stats.aspect_ratio.stddev
    );
    out
}
