//! Utilities for exporting evaluation results as Polars DataFrames
//!
//! Available with the `polars` feature (enabled by default).

use crate::error::CocoMatchError;
use crate::evaluator::EvaluationMetrics;
use polars::prelude::*;

/// Convert per-threshold metrics into a DataFrame
///
/// One row per IoU threshold with columns `threshold` (the percent label),
/// `precision`, `recall`, `f1`, `ap` (null where AP was not computed) and
/// `true_positives`.
///
/// # Arguments
///
/// * `metrics` - Result of an evaluation
///
/// # Returns
///
/// A DataFrame with one row per threshold, in threshold order
pub fn metrics_to_dataframe(metrics: &EvaluationMetrics) -> Result<DataFrame, CocoMatchError> {
    let rows = &metrics.thresholds;

    let labels: Vec<&str> = rows.iter().map(|t| t.label.as_str()).collect();
    let precision: Vec<f64> = rows.iter().map(|t| t.precision).collect();
    let recall: Vec<f64> = rows.iter().map(|t| t.recall).collect();
    let f1: Vec<f64> = rows.iter().map(|t| t.f1).collect();
    let ap: Vec<Option<f64>> = rows.iter().map(|t| t.ap).collect();
    let true_positives: Vec<u64> = rows.iter().map(|t| t.true_positives as u64).collect();

    let df = df! {
        "threshold" => labels,
        "precision" => precision,
        "recall" => recall,
        "f1" => f1,
        "ap" => ap,
        "true_positives" => true_positives,
    }?;

    Ok(df)
}

/// Convert the named metric values (`P_50`, ..., `mAP`, `mF1`) into a
/// two-column `metric`/`value` DataFrame
pub fn named_metrics_to_dataframe(metrics: &EvaluationMetrics) -> Result<DataFrame, CocoMatchError> {
    let (names, values): (Vec<&str>, Vec<f64>) = metrics.iter().unzip();

    let df = df! {
        "metric" => names,
        "value" => values,
    }?;

    Ok(df)
}
