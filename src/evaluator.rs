//! Main evaluation orchestrator.

use crate::config::EvalParams;
use crate::error::{CocoMatchError, Result};
use crate::intersection::align_with_stats;
use crate::matching::match_predictions;
use crate::metrics::ap::{average_precision, calculate_map};
use crate::metrics::f1_score::calculate_f1_from_pr;
use crate::metrics::precision_recall::calculate_precision_recall;
use crate::precalculate::IouTable;
use crate::stats::AlignmentStats;
use crate::threshold::threshold_label;
use crate::types::{Dataset, Instance};
use serde::Serialize;

/// Metrics at a single IoU threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdMetrics {
    pub threshold: f64,
    /// Percent label used in metric names, e.g. `"50"`
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Present only when predictions could be ranked
    pub ap: Option<f64>,
    pub true_positives: usize,
}

/// Complete result of one evaluation.
///
/// Values are addressable by name (`P_50`, `R_50`, `F1_50`, `AP_50`, ...,
/// `mAP`, `mF1`) in the order they were computed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    values: Vec<(String, f64)>,

    /// Per-threshold rows, in threshold order
    pub thresholds: Vec<ThresholdMetrics>,

    /// Mean AP over thresholds (multi-threshold runs with AP only)
    pub mean_ap: Option<f64>,

    /// Mean F1 over thresholds (multi-threshold runs only)
    pub mean_f1: Option<f64>,

    /// What alignment kept and dropped
    pub alignment: AlignmentStats,
}

impl EvaluationMetrics {
    fn push(&mut self, name: String, value: f64) {
        self.values.push((name, value));
    }

    /// Look up a metric by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, value)| value)
    }

    /// Iterate over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn names(&self) -> Vec<&str> {
        self.values.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Evaluate predictions against ground truth.
///
/// Both datasets are first aligned to their common images. The pairwise IoU
/// table is built once and reused for every threshold; matching starts fresh
/// at each threshold.
///
/// # Arguments
///
/// * `predictions` - Predicted instances (with scores when AP is wanted)
/// * `truth` - Ground-truth instances
/// * `params` - IoU method, thresholds and matching options
///
/// # Returns
///
/// Returns `EvaluationMetrics` with P/R/F1 (and AP where defined) for every
/// threshold, plus `mAP`/`mF1` when more than one threshold was requested.
///
/// # Errors
///
/// * `InvalidThreshold` - empty or out-of-range thresholds
/// * `CategoryMismatch` / `ImageCollision` - alignment failed
/// * `EmptyGroundTruth` - no truth instances on the common images
/// * `MissingData` - some but not all predictions carry a score, or a mask
///   is needed but absent
pub fn evaluate(
    predictions: &Dataset,
    truth: &Dataset,
    params: &EvalParams,
) -> Result<EvaluationMetrics> {
    params.validate()?;

    let (predictions, truth, alignment) = align_with_stats(predictions, truth)?;
    let truth_instances: Vec<&Instance> = truth.instances().collect();
    let prediction_instances: Vec<&Instance> = predictions.instances().collect();

    if truth_instances.is_empty() {
        return Err(CocoMatchError::EmptyGroundTruth(format!(
            "no ground-truth instances on the {} common images",
            alignment.common_images
        )));
    }

    let with_ap = ap_applicable(&prediction_instances, params.sort_by_iou)?;
    if !with_ap {
        log::info!("predictions carry no scores; AP is not computed");
    }

    let ious = IouTable::build(
        &truth_instances,
        &prediction_instances,
        params.iou_method,
        params.show_progress,
    )?;

    let num_truth = truth_instances.len();
    let num_predictions = prediction_instances.len();
    let mut metrics = EvaluationMetrics {
        alignment,
        ..Default::default()
    };

    for &threshold in &params.iou_thresholds {
        let outcome = match_predictions(
            &truth_instances,
            &prediction_instances,
            &ious,
            threshold,
            params.class_agnostic,
            params.match_policy,
        );

        let pr = calculate_precision_recall(outcome.true_positives, num_predictions, num_truth)?;
        let f1 = calculate_f1_from_pr(&pr);
        let ap = if with_ap {
            Some(average_precision(&outcome.matches, params.sort_by_iou, num_truth)?)
        } else {
            None
        };

        let label = threshold_label(threshold);
        log::debug!(
            "IoU > {}: tp={} P={:.4} R={:.4} F1={:.4}",
            threshold,
            pr.true_positives,
            pr.precision,
            pr.recall,
            f1
        );

        metrics.push(format!("P_{label}"), pr.precision);
        metrics.push(format!("R_{label}"), pr.recall);
        metrics.push(format!("F1_{label}"), f1);
        if let Some(ap) = ap {
            metrics.push(format!("AP_{label}"), ap);
        }

        metrics.thresholds.push(ThresholdMetrics {
            threshold,
            label,
            precision: pr.precision,
            recall: pr.recall,
            f1,
            ap,
            true_positives: pr.true_positives,
        });
    }

    if metrics.thresholds.len() > 1 {
        if with_ap {
            let aps: Vec<f64> = metrics.thresholds.iter().filter_map(|t| t.ap).collect();
            let mean_ap = calculate_map(&aps);
            metrics.mean_ap = Some(mean_ap);
            metrics.push("mAP".to_string(), mean_ap);
        }

        let f1s: Vec<f64> = metrics.thresholds.iter().map(|t| t.f1).collect();
        let mean_f1 = calculate_map(&f1s);
        metrics.mean_f1 = Some(mean_f1);
        metrics.push("mF1".to_string(), mean_f1);
    }

    Ok(metrics)
}

/// Whether AP can be computed for these predictions.
///
/// Ranking by IoU always works. Ranking by score needs every prediction to
/// carry one; none at all means AP is skipped, a mix is an error.
fn ap_applicable(predictions: &[&Instance], sort_by_iou: bool) -> Result<bool> {
    if sort_by_iou {
        return Ok(true);
    }

    let scored = predictions.iter().filter(|p| p.score.is_some()).count();
    if scored == predictions.len() {
        Ok(true)
    } else if scored == 0 {
        Ok(false)
    } else {
        Err(CocoMatchError::MissingData(format!(
            "{} of {} predictions have no score",
            predictions.len() - scored,
            predictions.len()
        )))
    }
}
