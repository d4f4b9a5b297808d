//! Average Precision (AP) and mean Average Precision (mAP) calculation.

use crate::error::{CocoMatchError, Result};
use crate::matching::PredictionMatch;
use crate::metrics::precision_recall::{calculate_precision_recall_curve, interpolate_precision};

/// Calculate Average Precision (AP) from a precision-recall curve.
///
/// Precision is first replaced by its non-increasing envelope, then the area
/// under the (recall, precision) polyline is integrated with the trapezoidal
/// rule, starting at the first point of the curve.
///
/// # Arguments
///
/// * `precisions` - Precision at each rank
/// * `recalls` - Recall at each rank (non-decreasing)
///
/// # Returns
///
/// Returns the Average Precision value. Curves with fewer than two points
/// have no area and give 0.0.
///
/// # Example
///
/// ```
/// use coco_match::metrics::ap::calculate_ap;
///
/// let precisions = vec![1.0, 1.0, 0.667, 0.75];
/// let recalls = vec![0.25, 0.5, 0.5, 0.75];
/// let ap = calculate_ap(&precisions, &recalls);
/// assert!((ap - 0.4375).abs() < 1e-12);
/// ```
pub fn calculate_ap(precisions: &[f64], recalls: &[f64]) -> f64 {
    let interpolated = interpolate_precision(precisions);

    recalls
        .windows(2)
        .zip(interpolated.windows(2))
        .map(|(r, p)| (r[1] - r[0]) * (p[1] + p[0]) / 2.0)
        .sum()
}

/// Calculate AP for one IoU threshold from a matching result.
///
/// Predictions are ranked by descending confidence score, or by descending
/// relevant IoU when `sort_by_iou` is set. The sort is stable, so ties keep
/// their input order.
///
/// # Arguments
///
/// * `matches` - Per-prediction matching results
/// * `sort_by_iou` - Rank by matched IoU instead of score
/// * `num_ground_truth` - Number of ground-truth instances
///
/// # Errors
///
/// Returns `EmptyGroundTruth` when `num_ground_truth` is zero and
/// `MissingData` when ranking by score and a prediction has no score.
pub fn average_precision(
    matches: &[PredictionMatch],
    sort_by_iou: bool,
    num_ground_truth: usize,
) -> Result<f64> {
    if num_ground_truth == 0 {
        return Err(CocoMatchError::EmptyGroundTruth(
            "average precision is undefined without ground-truth instances".to_string(),
        ));
    }

    let keys: Vec<f64> = if sort_by_iou {
        matches.iter().map(|m| m.relevant_iou).collect()
    } else {
        matches
            .iter()
            .map(|m| {
                m.score.ok_or_else(|| {
                    CocoMatchError::MissingData(format!(
                        "prediction {} has no score, required to rank for AP",
                        m.prediction_id
                    ))
                })
            })
            .collect::<Result<_>>()?
    };

    let mut order: Vec<usize> = (0..matches.len()).collect();
    order.sort_by(|&a, &b| keys[b].total_cmp(&keys[a]));

    let flags: Vec<bool> = order.iter().map(|&i| matches[i].is_true_positive).collect();
    let curve = calculate_precision_recall_curve(&flags, num_ground_truth);
    let (precisions, recalls): (Vec<f64>, Vec<f64>) =
        curve.iter().map(|point| (point.precision, point.recall)).unzip();

    Ok(calculate_ap(&precisions, &recalls))
}

/// Calculate the mean of a set of AP (or other per-threshold) values.
///
/// # Example
///
/// ```
/// use coco_match::metrics::ap::calculate_map;
///
/// let aps = vec![0.8, 0.9, 0.75, 0.85];
/// assert!((calculate_map(&aps) - 0.825).abs() < 1e-10);
/// ```
pub fn calculate_map(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.iter().sum::<f64>() / values.len() as f64
}
