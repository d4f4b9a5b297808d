//! Precision and Recall calculation.

use crate::error::{CocoMatchError, Result};

/// Container for precision and recall values at one IoU threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecisionRecall {
    pub precision: f64,
    pub recall: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

/// Calculate precision and recall from a matching result.
///
/// Every prediction that is not a true positive is a false positive, so
/// precision is `tp / num_predictions`; recall is `tp / num_ground_truth`.
/// Precision is 0.0 when there are no predictions.
///
/// # Arguments
///
/// * `true_positives` - Number of true positive matching events
/// * `num_predictions` - Total number of predictions evaluated
/// * `num_ground_truth` - Total number of ground-truth instances
///
/// # Errors
///
/// Returns `EmptyGroundTruth` when `num_ground_truth` is zero, since recall
/// is undefined.
///
/// # Example
///
/// ```
/// use coco_match::metrics::precision_recall::calculate_precision_recall;
///
/// let pr = calculate_precision_recall(6, 8, 8).unwrap();
/// assert_eq!(pr.precision, 0.75);
/// assert_eq!(pr.recall, 0.75);
/// assert_eq!(pr.false_positives, 2);
/// ```
pub fn calculate_precision_recall(
    true_positives: usize,
    num_predictions: usize,
    num_ground_truth: usize,
) -> Result<PrecisionRecall> {
    if num_ground_truth == 0 {
        return Err(CocoMatchError::EmptyGroundTruth(
            "recall is undefined without ground-truth instances".to_string(),
        ));
    }

    let precision = if num_predictions > 0 {
        true_positives as f64 / num_predictions as f64
    } else {
        0.0
    };
    let recall = true_positives as f64 / num_ground_truth as f64;

    Ok(PrecisionRecall {
        precision,
        recall,
        true_positives,
        false_positives: num_predictions.saturating_sub(true_positives),
        false_negatives: num_ground_truth.saturating_sub(true_positives),
    })
}

/// Precision-Recall curve point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionRecallPoint {
    pub precision: f64,
    pub recall: f64,
}

/// Calculate the precision-recall curve over ranked detections.
///
/// # Arguments
///
/// * `is_true_positive` - Whether each detection is a true positive, in rank order
/// * `num_ground_truth` - Total number of ground truth annotations
///
/// # Returns
///
/// Returns one point per prefix of the ranking.
pub fn calculate_precision_recall_curve(
    is_true_positive: &[bool],
    num_ground_truth: usize,
) -> Vec<PrecisionRecallPoint> {
    let mut curve = Vec::with_capacity(is_true_positive.len());
    let mut tp = 0;
    let mut fp = 0;

    for &is_tp in is_true_positive {
        if is_tp {
            tp += 1;
        } else {
            fp += 1;
        }

        let recall = if num_ground_truth > 0 {
            tp as f64 / num_ground_truth as f64
        } else {
            0.0
        };

        curve.push(PrecisionRecallPoint {
            precision: tp as f64 / (tp + fp) as f64,
            recall,
        });
    }

    curve
}

/// Interpolate precision so it never increases with rank.
///
/// `interpolated[i] = max(precision[i..])`, the upper envelope of the curve.
///
/// # Example
///
/// ```
/// use coco_match::metrics::precision_recall::interpolate_precision;
///
/// let interpolated = interpolate_precision(&[1.0, 0.5, 0.667, 0.5]);
/// assert_eq!(interpolated, vec![1.0, 0.667, 0.667, 0.5]);
/// ```
pub fn interpolate_precision(precision: &[f64]) -> Vec<f64> {
    let mut interpolated = precision.to_vec();
    for i in (0..interpolated.len().saturating_sub(1)).rev() {
        interpolated[i] = interpolated[i].max(interpolated[i + 1]);
    }
    interpolated
}
