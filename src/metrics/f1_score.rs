//! F1 Score calculation.

use crate::metrics::precision_recall::PrecisionRecall;

/// Calculate F1 score from precision and recall.
///
/// F1 score is the harmonic mean of precision and recall:
/// F1 = 2 × (Precision × Recall) / (Precision + Recall)
///
/// # Arguments
///
/// * `precision` - Precision value
/// * `recall` - Recall value
///
/// # Returns
///
/// Returns the F1 score. Returns 0.0 if both precision and recall are 0.
///
/// # Example
///
/// ```
/// use coco_match::metrics::f1_score::calculate_f1_score;
///
/// let f1 = calculate_f1_score(0.8, 0.6);
/// assert!((f1 - 0.6857).abs() < 0.001);
/// ```
pub fn calculate_f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        return 0.0;
    }

    2.0 * (precision * recall) / (precision + recall)
}

/// Calculate F1 score from a PrecisionRecall struct.
///
/// Without any true positive the score is exactly 0.0.
///
/// # Example
///
/// ```
/// use coco_match::metrics::precision_recall::calculate_precision_recall;
/// use coco_match::metrics::f1_score::calculate_f1_from_pr;
///
/// let pr = calculate_precision_recall(0, 4, 3).unwrap();
/// assert_eq!(calculate_f1_from_pr(&pr), 0.0);
/// ```
pub fn calculate_f1_from_pr(pr: &PrecisionRecall) -> f64 {
    if pr.true_positives == 0 {
        return 0.0;
    }
    calculate_f1_score(pr.precision, pr.recall)
}
