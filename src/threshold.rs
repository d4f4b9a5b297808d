//! IoU threshold utilities.

use crate::error::{CocoMatchError, Result};
use std::collections::HashMap;

/// The COCO threshold sweep 0.50, 0.55, ..., 0.95.
///
/// # Example
///
/// ```
/// use coco_match::threshold::coco_thresholds;
///
/// let thresholds = coco_thresholds();
/// assert_eq!(thresholds.len(), 10);
/// assert_eq!(thresholds[0], 0.5);
/// assert_eq!(thresholds[9], 0.95);
/// ```
pub fn coco_thresholds() -> Vec<f64> {
    (50..100).step_by(5).map(|p| p as f64 / 100.0).collect()
}

/// Generate a range of threshold values for evaluation.
///
/// # Arguments
///
/// * `start` - Starting threshold value (inclusive)
/// * `end` - Ending threshold value (inclusive)
/// * `steps` - Number of threshold values to generate
///
/// # Returns
///
/// Returns a vector of evenly-spaced threshold values.
///
/// # Example
///
/// ```
/// use coco_match::threshold::generate_threshold_range;
///
/// let thresholds = generate_threshold_range(0.1, 1.0, 10).unwrap();
/// assert_eq!(thresholds.len(), 10);
/// assert!((thresholds[0] - 0.1).abs() < 1e-10);
/// assert!((thresholds[9] - 1.0).abs() < 1e-10);
/// ```
pub fn generate_threshold_range(start: f64, end: f64, steps: usize) -> Result<Vec<f64>> {
    if steps == 0 {
        return Err(CocoMatchError::InvalidThreshold(
            "Number of steps must be greater than 0".to_string(),
        ));
    }

    validate_threshold(start)?;
    validate_threshold(end)?;

    if start > end {
        return Err(CocoMatchError::InvalidThreshold(format!(
            "Start threshold ({}) must be <= end threshold ({})",
            start, end
        )));
    }

    if steps == 1 {
        return Ok(vec![start]);
    }

    let step_size = (end - start) / (steps - 1) as f64;
    Ok((0..steps).map(|i| start + step_size * i as f64).collect())
}

/// Parse a threshold list as given on the command line.
///
/// Accepts `"coco"` for [`coco_thresholds`] or a comma-separated list of
/// integer percents such as `"50,75"`.
///
/// # Errors
///
/// Returns `InvalidThreshold` for empty lists, unparseable items and values
/// outside (0, 100].
pub fn parse_thresholds(text: &str) -> Result<Vec<f64>> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("coco") {
        return Ok(coco_thresholds());
    }

    let thresholds = text
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let percent: u32 = item.parse().map_err(|_| {
                CocoMatchError::InvalidThreshold(format!(
                    "expected an integer percent, got '{}'",
                    item
                ))
            })?;
            let threshold = percent as f64 / 100.0;
            validate_threshold(threshold)?;
            Ok(threshold)
        })
        .collect::<Result<Vec<_>>>()?;

    validate_thresholds(&thresholds)?;
    Ok(thresholds)
}

/// Percent label used in metric names (`0.58` gives `"58"`).
///
/// A small guard absorbs binary representation error before truncation.
pub fn threshold_label(threshold: f64) -> String {
    format!("{}", (threshold * 100.0 + 1e-6).floor() as i64)
}

/// Validate that a threshold is in the valid range (0.0, 1.0].
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(CocoMatchError::InvalidThreshold(format!(
            "Threshold must be in (0.0, 1.0], got {}",
            threshold
        )));
    }
    Ok(())
}

/// Validate a non-empty list of thresholds.
///
/// Each threshold must be in range and map to its own label, since labels
/// name the per-threshold metrics.
pub fn validate_thresholds(thresholds: &[f64]) -> Result<()> {
    if thresholds.is_empty() {
        return Err(CocoMatchError::InvalidThreshold(
            "at least one IoU threshold is required".to_string(),
        ));
    }
    thresholds.iter().try_for_each(|&t| validate_threshold(t))?;

    let mut seen = HashMap::with_capacity(thresholds.len());
    for &threshold in thresholds {
        if let Some(previous) = seen.insert(threshold_label(threshold), threshold) {
            return Err(CocoMatchError::InvalidThreshold(format!(
                "thresholds {} and {} share the label \"{}\"",
                previous,
                threshold,
                threshold_label(threshold)
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coco_labels() {
        let labels: Vec<String> = coco_thresholds().into_iter().map(threshold_label).collect();
        assert_eq!(
            labels,
            vec!["50", "55", "60", "65", "70", "75", "80", "85", "90", "95"]
        );
    }

    #[test]
    fn test_label_guard() {
        assert_eq!(threshold_label(0.58), "58");
        assert_eq!(threshold_label(0.29), "29");
        assert_eq!(threshold_label(1.0), "100");
        assert_eq!(threshold_label(0.505), "50");
    }

    #[test]
    fn test_parse_thresholds() {
        assert_eq!(parse_thresholds("coco").unwrap(), coco_thresholds());
        assert_eq!(parse_thresholds("50, 75").unwrap(), vec![0.5, 0.75]);
        assert_eq!(parse_thresholds("100").unwrap(), vec![1.0]);
    }

    #[test]
    fn test_parse_thresholds_rejects() {
        assert!(parse_thresholds("").is_err());
        assert!(parse_thresholds("0").is_err());
        assert!(parse_thresholds("150").is_err());
        assert!(parse_thresholds("0.5").is_err());
        assert!(parse_thresholds("fifty").is_err());
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(validate_threshold(0.0).is_err());
        assert!(validate_threshold(1.5).is_err());
        assert!(validate_threshold(f64::NAN).is_err());
        assert!(validate_threshold(1.0).is_ok());
    }

    #[test]
    fn test_thresholds_with_shared_label_rejected() {
        let result = validate_thresholds(&[0.5, 0.505]);
        assert!(matches!(result, Err(CocoMatchError::InvalidThreshold(_))));
        assert!(validate_thresholds(&[0.75, 0.75]).is_err());
        assert!(parse_thresholds("50,75,50").is_err());
        assert!(validate_thresholds(&[0.5, 0.51]).is_ok());
    }

    #[test]
    fn test_generate_threshold_range() {
        let thresholds = generate_threshold_range(0.5, 0.95, 10).unwrap();
        assert_eq!(thresholds.len(), 10);
        assert!((thresholds[0] - 0.5).abs() < 1e-10);
        assert!((thresholds[9] - 0.95).abs() < 1e-10);
        assert!(generate_threshold_range(0.9, 0.5, 3).is_err());
        assert!(generate_threshold_range(0.5, 0.9, 0).is_err());
    }
}
