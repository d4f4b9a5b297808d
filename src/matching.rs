//! Greedy matching of predictions to ground truth.

use crate::error::{CocoMatchError, Result};
use crate::precalculate::IouTable;
use crate::types::Instance;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// How predictions that were already claimed by a ground truth are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// A prediction stays eligible after being claimed. Later claims overwrite
    /// its recorded IoU and truth, and every claim counts as a true positive.
    #[default]
    Greedy,
    /// A claimed prediction is removed from the pool (one-to-one assignment).
    Exclusive,
}

impl FromStr for MatchPolicy {
    type Err = CocoMatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(MatchPolicy::Greedy),
            "exclusive" => Ok(MatchPolicy::Exclusive),
            _ => Err(CocoMatchError::UnknownMatchPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::Greedy => f.write_str("greedy"),
            MatchPolicy::Exclusive => f.write_str("exclusive"),
        }
    }
}

/// Matching result for one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionMatch {
    pub prediction_id: u64,
    pub score: Option<f64>,
    pub is_true_positive: bool,
    /// IoU with the ground truth that (last) claimed this prediction
    pub relevant_iou: f64,
    pub matched_truth_id: Option<u64>,
}

impl PredictionMatch {
    fn unmatched(prediction: &Instance) -> Self {
        Self {
            prediction_id: prediction.id,
            score: prediction.score,
            is_true_positive: false,
            relevant_iou: 0.0,
            matched_truth_id: None,
        }
    }
}

/// Outcome of matching at one IoU threshold.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// Number of successful matching events, one per matched ground truth
    pub true_positives: usize,
    /// One entry per prediction, in input order
    pub matches: Vec<PredictionMatch>,
    index: HashMap<u64, usize>,
}

impl MatchOutcome {
    /// Look up the result for a prediction id.
    pub fn get(&self, prediction_id: u64) -> Option<&PredictionMatch> {
        self.index.get(&prediction_id).map(|&i| &self.matches[i])
    }

    /// Number of distinct predictions flagged as true positives.
    ///
    /// Under `MatchPolicy::Greedy` this can be lower than `true_positives`.
    pub fn flagged_predictions(&self) -> usize {
        self.matches.iter().filter(|m| m.is_true_positive).count()
    }
}

/// Match every ground truth to its best prediction.
///
/// For each truth, in order, the eligible predictions are those on the same
/// image whose cached IoU is strictly greater than `iou_threshold` and whose
/// category equals the truth's (unless `class_agnostic`). The one with the
/// highest IoU is flagged as a true positive; among equal IoUs the first
/// prediction wins.
///
/// # Arguments
///
/// * `truth` - Ground-truth instances
/// * `predictions` - Predicted instances
/// * `ious` - Pairwise IoU cache built over the same instances
/// * `iou_threshold` - Exclusive lower bound on IoU for a match
/// * `class_agnostic` - Ignore categories when matching
/// * `policy` - Whether a prediction can be claimed more than once
///
/// # Returns
///
/// Returns a fresh `MatchOutcome`; nothing from previous calls is reused.
pub fn match_predictions(
    truth: &[&Instance],
    predictions: &[&Instance],
    ious: &IouTable,
    iou_threshold: f64,
    class_agnostic: bool,
    policy: MatchPolicy,
) -> MatchOutcome {
    let mut matches: Vec<PredictionMatch> = predictions
        .iter()
        .map(|p| PredictionMatch::unmatched(p))
        .collect();
    let index: HashMap<u64, usize> = predictions
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id, i))
        .collect();

    let mut by_image: HashMap<u64, Vec<usize>> = HashMap::new();
    for (i, prediction) in predictions.iter().enumerate() {
        by_image.entry(prediction.image_id).or_default().push(i);
    }

    let mut claimed = vec![false; predictions.len()];
    let mut true_positives = 0;

    for t in truth {
        let Some(candidates) = by_image.get(&t.image_id) else {
            continue;
        };

        let mut best: Option<(usize, f64)> = None;
        for &i in candidates {
            let p = predictions[i];
            if policy == MatchPolicy::Exclusive && claimed[i] {
                continue;
            }
            if !class_agnostic && p.category_id != t.category_id {
                continue;
            }
            let Some(iou) = ious.get(t.id, p.id) else {
                continue;
            };
            if !(iou > iou_threshold) {
                continue;
            }
            if best.map_or(true, |(_, best_iou)| iou > best_iou) {
                best = Some((i, iou));
            }
        }

        if let Some((i, iou)) = best {
            if claimed[i] {
                log::debug!(
                    "prediction {} claimed again by truth {} (previously truth {:?})",
                    matches[i].prediction_id,
                    t.id,
                    matches[i].matched_truth_id
                );
            }
            let m = &mut matches[i];
            m.is_true_positive = true;
            m.relevant_iou = iou;
            m.matched_truth_id = Some(t.id);
            claimed[i] = true;
            true_positives += 1;
        }
    }

    MatchOutcome {
        true_positives,
        matches,
        index,
    }
}
