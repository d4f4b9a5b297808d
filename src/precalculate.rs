//! Pairwise IoU cache between ground-truth and predicted instances.

use crate::error::{CocoMatchError, Result};
use crate::metrics::iou::{instance_iou, IouMethod};
use crate::types::Instance;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// IoU for every (truth, prediction) pair that shares an image.
///
/// Pairs from different images are never stored: a missing key means the two
/// instances must not be compared, not that their IoU is zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IouTable {
    ious: HashMap<(u64, u64), f64>,
}

impl IouTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute IoU for all same-image pairs.
    ///
    /// Predictions are grouped by image so only candidate pairs are examined;
    /// the per-truth work runs on the rayon thread pool. The result does not
    /// depend on the number of threads.
    ///
    /// # Arguments
    ///
    /// * `truth` - Ground-truth instances
    /// * `predictions` - Predicted instances
    /// * `method` - Geometry used for the IoU
    /// * `show_progress` - Draw a progress bar on stderr
    ///
    /// # Errors
    ///
    /// Returns `InvalidAnnotation` if instance ids repeat within either input,
    /// and propagates the first geometry error encountered.
    pub fn build(
        truth: &[&Instance],
        predictions: &[&Instance],
        method: IouMethod,
        show_progress: bool,
    ) -> Result<Self> {
        check_unique_ids(truth, "ground truth")?;
        check_unique_ids(predictions, "predictions")?;

        let mut by_image: HashMap<u64, Vec<&Instance>> = HashMap::new();
        for &prediction in predictions {
            by_image.entry(prediction.image_id).or_default().push(prediction);
        }

        let bar = if show_progress {
            progress_bar(truth.len() as u64)
        } else {
            ProgressBar::hidden()
        };

        let rows = truth
            .par_iter()
            .map(|&t| {
                let row = match by_image.get(&t.image_id) {
                    Some(candidates) => candidates
                        .iter()
                        .map(|&p| Ok(((t.id, p.id), instance_iou(t, p, method)?)))
                        .collect::<Result<Vec<_>>>(),
                    None => Ok(Vec::new()),
                };
                bar.inc(1);
                row
            })
            .collect::<Result<Vec<Vec<_>>>>();
        bar.finish_and_clear();

        let ious: HashMap<(u64, u64), f64> = rows?.into_iter().flatten().collect();
        log::debug!(
            "cached {} {} IoU values for {} truth x {} predicted instances",
            ious.len(),
            method,
            truth.len(),
            predictions.len()
        );

        Ok(Self { ious })
    }

    /// Store an IoU value directly.
    pub fn insert(&mut self, truth_id: u64, prediction_id: u64, iou: f64) {
        self.ious.insert((truth_id, prediction_id), iou);
    }

    /// Cached IoU, or `None` when the pair was never compared.
    pub fn get(&self, truth_id: u64, prediction_id: u64) -> Option<f64> {
        self.ious.get(&(truth_id, prediction_id)).copied()
    }

    pub fn len(&self) -> usize {
        self.ious.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ious.is_empty()
    }
}

fn check_unique_ids(instances: &[&Instance], collection: &str) -> Result<()> {
    let mut seen = HashSet::with_capacity(instances.len());
    for instance in instances {
        if !seen.insert(instance.id) {
            return Err(CocoMatchError::InvalidAnnotation(format!(
                "instance id {} appears more than once in {collection}",
                instance.id
            )));
        }
    }
    Ok(())
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template(
        "[{elapsed_precise} ETA: {eta}] Computing IoU: {wide_bar:.yellow} {human_pos}/{human_len}",
    ) {
        bar.set_style(style.progress_chars("█▇▆▅▄▃▂▁  "));
    }
    bar
}
