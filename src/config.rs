//! Evaluation parameters.

use crate::error::Result;
use crate::matching::MatchPolicy;
use crate::metrics::iou::IouMethod;
use crate::threshold::{coco_thresholds, validate_thresholds};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Parameters of one evaluation run.
///
/// Every field has a default, so a JSON config file only needs the keys it
/// changes:
///
/// ```json
/// { "iou_method": "mask", "iou_thresholds": [0.5, 0.75], "sort_by_iou": true }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalParams {
    /// How the overlap of two instances is measured
    pub iou_method: IouMethod,

    /// IoU thresholds, each in (0, 1]
    pub iou_thresholds: Vec<f64>,

    /// Ignore categories when matching
    pub class_agnostic: bool,

    /// Rank predictions by matched IoU instead of score for AP
    pub sort_by_iou: bool,

    /// Whether a prediction may be claimed by more than one truth
    pub match_policy: MatchPolicy,

    /// Show a progress bar while building the IoU table
    pub show_progress: bool,
}

impl Default for EvalParams {
    fn default() -> Self {
        Self {
            iou_method: IouMethod::default(),
            iou_thresholds: vec![0.5],
            class_agnostic: false,
            sort_by_iou: false,
            match_policy: MatchPolicy::default(),
            show_progress: false,
        }
    }
}

impl EvalParams {
    /// Defaults with the COCO threshold sweep 0.50:0.05:0.95.
    pub fn coco() -> Self {
        Self {
            iou_thresholds: coco_thresholds(),
            ..Self::default()
        }
    }

    pub fn with_iou_method(mut self, iou_method: IouMethod) -> Self {
        self.iou_method = iou_method;
        self
    }

    pub fn with_thresholds(mut self, iou_thresholds: Vec<f64>) -> Self {
        self.iou_thresholds = iou_thresholds;
        self
    }

    pub fn with_class_agnostic(mut self, class_agnostic: bool) -> Self {
        self.class_agnostic = class_agnostic;
        self
    }

    pub fn with_sort_by_iou(mut self, sort_by_iou: bool) -> Self {
        self.sort_by_iou = sort_by_iou;
        self
    }

    pub fn with_match_policy(mut self, match_policy: MatchPolicy) -> Self {
        self.match_policy = match_policy;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Load parameters from a JSON file and validate them.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, names
    /// an unknown IoU method or match policy, or has invalid thresholds.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let params: EvalParams = serde_json::from_str(&contents)?;
        params.validate()?;
        Ok(params)
    }

    /// Check that at least one threshold is given and all lie in (0, 1].
    pub fn validate(&self) -> Result<()> {
        validate_thresholds(&self.iou_thresholds)
    }
}
