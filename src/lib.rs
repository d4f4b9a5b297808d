//! # coco-match
//!
//! A Rust library for matching predicted object instances against ground-truth
//! annotations in COCO-style datasets and scoring the result.
//!
//! The pipeline is:
//! - **Alignment**: restrict both datasets to the images they share, keyed by
//!   the last three components of each image path
//! - **IoU cache**: compute box or mask IoU once for every same-image pair
//! - **Matching**: at each IoU threshold, let every ground-truth instance claim
//!   its best-overlapping prediction
//! - **Metrics**: precision, recall and F1 per threshold, Average Precision
//!   when predictions can be ranked, and their means over thresholds
//!
//! [`collect_statistics`] describes a single dataset instead: annotation
//! coverage, per-class counts and object sizes measured on minimum-area
//! rectangles, optionally converted to physical units per file name pattern.
//!
//! ## Quick Start
//!
//! ```rust
//! use coco_match::{evaluate, load_from_string, EvalParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let truth = load_from_string(r#"{
//!     "images": [{"id": 1, "file_name": "run/val/a.png", "width": 64, "height": 64}],
//!     "annotations": [{"id": 1, "image_id": 1, "category_id": 1, "bbox": [0, 0, 20, 20]}],
//!     "categories": [{"id": 1, "name": "particle"}]
//! }"#)?;
//! let predictions = load_from_string(r#"{
//!     "images": [{"id": 9, "file_name": "D:\\out\\run\\val\\a.png", "width": 64, "height": 64}],
//!     "annotations": [{"id": 4, "image_id": 9, "category_id": 1, "bbox": [2, 0, 20, 20], "score": 0.8}],
//!     "categories": [{"id": 1, "name": "particle"}]
//! }"#)?;
//!
//! let metrics = evaluate(&predictions, &truth, &EvalParams::coco())?;
//! println!("mAP: {:.4}", metrics.get("mAP").unwrap_or_default());
//! println!("mF1: {:.4}", metrics.get("mF1").unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! ## COCO Format
//!
//! Annotations carry either polygon `segmentation` (preferred; the box is
//! derived from it and a mask is rasterised) or a `bbox` as
//! `[x, y, width, height]`. Predictions add a `score`. Unknown keys are kept
//! and written back unchanged.
//!
//! ## Features
//!
//! - `polars` (default): export per-threshold metrics as a DataFrame

pub mod config;
pub mod contour;
pub mod dataset_stats;
pub mod error;
pub mod evaluator;
pub mod intersection;
pub mod loader;
pub mod matching;
pub mod metrics;
pub mod precalculate;
pub mod raster;
pub mod report;
pub mod stats;
pub mod threshold;
pub mod types;

#[cfg(feature = "polars")]
pub mod polars_utils;

// Re-export commonly used types and functions
pub use config::EvalParams;
pub use dataset_stats::{collect_statistics, DatasetStatistics, ScaleRule};
pub use error::{CocoMatchError, Result};
pub use evaluator::{evaluate, EvaluationMetrics, ThresholdMetrics};
pub use intersection::{align, align_with_stats};
pub use loader::{
    load_from_file, load_from_file_with_options, load_from_string, load_from_string_with_options,
    save_to_file, to_json_string, LoadOptions,
};
pub use matching::{match_predictions, MatchOutcome, MatchPolicy, PredictionMatch};
pub use metrics::iou::{box_iou, instance_iou, mask_iou, IouMethod};
pub use precalculate::IouTable;
pub use stats::AlignmentStats;
pub use types::{BoundingBox, Category, Dataset, Image, ImageKey, Instance, Mask};
