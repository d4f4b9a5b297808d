//! Error types for the coco-match library.

use thiserror::Error;

/// Result type for coco-match operations.
pub type Result<T> = std::result::Result<T, CocoMatchError>;

/// Error types that can occur while loading, aligning or evaluating datasets.
#[derive(Error, Debug)]
pub enum CocoMatchError {
    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error raised by Polars while building a DataFrame.
    #[cfg(feature = "polars")]
    #[error("Polars error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),

    /// Invalid annotation data.
    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    /// Box coordinates out of order, or masks of different shapes.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Data required by the requested computation is not present.
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Mismatched categories between ground truth and predictions.
    #[error("Category mismatch: {0}")]
    CategoryMismatch(String),

    /// Two images of one collection map to the same alignment key.
    #[error("Image collision in {collection}: more than one image maps to \"{key}\"")]
    ImageCollision { collection: String, key: String },

    /// Ground truth has no instances, so recall and AP are undefined.
    #[error("Empty ground truth: {0}")]
    EmptyGroundTruth(String),

    /// Empty dataset provided.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Invalid IoU threshold.
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Unrecognised IoU method name.
    #[error("Unknown IoU method \"{0}\", expected one of: box, mask")]
    UnknownIouMethod(String),

    /// Unrecognised matching policy name.
    #[error("Unknown match policy \"{0}\", expected one of: greedy, exclusive")]
    UnknownMatchPolicy(String),

    /// Malformed pixel-size rule.
    #[error("Invalid scale: {0}")]
    InvalidScale(String),

    /// Requested metric is not part of the evaluation output.
    #[error("Unknown metric \"{name}\", available: {available}")]
    UnknownMetric { name: String, available: String },
}
