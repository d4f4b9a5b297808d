//! Statistics collected while aligning two datasets
//!
//! Alignment silently drops images that only one side contains; these counters
//! make that visible to callers and to the log.

use serde::{Deserialize, Serialize};

/// Image and instance counts before and after alignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentStats {
    /// Images in the first collection before alignment
    pub images_a: usize,

    /// Images in the second collection before alignment
    pub images_b: usize,

    /// Images present in both collections
    pub common_images: usize,

    /// Instances of the first collection kept after alignment
    pub instances_a: usize,

    /// Instances of the second collection kept after alignment
    pub instances_b: usize,
}

impl AlignmentStats {
    /// Number of images dropped from the first collection
    pub fn dropped_a(&self) -> usize {
        self.images_a.saturating_sub(self.common_images)
    }

    /// Number of images dropped from the second collection
    pub fn dropped_b(&self) -> usize {
        self.images_b.saturating_sub(self.common_images)
    }

    /// Whether either side lost more than half of its images
    pub fn is_lossy(&self) -> bool {
        self.dropped_a() * 2 > self.images_a || self.dropped_b() * 2 > self.images_b
    }

    /// Get a formatted string summary of the statistics
    pub fn summary_string(&self) -> String {
        format!(
            "AlignmentStats {{ common: {}, dropped_a: {}/{}, dropped_b: {}/{}, instances: {}/{} }}",
            self.common_images,
            self.dropped_a(),
            self.images_a,
            self.dropped_b(),
            self.images_b,
            self.instances_a,
            self.instances_b
        )
    }
}
