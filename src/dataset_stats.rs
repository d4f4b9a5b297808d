//! Descriptive statistics over one dataset: annotation coverage, per-class
//! counts and object size distribution.

use crate::contour::{flat_points, min_area_rect_size, ContourSize};
use crate::error::{CocoMatchError, Result};
use crate::types::{Dataset, Image, Instance};
use regex::Regex;
use serde::Serialize;
use std::str::FromStr;

/// Pixel size for images whose file name matches a pattern.
///
/// Parsed from `"<file name regex>:<pixel size>"`, where the pixel size is a
/// number (`0.65`) or a ratio (`1/3`).
#[derive(Debug, Clone)]
pub struct ScaleRule {
    pub pattern: Regex,
    pub pixel_size: f64,
}

impl ScaleRule {
    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.is_match(file_name)
    }
}

impl FromStr for ScaleRule {
    type Err = CocoMatchError;

    fn from_str(s: &str) -> Result<Self> {
        let (pattern, size) = s.rsplit_once(':').ok_or_else(|| {
            CocoMatchError::InvalidScale(format!("expected \"<pattern>:<pixel size>\", got \"{}\"", s))
        })?;
        let pattern = Regex::new(pattern)
            .map_err(|e| CocoMatchError::InvalidScale(format!("bad pattern \"{}\": {}", pattern, e)))?;
        let pixel_size = parse_pixel_size(size.trim())?;
        Ok(Self { pattern, pixel_size })
    }
}

fn parse_pixel_size(text: &str) -> Result<f64> {
    let invalid = || CocoMatchError::InvalidScale(format!("bad pixel size \"{}\"", text));
    let value = match text.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().map_err(|_| invalid())?;
            let den: f64 = den.trim().parse().map_err(|_| invalid())?;
            num / den
        }
        None => text.parse().map_err(|_| invalid())?,
    };
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid())
    }
}

/// Mean and population standard deviation of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Summary {
    pub mean: f64,
    pub stddev: f64,
}

impl Summary {
    /// Summarise `values`; an empty sample gives zeros.
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            stddev: variance.sqrt(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DatasetStatistics {
    pub num_images: usize,
    pub num_annotated_images: usize,
    /// Instance count per category name, in category order
    pub annotations_by_class: Vec<(String, usize)>,
    pub length: Summary,
    pub width: Summary,
    /// `length / width`, over instances with non-zero width
    pub aspect_ratio: Summary,
    /// Whether sizes were converted with at least one scale rule
    pub scaled: bool,
}

impl DatasetStatistics {
    /// Percentage of images carrying at least one instance.
    pub fn annotated_percent(&self) -> f64 {
        if self.num_images == 0 {
            0.0
        } else {
            self.num_annotated_images as f64 * 100.0 / self.num_images as f64
        }
    }
}

/// Outline size of an instance in pixels: its polygons, or its box when it
/// has none.
pub fn instance_size(instance: &Instance) -> ContourSize {
    let points: Vec<(f64, f64)> = if instance.segmentation.is_empty() {
        let b = &instance.bbox;
        vec![(b.x1, b.y1), (b.x2, b.y1), (b.x2, b.y2), (b.x1, b.y2)]
    } else {
        instance
            .segmentation
            .iter()
            .flat_map(|polygon| flat_points(polygon))
            .collect()
    };
    min_area_rect_size(&points)
}

fn pixel_size(image: &Image, scales: &[ScaleRule]) -> f64 {
    match scales.iter().find(|rule| rule.matches(&image.file_name)) {
        Some(rule) => rule.pixel_size,
        None => {
            if !scales.is_empty() {
                log::warn!("no scale rule matches {}, sizes stay in pixels", image.file_name);
            }
            1.0
        }
    }
}

/// Collect coverage, class counts and size statistics for a dataset.
///
/// Each image's sizes are multiplied by the pixel size of the first scale
/// rule matching its file name.
pub fn collect_statistics(dataset: &Dataset, scales: &[ScaleRule]) -> DatasetStatistics {
    let mut lengths = Vec::new();
    let mut widths = Vec::new();
    let mut ratios = Vec::new();

    for image in &dataset.images {
        let scale = pixel_size(image, scales);
        for instance in &image.instances {
            let size = instance_size(instance).scaled(scale);
            lengths.push(size.length);
            widths.push(size.width);
            if let Some(ratio) = size.aspect_ratio() {
                ratios.push(ratio);
            }
        }
    }
    log::debug!(
        "measured {} instances, {} with a defined aspect ratio",
        lengths.len(),
        ratios.len()
    );

    let annotations_by_class = dataset
        .categories
        .iter()
        .map(|category| {
            let count = dataset
                .instances()
                .filter(|instance| instance.category_id == category.id)
                .count();
            (category.name.clone(), count)
        })
        .collect();

    DatasetStatistics {
        num_images: dataset.images.len(),
        num_annotated_images: dataset
            .images
            .iter()
            .filter(|image| !image.instances.is_empty())
            .count(),
        annotations_by_class,
        length: Summary::of(&lengths),
        width: Summary::of(&widths),
        aspect_ratio: Summary::of(&ratios),
        scaled: !scales.is_empty(),
    }
}
