//! Core data types for annotated datasets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque passthrough fields attached to datasets, images, categories and
/// annotations. Never interpreted by the evaluation code.
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// Axis-aligned bounding box in corner form (x1, y1, x2, y2).
///
/// A box is valid when `x1 < x2` and `y1 < y2`. Validity is not enforced at
/// construction; IoU computation rejects invalid boxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its corners.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a bounding box from COCO `[x, y, width, height]` values.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Convert back to COCO `[x, y, width, height]`.
    pub fn to_xywh(&self) -> [f64; 4] {
        [self.x1, self.y1, self.width(), self.height()]
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Get the area of the bounding box.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Check that both axes are strictly ordered.
    pub fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }
}

/// Binary occupancy grid over an image, stored as a row-major bitset.
#[derive(Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    words: Vec<u64>,
}

impl Mask {
    /// Create an empty mask of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let bits = width as usize * height as usize;
        Self {
            width,
            height,
            words: vec![0; bits.div_ceil(64)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn bit(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Mark pixel (x, y) as occupied. Pixels outside the grid are ignored.
    pub fn set(&mut self, x: u32, y: u32) {
        if x < self.width && y < self.height {
            let bit = self.bit(x, y);
            self.words[bit / 64] |= 1u64 << (bit % 64);
        }
    }

    /// Whether pixel (x, y) is occupied. Pixels outside the grid are not.
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let bit = self.bit(x, y);
        self.words[bit / 64] & (1u64 << (bit % 64)) != 0
    }

    /// Number of occupied pixels.
    pub fn count(&self) -> u64 {
        self.words.iter().map(|w| u64::from(w.count_ones())).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn same_shape(&self, other: &Mask) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Popcount of `self AND other`. Both masks must have the same shape.
    pub fn intersection_count(&self, other: &Mask) -> u64 {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| u64::from((a & b).count_ones()))
            .sum()
    }

    /// Popcount of `self OR other`. Both masks must have the same shape.
    pub fn union_count(&self, other: &Mask) -> u64 {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| u64::from((a | b).count_ones()))
            .sum()
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mask")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("occupied", &self.count())
            .finish()
    }
}

/// Represents a category in the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Category {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            extra: Extra::new(),
        }
    }
}

/// One annotated object occurrence, either a ground-truth label or a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub id: u64,
    pub image_id: u64,
    pub category_id: u64,
    /// Confidence score (for predictions)
    pub score: Option<f64>,
    pub bbox: BoundingBox,
    /// Rasterised occupancy, present when the dataset was loaded with masks
    pub mask: Option<Mask>,
    /// Polygon contours as stored in the source file
    pub segmentation: Vec<Vec<f64>>,
    pub iscrowd: u8,
    pub extra: Extra,
}

impl Instance {
    /// Create an instance with only a bounding box.
    pub fn new(id: u64, image_id: u64, category_id: u64, bbox: BoundingBox) -> Self {
        Self {
            id,
            image_id,
            category_id,
            score: None,
            bbox,
            mask: None,
            segmentation: Vec::new(),
            iscrowd: 0,
            extra: Extra::new(),
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_mask(mut self, mask: Mask) -> Self {
        self.mask = Some(mask);
        self
    }
}

/// Identity of an image across datasets: the last three components of its
/// normalised file path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageKey(String);

impl ImageKey {
    const COMPONENTS: usize = 3;

    pub fn from_file_name(file_name: &str) -> Self {
        let normalized = normalize_path(file_name);
        let parts: Vec<&str> = normalized.split('/').collect();
        let start = parts.len().saturating_sub(Self::COMPONENTS);
        ImageKey(parts[start..].join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize_path(file_name: &str) -> String {
    file_name.replace('\\', "/")
}

/// Represents an image together with the instances annotated on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub id: u64,
    /// File path, always with forward slashes
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub instances: Vec<Instance>,
    pub extra: Extra,
}

impl Image {
    pub fn new(id: u64, file_name: &str, width: u32, height: u32) -> Self {
        Self {
            id,
            file_name: normalize_path(file_name),
            width,
            height,
            instances: Vec::new(),
            extra: Extra::new(),
        }
    }

    /// Final path component, used as the display name.
    pub fn base_name(&self) -> &str {
        self.file_name.rsplit('/').next().unwrap_or(&self.file_name)
    }

    pub fn key(&self) -> ImageKey {
        ImageKey::from_file_name(&self.file_name)
    }

    /// Attach an instance, rewriting its owning-image id.
    pub fn add_instance(&mut self, mut instance: Instance) {
        instance.image_id = self.id;
        self.instances.push(instance);
    }

    /// Change the image id, keeping the instances consistent.
    pub fn set_id(&mut self, id: u64) {
        self.id = id;
        for instance in &mut self.instances {
            instance.image_id = id;
        }
    }
}

/// Represents a complete dataset: images (owning their instances) and categories.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub images: Vec<Image>,
    pub categories: Vec<Category>,
    /// Top-level keys other than images, annotations and categories
    pub extra: Extra,
}

impl Dataset {
    pub fn new(images: Vec<Image>, categories: Vec<Category>) -> Self {
        Self {
            images,
            categories,
            extra: Extra::new(),
        }
    }

    /// A dataset with categories but no images.
    pub fn empty(categories: Vec<Category>) -> Self {
        Self::new(Vec::new(), categories)
    }

    /// All instances, in image order then within-image order.
    pub fn instances(&self) -> impl Iterator<Item = &Instance> + '_ {
        self.images.iter().flat_map(|image| image.instances.iter())
    }

    pub fn num_instances(&self) -> usize {
        self.images.iter().map(|image| image.instances.len()).sum()
    }
}
