//! JSON loading and writing for COCO format datasets.

use crate::error::{CocoMatchError, Result};
use crate::raster::{contour_points, rasterize, Point};
use crate::types::{BoundingBox, Category, Dataset, Extra, Image, Instance};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Options controlling how a dataset is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Fill segmentation polygons into masks (needed for mask IoU)
    pub rasterize_masks: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            rasterize_masks: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoFile {
    images: Vec<CocoImage>,
    #[serde(default)]
    annotations: Vec<CocoAnnotation>,
    categories: Vec<Category>,
    #[serde(flatten)]
    extra: Extra,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoImage {
    id: u64,
    file_name: String,
    width: u32,
    height: u32,
    #[serde(flatten)]
    extra: Extra,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    segmentation: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bbox: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(default)]
    iscrowd: u8,
    #[serde(flatten)]
    extra: Extra,
}

/// Load a COCO dataset from a JSON file.
///
/// # Arguments
///
/// * `path` - Path to the COCO JSON file
///
/// # Returns
///
/// Returns a `Dataset` whose images own their instances.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if an
/// annotation is invalid (see [`load_from_string_with_options`]).
///
/// # Example
///
/// ```no_run
/// use coco_match::loader::load_from_file;
///
/// let dataset = load_from_file("annotations.json").unwrap();
/// println!("Loaded {} instances", dataset.num_instances());
/// ```
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    load_from_file_with_options(path, LoadOptions::default())
}

/// Load a COCO dataset from a JSON file with explicit options.
pub fn load_from_file_with_options<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let raw: CocoFile = serde_json::from_reader(reader)?;

    let dataset = build_dataset(raw, options)?;
    log::debug!(
        "loaded {}: {} images, {} instances, {} categories",
        path.display(),
        dataset.images.len(),
        dataset.num_instances(),
        dataset.categories.len()
    );
    Ok(dataset)
}

/// Load a COCO dataset from a JSON string.
///
/// # Example
///
/// ```
/// use coco_match::loader::load_from_string;
///
/// let json = r#"{
///     "images": [{"id": 1, "file_name": "a/b/c.png", "width": 64, "height": 64}],
///     "annotations": [
///         {"id": 1, "image_id": 1, "category_id": 1, "bbox": [10, 20, 30, 40]}
///     ],
///     "categories": [{"id": 1, "name": "particle"}]
/// }"#;
/// let dataset = load_from_string(json).unwrap();
/// assert_eq!(dataset.num_instances(), 1);
/// ```
pub fn load_from_string(json_str: &str) -> Result<Dataset> {
    load_from_string_with_options(json_str, LoadOptions::default())
}

/// Load a COCO dataset from a JSON string with explicit options.
///
/// # Errors
///
/// * `EmptyDataset` - no categories
/// * `InvalidAnnotation` - crowd annotations, annotations without geometry,
///   unknown or duplicate image ids, malformed polygons or bboxes
pub fn load_from_string_with_options(json_str: &str, options: LoadOptions) -> Result<Dataset> {
    let raw: CocoFile = serde_json::from_str(json_str)?;
    build_dataset(raw, options)
}

fn build_dataset(raw: CocoFile, options: LoadOptions) -> Result<Dataset> {
    if raw.categories.is_empty() {
        return Err(CocoMatchError::EmptyDataset(
            "Dataset must contain at least one category".to_string(),
        ));
    }

    let mut images = Vec::with_capacity(raw.images.len());
    let mut by_id: HashMap<u64, usize> = HashMap::with_capacity(raw.images.len());
    for raw_image in raw.images {
        if by_id.insert(raw_image.id, images.len()).is_some() {
            return Err(CocoMatchError::InvalidAnnotation(format!(
                "duplicate image id {}",
                raw_image.id
            )));
        }
        let mut image = Image::new(raw_image.id, &raw_image.file_name, raw_image.width, raw_image.height);
        image.extra = raw_image.extra;
        images.push(image);
    }

    for annotation in raw.annotations {
        let index = *by_id.get(&annotation.image_id).ok_or_else(|| {
            CocoMatchError::InvalidAnnotation(format!(
                "annotation {} refers to unknown image {}",
                annotation.id, annotation.image_id
            ))
        })?;
        let image: &mut Image = &mut images[index];
        let instance = build_instance(annotation, image.width, image.height, options)?;
        image.add_instance(instance);
    }

    Ok(Dataset {
        images,
        categories: raw.categories,
        extra: raw.extra,
    })
}

fn build_instance(raw: CocoAnnotation, width: u32, height: u32, options: LoadOptions) -> Result<Instance> {
    if raw.iscrowd != 0 {
        return Err(CocoMatchError::InvalidAnnotation(format!(
            "annotation {} is a crowd region, which is not supported",
            raw.id
        )));
    }

    let segmentation = match raw.segmentation {
        Some(value) => parse_polygons(raw.id, value)?,
        None => Vec::new(),
    };

    let mut instance = if segmentation.is_empty() {
        let bbox = match raw.bbox.as_deref() {
            Some(&[x, y, w, h]) => BoundingBox::from_xywh(x, y, w, h),
            Some(other) => {
                return Err(CocoMatchError::InvalidAnnotation(format!(
                    "annotation {} has invalid bbox length: {}",
                    raw.id,
                    other.len()
                )))
            }
            None => {
                return Err(CocoMatchError::InvalidAnnotation(format!(
                    "annotation {} has neither segmentation nor bbox",
                    raw.id
                )))
            }
        };
        Instance::new(raw.id, raw.image_id, raw.category_id, bbox)
    } else {
        let contours = segmentation
            .iter()
            .map(|polygon| contour_points(polygon))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| CocoMatchError::InvalidAnnotation(format!("annotation {}: {}", raw.id, e)))?;
        let bbox = contour_bounds(raw.id, &contours)?;

        let mut instance = Instance::new(raw.id, raw.image_id, raw.category_id, bbox);
        if options.rasterize_masks {
            instance.mask = Some(rasterize(&contours, width, height));
        }
        instance
    };

    instance.score = raw.score;
    instance.segmentation = segmentation;
    instance.iscrowd = raw.iscrowd;
    instance.extra = raw.extra;
    Ok(instance)
}

// Accepts a list of flat polygons or a single flat polygon.
fn parse_polygons(id: u64, value: Value) -> Result<Vec<Vec<f64>>> {
    if let Ok(polygons) = serde_json::from_value::<Vec<Vec<f64>>>(value.clone()) {
        return Ok(polygons.into_iter().filter(|p| !p.is_empty()).collect());
    }
    if let Ok(polygon) = serde_json::from_value::<Vec<f64>>(value) {
        return Ok(if polygon.is_empty() { Vec::new() } else { vec![polygon] });
    }
    Err(CocoMatchError::InvalidAnnotation(format!(
        "annotation {} has an unsupported segmentation format (only polygons are supported)",
        id
    )))
}

fn contour_bounds(id: u64, contours: &[Vec<Point>]) -> Result<BoundingBox> {
    let mut points = contours.iter().flatten();
    let &(x, y) = points.next().ok_or_else(|| {
        CocoMatchError::InvalidAnnotation(format!("annotation {} has an empty polygon", id))
    })?;
    let (x1, y1, x2, y2) = points.fold((x, y, x, y), |(x1, y1, x2, y2), &(x, y)| {
        (x1.min(x), y1.min(y), x2.max(x), y2.max(y))
    });
    Ok(BoundingBox::new(x1 as f64, y1 as f64, x2 as f64, y2 as f64))
}

fn to_coco_file(dataset: &Dataset) -> CocoFile {
    let images = dataset
        .images
        .iter()
        .map(|image| CocoImage {
            id: image.id,
            file_name: image.file_name.clone(),
            width: image.width,
            height: image.height,
            extra: image.extra.clone(),
        })
        .collect();

    let annotations = dataset
        .instances()
        .map(|instance| CocoAnnotation {
            id: instance.id,
            image_id: instance.image_id,
            category_id: instance.category_id,
            segmentation: (!instance.segmentation.is_empty())
                .then(|| Value::from(instance.segmentation.clone())),
            bbox: Some(instance.bbox.to_xywh().to_vec()),
            score: instance.score,
            iscrowd: instance.iscrowd,
            extra: instance.extra.clone(),
        })
        .collect();

    CocoFile {
        images,
        annotations,
        categories: dataset.categories.clone(),
        extra: dataset.extra.clone(),
    }
}

/// Serialise a dataset back to COCO JSON.
///
/// Extra fields of every entity are written back alongside the known ones;
/// `bbox` is written as `[x, y, width, height]`.
pub fn to_json_string(dataset: &Dataset) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_coco_file(dataset))?)
}

/// Write a dataset to a COCO JSON file.
pub fn save_to_file<P: AsRef<Path>>(dataset: &Dataset, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &to_coco_file(dataset))?;
    writer.flush()?;
    log::debug!("wrote {}", path.as_ref().display());
    Ok(())
}
