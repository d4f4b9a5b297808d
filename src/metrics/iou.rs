//! Intersection over Union (IoU) calculation.

use crate::error::{CocoMatchError, Result};
use crate::types::{BoundingBox, Instance, Mask};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Geometry used to compare two instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IouMethod {
    /// Axis-aligned bounding box overlap
    #[default]
    Box,
    /// Pixel overlap of rasterised masks
    Mask,
}

impl FromStr for IouMethod {
    type Err = CocoMatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "box" | "bbox" => Ok(IouMethod::Box),
            "mask" | "segm" => Ok(IouMethod::Mask),
            _ => Err(CocoMatchError::UnknownIouMethod(s.to_string())),
        }
    }
}

impl fmt::Display for IouMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IouMethod::Box => f.write_str("box"),
            IouMethod::Mask => f.write_str("mask"),
        }
    }
}

/// Calculate the Intersection over Union (IoU) between two bounding boxes.
///
/// Both boxes must have strictly ordered corners (`x1 < x2`, `y1 < y2`).
///
/// # Arguments
///
/// * `a` - First bounding box
/// * `b` - Second bounding box
///
/// # Returns
///
/// Returns a value between 0.0 (no overlap) and 1.0 (perfect overlap).
///
/// # Errors
///
/// Returns `InvalidGeometry` if either box is not strictly ordered or has an
/// unbounded area.
///
/// # Example
///
/// ```
/// use coco_match::metrics::iou::box_iou;
/// use coco_match::types::BoundingBox;
///
/// let a = BoundingBox::new(0.0, 0.0, 50.0, 50.0);
/// let b = BoundingBox::new(12.5, 12.5, 62.5, 62.5);
/// let iou = box_iou(&a, &b).unwrap();
/// assert!((iou - 9.0 / 23.0).abs() < 1e-9);
/// ```
pub fn box_iou(a: &BoundingBox, b: &BoundingBox) -> Result<f64> {
    check_ordered(a)?;
    check_ordered(b)?;

    // Calculate intersection coordinates
    let x_left = a.x1.max(b.x1);
    let y_bottom = a.y1.max(b.y1);
    let x_right = a.x2.min(b.x2);
    let y_top = a.y2.min(b.y2);

    if x_right < x_left || y_bottom > y_top {
        return Ok(0.0);
    }

    let intersection_area = (x_right - x_left) * (y_top - y_bottom);
    let union_area = a.area() + b.area() - intersection_area;

    let iou = intersection_area / union_area;
    assert!((0.0..=1.0).contains(&iou), "IoU out of range: {iou}");
    Ok(iou)
}

// Finite area keeps the IoU ratio inside [0, 1].
fn check_ordered(bbox: &BoundingBox) -> Result<()> {
    if bbox.is_valid() && bbox.area().is_finite() {
        Ok(())
    } else {
        Err(CocoMatchError::InvalidGeometry(format!(
            "box corners must satisfy x1 < x2 and y1 < y2 with finite area, got ({}, {}, {}, {})",
            bbox.x1, bbox.y1, bbox.x2, bbox.y2
        )))
    }
}

/// Calculate the IoU between two binary masks of equal shape.
///
/// IoU is `popcount(a AND b) / popcount(a OR b)`. Two empty masks have no
/// union; their IoU is defined as 0.0.
///
/// # Errors
///
/// Returns `InvalidGeometry` if the masks differ in shape.
pub fn mask_iou(a: &Mask, b: &Mask) -> Result<f64> {
    if !a.same_shape(b) {
        return Err(CocoMatchError::InvalidGeometry(format!(
            "mask shapes differ: {}x{} vs {}x{}",
            a.width(),
            a.height(),
            b.width(),
            b.height()
        )));
    }

    let union = a.union_count(b);
    if union == 0 {
        log::debug!("both masks are empty, IoU defined as 0");
        return Ok(0.0);
    }

    Ok(a.intersection_count(b) as f64 / union as f64)
}

/// Calculate the IoU between two instances using the given method.
///
/// # Errors
///
/// Returns `MissingData` when `IouMethod::Mask` is requested and either
/// instance has no mask, and propagates geometry errors.
pub fn instance_iou(a: &Instance, b: &Instance, method: IouMethod) -> Result<f64> {
    match method {
        IouMethod::Box => box_iou(&a.bbox, &b.bbox),
        IouMethod::Mask => {
            let (Some(mask_a), Some(mask_b)) = (&a.mask, &b.mask) else {
                let missing = if a.mask.is_none() { a.id } else { b.id };
                return Err(CocoMatchError::MissingData(format!(
                    "instance {missing} has no mask, cannot compute mask IoU"
                )));
            };
            mask_iou(mask_a, mask_b)
        }
    }
}
