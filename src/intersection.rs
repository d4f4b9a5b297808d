//! Restriction of two datasets to the images they have in common.

use crate::error::{CocoMatchError, Result};
use crate::stats::AlignmentStats;
use crate::types::{Dataset, Image, ImageKey};
use std::collections::{HashMap, HashSet};

/// Restrict two datasets to their common images.
///
/// See [`align_with_stats`] for the exact rules.
///
/// # Errors
///
/// Returns `CategoryMismatch` when the category counts differ and
/// `ImageCollision` when two images of one dataset share an [`ImageKey`].
pub fn align(a: &Dataset, b: &Dataset) -> Result<(Dataset, Dataset)> {
    let (a, b, _) = align_with_stats(a, b)?;
    Ok((a, b))
}

/// Restrict two datasets to their common images and report what was dropped.
///
/// Images are identified across datasets by their [`ImageKey`]. Images found
/// in only one dataset are dropped from it. Both outputs list the common
/// images in the same order (by base file name, then key), with image ids
/// renumbered from 1 and instance ids renumbered from 1 in iteration order.
///
/// # Arguments
///
/// * `a` - First dataset (conventionally the predictions)
/// * `b` - Second dataset (conventionally the ground truth)
///
/// # Returns
///
/// Returns the two aligned datasets and the alignment statistics.
pub fn align_with_stats(a: &Dataset, b: &Dataset) -> Result<(Dataset, Dataset, AlignmentStats)> {
    if a.categories.len() != b.categories.len() {
        return Err(CocoMatchError::CategoryMismatch(format!(
            "{} categories ({}) vs {} categories ({})",
            a.categories.len(),
            category_names(a),
            b.categories.len(),
            category_names(b)
        )));
    }

    let keys_a = image_keys(a, "A")?;
    let keys_b = image_keys(b, "B")?;
    let common: HashSet<ImageKey> = keys_a.intersection(&keys_b).cloned().collect();

    let aligned_a = restrict(a, &common);
    let aligned_b = restrict(b, &common);

    let stats = AlignmentStats {
        images_a: a.images.len(),
        images_b: b.images.len(),
        common_images: common.len(),
        instances_a: aligned_a.num_instances(),
        instances_b: aligned_b.num_instances(),
    };

    if stats.is_lossy() {
        log::warn!("most images have no counterpart: {}", stats.summary_string());
    } else {
        log::info!("aligned datasets: {}", stats.summary_string());
    }

    Ok((aligned_a, aligned_b, stats))
}

fn category_names(dataset: &Dataset) -> String {
    dataset
        .categories
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn image_keys(dataset: &Dataset, collection: &str) -> Result<HashSet<ImageKey>> {
    let mut keys = HashSet::with_capacity(dataset.images.len());
    for image in &dataset.images {
        let key = image.key();
        if keys.contains(&key) {
            return Err(CocoMatchError::ImageCollision {
                collection: collection.to_string(),
                key: key.to_string(),
            });
        }
        keys.insert(key);
    }
    Ok(keys)
}

fn restrict(dataset: &Dataset, common: &HashSet<ImageKey>) -> Dataset {
    let mut kept: Vec<(String, ImageKey, &Image)> = dataset
        .images
        .iter()
        .filter_map(|image| {
            let key = image.key();
            common
                .contains(&key)
                .then(|| (image.base_name().to_string(), key, image))
        })
        .collect();
    kept.sort_by(|x, y| x.0.cmp(&y.0).then_with(|| x.1.cmp(&y.1)));

    let mut next_instance_id = 1;
    let mut renumbered: HashMap<u64, u64> = HashMap::new();
    let images = kept
        .into_iter()
        .enumerate()
        .map(|(i, (_, _, image))| {
            let mut image = image.clone();
            renumbered.insert(image.id, i as u64 + 1);
            image.set_id(i as u64 + 1);
            for instance in &mut image.instances {
                instance.id = next_instance_id;
                next_instance_id += 1;
            }
            image
        })
        .collect();
    log::debug!("renumbered image ids: {renumbered:?}");

    Dataset {
        images,
        categories: dataset.categories.clone(),
        extra: dataset.extra.clone(),
    }
}
