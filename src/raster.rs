//! Polygon rasterisation into occupancy masks.

use crate::error::{CocoMatchError, Result};
use crate::types::Mask;

/// Integer pixel vertex.
pub type Point = (i64, i64);

/// Convert a flat `[x0, y0, x1, y1, ...]` contour into integer vertices.
///
/// Coordinates are truncated toward zero.
///
/// # Errors
///
/// Returns `InvalidAnnotation` for an odd number of coordinates or for
/// non-finite values.
pub fn contour_points(flat: &[f64]) -> Result<Vec<Point>> {
    if flat.len() % 2 != 0 {
        return Err(CocoMatchError::InvalidAnnotation(format!(
            "polygon has an odd number of coordinates ({})",
            flat.len()
        )));
    }
    if flat.iter().any(|v| !v.is_finite()) {
        return Err(CocoMatchError::InvalidAnnotation(
            "polygon has non-finite coordinates".to_string(),
        ));
    }

    Ok(flat
        .chunks_exact(2)
        .map(|xy| (xy[0].trunc() as i64, xy[1].trunc() as i64))
        .collect())
}

/// Fill polygons into a mask of the given size.
///
/// Pixels inside any polygon and pixels on its outline are set; everything
/// outside the image is clipped.
///
/// # Example
///
/// ```
/// use coco_match::raster::rasterize;
///
/// let square = vec![(1, 1), (3, 1), (3, 3), (1, 3)];
/// let mask = rasterize(&[square], 5, 5);
/// assert_eq!(mask.count(), 9);
/// assert!(mask.get(2, 2));
/// assert!(!mask.get(0, 0));
/// ```
pub fn rasterize(polygons: &[Vec<Point>], width: u32, height: u32) -> Mask {
    let mut mask = Mask::new(width, height);
    for polygon in polygons {
        fill_polygon(&mut mask, polygon);
        draw_outline(&mut mask, polygon);
    }
    mask
}

fn plot(mask: &mut Mask, x: i64, y: i64) {
    if x >= 0 && y >= 0 && x < mask.width() as i64 && y < mask.height() as i64 {
        mask.set(x as u32, y as u32);
    }
}

// Scanline fill at integer rows; edges are half-open in y so shared vertices
// are counted once.
fn fill_polygon(mask: &mut Mask, points: &[Point]) {
    if points.len() < 3 || mask.height() == 0 {
        return;
    }

    let min_y = points.iter().map(|p| p.1).min().unwrap_or(0).max(0);
    let max_y = points
        .iter()
        .map(|p| p.1)
        .max()
        .unwrap_or(0)
        .min(mask.height() as i64 - 1);

    let mut crossings: Vec<f64> = Vec::new();
    let last_x = mask.width() as i64 - 1;
    for y in min_y..=max_y {
        crossings.clear();
        for (i, &(x0, y0)) in points.iter().enumerate() {
            let (x1, y1) = points[(i + 1) % points.len()];
            if (y0 <= y && y < y1) || (y1 <= y && y < y0) {
                // f64 keeps far off-image vertices from overflowing
                let t = (y as f64 - y0 as f64) / (y1 as f64 - y0 as f64);
                crossings.push(x0 as f64 + t * (x1 as f64 - x0 as f64));
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for pair in crossings.chunks_exact(2) {
            let start = (pair[0].ceil() as i64).max(0);
            let end = (pair[1].floor() as i64).min(last_x);
            for x in start..=end {
                plot(mask, x, y);
            }
        }
    }
}

fn draw_outline(mask: &mut Mask, points: &[Point]) {
    match points.len() {
        0 => {}
        1 => plot(mask, points[0].0, points[0].1),
        n => {
            for i in 0..n {
                draw_line(mask, points[i], points[(i + 1) % n]);
            }
        }
    }
}

// Liang-Barsky: the part of a segment inside the image, endpoints rounded to
// pixels.
fn clip_segment(mask: &Mask, from: Point, to: Point) -> Option<(Point, Point)> {
    if mask.width() == 0 || mask.height() == 0 {
        return None;
    }
    let max_x = mask.width() as f64 - 1.0;
    let max_y = mask.height() as f64 - 1.0;
    let (x0, y0) = (from.0 as f64, from.1 as f64);
    let dx = to.0 as f64 - x0;
    let dy = to.1 as f64 - y0;

    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [(-dx, x0), (dx, max_x - x0), (-dy, y0), (dy, max_y - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| -> Point {
        (
            (x0 + t * dx).round().clamp(0.0, max_x) as i64,
            (y0 + t * dy).round().clamp(0.0, max_y) as i64,
        )
    };
    Some((at(t0), at(t1)))
}

// Bresenham over the clipped segment
fn draw_line(mask: &mut Mask, from: Point, to: Point) {
    let Some((from, to)) = clip_segment(mask, from, to) else {
        return;
    };
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        plot(mask, x, y);
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contour_points_truncate() {
        let points = contour_points(&[1.9, 2.2, -0.5, 3.99]).unwrap();
        assert_eq!(points, vec![(1, 2), (0, 3)]);
    }

    #[test]
    fn test_contour_points_odd() {
        assert!(contour_points(&[1.0, 2.0, 3.0]).is_err());
        assert!(contour_points(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_rectangle_includes_boundary() {
        let rect = vec![(10, 10), (19, 10), (19, 14), (10, 14)];
        let mask = rasterize(&[rect], 40, 40);
        assert_eq!(mask.count(), 10 * 5);
        assert!(mask.get(10, 10));
        assert!(mask.get(19, 14));
        assert!(!mask.get(20, 14));
    }

    #[test]
    fn test_triangle() {
        let triangle = vec![(0, 0), (4, 0), (0, 4)];
        let mask = rasterize(&[triangle], 10, 10);
        // rows 0..=4 hold 5, 4, 3, 2, 1 pixels
        assert_eq!(mask.count(), 15);
        assert!(mask.get(2, 2));
        assert!(!mask.get(3, 2));
    }

    #[test]
    fn test_clipped_to_image() {
        let rect = vec![(-5, -5), (2, -5), (2, 2), (-5, 2)];
        let mask = rasterize(&[rect], 4, 4);
        assert_eq!(mask.count(), 9);
    }

    #[test]
    fn test_degenerate_polygons() {
        let line = vec![(1, 1), (4, 1)];
        let mask = rasterize(&[line], 8, 8);
        assert_eq!(mask.count(), 4);

        let point = vec![(3, 3)];
        assert_eq!(rasterize(&[point], 8, 8).count(), 1);
    }

    #[test]
    fn test_multiple_polygons_union() {
        let a = vec![(0, 0), (2, 0), (2, 2), (0, 2)];
        let b = vec![(1, 1), (3, 1), (3, 3), (1, 3)];
        let mask = rasterize(&[a, b], 5, 5);
        assert_eq!(mask.count(), 9 + 9 - 4);
    }

    #[test]
    fn test_far_off_image_vertex_is_clipped() {
        let points = contour_points(&[0.0, 0.0, 1e13, 0.0, 1e13, 10.0, 0.0, 10.0]).unwrap();
        let mask = rasterize(&[points], 64, 64);
        // rows 0..=10 fully covered
        assert_eq!(mask.count(), 64 * 11);
        assert!(mask.get(63, 10));
        assert!(!mask.get(0, 11));
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let points = contour_points(&[-1e19, 0.0, 1e19, 0.0, 1e19, 10.0, -1e19, 10.0]).unwrap();
        let mask = rasterize(&[points], 64, 64);
        assert_eq!(mask.count(), 64 * 11);

        let spike = contour_points(&[5.0, 5.0, 1e19, -1e19, 5.0, 6.0]).unwrap();
        let mask = rasterize(&[spike], 16, 16);
        assert!(mask.get(5, 5));
        assert!(mask.get(5, 6));
    }

    #[test]
    fn test_segment_outside_image_is_skipped() {
        let line = vec![(-10, -3), (20, -3)];
        assert!(rasterize(&[line], 8, 8).is_empty());
    }
}
