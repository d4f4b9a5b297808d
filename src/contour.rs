//! Size of an object outline, measured on its minimum-area enclosing rectangle.

/// A point in image coordinates.
pub type Point2 = (f64, f64);

/// Side lengths of a minimum-area rotated rectangle, `width <= length`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContourSize {
    pub width: f64,
    pub length: f64,
}

impl ContourSize {
    /// `length / width`, or `None` for a degenerate (zero-width) outline.
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.width > 0.0).then(|| self.length / self.width)
    }

    /// Both sides multiplied by a pixel size.
    pub fn scaled(&self, pixel_size: f64) -> Self {
        Self {
            width: self.width * pixel_size,
            length: self.length * pixel_size,
        }
    }
}

/// Group a flat `[x0, y0, x1, y1, ...]` list into points. A trailing odd
/// coordinate is ignored.
pub fn flat_points(flat: &[f64]) -> Vec<Point2> {
    flat.chunks_exact(2).map(|xy| (xy[0], xy[1])).collect()
}

/// Measure the width and length of the smallest rotated rectangle that
/// encloses `points`.
///
/// Collinear input has zero width and its extent as length; an empty slice
/// measures zero.
///
/// # Example
///
/// ```
/// use coco_match::contour::min_area_rect_size;
///
/// // a 4 x 2 rectangle rotated by 45 degrees
/// let h = 2f64.sqrt();
/// let points = [(0.0, 0.0), (2.0 * h, 2.0 * h), (h, 3.0 * h), (-h, h)];
/// let size = min_area_rect_size(&points);
/// assert!((size.length - 4.0).abs() < 1e-9);
/// assert!((size.width - 2.0).abs() < 1e-9);
/// ```
pub fn min_area_rect_size(points: &[Point2]) -> ContourSize {
    let hull = convex_hull(points);
    match hull.len() {
        0 | 1 => ContourSize::default(),
        2 => ContourSize {
            width: 0.0,
            length: distance(hull[0], hull[1]),
        },
        _ => rotating_calipers(&hull),
    }
}

fn distance(a: Point2, b: Point2) -> f64 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

fn cross(o: Point2, a: Point2, b: Point2) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

// Andrew's monotone chain. Collinear points are dropped, so a hull of two
// points means the input lies on a line.
fn convex_hull(points: &[Point2]) -> Vec<Point2> {
    let mut pts: Vec<Point2> = points
        .iter()
        .copied()
        .filter(|p| p.0.is_finite() && p.1.is_finite())
        .collect();
    pts.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point2> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point2> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

// Every side of the minimum rectangle is collinear with a hull edge, so
// trying each edge as a base finds it.
fn rotating_calipers(hull: &[Point2]) -> ContourSize {
    let n = hull.len();
    let mut best: Option<(f64, ContourSize)> = None;

    for i in 0..n {
        let p1 = hull[i];
        let p2 = hull[(i + 1) % n];
        let edge_len = distance(p1, p2);
        if edge_len < 1e-12 {
            continue;
        }
        let (ux, uy) = ((p2.0 - p1.0) / edge_len, (p2.1 - p1.1) / edge_len);

        let (mut min_u, mut max_u) = (f64::MAX, f64::MIN);
        let (mut min_v, mut max_v) = (f64::MAX, f64::MIN);
        for p in hull {
            let (dx, dy) = (p.0 - p1.0, p.1 - p1.1);
            let u = dx * ux + dy * uy;
            let v = dy * ux - dx * uy;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let (a, b) = (max_u - min_u, max_v - min_v);
        let area = a * b;
        if best.map_or(true, |(best_area, _)| area < best_area) {
            best = Some((
                area,
                ContourSize {
                    width: a.min(b),
                    length: a.max(b),
                },
            ));
        }
    }

    best.map(|(_, size)| size).unwrap_or_default()
}
