//! Property-based tests using proptest
//!
//! These tests verify mathematical properties and invariants that should
//! always hold regardless of the input values.

use coco_match::metrics::ap::calculate_ap;
use coco_match::metrics::f1_score::calculate_f1_score;
use coco_match::metrics::precision_recall::interpolate_precision;
use coco_match::raster::rasterize;
use coco_match::{align, box_iou, mask_iou, BoundingBox, Category, Dataset, Image, Instance};
use proptest::prelude::*;

fn valid_box() -> impl Strategy<Value = BoundingBox> {
    (0.0f64..500.0, 0.0f64..500.0, 0.5f64..200.0, 0.5f64..200.0)
        .prop_map(|(x, y, w, h)| BoundingBox::from_xywh(x, y, w, h))
}

fn image_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(0u32..40, 0..15)
        .prop_map(|ids| ids.into_iter().map(|i| format!("img_{:03}.png", i)).collect())
}

fn dataset(names: &[String], prefix: &str) -> Dataset {
    let images = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut image = Image::new(i as u64 + 1, &format!("{}/set/val/{}", prefix, name), 100, 100);
            image.add_instance(Instance::new(
                i as u64 + 1,
                0,
                1,
                BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            ));
            image
        })
        .collect();
    Dataset::new(images, vec![Category::new(1, "particle")])
}

proptest! {
    #[test]
    fn prop_box_iou_symmetric(a in valid_box(), b in valid_box()) {
        let ab = box_iou(&a, &b).unwrap();
        let ba = box_iou(&b, &a).unwrap();
        prop_assert!((ab - ba).abs() < 1e-12);
    }

    #[test]
    fn prop_box_iou_range(a in valid_box(), b in valid_box()) {
        let iou = box_iou(&a, &b).unwrap();
        prop_assert!((0.0..=1.0).contains(&iou), "IoU should be in [0,1], got {}", iou);
    }

    #[test]
    fn prop_box_iou_self_is_one(a in valid_box()) {
        let iou = box_iou(&a, &a).unwrap();
        prop_assert!((iou - 1.0).abs() < 1e-12);
    }

    #[test]
    fn prop_box_iou_disjoint_is_zero(a in valid_box(), gap in 0.0f64..50.0) {
        let b = BoundingBox::new(a.x2 + gap, a.y1, a.x2 + gap + 10.0, a.y2);
        prop_assert_eq!(box_iou(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn prop_mask_iou_range(
        ax in 0i64..30, ay in 0i64..30, aw in 1i64..20, ah in 1i64..20,
        bx in 0i64..30, by in 0i64..30, bw in 1i64..20, bh in 1i64..20,
    ) {
        let rect = |x: i64, y: i64, w: i64, h: i64| vec![(x, y), (x + w, y), (x + w, y + h), (x, y + h)];
        let a = rasterize(&[rect(ax, ay, aw, ah)], 48, 48);
        let b = rasterize(&[rect(bx, by, bw, bh)], 48, 48);

        let ab = mask_iou(&a, &b).unwrap();
        let ba = mask_iou(&b, &a).unwrap();
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert_eq!(ab, ba);
        prop_assert_eq!(mask_iou(&a, &a).unwrap(), 1.0);
    }

    #[test]
    fn prop_f1_range(p in 0.0f64..=1.0, r in 0.0f64..=1.0) {
        let f1 = calculate_f1_score(p, r);
        prop_assert!(f1.is_finite());
        prop_assert!((0.0..=1.0).contains(&f1), "F1 score should be in [0,1], got {}", f1);
        prop_assert!(f1 <= p.max(r) + 1e-12);
    }

    #[test]
    fn prop_interpolated_precision_non_increasing(ps in prop::collection::vec(0.0f64..=1.0, 0..50)) {
        let interpolated = interpolate_precision(&ps);
        prop_assert_eq!(interpolated.len(), ps.len());
        for pair in interpolated.windows(2) {
            prop_assert!(pair[0] >= pair[1]);
        }
        for (i, p) in interpolated.iter().zip(&ps) {
            prop_assert!(i >= p);
        }
    }

    #[test]
    fn prop_ap_range(flags in prop::collection::vec(any::<bool>(), 1..60)) {
        let total = flags.iter().filter(|&&f| f).count().max(1);
        let mut tp = 0;
        let mut precisions = Vec::new();
        let mut recalls = Vec::new();
        for (i, &flag) in flags.iter().enumerate() {
            if flag {
                tp += 1;
            }
            precisions.push(tp as f64 / (i + 1) as f64);
            recalls.push(tp as f64 / total as f64);
        }

        let ap = calculate_ap(&precisions, &recalls);
        prop_assert!((0.0..=1.0).contains(&ap), "AP should be in [0,1], got {}", ap);
    }

    #[test]
    fn prop_alignment_order_independent(a in image_names(), b in image_names()) {
        let mut a_rev = a.clone();
        a_rev.reverse();

        let (x1, y1) = align(&dataset(&a, "/one"), &dataset(&b, "D:\\two")).unwrap();
        let (x2, y2) = align(&dataset(&a_rev, "/one"), &dataset(&b, "D:\\two")).unwrap();

        let keys = |d: &Dataset| d.images.iter().map(|i| i.key()).collect::<Vec<_>>();
        prop_assert_eq!(keys(&x1), keys(&x2));
        prop_assert_eq!(keys(&y1), keys(&y2));
        prop_assert_eq!(keys(&x1), keys(&y1));
    }

    #[test]
    fn prop_alignment_idempotent(a in image_names(), b in image_names()) {
        let (x1, y1) = align(&dataset(&a, "/one"), &dataset(&b, "/two")).unwrap();
        let (x2, y2) = align(&x1, &y1).unwrap();
        prop_assert_eq!(&x1, &x2);
        prop_assert_eq!(&y1, &y2);
    }

    #[test]
    fn prop_alignment_shrinks_symmetrically(names in image_names(), drop in any::<prop::sample::Index>()) {
        prop_assume!(!names.is_empty());
        let (full_a, full_b) = align(&dataset(&names, "/one"), &dataset(&names, "/two")).unwrap();

        let mut fewer = names.clone();
        fewer.remove(drop.index(names.len()));
        let (less_a, less_b) = align(&dataset(&fewer, "/one"), &dataset(&names, "/two")).unwrap();

        prop_assert_eq!(less_a.images.len(), full_a.images.len() - 1);
        prop_assert_eq!(less_b.images.len(), full_b.images.len() - 1);
    }

    #[test]
    fn prop_rasterize_any_vertices_stays_in_image(
        points in prop::collection::vec((any::<i64>(), any::<i64>()), 1..7),
    ) {
        let mask = rasterize(&[points], 32, 24);
        prop_assert!(mask.count() <= 32 * 24);
    }

    #[test]
    fn prop_far_vertex_matches_clamped_vertex(y in 1i64..20, far in 1_000i64..1_000_000_000_000) {
        // a rectangle reaching far to the right covers the same pixels as
        // one stopping at the image border
        let reaching = rasterize(&[vec![(0, 0), (far, 0), (far, y), (0, y)]], 32, 24);
        let clamped = rasterize(&[vec![(0, 0), (31, 0), (31, y), (0, y)]], 32, 24);
        prop_assert_eq!(reaching, clamped);
    }
}
