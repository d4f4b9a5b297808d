//! Integration tests for the complete matching and evaluation pipeline.

use coco_match::{
    align, evaluate, load_from_file, threshold::coco_thresholds, Dataset, EvalParams, Image,
    IouMethod, MatchPolicy,
};
use std::path::PathBuf;

const TOLERANCE: f64 = 1e-9;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixtures() -> (Dataset, Dataset) {
    let truth = load_from_file(fixture("truth.json")).unwrap();
    let predictions = load_from_file(fixture("predictions.json")).unwrap();
    (truth, predictions)
}

fn assert_close(actual: Option<f64>, expected: f64, name: &str) {
    let actual = actual.unwrap_or_else(|| panic!("metric {} missing", name));
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "{}: expected {}, got {}",
        name,
        expected,
        actual
    );
}

#[test]
fn test_fixture_reference_values() {
    let (truth, predictions) = load_fixtures();
    let metrics = evaluate(&predictions, &truth, &EvalParams::coco()).unwrap();

    assert_close(metrics.get("mF1"), 0.625, "mF1");
    assert_close(metrics.get("mAP"), 0.44619047619047614, "mAP");
    assert_eq!(metrics.len(), 10 * 4 + 2);
}

#[test]
fn test_fixture_per_threshold() {
    let (truth, predictions) = load_fixtures();
    let metrics = evaluate(&predictions, &truth, &EvalParams::coco()).unwrap();

    // (labels, true positives, P = R = F1, AP)
    let expected: [(&[&str], usize, f64, f64); 4] = [
        (&["50", "55", "60", "65"], 6, 0.75, 0.5714285714285714),
        (&["70", "75", "80"], 5, 0.625, 0.4392857142857143),
        (&["85", "90"], 4, 0.5, 0.35),
        (&["95"], 3, 0.375, 0.15833333333333333),
    ];

    for (labels, tp, prf, ap) in expected {
        for label in labels {
            let row = metrics
                .thresholds
                .iter()
                .find(|t| t.label == *label)
                .unwrap();
            assert_eq!(row.true_positives, tp, "tp at {}", label);
            assert_close(metrics.get(&format!("P_{}", label)), prf, "precision");
            assert_close(metrics.get(&format!("R_{}", label)), prf, "recall");
            assert_close(metrics.get(&format!("F1_{}", label)), prf, "f1");
            assert_close(metrics.get(&format!("AP_{}", label)), ap, "ap");
        }
    }
}

#[test]
fn test_fixture_alignment() {
    let (truth, predictions) = load_fixtures();
    let metrics = evaluate(&predictions, &truth, &EvalParams::coco()).unwrap();

    assert_eq!(metrics.alignment.images_a, 5);
    assert_eq!(metrics.alignment.images_b, 6);
    assert_eq!(metrics.alignment.common_images, 5);
    assert_eq!(metrics.alignment.instances_a, 8);
    assert_eq!(metrics.alignment.instances_b, 8);
}

#[test]
fn test_metric_order() {
    let (truth, predictions) = load_fixtures();
    let params = EvalParams::default().with_thresholds(vec![0.5, 0.75]);
    let metrics = evaluate(&predictions, &truth, &params).unwrap();

    assert_eq!(
        metrics.names(),
        vec!["P_50", "R_50", "F1_50", "AP_50", "P_75", "R_75", "F1_75", "AP_75", "mAP", "mF1"]
    );
}

#[test]
fn test_single_threshold_has_no_means() {
    let (truth, predictions) = load_fixtures();
    let metrics = evaluate(&predictions, &truth, &EvalParams::default()).unwrap();

    assert!(metrics.get("mAP").is_none());
    assert!(metrics.get("mF1").is_none());
    assert_close(metrics.get("AP_50"), 0.5714285714285714, "AP_50");
}

#[test]
fn test_identical_trailing_image_does_not_matter() {
    let (truth, predictions) = load_fixtures();
    let baseline = evaluate(&predictions, &truth, &EvalParams::coco()).unwrap();

    let mut truth_extra = truth.clone();
    let mut predictions_extra = predictions.clone();
    truth_extra
        .images
        .push(Image::new(50, "/data/cells/run_a/images/val/img_099.png", 640, 480));
    predictions_extra
        .images
        .push(Image::new(60, "D:/exports/images/val/img_099.png", 640, 480));

    let extended = evaluate(&predictions_extra, &truth_extra, &EvalParams::coco()).unwrap();
    assert_eq!(extended.alignment.common_images, 6);

    for (name, value) in baseline.iter() {
        assert_close(extended.get(name), value, name);
    }
}

#[test]
fn test_truth_only_image_does_not_matter() {
    let (mut truth, predictions) = load_fixtures();
    let baseline = evaluate(&predictions, &truth, &EvalParams::coco()).unwrap();

    truth.images.retain(|image| image.base_name() != "img_006.png");
    let trimmed = evaluate(&predictions, &truth, &EvalParams::coco()).unwrap();

    assert_eq!(trimmed.alignment.dropped_b(), 0);

    // alignment statistics differ by the dropped image, the metrics do not
    let mut trimmed = trimmed;
    trimmed.alignment = baseline.alignment.clone();
    assert_eq!(baseline, trimmed);
}

#[test]
fn test_mask_iou_pipeline() {
    let (truth, predictions) = load_fixtures();
    let params = EvalParams::coco().with_iou_method(IouMethod::Mask);
    let metrics = evaluate(&predictions, &truth, &params).unwrap();

    // Rasterised rectangles include their outline, so overlaps shift slightly
    // but identical predictions still match at every threshold.
    let tp_95 = metrics.thresholds.last().unwrap().true_positives;
    assert!(tp_95 >= 3);
    let f1 = metrics.get("mF1").unwrap();
    assert!(f1 > 0.0 && f1 <= 1.0);
}

#[test]
fn test_exclusive_policy_on_fixture() {
    let (truth, predictions) = load_fixtures();
    let greedy = evaluate(&predictions, &truth, &EvalParams::coco()).unwrap();
    let exclusive = evaluate(
        &predictions,
        &truth,
        &EvalParams::coco().with_match_policy(MatchPolicy::Exclusive),
    )
    .unwrap();

    // no prediction in the fixture overlaps two truths
    assert_eq!(greedy.thresholds, exclusive.thresholds);
}

#[test]
fn test_class_agnostic_on_fixture() {
    let (truth, predictions) = load_fixtures();
    let agnostic = evaluate(
        &predictions,
        &truth,
        &EvalParams::coco().with_class_agnostic(true),
    )
    .unwrap();

    assert_close(agnostic.get("mF1"), 0.625, "mF1");
}

#[test]
fn test_evaluation_is_repeatable() {
    let (truth, predictions) = load_fixtures();
    let params = EvalParams::default().with_thresholds(coco_thresholds());

    let first = evaluate(&predictions, &truth, &params).unwrap();
    let second = evaluate(&predictions, &truth, &params).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_align_fixture() {
    let (truth, predictions) = load_fixtures();
    let (p, t) = align(&predictions, &truth).unwrap();

    assert_eq!(p.images.len(), t.images.len());
    for (a, b) in p.images.iter().zip(&t.images) {
        assert_eq!(a.key(), b.key());
        assert_eq!(a.id, b.id);
    }
}
