use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[test]
fn test_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("coco-match")?;
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicates::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn test_eval_default_values() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("coco-match")?;
    cmd.args(["eval", &fixture("truth.json"), &fixture("predictions.json")]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Metrics \\ Preds"))
        .stdout(predicates::str::contains("0.5714"))
        .stdout(predicates::str::contains("0.4462"))
        .stdout(predicates::str::contains("0.6250"));
    Ok(())
}

#[test]
fn test_eval_truncates_pred_names() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("coco-match")?;
    cmd.args(["eval", &fixture("truth.json"), &fixture("predictions.json")]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("res/predictions.json"))
        .stdout(predicates::str::contains("fixtures/predictions.json").not());
    Ok(())
}

#[test]
fn test_eval_all_values_with_thresholds() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("coco-match")?;
    cmd.args([
        "eval",
        &fixture("truth.json"),
        &fixture("predictions.json"),
        "-t",
        "50,95",
        "-v",
        "all",
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("P_95"))
        .stdout(predicates::str::contains("AP_95"))
        .stdout(predicates::str::contains("0.1583"))
        .stdout(predicates::str::contains("P_75").not());
    Ok(())
}

#[test]
fn test_eval_single_threshold_default_values_fail() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("coco-match")?;
    cmd.args(["eval", &fixture("truth.json"), &fixture("predictions.json"), "-t", "50"]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("UnknownMetric"));
    Ok(())
}

#[test]
fn test_eval_writes_report() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("report");

    let mut cmd = Command::cargo_bin("coco-match")?;
    cmd.args(["eval", &fixture("truth.json"), &fixture("predictions.json"), "-o"])
        .arg(&output);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Writing report to"));

    let report = fs::read_to_string(dir.path().join("report.txt"))?;
    assert!(report.starts_with("Truth: "));
    assert!(report.contains("vs preds: "));
    assert!(report.contains("  * mF1 = 0.625"));
    assert!(report.contains("  * AP_95 = "));
    Ok(())
}

#[test]
fn test_eval_with_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("params.json");
    fs::write(&config, r#"{"iou_thresholds": [0.5, 0.75], "match_policy": "exclusive"}"#)?;

    let mut cmd = Command::cargo_bin("coco-match")?;
    cmd.args(["eval", &fixture("truth.json"), &fixture("predictions.json"), "-v", "all", "--config"])
        .arg(&config);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("F1_75"))
        .stdout(predicates::str::contains("F1_80").not());
    Ok(())
}

#[test]
fn test_eval_rejects_unknown_iou_method() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("coco-match")?;
    cmd.args([
        "eval",
        &fixture("truth.json"),
        &fixture("predictions.json"),
        "--iou-method",
        "polygon",
    ]);
    cmd.assert().failure();
    Ok(())
}

#[test]
fn test_eval_mask_method() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("coco-match")?;
    cmd.args([
        "eval",
        &fixture("truth.json"),
        &fixture("predictions.json"),
        "--iou-method",
        "mask",
        "--match-policy",
        "exclusive",
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("mF1"));
    Ok(())
}

#[test]
fn test_unit_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("normalised.json");

    let mut cmd = Command::cargo_bin("coco-match")?;
    cmd.args(["unit", &fixture("predictions.json"), "-o"]).arg(&output);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("5 images, 8 instances"));

    let written = fs::read_to_string(&output)?;
    assert!(written.contains("D:/exports/images/val/img_001.png"));
    Ok(())
}

#[test]
fn test_unit_reports_bad_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("broken.json");
    fs::write(&input, r#"{"images": [], "annotations": [], "categories": []}"#)?;

    let mut cmd = Command::cargo_bin("coco-match")?;
    cmd.arg("unit").arg(&input);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("EmptyDataset"));
    Ok(())
}

#[test]
fn test_stats_in_pixels() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("coco-match")?;
    cmd.args(["stats", &fixture("truth.json")]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Annotated images: 6/6 (100.0%)"))
        .stdout(predicates::str::contains(" - particle: 9\n - debris: 0\n"))
        .stdout(predicates::str::contains("Mean length 100.0 px (σ=0.00 px)"))
        .stdout(predicates::str::contains("Mean width 100.0 px"))
        .stdout(predicates::str::contains("Mean aspect_ratio 1.000 (σ=0.0000)"));
    Ok(())
}

#[test]
fn test_stats_with_scale_rules() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("coco-match")?;
    cmd.args([
        "stats",
        &fixture("truth.json"),
        "-s",
        r"img_00[1-3]\.png:0.5",
        "--scale",
        r"img_00[4-6]\.png:1/4",
        "--unit",
        "um",
    ]);
    // five instances at 50 um, four at 25 um
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Mean length 38.9 um (σ=12.42 um)"));
    Ok(())
}

#[test]
fn test_stats_default_unit_and_several_datasets() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("coco-match")?;
    cmd.args(["stats", &fixture("truth.json"), &fixture("predictions.json"), "-s", ".*:2"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Mean length 200.0 μm"))
        .stdout(predicates::str::contains("Dataset: ").count(2));
    Ok(())
}

#[test]
fn test_stats_rejects_bad_scale() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("coco-match")?;
    cmd.args(["stats", &fixture("truth.json"), "-s", "img_001:zero"]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("bad pixel size"));
    Ok(())
}
