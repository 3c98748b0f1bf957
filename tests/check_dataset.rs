//! Checks run over datasets produced by the pipeline, then tampered with.

use std::fs;
use std::path::{Path, PathBuf};

use boxseed::check::{check_dataset, CheckOptions, IssueCode, Severity};
use boxseed::config::PipelineConfig;
use boxseed::pipeline::run_pipeline;
use boxseed::BoxseedError;

mod common;
use common::{write_marked_png, MarkerProposer};

/// Build a dataset with every image in train: a (2 regions), b (1), c (0).
fn build(temp: &Path) -> PathBuf {
    let source = temp.join("raw");
    let output = temp.join("dataset");
    write_marked_png(&source.join("a.png"), 64, 48, 2);
    write_marked_png(&source.join("b.png"), 64, 48, 1);
    write_marked_png(&source.join("c.png"), 64, 48, 0);

    let config = PipelineConfig {
        split_ratio: 1.0,
        seed: Some(11),
        ..Default::default()
    };
    run_pipeline(&source, &output, &config, &MarkerProposer).expect("build");
    output
}

#[test]
fn freshly_built_dataset_is_clean() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = build(temp.path());

    let report = check_dataset(&root, &CheckOptions::default()).expect("check");
    assert!(report.is_clean(), "{report}");
    assert_eq!(report.label_files, 2);
    assert_eq!(report.label_lines, 3);
}

#[test]
fn out_of_range_and_unknown_ids_are_errors() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = build(temp.path());
    let label = root.join("labels/train/b.txt");

    fs::write(&label, "42 1.500000 0.500000 0.200000 0.200000\n").expect("tamper label");

    let report = check_dataset(&root, &CheckOptions::default()).expect("check");
    assert!(!report.is_ok());
    assert!(report.has(IssueCode::CoordinateOutOfRange));
    assert!(report.has(IssueCode::UnknownLabelId));
    // The ID that line used to carry is now orphaned in the manifest.
    assert!(report.has(IssueCode::UnusedManifestEntry));
}

#[test]
fn malformed_line_is_reported_once_per_file() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = build(temp.path());
    let label = root.join("labels/train/a.txt");

    fs::write(&label, "0 0.5 0.5\nnot a label\n").expect("tamper label");

    let report = check_dataset(&root, &CheckOptions::default()).expect("check");
    let malformed: Vec<_> = report
        .issues
        .iter()
        .filter(|i| i.code == IssueCode::MalformedLabelLine)
        .collect();
    assert_eq!(malformed.len(), 1);
    assert_eq!(malformed[0].severity, Severity::Error);
}

#[test]
fn duplicate_ids_across_files_are_errors() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = build(temp.path());

    let a = fs::read_to_string(root.join("labels/train/a.txt")).expect("read a");
    let first_line = a.lines().next().expect("first line");
    fs::write(root.join("labels/train/b.txt"), format!("{first_line}\n")).expect("tamper b");

    let report = check_dataset(&root, &CheckOptions::default()).expect("check");
    assert!(report.has(IssueCode::DuplicateLabelId));
}

#[test]
fn missing_crop_is_a_warning() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = build(temp.path());

    fs::remove_file(root.join("unknown_objects/a_object_2.png")).expect("remove crop");

    let report = check_dataset(&root, &CheckOptions::default()).expect("check");
    assert!(report.is_ok());
    assert_eq!(report.warning_count(), 1);
    assert!(report.has(IssueCode::CropCountMismatch));
}

#[test]
fn unpaired_files_are_errors() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = build(temp.path());

    fs::remove_file(root.join("images/train/a.png")).expect("remove image");
    fs::remove_file(root.join("labels/train/b.txt")).expect("remove label");

    let report = check_dataset(&root, &CheckOptions::default()).expect("check");
    assert!(report.has(IssueCode::LabelWithoutImage));
    assert!(report.has(IssueCode::ImageWithoutLabels));
}

#[test]
fn unreadable_copied_image_is_an_error() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = build(temp.path());

    fs::write(root.join("images/train/b.png"), b"garbage").expect("corrupt image");

    let report = check_dataset(&root, &CheckOptions::default()).expect("check");
    assert!(report.has(IssueCode::UnreadableImage));
}

#[test]
fn missing_manifest_is_an_error_not_an_issue() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = build(temp.path());
    fs::remove_file(root.join("dataset.yaml")).expect("remove manifest");

    let err = check_dataset(&root, &CheckOptions::default()).unwrap_err();
    assert!(matches!(err, BoxseedError::Io(_)));
}
