//! Integration tests for the feature-file loader.

use std::fs;
use std::path::Path;

use patchvote_classifiers::config::RuntimeConfig;
use patchvote_classifiers::io::{
    list_feature_files, load_corpus, load_unlabeled, read_feature_file, read_targets,
};
use patchvote_classifiers::PatchvoteError;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

// ---------------------------------------------------------------------------
// Successful loads
// ---------------------------------------------------------------------------

#[test]
fn rows_labels_and_classes_stay_aligned() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "vg_100_a.txt", "1.0 2.0 3.0\n4.0 5.0 6.0\n");
    write(dir.path(), "nvg_200_b.txt", "0.5 0.5 0.5\n");
    write(dir.path(), "vg_300.txt", "\n7 8 9\n\n");

    let corpus = load_corpus(dir.path(), &RuntimeConfig::new(2)).unwrap();
    assert_eq!(corpus.n_samples(), 4);
    assert_eq!(corpus.n_features(), 3);
    assert_eq!(corpus.labels.len(), corpus.n_samples());
    assert_eq!(corpus.classes.len(), corpus.n_samples());

    // Files are read in filename order: nvg_200_b, vg_100_a, vg_300.txt
    assert_eq!(corpus.labels, vec!["nvg_200", "vg_100", "vg_100", "vg_300.txt"]);
    assert_eq!(corpus.classes.to_vec(), vec![0, 1, 1, 1]);
    assert_eq!(corpus.x[(2, 1)], 5.0);
}

#[test]
fn results_do_not_depend_on_pool_size() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..12 {
        let prefix = if i % 2 == 0 { "vg" } else { "nvg" };
        write(
            dir.path(),
            &format!("{}_{:02}_x.txt", prefix, i),
            &format!("{} {}\n{} {}\n", i, i + 1, i * 2, i * 3),
        );
    }
    let single = load_corpus(dir.path(), &RuntimeConfig::new(1)).unwrap();
    let many = load_corpus(dir.path(), &RuntimeConfig::new(4)).unwrap();
    assert_eq!(single.x, many.x);
    assert_eq!(single.labels, many.labels);
    assert_eq!(single.classes, many.classes);
}

#[test]
fn listing_skips_directories() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "vg_1.txt", "1\n");
    fs::create_dir(dir.path().join("vg_nested")).unwrap();
    let files = list_feature_files(dir.path()).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].index, 0);
    assert_eq!(files[0].file_name, "vg_1.txt");
}

#[test]
fn unlabeled_load_accepts_any_file_name() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "painting_7_crop_1.txt", "1 2\n3 4\n");
    write(dir.path(), "painting_7_crop_2.txt", "5 6\n");
    write(dir.path(), "unknown_12.txt", "7 8\n");
    write(dir.path(), "vg_3.txt", "9 10\n");

    let patches = load_unlabeled(dir.path(), &RuntimeConfig::new(2)).unwrap();
    assert_eq!(patches.n_samples(), 5);
    assert_eq!(patches.n_features(), 2);
    assert_eq!(patches.n_groups(), 3);
    assert_eq!(patches.indices_of("painting_7"), vec![0, 1, 2]);
    assert_eq!(patches.indices_of("unknown_12.txt"), vec![3]);
    assert_eq!(patches.x.row(4).to_vec(), vec![9.0, 10.0]);

    // The same directory is not a training corpus.
    let err = load_corpus(dir.path(), &RuntimeConfig::new(2)).unwrap_err();
    assert!(matches!(err, PatchvoteError::InvalidClassPrefix { .. }));
}

#[test]
fn targets_file_ignores_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "targets.txt", "vg_1\n\n  nvg_2  \n");
    let targets = read_targets(dir.path().join("targets.txt")).unwrap();
    assert_eq!(targets, vec!["vg_1", "nvg_2"]);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn unknown_prefix_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "vg_1.txt", "1 2\n");
    write(dir.path(), "other_2.txt", "1 2\n");
    let err = load_corpus(dir.path(), &RuntimeConfig::default()).unwrap_err();
    assert!(matches!(err, PatchvoteError::InvalidClassPrefix { .. }));
}

#[test]
fn non_numeric_token_reports_line() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "vg_1.txt", "1 2\n3 abc\n");
    let err = read_feature_file(dir.path().join("vg_1.txt")).unwrap_err();
    match err {
        PatchvoteError::InvalidFeatureValue { line, token, .. } => {
            assert_eq!(line, 2);
            assert_eq!(token, "abc");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn ragged_rows_across_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "vg_1.txt", "1 2\n");
    write(dir.path(), "nvg_2.txt", "1 2 3\n");
    let err = load_corpus(dir.path(), &RuntimeConfig::default()).unwrap_err();
    assert!(matches!(err, PatchvoteError::DimensionMismatch { .. }));
}

#[test]
fn empty_file_and_empty_directory_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_corpus(dir.path(), &RuntimeConfig::default()).unwrap_err();
    assert!(matches!(err, PatchvoteError::EmptyCorpus(_)));

    write(dir.path(), "vg_1.txt", "\n\n");
    let err = load_corpus(dir.path(), &RuntimeConfig::default()).unwrap_err();
    assert!(matches!(err, PatchvoteError::EmptyFeatureFile(_)));
}

#[test]
fn unlabeled_load_still_checks_widths_and_emptiness() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_unlabeled(dir.path(), &RuntimeConfig::default()).unwrap_err();
    assert!(matches!(err, PatchvoteError::EmptyCorpus(_)));

    write(dir.path(), "a_1.txt", "1 2\n");
    write(dir.path(), "b_2.txt", "1 2 3\n");
    let err = load_unlabeled(dir.path(), &RuntimeConfig::default()).unwrap_err();
    assert!(matches!(err, PatchvoteError::DimensionMismatch { .. }));
}

#[test]
fn missing_directory_is_an_io_error() {
    let err = load_corpus("/nonexistent/patchvote/corpus", &RuntimeConfig::default()).unwrap_err();
    assert!(matches!(err, PatchvoteError::Io { .. }));
}
