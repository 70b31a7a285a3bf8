//! Integration tests for pipeline config parsing and util helpers.

use log::LevelFilter;

use patchvote_classifiers::aggregation::AggregationMethod;
use patchvote_classifiers::config::{Kernel, SearchStrategy};
use patchvote_cli::input::{load_pipeline_config, PipelineConfig, DEFAULT_EXTREMES};
use patchvote_cli::util::{validate_directory, validate_file, verbosity_filter};

// ---------------------------------------------------------------------------
// PipelineConfig defaults & serialization
// ---------------------------------------------------------------------------

#[test]
fn pipeline_config_default_values() {
    let cfg = PipelineConfig::default();
    assert_eq!(cfg.aggregation, AggregationMethod::Mode);
    assert_eq!(cfg.n_extremes, DEFAULT_EXTREMES);
    assert_eq!(cfg.search.kernel, Kernel::Linear);
    assert!(cfg.runtime.cores >= 1);
    assert!(cfg.validate().is_ok());
}

#[test]
fn pipeline_config_serializes_to_json() {
    let json = serde_json::to_string_pretty(&PipelineConfig::default()).unwrap();
    assert!(json.contains("\"search\""));
    assert!(json.contains("\"calibration\""));
    assert!(json.contains("\"aggregation\": \"mode\""));
}

#[test]
fn partial_json_fills_defaults() {
    let cfg: PipelineConfig =
        serde_json::from_str(r#"{"aggregation": "median", "search": {"kernel": "rbf"}}"#).unwrap();
    assert_eq!(cfg.aggregation, AggregationMethod::Median);
    assert_eq!(cfg.search.kernel, Kernel::Rbf);
    assert_eq!(cfg.search.search, SearchStrategy::Random);
    assert_eq!(cfg.n_extremes, DEFAULT_EXTREMES);
}

#[test]
fn load_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"n_extremes": 5, "search": {"folds": 4}}"#).unwrap();
    let cfg = load_pipeline_config(&path).unwrap();
    assert_eq!(cfg.n_extremes, 5);
    assert_eq!(cfg.search.folds, 4);
}

#[test]
fn load_config_reports_bad_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{not json").unwrap();
    let err = load_pipeline_config(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
}

#[test]
fn single_fold_fails_validation() {
    let mut cfg = PipelineConfig::default();
    cfg.search.folds = 1;
    assert!(cfg.validate().is_err());
}

// ---------------------------------------------------------------------------
// util
// ---------------------------------------------------------------------------

#[test]
fn validate_directory_accepts_dirs_only() {
    let dir = tempfile::tempdir().unwrap();
    assert!(validate_directory(dir.path()).is_ok());
    let file = dir.path().join("a.txt");
    std::fs::File::create(&file).unwrap();
    assert!(validate_directory(&file).is_err());
    assert!(validate_directory("/nonexistent/dir").is_err());
}

#[test]
fn validate_file_requires_regular_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("model.json");
    std::fs::File::create(&file).unwrap();
    assert!(validate_file(&file).is_ok());
    assert!(validate_file(dir.path()).is_err());
}

#[test]
fn verbosity_maps_to_levels() {
    assert_eq!(verbosity_filter(0), LevelFilter::Info);
    assert_eq!(verbosity_filter(1), LevelFilter::Debug);
    assert_eq!(verbosity_filter(4), LevelFilter::Trace);
}
