//! CLI binary smoke tests using assert_cmd.
//!
//! These run the compiled `patchvote` binary against a small synthetic
//! corpus and check argument handling and the output of every stage.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("patchvote").unwrap()
}

/// Three paintings per class, four 2-d patches each, well separated.
fn write_corpus(dir: &Path) {
    for painting in 1..=3 {
        let mut target = String::new();
        let mut other = String::new();
        for patch in 0..4 {
            let jitter = 0.1 * patch as f64 + 0.05 * painting as f64;
            target.push_str(&format!("{} {}\n", 2.0 + jitter, 1.5 - jitter));
            other.push_str(&format!("{} {}\n", -2.0 - jitter, -1.5 + jitter));
        }
        fs::write(dir.join(format!("vg_{}_patches.txt", painting)), target).unwrap();
        fs::write(dir.join(format!("nvg_{}_patches.txt", painting)), other).unwrap();
    }
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("calibrate"))
        .stdout(predicate::str::contains("classify"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("patchvote"));
}

#[test]
fn unknown_aggregation_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .args(["classify", "-d"])
        .arg(dir.path())
        .args(["-m", "model.json", "-a", "vote"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("vote"));
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

#[test]
fn gather_missing_directory_errors() {
    cmd()
        .args(["gather", "-d", "/nonexistent/patches"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Directory does not exist"));
}

#[test]
fn classify_missing_model_errors() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    cmd()
        .args(["classify", "-d"])
        .arg(dir.path())
        .arg("-m")
        .arg(dir.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("File does not exist"));
}

#[test]
fn gather_rejects_unknown_prefix() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("xx_1_patches.txt"), "1.0 2.0\n").unwrap();
    cmd()
        .args(["gather", "-c", "1", "-d"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("xx_1_patches.txt"));
}

#[test]
fn gather_prints_default_config_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    cmd()
        .args(["gather", "-d"])
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("No config provided"))
        .stderr(predicate::str::contains("\"aggregation\""))
        .stdout(predicate::str::contains("patches\t24"))
        .stdout(predicate::str::contains("groups\t6"));
}

#[test]
fn config_file_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"runtime": {"cores": 0}}"#).unwrap();

    let data = tempfile::tempdir().unwrap();
    write_corpus(data.path());
    cmd()
        .args(["gather", "--config"])
        .arg(&config)
        .arg("-d")
        .arg(data.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cores"));
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[test]
fn train_calibrate_classify_scores() {
    let data = tempfile::tempdir().unwrap();
    write_corpus(data.path());
    let out = tempfile::tempdir().unwrap();
    let model = out.path().join("model.json");
    let score_model = out.path().join("score_model.json");
    let verdicts = out.path().join("verdicts.tsv");
    let report = out.path().join("report.html");
    let targets = out.path().join("targets.txt");
    fs::write(&targets, "vg_1\nvg_9\n").unwrap();

    cmd()
        .args(["train", "-c", "1", "-d"])
        .arg(data.path())
        .arg("-m")
        .arg(&model)
        .args(["-s", "random", "-i", "4", "--folds", "3", "--seed", "11"])
        .assert()
        .success()
        .stdout(predicate::str::contains("best_params"));
    assert!(model.is_file());

    cmd()
        .args(["calibrate", "-c", "1", "-d"])
        .arg(data.path())
        .arg("-m")
        .arg(&model)
        .arg("-s")
        .arg(&score_model)
        .args(["--folds", "3"])
        .assert()
        .success();
    assert!(score_model.is_file());

    cmd()
        .args(["classify", "-c", "1", "-d"])
        .arg(data.path())
        .arg("-m")
        .arg(&model)
        .args(["-a", "far", "-o"])
        .arg(&verdicts)
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("Final classification (far)"))
        .stdout(predicate::str::contains("vg_2\ttruth=1\tverdict=1"))
        .stdout(predicate::str::contains("nvg_3\ttruth=0\tverdict=0"))
        .stdout(predicate::str::contains("Confusion matrix"))
        .stdout(predicate::str::contains("weighted avg"));

    let tsv = fs::read_to_string(&verdicts).unwrap();
    assert!(tsv.starts_with("group\ttruth\tverdict\n"));
    assert_eq!(tsv.lines().count(), 7);
    assert!(fs::read_to_string(&report).unwrap().contains("Patch Distances"));

    cmd()
        .args(["scores", "-c", "1", "-d"])
        .arg(data.path())
        .arg("-m")
        .arg(&model)
        .arg("-s")
        .arg(&score_model)
        .arg("-t")
        .arg(&targets)
        .args(["-n", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vg_1 (4 patches)"))
        .stdout(predicate::str::contains("first"))
        .stdout(predicate::str::contains("vg_9\tfailed"));
}

#[test]
fn scores_reads_paintings_without_a_class_prefix() {
    let data = tempfile::tempdir().unwrap();
    write_corpus(data.path());
    let out = tempfile::tempdir().unwrap();
    let model = out.path().join("model.json");
    let score_model = out.path().join("score_model.json");

    cmd()
        .args(["train", "-c", "1", "-d"])
        .arg(data.path())
        .arg("-m")
        .arg(&model)
        .args(["-s", "random", "-i", "2", "--folds", "3", "--seed", "3"])
        .assert()
        .success();
    cmd()
        .args(["calibrate", "-c", "1", "-d"])
        .arg(data.path())
        .arg("-m")
        .arg(&model)
        .arg("-s")
        .arg(&score_model)
        .args(["--folds", "3"])
        .assert()
        .success();

    let unknown = tempfile::tempdir().unwrap();
    fs::write(unknown.path().join("painting_1_patches.txt"), "2.1 1.4\n1.9 1.6\n").unwrap();
    fs::write(unknown.path().join("painting_2_patches.txt"), "-2.0 -1.5\n").unwrap();
    let targets = out.path().join("targets.txt");
    fs::write(&targets, "painting_1\npainting_2\n").unwrap();

    cmd()
        .args(["scores", "-c", "1", "-d"])
        .arg(unknown.path())
        .arg("-m")
        .arg(&model)
        .arg("-s")
        .arg(&score_model)
        .arg("-t")
        .arg(&targets)
        .args(["-n", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("painting_1 (2 patches)"))
        .stdout(predicate::str::contains("painting_2 (1 patches)"))
        .stdout(predicate::str::contains("failed").not());
}
