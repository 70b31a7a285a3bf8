use std::path::Path;

use anyhow::{Context, Result};
use patchvote_classifiers::calibration::{probability_lookup, CalibrationModel, GroupProbabilities};
use patchvote_classifiers::evaluate::GroupFailure;
use patchvote_classifiers::io::read_targets;
use patchvote_classifiers::persistence::load_model;
use patchvote_classifiers::trainer::TrainedModel;

use super::load_patches_from;
use crate::input::PipelineConfig;

/// Calibrated probabilities at both distance extremes of each target group.
///
/// The paintings in `dir` need no `vg`/`nvg` prefix: their attribution is
/// what is being asked.
pub fn run_scores(
    dir: &Path,
    model_path: &Path,
    score_model_path: &Path,
    targets_path: &Path,
    config: &PipelineConfig,
) -> Result<(Vec<GroupProbabilities>, Vec<GroupFailure>)> {
    let model: TrainedModel = load_model(model_path)
        .with_context(|| format!("Failed to load model from {}", model_path.display()))?;
    let calibrator: CalibrationModel = load_model(score_model_path).with_context(|| {
        format!(
            "Failed to load calibration model from {}",
            score_model_path.display()
        )
    })?;
    let targets = read_targets(targets_path)
        .with_context(|| format!("Failed to read targets from {}", targets_path.display()))?;
    let patches = load_patches_from(dir, config)?;

    let (groups, failures) =
        probability_lookup(&model, &calibrator, &patches, &targets, config.n_extremes);

    for group in &groups {
        println!("{} ({} patches)", group.label, group.n_patches);
        for estimate in &group.first {
            println!("  first\t{:.4}\t{:.4}", estimate.distance, estimate.probability);
        }
        for estimate in &group.last {
            println!("  last\t{:.4}\t{:.4}", estimate.distance, estimate.probability);
        }
    }
    for failure in &failures {
        println!("{}\tfailed: {}", failure.label, failure.cause);
    }

    Ok((groups, failures))
}
