use std::path::Path;

use anyhow::{Context, Result};
use patchvote_classifiers::calibration::{corpus_distances, CalibrationModel, ScoreCalibrator};
use patchvote_classifiers::persistence::{load_model, save_model};
use patchvote_classifiers::trainer::TrainedModel;

use super::load_corpus_from;
use crate::input::PipelineConfig;

/// Fit the distance-to-probability calibrator on the trained model's
/// decision distances over the whole corpus.
pub fn run_calibration(
    dir: &Path,
    model_path: &Path,
    score_model_path: &Path,
    config: &PipelineConfig,
) -> Result<CalibrationModel> {
    let model: TrainedModel = load_model(model_path)
        .with_context(|| format!("Failed to load model from {}", model_path.display()))?;
    let corpus = load_corpus_from(dir, config)?;

    let distances = corpus_distances(&model, &corpus).context("Failed to score corpus")?;
    let classes = corpus.class_vec();
    let distances = distances.to_vec();

    let calibrator = ScoreCalibrator::new(config.calibration.clone())
        .fit(&distances, &classes)
        .context("Calibration failed")?;

    save_model(&calibrator, score_model_path).with_context(|| {
        format!(
            "Failed to save calibration model to {}",
            score_model_path.display()
        )
    })?;

    println!("best_params\t{}", calibrator.best_params);
    println!("best_neg_mse\t{:.4}", calibrator.best_score);
    Ok(calibrator)
}
