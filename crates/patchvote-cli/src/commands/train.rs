use std::path::Path;

use anyhow::{Context, Result};
use patchvote_classifiers::persistence::save_model;
use patchvote_classifiers::trainer::{ModelTrainer, TrainedModel};

use super::load_corpus_from;
use crate::input::PipelineConfig;

/// Fit the patch classifier under cross-validated search and save it.
pub fn run_training(dir: &Path, model_path: &Path, config: &PipelineConfig) -> Result<TrainedModel> {
    let corpus = load_corpus_from(dir, config)?;

    log::info!(
        "Training {:?} SVM with {:?} search ({} folds)",
        config.search.kernel,
        config.search.search,
        config.search.folds
    );
    let model = ModelTrainer::new(config.search.clone())
        .fit(&corpus)
        .context("Model training failed")?;

    save_model(&model, model_path)
        .with_context(|| format!("Failed to save model to {}", model_path.display()))?;

    println!("best_params\t{}", model.best_params);
    println!("best_f1\t{:.4}", model.best_score);
    Ok(model)
}
