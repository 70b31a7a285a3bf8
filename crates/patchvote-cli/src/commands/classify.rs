use std::path::Path;

use anyhow::{Context, Result};
use patchvote_classifiers::calibration::corpus_distances;
use patchvote_classifiers::evaluate::{classify, Classification};
use patchvote_classifiers::io::write_verdicts_tsv;
use patchvote_classifiers::persistence::load_model;
use patchvote_classifiers::report::{
    write_classification_report, ClassificationReport, ConfusionMatrix,
};
use patchvote_classifiers::trainer::TrainedModel;

use super::load_corpus_from;
use crate::input::PipelineConfig;

/// Where `classify` writes besides stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyOutputs<'a> {
    pub verdicts: Option<&'a Path>,
    pub report: Option<&'a Path>,
}

/// Score every painting in isolation, fold its patch scores into a verdict
/// and compare the verdicts against ground truth.
pub fn run_classification(
    dir: &Path,
    model_path: &Path,
    config: &PipelineConfig,
    outputs: ClassifyOutputs<'_>,
) -> Result<Classification> {
    let model: TrainedModel = load_model(model_path)
        .with_context(|| format!("Failed to load model from {}", model_path.display()))?;
    let corpus = load_corpus_from(dir, config)?;

    log::info!("Classifying groups with '{}' aggregation", config.aggregation);
    let classification = classify(&model, &corpus, config.aggregation);

    for failure in &classification.failures {
        log::warn!("Group {} failed: {}", failure.label, failure.cause);
    }

    println!("Final classification ({}):", classification.method);
    for (label, truth, verdict) in classification.rows() {
        println!("{}\ttruth={}\tverdict={}", label, truth, verdict);
    }

    let pairs = classification.rows().into_iter().map(|(_, t, v)| (t, v));
    let cm = ConfusionMatrix::from_pairs(pairs);
    println!();
    println!("Confusion matrix:");
    print!("{}", cm);
    println!();
    println!("Classification report:");
    print!("{}", ClassificationReport::from_confusion(&cm));

    if let Some(path) = outputs.verdicts {
        write_verdicts_tsv(path, &classification)
            .with_context(|| format!("Failed to write verdicts to {}", path.display()))?;
    }

    if let Some(path) = outputs.report {
        let distances = corpus_distances(&model, &corpus).context("Failed to score corpus")?;
        write_classification_report(
            path,
            &classification,
            &model,
            &distances.to_vec(),
            &corpus.class_vec(),
            env!("CARGO_PKG_VERSION"),
        )
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    Ok(classification)
}
