//! Turn patch decision distances into probabilities of the target class.
//!
//! A one-feature logistic regression is fitted on the trained classifier's
//! distances over the whole corpus, with its own stratified grid search.
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::{CalibrationConfig, Hyperparameters, Kernel};
use crate::data_handling::{Corpus, PatchSet};
use crate::error::{PatchvoteError, Result};
use crate::evaluate::GroupFailure;
use crate::model_selection::{
    cross_validated_search, parameter_grid, stratified_k_fold, CvResult, ScoringMetric,
};
use crate::models::LogisticRegression;
use crate::trainer::TrainedModel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationModel {
    pub estimator: LogisticRegression,
    pub best_params: Hyperparameters,
    pub best_score: f64,
    pub cv_results: Vec<CvResult>,
}

impl CalibrationModel {
    /// Probability that a patch at `distance` belongs to the target class.
    pub fn predict_probability(&self, distance: f64) -> Result<f64> {
        let p = self.predict_probabilities(&[distance])?;
        Ok(p[0])
    }

    pub fn predict_probabilities(&self, distances: &[f64]) -> Result<Vec<f64>> {
        let x = column(distances)?;
        Ok(self.estimator.predict_proba(x.view())?.to_vec())
    }
}

fn column(values: &[f64]) -> Result<Array2<f64>> {
    Array2::from_shape_vec((values.len(), 1), values.to_vec())
        .map_err(|e| PatchvoteError::Numerical(format!("Failed to shape distances: {}", e)))
}

pub struct ScoreCalibrator {
    config: CalibrationConfig,
}

impl ScoreCalibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        ScoreCalibrator { config }
    }

    /// Fit the calibrator on 1-D distances and their classes.
    pub fn fit(&self, distances: &[f64], classes: &[u8]) -> Result<CalibrationModel> {
        self.config.validate()?;
        if distances.len() != classes.len() {
            return Err(PatchvoteError::DimensionMismatch {
                context: "Calibration classes must align with distances".to_string(),
                expected: distances.len(),
                found: classes.len(),
            });
        }
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let x = column(distances)?;
        let folds = stratified_k_fold(classes, self.config.folds, &mut rng)?;
        let candidates = parameter_grid(Kernel::Linear);
        log::info!(
            "Calibrating {} distances over {} candidates with {}-fold stratified CV",
            distances.len(),
            candidates.len(),
            self.config.folds
        );

        let max_iter = self.config.max_iter;
        let outcome = cross_validated_search(
            x.view(),
            classes,
            &candidates,
            &folds,
            ScoringMetric::NegMeanSquaredError,
            |params| LogisticRegression::new(*params).with_max_iter(max_iter),
        )?;

        Ok(CalibrationModel {
            estimator: outcome.best_estimator,
            best_params: outcome.best_params,
            best_score: outcome.best_score,
            cv_results: outcome.cv_results,
        })
    }
}

/// Decision distance of every patch of the corpus.
pub fn corpus_distances(model: &TrainedModel, corpus: &Corpus) -> Result<Array1<f64>> {
    model.decision_function(corpus.features())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityEstimate {
    pub distance: f64,
    pub probability: f64,
}

/// Calibrated probabilities of the `n` smallest and `n` largest distances.
///
/// `sorted` must be ascending. Groups smaller than `n` yield every patch on
/// both ends.
pub fn extreme_probabilities(
    sorted: &[f64],
    n: usize,
    calibrator: &CalibrationModel,
) -> Result<(Vec<ProbabilityEstimate>, Vec<ProbabilityEstimate>)> {
    let take = n.min(sorted.len());
    let estimate = |values: &[f64]| -> Result<Vec<ProbabilityEstimate>> {
        let probabilities = calibrator.predict_probabilities(values)?;
        Ok(values
            .iter()
            .zip(probabilities)
            .map(|(&distance, probability)| ProbabilityEstimate {
                distance,
                probability,
            })
            .collect())
    };
    let first = estimate(&sorted[..take])?;
    let last = estimate(&sorted[sorted.len() - take..])?;
    Ok((first, last))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupProbabilities {
    pub label: String,
    pub n_patches: usize,
    pub first: Vec<ProbabilityEstimate>,
    pub last: Vec<ProbabilityEstimate>,
}

/// Extreme-distance probabilities for each requested group.
///
/// The patches need no class. Labels absent from `patches`, or groups that
/// fail to score, are returned as failures alongside the successful lookups.
pub fn probability_lookup(
    model: &TrainedModel,
    calibrator: &CalibrationModel,
    patches: &PatchSet,
    targets: &[String],
    n: usize,
) -> (Vec<GroupProbabilities>, Vec<GroupFailure>) {
    let mut found = Vec::new();
    let mut failures = Vec::new();
    for label in targets {
        match lookup_group(model, calibrator, patches, label, n) {
            Ok(group) => found.push(group),
            Err(e) => {
                log::warn!("Skipping target {}: {}", label, e);
                failures.push(GroupFailure {
                    label: label.clone(),
                    cause: e.to_string(),
                });
            }
        }
    }
    (found, failures)
}

fn lookup_group(
    model: &TrainedModel,
    calibrator: &CalibrationModel,
    patches: &PatchSet,
    label: &str,
    n: usize,
) -> Result<GroupProbabilities> {
    let indices = patches.indices_of(label);
    if indices.is_empty() {
        return Err(PatchvoteError::UnknownGroup(label.to_string()));
    }
    let x = patches.select_features(&indices);
    let mut distances = model.decision_function(x.view())?.to_vec();
    distances.sort_by(|a, b| a.total_cmp(b));
    log::debug!("{} sorted distances: {:?}", label, distances);

    let (first, last) = extreme_probabilities(&distances, n, calibrator)?;
    Ok(GroupProbabilities {
        label: label.to_string(),
        n_patches: indices.len(),
        first,
        last,
    })
}
