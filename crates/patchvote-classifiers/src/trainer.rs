//! Patch classifier training: search the SVM hyperparameter space under
//! stratified k-fold and refit the best candidate on the whole corpus.
use ndarray::{Array1, ArrayView2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::{
    Hyperparameters, Kernel, ScoringMode, SearchConfig, SearchStrategy, CLASSES,
};
use crate::data_handling::Corpus;
use crate::error::Result;
use crate::evaluate::GroupScores;
use crate::model_selection::{
    cross_validated_search, parameter_grid, sample_parameters, stratified_k_fold, CvResult,
    ScoringMetric,
};
use crate::models::{build_model, ClassifierModel, SvmClassifier};

/// A fitted patch classifier together with its search record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub estimator: SvmClassifier,
    /// Class identifiers, negative first.
    pub classes: [u8; 2],
    pub best_params: Hyperparameters,
    pub best_score: f64,
    pub kernel: Kernel,
    pub search: SearchStrategy,
    pub cv_results: Vec<CvResult>,
}

impl TrainedModel {
    pub fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        self.estimator.decision_function(x)
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<u8>> {
        self.estimator.predict(x)
    }

    /// Score the rows of one group in the requested mode.
    pub fn score(&self, x: ArrayView2<f64>, mode: ScoringMode) -> Result<GroupScores> {
        Ok(match mode {
            ScoringMode::Predict => GroupScores::Labels(self.predict(x)?.to_vec()),
            ScoringMode::DecisionFunction => {
                GroupScores::Distances(self.decision_function(x)?.to_vec())
            }
        })
    }

    pub fn n_features(&self) -> Option<usize> {
        self.estimator.n_features()
    }
}

pub struct ModelTrainer {
    config: SearchConfig,
}

impl ModelTrainer {
    pub fn new(config: SearchConfig) -> Self {
        ModelTrainer { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn fit(&self, corpus: &Corpus) -> Result<TrainedModel> {
        self.config.validate()?;
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let y = corpus.class_vec();
        let folds = stratified_k_fold(&y, self.config.folds, &mut rng)?;
        let candidates = match self.config.search {
            SearchStrategy::Grid => parameter_grid(self.config.kernel),
            SearchStrategy::Random => {
                sample_parameters(self.config.kernel, self.config.iterations, &mut rng)
            }
        };

        log::info!(
            "Searching {} {:?} candidates for a {:?} SVM with {}-fold stratified CV",
            candidates.len(),
            self.config.search,
            self.config.kernel,
            self.config.folds
        );

        let kernel = self.config.kernel;
        let tolerance = self.config.tolerance;
        let outcome = cross_validated_search(
            corpus.features(),
            &y,
            &candidates,
            &folds,
            ScoringMetric::F1,
            |params| build_model(kernel, params, tolerance),
        )?;

        Ok(TrainedModel {
            estimator: outcome.best_estimator,
            classes: CLASSES,
            best_params: outcome.best_params,
            best_score: outcome.best_score,
            kernel,
            search: self.config.search,
            cv_results: outcome.cv_results,
        })
    }
}
