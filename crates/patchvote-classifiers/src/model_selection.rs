//! Stratified k-fold cross-validation and hyperparameter search.
//!
//! Shared by the patch classifier (F1 on the target class) and the score
//! calibrator (negated mean squared error of the predicted labels).
use ndarray::{ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::config::{
    c_range, gamma_range, ClassWeight, Hyperparameters, Kernel, CLASSES, TARGET_CLASS,
};
use crate::error::{PatchvoteError, Result};
use crate::models::ClassifierModel;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMetric {
    F1,
    NegMeanSquaredError,
}

impl ScoringMetric {
    /// Greater is better for every metric.
    pub fn score(&self, y_true: &[u8], y_pred: &[u8]) -> f64 {
        match self {
            ScoringMetric::F1 => f1_score(y_true, y_pred),
            ScoringMetric::NegMeanSquaredError => -mean_squared_error(y_true, y_pred),
        }
    }
}

/// F1 of the target class; 0 when precision and recall are both undefined.
pub fn f1_score(y_true: &[u8], y_pred: &[u8]) -> f64 {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t == TARGET_CLASS, p == TARGET_CLASS) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }
    let denom = 2 * tp + fp + fn_;
    if denom == 0 {
        0.0
    } else {
        2.0 * tp as f64 / denom as f64
    }
}

pub fn mean_squared_error(y_true: &[u8], y_pred: &[u8]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let total: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(&t, &p)| {
            let d = t as f64 - p as f64;
            d * d
        })
        .sum();
    total / y_true.len() as f64
}

/// Row indices of one train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split `y` into `n_folds` class-stratified folds.
///
/// Each class's indices are shuffled once and dealt into `n_folds`
/// near-equal contiguous parts; fold k tests on part k of every class.
pub fn stratified_k_fold(y: &[u8], n_folds: usize, rng: &mut StdRng) -> Result<Vec<Fold>> {
    if n_folds < 2 {
        return Err(PatchvoteError::InvalidConfig(format!(
            "Cross-validation needs at least 2 folds, got {}",
            n_folds
        )));
    }

    let mut parts: Vec<Vec<usize>> = vec![Vec::new(); n_folds];
    for &class in CLASSES.iter() {
        let mut idx: Vec<usize> = y
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| if c == class { Some(i) } else { None })
            .collect();
        if idx.len() < n_folds {
            return Err(PatchvoteError::InsufficientClassSamples {
                class,
                count: idx.len(),
                folds: n_folds,
            });
        }
        idx.shuffle(rng);
        let count = idx.len();
        for (k, part) in parts.iter_mut().enumerate() {
            let begin = k * count / n_folds;
            let end = (k + 1) * count / n_folds;
            part.extend_from_slice(&idx[begin..end]);
        }
    }

    Ok(parts
        .into_iter()
        .map(|mut test| {
            test.sort_unstable();
            let mut in_test = vec![false; y.len()];
            for &i in &test {
                in_test[i] = true;
            }
            let train = (0..y.len()).filter(|&i| !in_test[i]).collect();
            Fold { train, test }
        })
        .collect())
}

/// Every candidate of the search space in grid order: C slowest, then class
/// weight, then gamma (RBF only) fastest.
pub fn parameter_grid(kernel: Kernel) -> Vec<Hyperparameters> {
    let mut grid = Vec::new();
    for c in c_range() {
        for class_weight in ClassWeight::ALL {
            match kernel {
                Kernel::Linear => grid.push(Hyperparameters::new(c, class_weight)),
                Kernel::Rbf => {
                    for gamma in gamma_range() {
                        grid.push(Hyperparameters::new(c, class_weight).with_gamma(gamma));
                    }
                }
            }
        }
    }
    grid
}

/// Draw `n_iter` candidates, sampling each axis uniformly and independently.
pub fn sample_parameters(kernel: Kernel, n_iter: usize, rng: &mut StdRng) -> Vec<Hyperparameters> {
    let cs = c_range();
    let gammas = gamma_range();
    (0..n_iter)
        .map(|_| {
            let c = cs[rng.gen_range(0..cs.len())];
            let class_weight = ClassWeight::ALL[rng.gen_range(0..ClassWeight::ALL.len())];
            let params = Hyperparameters::new(c, class_weight);
            match kernel {
                Kernel::Linear => params,
                Kernel::Rbf => params.with_gamma(gammas[rng.gen_range(0..gammas.len())]),
            }
        })
        .collect()
}

/// Cross-validated score of one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvResult {
    pub params: Hyperparameters,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome<M> {
    /// Best candidate refit on every row.
    pub best_estimator: M,
    pub best_params: Hyperparameters,
    pub best_score: f64,
    pub cv_results: Vec<CvResult>,
}

/// Score every candidate on the same folds and refit the winner on all rows.
///
/// The winner is the first candidate with the strictly greatest mean score.
/// A candidate whose fit fails on any fold aborts the search.
pub fn cross_validated_search<M, F>(
    x: ArrayView2<f64>,
    y: &[u8],
    candidates: &[Hyperparameters],
    folds: &[Fold],
    metric: ScoringMetric,
    build: F,
) -> Result<SearchOutcome<M>>
where
    M: ClassifierModel,
    F: Fn(&Hyperparameters) -> M,
{
    if candidates.is_empty() {
        return Err(PatchvoteError::InvalidConfig(
            "Hyperparameter search needs at least one candidate".to_string(),
        ));
    }
    if x.nrows() != y.len() {
        return Err(PatchvoteError::DimensionMismatch {
            context: "Search targets must align with feature rows".to_string(),
            expected: x.nrows(),
            found: y.len(),
        });
    }

    let mut cv_results = Vec::with_capacity(candidates.len());
    let mut best: Option<(usize, f64)> = None;

    for (idx, params) in candidates.iter().enumerate() {
        let mut fold_scores = Vec::with_capacity(folds.len());
        for fold in folds {
            let x_train = x.select(Axis(0), &fold.train);
            let y_train: Vec<u8> = fold.train.iter().map(|&i| y[i]).collect();
            let x_test = x.select(Axis(0), &fold.test);
            let y_test: Vec<u8> = fold.test.iter().map(|&i| y[i]).collect();

            let mut model = build(params);
            model.fit(x_train.view(), &y_train)?;
            let y_pred = model.predict(x_test.view())?.to_vec();
            fold_scores.push(metric.score(&y_test, &y_pred));
        }

        let mean_score = fold_scores.iter().mean();
        let std_score = fold_scores.iter().population_std_dev();
        log::debug!(
            "{:.3} (+/-{:.3}) for {}",
            mean_score,
            std_score * 2.0,
            params
        );
        if best.map_or(true, |(_, score)| mean_score > score) {
            best = Some((idx, mean_score));
        }
        cv_results.push(CvResult {
            params: *params,
            fold_scores,
            mean_score,
            std_score,
        });
    }

    let (best_idx, best_score) = best.ok_or_else(|| {
        PatchvoteError::InvalidConfig("Hyperparameter search produced no scores".to_string())
    })?;
    let best_params = candidates[best_idx];
    log::info!("Best score: {:.4} with {}", best_score, best_params);

    let mut best_estimator = build(&best_params);
    best_estimator.fit(x, y)?;

    Ok(SearchOutcome {
        best_estimator,
        best_params,
        best_score,
        cv_results,
    })
}
