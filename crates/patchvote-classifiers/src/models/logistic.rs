use linfa::traits::Fit;
use linfa::Dataset;
use ndarray::{Array1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::config::{ClassWeight, Hyperparameters, DEFAULT_CALIBRATION_MAX_ITER};
use crate::error::{PatchvoteError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::utils::{
    balanced_indices, check_fit_inputs, check_n_features, class_counts, sigmoid, target_flags,
};

/// L2-regularised logistic regression fitted with `linfa-logistic`.
///
/// Minimises `0.5 * |w|^2 + C * sum_i s_i * ln(1 + exp(-y_i (w.x_i + b)))`
/// where `s_i` is the class weight of sample i; the intercept is not
/// penalised. linfa has no sample weights, so balanced weighting trains on
/// rows repeated up to the larger class count and rescales the penalty to
/// match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    params: Hyperparameters,
    max_iter: usize,
    coef: Option<Array1<f64>>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(params: Hyperparameters) -> Self {
        LogisticRegression {
            params,
            max_iter: DEFAULT_CALIBRATION_MAX_ITER,
            coef: None,
            intercept: 0.0,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    pub fn params(&self) -> &Hyperparameters {
        &self.params
    }

    pub fn coef(&self) -> Option<&Array1<f64>> {
        self.coef.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Probability of the target class for every row.
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        Ok(self.decision_function(x)?.mapv(sigmoid))
    }
}

impl ClassifierModel for LogisticRegression {
    fn fit(&mut self, x: ArrayView2<f64>, y: &[u8]) -> Result<()> {
        check_fit_inputs(&x, y)?;

        // linfa's penalty is `0.5 * alpha * |w|^2` on an unweighted loss sum.
        let (records, targets, alpha) = match self.params.class_weight {
            ClassWeight::Unweighted => (x.to_owned(), target_flags(y), 1.0 / self.params.c),
            ClassWeight::Balanced => {
                let rows = balanced_indices(y);
                let larger = class_counts(y).into_iter().max().unwrap_or(0) as f64;
                let resampled: Vec<u8> = rows.iter().map(|&i| y[i]).collect();
                let alpha = 2.0 * larger / (y.len() as f64 * self.params.c);
                (x.select(Axis(0), &rows), target_flags(&resampled), alpha)
            }
        };
        let dataset = Dataset::new(records, targets);

        let fitted = linfa_logistic::LogisticRegression::default()
            .alpha(alpha)
            .with_intercept(true)
            .max_iterations(self.max_iter as u64)
            .fit(&dataset)
            .map_err(|e| {
                PatchvoteError::Numerical(format!(
                    "Logistic regression failed to fit (C={}): {}",
                    self.params.c, e
                ))
            })?;

        // linfa picks its own positive class; orient everything to the target.
        let sign = if fitted.labels().pos.class { 1.0 } else { -1.0 };
        let coef = fitted.params().mapv(|w| sign * w);
        let intercept = sign * fitted.intercept();
        if !intercept.is_finite() || coef.iter().any(|v| !v.is_finite()) {
            return Err(PatchvoteError::Numerical(
                "Logistic regression produced non-finite weights".to_string(),
            ));
        }
        log::trace!(
            "Logistic regression fitted with C={} ({:?}): coef={:?}, intercept={}",
            self.params.c,
            self.params.class_weight,
            coef,
            intercept
        );

        self.coef = Some(coef);
        self.intercept = intercept;
        Ok(())
    }

    fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let coef = self
            .coef
            .as_ref()
            .ok_or(PatchvoteError::NotFitted("logistic_regression"))?;
        check_n_features(coef.len(), x.ncols())?;
        Ok(x.dot(coef) + self.intercept)
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}
