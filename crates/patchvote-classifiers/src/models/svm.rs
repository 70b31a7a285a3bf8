//! Support vector classifier on top of `linfa-svm`.
//!
//! The per-class penalty is `C` times the class weight, handed to linfa as
//! its positive/negative weights. linfa parameterises the Gaussian kernel as
//! `exp(-|a - b|^2 / eps)`, so `gamma` enters as `eps = 1 / gamma`.
use linfa::traits::Fit;
use linfa::Dataset;
use linfa_svm::{Svm, SvmParams};
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::config::{Hyperparameters, Kernel, DEFAULT_SVM_TOLERANCE, OTHER_CLASS, TARGET_CLASS};
use crate::error::{PatchvoteError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::utils::{check_fit_inputs, check_n_features, class_weights, target_flags};

/// Gaussian width used when an RBF candidate carries no `gamma`.
const DEFAULT_GAMMA: f64 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmClassifier {
    kernel: Kernel,
    params: Hyperparameters,
    tolerance: f64,
    n_features: Option<usize>,
    model: Option<Svm<f64, bool>>,
}

impl SvmClassifier {
    pub fn new(kernel: Kernel, params: Hyperparameters) -> Self {
        SvmClassifier {
            kernel,
            params,
            tolerance: DEFAULT_SVM_TOLERANCE,
            n_features: None,
            model: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub fn params(&self) -> &Hyperparameters {
        &self.params
    }

    pub fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    pub fn n_support(&self) -> usize {
        self.model.as_ref().map_or(0, |m| m.nsupport())
    }

    fn gamma(&self) -> f64 {
        self.params.gamma.unwrap_or(DEFAULT_GAMMA)
    }

    fn label(&self) -> &'static str {
        match self.kernel {
            Kernel::Linear => "linear_svm",
            Kernel::Rbf => "rbf_svm",
        }
    }

    fn solver_params(&self, y: &[u8]) -> SvmParams<f64, bool> {
        let weights = class_weights(y, self.params.class_weight);
        let c_target = self.params.c * weights[TARGET_CLASS as usize];
        let c_other = self.params.c * weights[OTHER_CLASS as usize];
        let params = Svm::<f64, bool>::params()
            .eps(self.tolerance)
            .pos_neg_weights(c_target, c_other);
        match self.kernel {
            Kernel::Linear => params.linear_kernel(),
            Kernel::Rbf => params.gaussian_kernel(1.0 / self.gamma()),
        }
    }
}

impl ClassifierModel for SvmClassifier {
    fn fit(&mut self, x: ArrayView2<f64>, y: &[u8]) -> Result<()> {
        check_fit_inputs(&x, y)?;
        let params = self.solver_params(y);
        let dataset = Dataset::new(x.to_owned(), target_flags(y));

        let model = <SvmParams<f64, bool> as Fit<_, _, _>>::fit(&params, &dataset).map_err(|e| {
            PatchvoteError::Numerical(format!(
                "{} failed to fit (C={}): {}",
                self.label(),
                self.params.c,
                e
            ))
        })?;
        log::trace!(
            "{} kept {} of {} support vectors (C={}, gamma={:?})",
            self.label(),
            model.nsupport(),
            x.nrows(),
            self.params.c,
            self.params.gamma
        );

        self.n_features = Some(x.ncols());
        self.model = Some(model);
        Ok(())
    }

    fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let (model, n_features) = match (&self.model, self.n_features) {
            (Some(model), Some(n)) => (model, n),
            _ => return Err(PatchvoteError::NotFitted(self.label())),
        };
        check_n_features(n_features, x.ncols())?;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| model.weighted_sum(&row) - model.rho)
            .collect())
    }

    fn name(&self) -> &str {
        self.label()
    }
}
