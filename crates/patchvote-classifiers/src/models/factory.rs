use crate::config::{Hyperparameters, Kernel};
use crate::models::svm::SvmClassifier;

/// Build an unfitted patch classifier for one hyperparameter candidate.
pub fn build_model(kernel: Kernel, params: &Hyperparameters, tolerance: f64) -> SvmClassifier {
    SvmClassifier::new(kernel, *params).with_tolerance(tolerance)
}
