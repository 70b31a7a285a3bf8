use ndarray::{Array1, ArrayView2};

use crate::config::{OTHER_CLASS, TARGET_CLASS};
use crate::error::Result;

/// Contract shared by every binary model in the crate.
///
/// Targets use the fixed class encoding (1 for the target artist, 0 for any
/// other painter). A positive decision value always means the target class.
pub trait ClassifierModel {
    /// Fit the model on rows of `x` with class targets `y`.
    fn fit(&mut self, x: ArrayView2<f64>, y: &[u8]) -> Result<()>;

    /// Signed distance of every row from the decision boundary.
    fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>>;

    /// Hard class labels derived from the sign of the decision function.
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<u8>> {
        Ok(self
            .decision_function(x)?
            .mapv(|d| if d > 0.0 { TARGET_CLASS } else { OTHER_CLASS }))
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
