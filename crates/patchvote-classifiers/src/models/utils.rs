//! Helpers shared by the SVM and logistic solvers.
use ndarray::{Array1, ArrayView2};

use crate::config::{ClassWeight, OTHER_CLASS, TARGET_CLASS};
use crate::error::{PatchvoteError, Result};

/// Validate fit inputs: aligned lengths, binary targets, both classes present.
pub fn check_fit_inputs(x: &ArrayView2<f64>, y: &[u8]) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(PatchvoteError::DimensionMismatch {
            context: "Training targets must align with feature rows".to_string(),
            expected: x.nrows(),
            found: y.len(),
        });
    }
    if let Some(bad) = y.iter().find(|&&c| c != OTHER_CLASS && c != TARGET_CLASS) {
        return Err(PatchvoteError::InvalidConfig(format!(
            "Training targets must be {} or {}, found {}",
            OTHER_CLASS, TARGET_CLASS, bad
        )));
    }
    let counts = class_counts(y);
    if counts[0] == 0 || counts[1] == 0 {
        return Err(PatchvoteError::InvalidConfig(format!(
            "Training needs samples of both classes, got {} of class {} and {} of class {}",
            counts[0], OTHER_CLASS, counts[1], TARGET_CLASS
        )));
    }
    Ok(())
}

pub fn check_n_features(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(PatchvoteError::DimensionMismatch {
            context: "Input rows do not match the fitted model".to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

pub fn class_counts(y: &[u8]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for &c in y {
        if c == TARGET_CLASS {
            counts[1] += 1;
        } else {
            counts[0] += 1;
        }
    }
    counts
}

/// Per-class multipliers on C, indexed by class id.
///
/// `Balanced` weights each class by `n_samples / (2 * count)` so both classes
/// contribute equally to the loss.
pub fn class_weights(y: &[u8], weighting: ClassWeight) -> [f64; 2] {
    match weighting {
        ClassWeight::Unweighted => [1.0, 1.0],
        ClassWeight::Balanced => {
            let counts = class_counts(y);
            let n = y.len() as f64;
            [
                n / (2.0 * counts[0].max(1) as f64),
                n / (2.0 * counts[1].max(1) as f64),
            ]
        }
    }
}

/// Class ids as the boolean targets linfa expects; `true` is the target class.
pub fn target_flags(y: &[u8]) -> Array1<bool> {
    y.iter().map(|&c| c == TARGET_CLASS).collect()
}

/// Row indices that repeat each class cyclically up to the size of the
/// larger class. Training on them weighs both classes equally.
pub fn balanced_indices(y: &[u8]) -> Vec<usize> {
    let mut by_class: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
    for (i, &c) in y.iter().enumerate() {
        by_class[usize::from(c == TARGET_CLASS)].push(i);
    }
    let target = by_class.iter().map(Vec::len).max().unwrap_or(0);
    let mut indices = Vec::with_capacity(2 * target);
    for rows in by_class.iter().filter(|rows| !rows.is_empty()) {
        indices.extend(rows.iter().copied().cycle().take(target));
    }
    indices
}

#[inline]
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
