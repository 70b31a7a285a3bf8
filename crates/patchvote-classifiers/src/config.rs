use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PatchvoteError, Result};

/// Class assigned to paintings by the target artist.
pub const TARGET_CLASS: u8 = 1;
/// Class assigned to every other painting.
pub const OTHER_CLASS: u8 = 0;
/// Class identifiers in decision order: negative first, positive second.
pub const CLASSES: [u8; 2] = [OTHER_CLASS, TARGET_CLASS];

pub const TARGET_PREFIX: &str = "vg";
pub const OTHER_PREFIX: &str = "nvg";
pub const LABEL_SEPARATOR: char = '_';

pub const DEFAULT_FOLDS: usize = 3;
pub const DEFAULT_CALIBRATION_FOLDS: usize = 5;
pub const DEFAULT_ITERATIONS: usize = 10;
pub const DEFAULT_SVM_TOLERANCE: f64 = 1e-3;
pub const DEFAULT_CALIBRATION_MAX_ITER: usize = 100;

/// Regularisation strengths searched for every model: 2^-10 .. 2^15.
pub fn c_range() -> Vec<f64> {
    (-10..16).map(|e| 2f64.powi(e)).collect()
}

/// RBF kernel widths searched when `Kernel::Rbf` is selected: 2^-15 .. 2^3.
pub fn gamma_range() -> Vec<f64> {
    (-15..4).map(|e| 2f64.powi(e)).collect()
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf,
}

impl FromStr for Kernel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(Kernel::Linear),
            "rbf" => Ok(Kernel::Rbf),
            _ => Err(format!(
                "Unknown kernel: {}. Valid options are: linear, rbf",
                s
            )),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    Grid,
    Random,
}

impl FromStr for SearchStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grid" => Ok(SearchStrategy::Grid),
            "random" => Ok(SearchStrategy::Random),
            _ => Err(format!(
                "Unknown search strategy: {}. Valid options are: grid, random",
                s
            )),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    #[serde(rename = "none")]
    Unweighted,
    Balanced,
}

impl ClassWeight {
    pub const ALL: [ClassWeight; 2] = [ClassWeight::Unweighted, ClassWeight::Balanced];
}

impl fmt::Display for ClassWeight {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClassWeight::Unweighted => write!(f, "none"),
            ClassWeight::Balanced => write!(f, "balanced"),
        }
    }
}

/// How a trained model turns a group's patches into scores.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Hard class labels.
    Predict,
    /// Signed distances from the separating hyperplane.
    DecisionFunction,
}

/// One point of the hyperparameter space.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Hyperparameters {
    pub c: f64,
    pub class_weight: ClassWeight,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamma: Option<f64>,
}

impl Hyperparameters {
    pub fn new(c: f64, class_weight: ClassWeight) -> Self {
        Self {
            c,
            class_weight,
            gamma: None,
        }
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Hyperparameters::new(1.0, ClassWeight::Unweighted)
    }
}

impl fmt::Display for Hyperparameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{C: {}, class_weight: {}", self.c, self.class_weight)?;
        if let Some(gamma) = self.gamma {
            write!(f, ", gamma: {}", gamma)?;
        }
        write!(f, "}}")
    }
}

/// Hyperparameter search settings for the patch classifier.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub kernel: Kernel,
    pub search: SearchStrategy,
    /// Candidates drawn by random search.
    pub iterations: usize,
    pub folds: usize,
    /// Fixes fold shuffling and random sampling. Drawn from entropy when unset.
    pub seed: Option<u64>,
    /// Stopping tolerance of the SVM solver.
    pub tolerance: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            kernel: Kernel::Linear,
            search: SearchStrategy::Random,
            iterations: DEFAULT_ITERATIONS,
            folds: DEFAULT_FOLDS,
            seed: None,
            tolerance: DEFAULT_SVM_TOLERANCE,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(PatchvoteError::InvalidConfig(
                "Minimum number of iterations is 1".to_string(),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(PatchvoteError::InvalidConfig(format!(
                "SVM tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        validate_folds(self.folds)
    }
}

/// Settings for the distance-to-probability calibrator.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct CalibrationConfig {
    pub folds: usize,
    pub max_iter: usize,
    pub seed: Option<u64>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            folds: DEFAULT_CALIBRATION_FOLDS,
            max_iter: DEFAULT_CALIBRATION_MAX_ITER,
            seed: None,
        }
    }
}

impl CalibrationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(PatchvoteError::InvalidConfig(
                "Calibration needs at least one solver iteration".to_string(),
            ));
        }
        validate_folds(self.folds)
    }
}

fn validate_folds(folds: usize) -> Result<()> {
    if folds < 2 {
        return Err(PatchvoteError::InvalidConfig(format!(
            "Cross-validation needs at least 2 folds, got {}",
            folds
        )));
    }
    Ok(())
}

/// Worker-pool sizing, passed explicitly to every stage that fans out.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    pub cores: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { cores: 1 }
    }
}

impl RuntimeConfig {
    pub fn new(cores: usize) -> Self {
        Self { cores }
    }

    /// Build a dedicated rayon pool with exactly `cores` threads.
    pub fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        if self.cores == 0 {
            return Err(PatchvoteError::InvalidConfig(
                "Number of cores must be at least 1".to_string(),
            ));
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.cores)
            .build()
            .map_err(|e| PatchvoteError::WorkerPool(e.to_string()))
    }
}
