//! patchvote-classifiers: patch-level classification for painting attribution.
//!
//! A painting is cut into patches, every patch is described by a feature
//! vector, and a binary SVM scores the patches. This crate loads the patch
//! corpus, trains the SVM under stratified cross-validated hyperparameter
//! search, scores each painting's patches in isolation (leave-one-group-out),
//! folds the patch scores into a single verdict per painting, and calibrates
//! decision distances into probabilities with a second logistic model.
//!
//! Everything that touches disk (feature files, verdict tables, model blobs,
//! HTML reports) lives in `io`, `persistence` and `report`; the numeric core
//! works on `ndarray` matrices and is single-threaded.
pub mod aggregation;
pub mod calibration;
pub mod config;
pub mod data_handling;
pub mod error;
pub mod evaluate;
pub mod io;
pub mod model_selection;
pub mod models;
pub mod persistence;
pub mod report;
pub mod trainer;

pub use error::{PatchvoteError, Result};
