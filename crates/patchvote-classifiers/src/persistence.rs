//! Model blobs: a small JSON envelope around the serialized model.
//!
//! ```json
//! { "format": "patchvote", "version": 1, "kind": "classifier", "payload": { ... } }
//! ```
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calibration::CalibrationModel;
use crate::error::{PatchvoteError, Result};
use crate::trainer::TrainedModel;

pub const FORMAT_TAG: &str = "patchvote";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Classifier,
    Calibrator,
}

impl ModelKind {
    fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Classifier => "classifier",
            ModelKind::Calibrator => "calibrator",
        }
    }
}

/// A model that can be stored as an opaque blob.
pub trait Persist: Serialize + DeserializeOwned {
    const KIND: ModelKind;

    fn to_blob(&self) -> Result<Vec<u8>> {
        let envelope = Envelope {
            format: FORMAT_TAG.to_string(),
            version: FORMAT_VERSION,
            kind: Self::KIND,
            payload: serde_json::to_value(self)?,
        };
        Ok(serde_json::to_vec(&envelope)?)
    }

    fn from_blob(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        let envelope: Envelope = serde_json::from_value(value).map_err(|e| {
            PatchvoteError::ModelFormat(format!("Missing or malformed envelope: {}", e))
        })?;
        if envelope.format != FORMAT_TAG {
            return Err(PatchvoteError::ModelFormat(format!(
                "Unexpected format tag '{}'",
                envelope.format
            )));
        }
        if envelope.version != FORMAT_VERSION {
            return Err(PatchvoteError::ModelFormat(format!(
                "Unsupported version {} (expected {})",
                envelope.version, FORMAT_VERSION
            )));
        }
        if envelope.kind != Self::KIND {
            return Err(PatchvoteError::ModelFormat(format!(
                "Expected a {} model, found a {} model",
                Self::KIND.as_str(),
                envelope.kind.as_str()
            )));
        }
        Ok(serde_json::from_value(envelope.payload)?)
    }
}

impl Persist for TrainedModel {
    const KIND: ModelKind = ModelKind::Classifier;
}

impl Persist for CalibrationModel {
    const KIND: ModelKind = ModelKind::Calibrator;
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    kind: ModelKind,
    payload: Value,
}

/// Write a model blob to `path` through a temporary sibling file.
pub fn save_model<M: Persist, P: AsRef<Path>>(model: &M, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = model.to_blob()?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).map_err(|e| PatchvoteError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| PatchvoteError::io(path, e))?;
    log::info!("Saved {} model to {}", M::KIND.as_str(), path.display());
    Ok(())
}

pub fn load_model<M: Persist, P: AsRef<Path>>(path: P) -> Result<M> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| PatchvoteError::io(path, e))?;
    let model = M::from_blob(&bytes)?;
    log::debug!("Loaded {} model from {}", M::KIND.as_str(), path.display());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClassWeight, Hyperparameters, Kernel, SearchStrategy, CLASSES};
    use crate::models::{ClassifierModel, LogisticRegression, SvmClassifier};
    use ndarray::array;

    fn trained() -> TrainedModel {
        let params = Hyperparameters::new(1.0, ClassWeight::Unweighted);
        let mut svm = SvmClassifier::new(Kernel::Linear, params);
        svm.fit(array![[-1.0], [-2.0], [1.0], [2.0]].view(), &[0, 0, 1, 1])
            .unwrap();
        TrainedModel {
            estimator: svm,
            classes: CLASSES,
            best_params: params,
            best_score: 1.0,
            kernel: Kernel::Linear,
            search: SearchStrategy::Grid,
            cv_results: Vec::new(),
        }
    }

    #[test]
    fn classifier_blob_round_trips() {
        let model = trained();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        save_model(&model, &path).unwrap();
        let loaded: TrainedModel = load_model(&path).unwrap();

        let x = array![[-3.0], [0.5], [4.0]];
        let before = model.decision_function(x.view()).unwrap();
        let after = loaded.decision_function(x.view()).unwrap();
        for (a, b) in before.iter().zip(after.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert_eq!(loaded.best_params, model.best_params);
        assert!(!dir.path().join("model.json.tmp").exists());
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let blob = trained().to_blob().unwrap();
        let err = CalibrationModel::from_blob(&blob).unwrap_err();
        assert!(matches!(err, PatchvoteError::ModelFormat(_)));
    }

    #[test]
    fn wrong_format_and_version_are_rejected() {
        let mut value: Value = serde_json::from_slice(&trained().to_blob().unwrap()).unwrap();
        value["version"] = Value::from(2);
        let err = TrainedModel::from_blob(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, PatchvoteError::ModelFormat(_)));

        value["version"] = Value::from(1);
        value["format"] = Value::from("pickle");
        let err = TrainedModel::from_blob(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, PatchvoteError::ModelFormat(_)));
    }

    #[test]
    fn corrupt_json_is_a_serialization_error() {
        let err = TrainedModel::from_blob(b"{not json").unwrap_err();
        assert!(matches!(err, PatchvoteError::Serialization(_)));
    }

    #[test]
    fn calibrator_kind_is_tagged() {
        let model = CalibrationModel {
            estimator: LogisticRegression::new(Hyperparameters::default()),
            best_params: Hyperparameters::default(),
            best_score: -0.1,
            cv_results: Vec::new(),
        };
        let value: Value = serde_json::from_slice(&model.to_blob().unwrap()).unwrap();
        assert_eq!(value["kind"], "calibrator");
        assert_eq!(value["format"], FORMAT_TAG);
        assert!(CalibrationModel::from_blob(&model.to_blob().unwrap()).is_ok());
    }
}
