//! Capabilities the pipeline needs from the fitted artifacts.
//!
//! The service only ever calls these traits, so tests can swap in fakes and
//! the classifier backend (JSON forest or ONNX) is chosen at load time.

use std::path::Path;

use churn_core::{ChurnClass, Probabilities};
use serde::de::DeserializeOwned;

use crate::ModelError;

/// Fitted categorical-to-integer mapping.
pub trait CategoricalEncoder: Send + Sync {
    /// Code for `value`, or [`ModelError::UnknownCategory`] outside the fitted vocabulary.
    fn transform(&self, value: &str) -> Result<usize, ModelError>;

    /// Size of the fitted vocabulary.
    fn n_classes(&self) -> usize;
}

/// Fitted numeric standardisation over a fixed set of columns.
pub trait NumericScaler: Send + Sync {
    fn n_features(&self) -> usize;

    /// Column names seen at fit time, when the artifact recorded them.
    fn feature_names(&self) -> Option<&[String]>;

    fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// Pre-trained binary classifier over the full feature vector.
pub trait Classifier: Send + Sync {
    fn n_features(&self) -> usize;

    fn feature_names(&self) -> Option<&[String]>;

    fn predict_proba(&self, features: &[f64]) -> Result<Probabilities, ModelError>;

    fn predict(&self, features: &[f64]) -> Result<ChurnClass, ModelError> {
        Ok(self.predict_proba(features)?.argmax())
    }

    /// Short human-readable description for startup logs and `churn check`.
    fn describe(&self) -> String;
}

/// Read and deserialize one JSON artifact.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    if !path.exists() {
        return Err(ModelError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Artifact name used in errors: the file stem, e.g. `state_encoder`.
pub(crate) fn artifact_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_json_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_json::<serde_json::Value>(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
    }

    #[test]
    fn read_json_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.json");
        std::fs::write(&path, b"\x80not json").unwrap();
        let err = read_json::<serde_json::Value>(&path).unwrap_err();
        assert!(matches!(err, ModelError::Parse { .. }));
    }

    #[test]
    fn artifact_name_is_file_stem() {
        assert_eq!(
            artifact_name(Path::new("artifacts/state_encoder.json")),
            "state_encoder"
        );
    }
}
