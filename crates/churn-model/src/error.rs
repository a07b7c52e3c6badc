use std::path::PathBuf;

use churn_core::LayoutError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid artifact {artifact}: {reason}")]
    Invalid { artifact: String, reason: String },

    #[error("{encoder}: unknown category '{value}'")]
    UnknownCategory { encoder: String, value: String },

    #[error("expected {expected} features, got {found}")]
    FeatureMismatch { expected: usize, found: usize },

    #[error("training row has no usable '{0}' column")]
    MissingColumn(String),

    #[error("feature layout mismatch: {0}")]
    Layout(#[from] LayoutError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "onnx")]
    #[error("onnx runtime error: {0}")]
    Onnx(String),
}

impl ModelError {
    pub(crate) fn invalid(artifact: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            artifact: artifact.to_string(),
            reason: reason.into(),
        }
    }
}
