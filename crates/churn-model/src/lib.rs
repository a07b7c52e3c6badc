//! Inference layer: fitted artifacts, the feature pipeline, and the prediction service.

mod artifact;
mod encoder;
mod error;
mod forest;
mod pipeline;
mod scaler;
mod service;
mod store;

#[cfg(feature = "onnx")]
mod onnx;

pub use artifact::{CategoricalEncoder, Classifier, NumericScaler};
pub use encoder::LabelEncoder;
pub use error::ModelError;
pub use forest::{DecisionTree, RandomForest, TreeFile};
pub use pipeline::{FeaturePipeline, FeatureVector};
pub use scaler::StandardScaler;
pub use service::PredictionService;
pub use store::{ArtifactPaths, ArtifactStore, ArtifactSummary};

#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
