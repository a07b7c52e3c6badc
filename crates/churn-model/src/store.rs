//! Artifact store: loads every fitted artifact once, all or nothing.
//!
//! The store also checks that the scaler and classifier were fitted on the
//! same column layout the pipeline assembles, so a drifted artifact stops
//! startup instead of silently producing wrong predictions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use churn_core::check_layout;
use churn_core::schema::{NUMERIC_COLUMNS, TRAINING_COLUMNS};
use tracing::info;

use crate::artifact::{CategoricalEncoder, Classifier, NumericScaler};
use crate::encoder::LabelEncoder;
use crate::forest::RandomForest;
use crate::pipeline::FeaturePipeline;
use crate::scaler::StandardScaler;
use crate::service::PredictionService;
use crate::ModelError;

pub const STATE_ENCODER_FILE: &str = "state_encoder.json";
pub const INTL_PLAN_ENCODER_FILE: &str = "intl_plan_encoder.json";
pub const VM_PLAN_ENCODER_FILE: &str = "vm_plan_encoder.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const CLASSIFIER_FILE: &str = "rf_model_balanced.json";
#[cfg(feature = "onnx")]
pub const ONNX_CLASSIFIER_FILE: &str = "rf_model_balanced.onnx";

/// Fixed artifact locations inside one directory.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub state_encoder: PathBuf,
    pub intl_plan_encoder: PathBuf,
    pub vm_plan_encoder: PathBuf,
    pub scaler: PathBuf,
    pub classifier: PathBuf,
}

impl ArtifactPaths {
    /// Standard file names under `dir`.
    ///
    /// With the `onnx` feature, `rf_model_balanced.onnx` takes precedence
    /// over the JSON forest when present.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            state_encoder: dir.join(STATE_ENCODER_FILE),
            intl_plan_encoder: dir.join(INTL_PLAN_ENCODER_FILE),
            vm_plan_encoder: dir.join(VM_PLAN_ENCODER_FILE),
            scaler: dir.join(SCALER_FILE),
            classifier: classifier_path(dir),
        }
    }
}

#[cfg(feature = "onnx")]
fn classifier_path(dir: &Path) -> PathBuf {
    let onnx = dir.join(ONNX_CLASSIFIER_FILE);
    if onnx.exists() {
        onnx
    } else {
        dir.join(CLASSIFIER_FILE)
    }
}

#[cfg(not(feature = "onnx"))]
fn classifier_path(dir: &Path) -> PathBuf {
    dir.join(CLASSIFIER_FILE)
}

/// Counts reported by `churn check` and logged at startup.
#[derive(Debug, Clone)]
pub struct ArtifactSummary {
    pub state_classes: usize,
    pub intl_plan_classes: usize,
    pub vm_plan_classes: usize,
    pub scaler_features: usize,
    pub classifier_features: usize,
    pub classifier: String,
}

/// The fitted artifacts, immutable after load.
pub struct ArtifactStore {
    state_encoder: Arc<dyn CategoricalEncoder>,
    intl_plan_encoder: Arc<dyn CategoricalEncoder>,
    vm_plan_encoder: Arc<dyn CategoricalEncoder>,
    scaler: Arc<dyn NumericScaler>,
    classifier: Arc<dyn Classifier>,
}

impl ArtifactStore {
    /// Load all artifacts from `dir` and verify their layout.
    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        Self::load_paths(&ArtifactPaths::in_dir(dir))
    }

    pub fn load_paths(paths: &ArtifactPaths) -> Result<Self, ModelError> {
        let state_encoder = LabelEncoder::load(&paths.state_encoder)?;
        info!(classes = state_encoder.classes().len(), path = %paths.state_encoder.display(), "loaded encoder");
        let intl_plan_encoder = LabelEncoder::load(&paths.intl_plan_encoder)?;
        info!(classes = intl_plan_encoder.classes().len(), path = %paths.intl_plan_encoder.display(), "loaded encoder");
        let vm_plan_encoder = LabelEncoder::load(&paths.vm_plan_encoder)?;
        info!(classes = vm_plan_encoder.classes().len(), path = %paths.vm_plan_encoder.display(), "loaded encoder");

        let scaler = StandardScaler::load(&paths.scaler)?;
        info!(features = scaler.n_features(), path = %paths.scaler.display(), "loaded scaler");

        let classifier = load_classifier(&paths.classifier)?;
        info!(model = %classifier.describe(), path = %paths.classifier.display(), "loaded classifier");

        Self::from_parts(
            Arc::new(state_encoder),
            Arc::new(intl_plan_encoder),
            Arc::new(vm_plan_encoder),
            Arc::new(scaler),
            classifier,
        )
    }

    /// Assemble a store from already loaded artifacts, verifying their layout.
    pub fn from_parts(
        state_encoder: Arc<dyn CategoricalEncoder>,
        intl_plan_encoder: Arc<dyn CategoricalEncoder>,
        vm_plan_encoder: Arc<dyn CategoricalEncoder>,
        scaler: Arc<dyn NumericScaler>,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self, ModelError> {
        let store = Self {
            state_encoder,
            intl_plan_encoder,
            vm_plan_encoder,
            scaler,
            classifier,
        };
        store.verify_layout()?;
        Ok(store)
    }

    /// Check scaler and classifier inputs against the pipeline's column order.
    ///
    /// Names are compared when the artifact recorded them; otherwise only the
    /// feature counts can be checked.
    pub fn verify_layout(&self) -> Result<(), ModelError> {
        match self.scaler.feature_names() {
            Some(names) => check_layout("scaler", &NUMERIC_COLUMNS, names)?,
            None => check_count("scaler", NUMERIC_COLUMNS.len(), self.scaler.n_features())?,
        }
        match self.classifier.feature_names() {
            Some(names) => check_layout("classifier", &TRAINING_COLUMNS, names)?,
            None => check_count(
                "classifier",
                TRAINING_COLUMNS.len(),
                self.classifier.n_features(),
            )?,
        }
        Ok(())
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            state_classes: self.state_encoder.n_classes(),
            intl_plan_classes: self.intl_plan_encoder.n_classes(),
            vm_plan_classes: self.vm_plan_encoder.n_classes(),
            scaler_features: self.scaler.n_features(),
            classifier_features: self.classifier.n_features(),
            classifier: self.classifier.describe(),
        }
    }

    /// Wire the artifacts into a [`PredictionService`].
    pub fn into_service(self) -> PredictionService {
        let pipeline = FeaturePipeline::new(
            self.state_encoder,
            self.intl_plan_encoder,
            self.vm_plan_encoder,
            self.scaler,
        );
        PredictionService::new(pipeline, self.classifier)
    }
}

fn check_count(artifact: &str, expected: usize, found: usize) -> Result<(), ModelError> {
    if expected == found {
        Ok(())
    } else {
        Err(churn_core::LayoutError::Count {
            artifact: artifact.to_string(),
            expected,
            found,
        }
        .into())
    }
}

#[cfg(feature = "onnx")]
fn load_classifier(path: &Path) -> Result<Arc<dyn Classifier>, ModelError> {
    if path.extension().is_some_and(|ext| ext == "onnx") {
        Ok(Arc::new(crate::onnx::OnnxClassifier::load(
            path,
            TRAINING_COLUMNS.len(),
        )?))
    } else {
        Ok(Arc::new(RandomForest::load(path)?))
    }
}

#[cfg(not(feature = "onnx"))]
fn load_classifier(path: &Path) -> Result<Arc<dyn Classifier>, ModelError> {
    Ok(Arc::new(RandomForest::load(path)?))
}
