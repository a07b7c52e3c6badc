//! Prediction service: feature pipeline plus classifier, one record at a time.

use std::sync::Arc;

use churn_core::{CustomerRecord, Prediction};
use tracing::debug;

use crate::artifact::Classifier;
use crate::pipeline::{FeaturePipeline, FeatureVector};
use crate::ModelError;

/// Everything a request handler needs, built once at startup and shared.
#[derive(Clone)]
pub struct PredictionService {
    pipeline: FeaturePipeline,
    classifier: Arc<dyn Classifier>,
}

impl PredictionService {
    pub fn new(pipeline: FeaturePipeline, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            pipeline,
            classifier,
        }
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Run one record through the pipeline and the classifier.
    pub fn predict(&self, record: &CustomerRecord) -> Result<Prediction, ModelError> {
        let features = self.pipeline.transform(record)?;
        self.predict_features(&features)
    }

    /// Classify an already assembled vector.
    ///
    /// The vector must match the classifier's input width; a mismatch is
    /// reported instead of evaluated.
    pub fn predict_features(&self, features: &FeatureVector) -> Result<Prediction, ModelError> {
        let expected = self.classifier.n_features();
        if features.len() != expected {
            return Err(ModelError::FeatureMismatch {
                expected,
                found: features.len(),
            });
        }

        let probabilities = self.classifier.predict_proba(features.as_slice())?;
        let predicted_class = probabilities.argmax();
        debug!(
            %predicted_class,
            no_churn = probabilities.no_churn,
            churn = probabilities.churn,
            "prediction"
        );

        Ok(Prediction {
            predicted_class,
            probabilities,
        })
    }
}
