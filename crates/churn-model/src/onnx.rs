//! ONNX Runtime backend for the classifier.
//!
//! Expects a sklearn-onnx export converted with `zipmap=False`: one float
//! input of shape `[N, n_features]` and an `output_probability` tensor of
//! shape `[N, 2]`.

use std::path::Path;
use std::sync::Mutex;

use churn_core::Probabilities;
use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::ModelError;
use crate::artifact::Classifier;

const PROBABILITY_OUTPUT: &str = "output_probability";

fn onnx_err(e: impl std::fmt::Display) -> ModelError {
    ModelError::Onnx(e.to_string())
}

/// Classifier backed by an ONNX Runtime session.
///
/// `Session::run` needs `&mut`, so the session sits behind a mutex; every
/// other artifact is shared without locking.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    n_features: usize,
}

impl OnnxClassifier {
    pub fn load(path: &Path, n_features: usize) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(onnx_err)?
            .commit_from_file(path)
            .map_err(onnx_err)?;

        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .ok_or_else(|| ModelError::Onnx("model declares no inputs".into()))?;
        if !session
            .outputs()
            .iter()
            .any(|output| output.name() == PROBABILITY_OUTPUT)
        {
            return Err(ModelError::Onnx(format!(
                "model has no '{PROBABILITY_OUTPUT}' output (export with zipmap=False)"
            )));
        }

        info!(input = %input_name, n_features, model = %path.display(), "loaded onnx classifier");
        Ok(Self {
            session: Mutex::new(session),
            input_name,
            n_features,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Probabilities, ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::FeatureMismatch {
                expected: self.n_features,
                found: features.len(),
            });
        }

        let data: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let shape = [1i64, self.n_features as i64];
        let input = Tensor::from_array((shape, data.into_boxed_slice())).map_err(onnx_err)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ModelError::Onnx("session mutex poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(onnx_err)?;

        let (_, probs) = outputs[PROBABILITY_OUTPUT]
            .try_extract_tensor::<f32>()
            .map_err(onnx_err)?;
        let [no_churn, churn] = probs else {
            return Err(ModelError::Onnx(format!(
                "expected 2 probabilities, got {}",
                probs.len()
            )));
        };

        Ok(Probabilities {
            no_churn: f64::from(*no_churn),
            churn: f64::from(*churn),
        })
    }

    fn describe(&self) -> String {
        format!("onnx classifier ({} features)", self.n_features)
    }
}
