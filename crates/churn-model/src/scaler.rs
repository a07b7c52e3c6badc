//! Standard scaler exported from a fitted `StandardScaler`.
//!
//! `mean` and `scale` are optional to cover `with_mean=False` and
//! `with_std=False`; whichever arrays are present must agree in length.

use std::path::Path;

use serde::Deserialize;

use crate::ModelError;
use crate::artifact::{NumericScaler, artifact_name, read_json};

#[derive(Deserialize)]
struct ScalerFile {
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    #[serde(default)]
    mean: Option<Vec<f64>>,
    #[serde(default)]
    scale: Option<Vec<f64>>,
}

/// `(x - mean) / scale`, column by column.
#[derive(Debug)]
pub struct StandardScaler {
    feature_names: Option<Vec<String>>,
    mean: Option<Vec<f64>>,
    scale: Option<Vec<f64>>,
    n_features: usize,
}

impl StandardScaler {
    pub fn new(
        feature_names: Option<Vec<String>>,
        mean: Option<Vec<f64>>,
        scale: Option<Vec<f64>>,
    ) -> Result<Self, ModelError> {
        Self::build("scaler", feature_names, mean, scale)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let file: ScalerFile = read_json(path)?;
        Self::build(&artifact_name(path), file.feature_names, file.mean, file.scale)
    }

    fn build(
        name: &str,
        feature_names: Option<Vec<String>>,
        mean: Option<Vec<f64>>,
        scale: Option<Vec<f64>>,
    ) -> Result<Self, ModelError> {
        let lengths: Vec<usize> = [
            feature_names.as_ref().map(Vec::len),
            mean.as_ref().map(Vec::len),
            scale.as_ref().map(Vec::len),
        ]
        .into_iter()
        .flatten()
        .collect();

        let Some(&n_features) = lengths.first() else {
            return Err(ModelError::invalid(
                name,
                "needs at least one of feature_names, mean, scale",
            ));
        };
        if lengths.iter().any(|&len| len != n_features) {
            return Err(ModelError::invalid(
                name,
                format!("feature_names/mean/scale lengths disagree: {lengths:?}"),
            ));
        }
        if n_features == 0 {
            return Err(ModelError::invalid(name, "no features"));
        }
        if mean.as_ref().is_some_and(|m| m.iter().any(|v| !v.is_finite())) {
            return Err(ModelError::invalid(name, "non-finite mean"));
        }
        if scale
            .as_ref()
            .is_some_and(|s| s.iter().any(|v| !v.is_finite() || *v == 0.0))
        {
            return Err(ModelError::invalid(name, "scale must be finite and non-zero"));
        }

        Ok(Self {
            feature_names,
            mean,
            scale,
            n_features,
        })
    }
}

impl NumericScaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ModelError> {
        if values.len() != self.n_features {
            return Err(ModelError::FeatureMismatch {
                expected: self.n_features,
                found: values.len(),
            });
        }

        Ok(values
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let centered = match &self.mean {
                    Some(mean) => x - mean[i],
                    None => x,
                };
                match &self.scale {
                    Some(scale) => centered / scale[i],
                    None => centered,
                }
            })
            .collect())
    }
}
