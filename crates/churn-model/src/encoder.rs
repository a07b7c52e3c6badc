//! Label encoder exported from a fitted `LabelEncoder` (`classes_`).

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::ModelError;
use crate::artifact::{CategoricalEncoder, artifact_name, read_json};

#[derive(Deserialize)]
struct LabelEncoderFile {
    classes: Vec<String>,
}

/// Maps each fitted class to its position in `classes`.
pub struct LabelEncoder {
    name: String,
    classes: Vec<String>,
    codes: HashMap<String, usize>,
}

impl LabelEncoder {
    /// Build from a fitted vocabulary. The code of a class is its index.
    pub fn new(name: impl Into<String>, classes: Vec<String>) -> Result<Self, ModelError> {
        let name = name.into();
        if classes.is_empty() {
            return Err(ModelError::invalid(&name, "empty vocabulary"));
        }

        let mut codes = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), code).is_some() {
                return Err(ModelError::invalid(
                    &name,
                    format!("duplicate class '{class}'"),
                ));
            }
        }

        Ok(Self {
            name,
            classes,
            codes,
        })
    }

    /// Load `{"classes": [...]}` from disk; the encoder is named after the file stem.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let file: LabelEncoderFile = read_json(path)?;
        Self::new(artifact_name(path), file.classes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl CategoricalEncoder for LabelEncoder {
    fn transform(&self, value: &str) -> Result<usize, ModelError> {
        self.codes
            .get(value)
            .copied()
            .ok_or_else(|| ModelError::UnknownCategory {
                encoder: self.name.clone(),
                value: value.to_string(),
            })
    }

    fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_encoder() -> LabelEncoder {
        LabelEncoder::new("intl_plan_encoder", vec!["no".into(), "yes".into()]).unwrap()
    }

    #[test]
    fn codes_follow_class_order() {
        let enc = plan_encoder();
        assert_eq!(enc.transform("no").unwrap(), 0);
        assert_eq!(enc.transform("yes").unwrap(), 1);
        assert_eq!(enc.n_classes(), 2);
    }

    #[test]
    fn unknown_value_is_an_error() {
        let err = plan_encoder().transform("maybe").unwrap_err();
        match err {
            ModelError::UnknownCategory { encoder, value } => {
                assert_eq!(encoder, "intl_plan_encoder");
                assert_eq!(value, "maybe");
            }
            other => panic!("expected UnknownCategory, got {other:?}"),
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(plan_encoder().transform("Yes").is_err());
    }

    #[test]
    fn rejects_empty_vocabulary() {
        assert!(matches!(
            LabelEncoder::new("state_encoder", vec![]),
            Err(ModelError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_classes() {
        let result = LabelEncoder::new("state_encoder", vec!["OH".into(), "OH".into()]);
        assert!(matches!(result, Err(ModelError::Invalid { .. })));
    }

    #[test]
    fn load_names_encoder_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vm_plan_encoder.json");
        std::fs::write(&path, r#"{"classes": ["no", "yes"]}"#).unwrap();

        let enc = LabelEncoder::load(&path).unwrap();
        assert_eq!(enc.name(), "vm_plan_encoder");
        assert_eq!(enc.classes(), ["no", "yes"]);
    }
}
