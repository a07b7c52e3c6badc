//! Training column layout shared by the encoders, the scaler, and the classifier.
//!
//! The artifacts were fitted on a frame whose columns carry the original
//! dataset names (space-separated). Every feature vector the service builds
//! must follow [`TRAINING_COLUMNS`] exactly.

use arrow::datatypes::{DataType, Field, Schema};
use thiserror::Error;

/// Training column names.
pub mod columns {
    pub const STATE: &str = "State";
    pub const ACCOUNT_LENGTH: &str = "Account length";
    pub const AREA_CODE: &str = "Area code";
    pub const INTERNATIONAL_PLAN: &str = "International plan";
    pub const VOICE_MAIL_PLAN: &str = "Voice mail plan";
    pub const NUMBER_VMAIL_MESSAGES: &str = "Number vmail messages";
    pub const TOTAL_DAY_CALLS: &str = "Total day calls";
    pub const TOTAL_DAY_CHARGE: &str = "Total day charge";
    pub const TOTAL_EVE_CALLS: &str = "Total eve calls";
    pub const TOTAL_EVE_CHARGE: &str = "Total eve charge";
    pub const TOTAL_NIGHT_CALLS: &str = "Total night calls";
    pub const TOTAL_NIGHT_CHARGE: &str = "Total night charge";
    pub const TOTAL_INTL_CALLS: &str = "Total intl calls";
    pub const TOTAL_INTL_CHARGE: &str = "Total intl charge";
    pub const CUSTOMER_SERVICE_CALLS: &str = "Customer service calls";
}

use columns::*;

/// Column order of the frame the classifier was trained on.
pub const TRAINING_COLUMNS: [&str; 15] = [
    STATE,
    ACCOUNT_LENGTH,
    AREA_CODE,
    INTERNATIONAL_PLAN,
    VOICE_MAIL_PLAN,
    NUMBER_VMAIL_MESSAGES,
    TOTAL_DAY_CALLS,
    TOTAL_DAY_CHARGE,
    TOTAL_EVE_CALLS,
    TOTAL_EVE_CHARGE,
    TOTAL_NIGHT_CALLS,
    TOTAL_NIGHT_CHARGE,
    TOTAL_INTL_CALLS,
    TOTAL_INTL_CHARGE,
    CUSTOMER_SERVICE_CALLS,
];

/// Columns replaced by a label encoder.
pub const CATEGORICAL_COLUMNS: [&str; 3] = [STATE, INTERNATIONAL_PLAN, VOICE_MAIL_PLAN];

/// Columns standardised by the scaler, in the order the scaler was fitted.
pub const NUMERIC_COLUMNS: [&str; 12] = [
    ACCOUNT_LENGTH,
    AREA_CODE,
    NUMBER_VMAIL_MESSAGES,
    TOTAL_DAY_CALLS,
    TOTAL_DAY_CHARGE,
    TOTAL_EVE_CALLS,
    TOTAL_EVE_CHARGE,
    TOTAL_NIGHT_CALLS,
    TOTAL_NIGHT_CHARGE,
    TOTAL_INTL_CALLS,
    TOTAL_INTL_CHARGE,
    CUSTOMER_SERVICE_CALLS,
];

/// Integer-typed columns of the raw training frame; the other numeric columns are floats.
const INTEGER_COLUMNS: [&str; 8] = [
    ACCOUNT_LENGTH,
    AREA_CODE,
    NUMBER_VMAIL_MESSAGES,
    TOTAL_DAY_CALLS,
    TOTAL_EVE_CALLS,
    TOTAL_NIGHT_CALLS,
    TOTAL_INTL_CALLS,
    CUSTOMER_SERVICE_CALLS,
];

/// Schema for the renamed, not yet transformed row.
pub fn training_schema() -> Schema {
    Schema::new(
        TRAINING_COLUMNS
            .iter()
            .map(|&name| {
                let data_type = if CATEGORICAL_COLUMNS.contains(&name) {
                    DataType::Utf8
                } else if INTEGER_COLUMNS.contains(&name) {
                    DataType::Int64
                } else {
                    DataType::Float64
                };
                Field::new(name, data_type, false)
            })
            .collect::<Vec<_>>(),
    )
}

/// Schema for the encoded and scaled feature row.
pub fn feature_schema() -> Schema {
    Schema::new(
        TRAINING_COLUMNS
            .iter()
            .map(|&name| Field::new(name, DataType::Float64, false))
            .collect::<Vec<_>>(),
    )
}

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("{artifact} expects {found} features, pipeline assembles {expected}")]
    Count {
        artifact: String,
        expected: usize,
        found: usize,
    },

    #[error("{artifact} feature {index} is '{found}', pipeline assembles '{expected}'")]
    Name {
        artifact: String,
        index: usize,
        expected: String,
        found: String,
    },
}

/// Compare an artifact's fitted feature names against the pipeline's column order.
pub fn check_layout(artifact: &str, expected: &[&str], found: &[String]) -> Result<(), LayoutError> {
    if expected.len() != found.len() {
        return Err(LayoutError::Count {
            artifact: artifact.to_string(),
            expected: expected.len(),
            found: found.len(),
        });
    }
    for (index, (e, f)) in expected.iter().zip(found).enumerate() {
        if e != f {
            return Err(LayoutError::Name {
                artifact: artifact.to_string(),
                index,
                expected: e.to_string(),
                found: f.clone(),
            });
        }
    }
    Ok(())
}
