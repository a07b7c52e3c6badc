//! Customer record accepted by `POST /predict`, and the prediction returned for it.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::schema::{TRAINING_COLUMNS, columns, training_schema};

/// One customer as sent by callers.
///
/// Field names follow the request convention (`Account_length`); every field
/// is required and there are no defaults. Numeric fields also accept numeric
/// strings, and integer fields accept floats with no fractional part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Account_length", deserialize_with = "lenient::integer")]
    pub account_length: i64,
    #[serde(rename = "Area_code", deserialize_with = "lenient::integer")]
    pub area_code: i64,
    #[serde(rename = "International_plan")]
    pub international_plan: String,
    #[serde(rename = "Voice_mail_plan")]
    pub voice_mail_plan: String,
    #[serde(rename = "Number_vmail_messages", deserialize_with = "lenient::integer")]
    pub number_vmail_messages: i64,
    #[serde(rename = "Total_day_calls", deserialize_with = "lenient::integer")]
    pub total_day_calls: i64,
    #[serde(rename = "Total_day_charge", deserialize_with = "lenient::float")]
    pub total_day_charge: f64,
    #[serde(rename = "Total_eve_calls", deserialize_with = "lenient::integer")]
    pub total_eve_calls: i64,
    #[serde(rename = "Total_eve_charge", deserialize_with = "lenient::float")]
    pub total_eve_charge: f64,
    #[serde(rename = "Total_night_calls", deserialize_with = "lenient::integer")]
    pub total_night_calls: i64,
    #[serde(rename = "Total_night_charge", deserialize_with = "lenient::float")]
    pub total_night_charge: f64,
    #[serde(rename = "Total_intl_calls", deserialize_with = "lenient::integer")]
    pub total_intl_calls: i64,
    #[serde(rename = "Total_intl_charge", deserialize_with = "lenient::float")]
    pub total_intl_charge: f64,
    #[serde(rename = "Customer_service_calls", deserialize_with = "lenient::integer")]
    pub customer_service_calls: i64,
}

/// Numeric coercion for request fields.
mod lenient {
    use std::fmt;

    use serde::Deserializer;
    use serde::de::{Error, Unexpected, Visitor};

    pub fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        deserializer.deserialize_any(IntegerVisitor)
    }

    pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(FloatVisitor)
    }

    fn integral(v: f64) -> Option<i64> {
        // 2^63 is exactly representable; anything at or above it overflows i64.
        (v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64)
            .then_some(v as i64)
    }

    struct IntegerVisitor;

    impl Visitor<'_> for IntegerVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an integer, a float with no fractional part, or an integer string")
        }

        fn visit_i64<E: Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
        }

        fn visit_f64<E: Error>(self, v: f64) -> Result<i64, E> {
            integral(v).ok_or_else(|| E::invalid_value(Unexpected::Float(v), &self))
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<i64, E> {
            let text = v.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(integral))
                .ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
        }
    }

    struct FloatVisitor;

    impl Visitor<'_> for FloatVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number or a numeric string")
        }

        fn visit_i64<E: Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_f64<E: Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<f64, E> {
            v.trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
        }
    }
}

/// A training-frame cell before encoding and scaling.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Category(String),
    Integer(i64),
    Float(f64),
}

impl RawValue {
    /// Numeric view of the cell; `None` for categories.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Category(_) => None,
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            Self::Category(v) => Some(v),
            _ => None,
        }
    }
}

/// A [`CustomerRecord`] renamed to training column names, in training order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    cells: Vec<(&'static str, RawValue)>,
}

impl TrainingRow {
    /// Look up a cell by training column name.
    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.cells
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.cells.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Single-row batch typed by [`training_schema`].
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let arrays: Vec<ArrayRef> = self
            .cells
            .iter()
            .map(|(_, value)| -> ArrayRef {
                match value {
                    RawValue::Category(v) => Arc::new(StringArray::from(vec![v.as_str()])),
                    RawValue::Integer(v) => Arc::new(Int64Array::from(vec![*v])),
                    RawValue::Float(v) => Arc::new(Float64Array::from(vec![*v])),
                }
            })
            .collect();
        RecordBatch::try_new(Arc::new(training_schema()), arrays)
    }
}

impl CustomerRecord {
    /// Rename request fields to the names the artifacts were fitted with.
    pub fn to_training_row(&self) -> TrainingRow {
        use RawValue::{Category, Float, Integer};

        let cells = vec![
            (columns::STATE, Category(self.state.clone())),
            (columns::ACCOUNT_LENGTH, Integer(self.account_length)),
            (columns::AREA_CODE, Integer(self.area_code)),
            (
                columns::INTERNATIONAL_PLAN,
                Category(self.international_plan.clone()),
            ),
            (columns::VOICE_MAIL_PLAN, Category(self.voice_mail_plan.clone())),
            (
                columns::NUMBER_VMAIL_MESSAGES,
                Integer(self.number_vmail_messages),
            ),
            (columns::TOTAL_DAY_CALLS, Integer(self.total_day_calls)),
            (columns::TOTAL_DAY_CHARGE, Float(self.total_day_charge)),
            (columns::TOTAL_EVE_CALLS, Integer(self.total_eve_calls)),
            (columns::TOTAL_EVE_CHARGE, Float(self.total_eve_charge)),
            (columns::TOTAL_NIGHT_CALLS, Integer(self.total_night_calls)),
            (columns::TOTAL_NIGHT_CHARGE, Float(self.total_night_charge)),
            (columns::TOTAL_INTL_CALLS, Integer(self.total_intl_calls)),
            (columns::TOTAL_INTL_CHARGE, Float(self.total_intl_charge)),
            (
                columns::CUSTOMER_SERVICE_CALLS,
                Integer(self.customer_service_calls),
            ),
        ];
        debug_assert!(
            cells
                .iter()
                .map(|(name, _)| *name)
                .eq(TRAINING_COLUMNS.iter().copied())
        );
        TrainingRow { cells }
    }
}

/// Predicted label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChurnClass {
    #[serde(rename = "No Churn")]
    NoChurn,
    #[serde(rename = "Churn")]
    Churn,
}

impl ChurnClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoChurn => "No Churn",
            Self::Churn => "Churn",
        }
    }

    /// Map the classifier's positive-class flag to a label.
    pub fn from_flag(churn: bool) -> Self {
        if churn { Self::Churn } else { Self::NoChurn }
    }
}

impl std::fmt::Display for ChurnClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-way class distribution. Serialises with the label names as keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    #[serde(rename = "No Churn")]
    pub no_churn: f64,
    #[serde(rename = "Churn")]
    pub churn: f64,
}

impl Probabilities {
    /// Most probable class. A tie goes to the first class, as numpy's argmax does.
    pub fn argmax(&self) -> ChurnClass {
        ChurnClass::from_flag(self.churn > self.no_churn)
    }

    pub fn total(&self) -> f64 {
        self.no_churn + self.churn
    }
}

/// Response body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_class: ChurnClass,
    pub probabilities: Probabilities,
}
