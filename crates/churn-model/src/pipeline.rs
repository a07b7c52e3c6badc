//! Feature pipeline: rename → encode categoricals → scale numerics → assemble.
//!
//! The steps run in that order for every record, and the assembled vector
//! always follows [`TRAINING_COLUMNS`].

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use arrow::record_batch::RecordBatch;
use churn_core::schema::{NUMERIC_COLUMNS, TRAINING_COLUMNS, columns, feature_schema};
use churn_core::{CustomerRecord, RawValue, TrainingRow};
use tracing::debug;

use crate::ModelError;
use crate::artifact::{CategoricalEncoder, NumericScaler};

/// Encoded and scaled features in training column order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of one training column.
    pub fn get(&self, column: &str) -> Option<f64> {
        TRAINING_COLUMNS
            .iter()
            .position(|c| *c == column)
            .and_then(|i| self.values.get(i).copied())
    }

    /// Single-row batch typed by [`feature_schema`].
    pub fn to_record_batch(&self) -> Result<RecordBatch, ModelError> {
        let arrays: Vec<ArrayRef> = self
            .values
            .iter()
            .map(|&v| Arc::new(Float64Array::from(vec![v])) as ArrayRef)
            .collect();
        Ok(RecordBatch::try_new(Arc::new(feature_schema()), arrays)?)
    }
}

/// Turns one [`CustomerRecord`] into one [`FeatureVector`].
#[derive(Clone)]
pub struct FeaturePipeline {
    state_encoder: Arc<dyn CategoricalEncoder>,
    intl_plan_encoder: Arc<dyn CategoricalEncoder>,
    vm_plan_encoder: Arc<dyn CategoricalEncoder>,
    scaler: Arc<dyn NumericScaler>,
}

impl FeaturePipeline {
    pub fn new(
        state_encoder: Arc<dyn CategoricalEncoder>,
        intl_plan_encoder: Arc<dyn CategoricalEncoder>,
        vm_plan_encoder: Arc<dyn CategoricalEncoder>,
        scaler: Arc<dyn NumericScaler>,
    ) -> Self {
        Self {
            state_encoder,
            intl_plan_encoder,
            vm_plan_encoder,
            scaler,
        }
    }

    pub fn transform(&self, record: &CustomerRecord) -> Result<FeatureVector, ModelError> {
        self.transform_row(&record.to_training_row())
    }

    /// Encode and scale an already renamed row.
    pub fn transform_row(&self, row: &TrainingRow) -> Result<FeatureVector, ModelError> {
        let state = self.state_encoder.transform(category(row, columns::STATE)?)?;
        let intl_plan = self
            .intl_plan_encoder
            .transform(category(row, columns::INTERNATIONAL_PLAN)?)?;
        let vm_plan = self
            .vm_plan_encoder
            .transform(category(row, columns::VOICE_MAIL_PLAN)?)?;

        let numeric = NUMERIC_COLUMNS
            .iter()
            .map(|c| number(row, c))
            .collect::<Result<Vec<_>, _>>()?;
        let scaled = self.scaler.transform(&numeric)?;
        if scaled.len() != NUMERIC_COLUMNS.len() {
            return Err(ModelError::FeatureMismatch {
                expected: NUMERIC_COLUMNS.len(),
                found: scaled.len(),
            });
        }

        // Numeric columns appear in the training frame in scaler order.
        let mut scaled = scaled.into_iter();
        let values = TRAINING_COLUMNS
            .iter()
            .map(|&column| match column {
                columns::STATE => Ok(state as f64),
                columns::INTERNATIONAL_PLAN => Ok(intl_plan as f64),
                columns::VOICE_MAIL_PLAN => Ok(vm_plan as f64),
                _ => scaled
                    .next()
                    .ok_or_else(|| ModelError::MissingColumn(column.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(state, intl_plan, vm_plan, dim = values.len(), "assembled feature vector");
        Ok(FeatureVector { values })
    }
}

fn category<'a>(row: &'a TrainingRow, column: &str) -> Result<&'a str, ModelError> {
    row.get(column)
        .and_then(RawValue::as_category)
        .ok_or_else(|| ModelError::MissingColumn(column.to_string()))
}

fn number(row: &TrainingRow, column: &str) -> Result<f64, ModelError> {
    row.get(column)
        .and_then(RawValue::as_f64)
        .ok_or_else(|| ModelError::MissingColumn(column.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::{LabelEncoder, StandardScaler};

    /// Scaler that records its input and returns it unchanged plus an offset.
    struct OffsetScaler {
        offset: f64,
        calls: AtomicUsize,
    }

    impl NumericScaler for OffsetScaler {
        fn n_features(&self) -> usize {
            NUMERIC_COLUMNS.len()
        }

        fn feature_names(&self) -> Option<&[String]> {
            None
        }

        fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(values.iter().map(|v| v + self.offset).collect())
        }
    }

    fn record() -> CustomerRecord {
        CustomerRecord {
            state: "OH".into(),
            account_length: 100,
            area_code: 415,
            international_plan: "no".into(),
            voice_mail_plan: "yes".into(),
            number_vmail_messages: 25,
            total_day_calls: 100,
            total_day_charge: 30.5,
            total_eve_calls: 90,
            total_eve_charge: 15.2,
            total_night_calls: 80,
            total_night_charge: 9.1,
            total_intl_calls: 4,
            total_intl_charge: 2.5,
            customer_service_calls: 1,
        }
    }

    fn encoder(name: &str, classes: &[&str]) -> Arc<dyn CategoricalEncoder> {
        Arc::new(
            LabelEncoder::new(name, classes.iter().map(|s| s.to_string()).collect()).unwrap(),
        )
    }

    fn pipeline(scaler: Arc<dyn NumericScaler>) -> FeaturePipeline {
        FeaturePipeline::new(
            encoder("state_encoder", &["CA", "NY", "OH"]),
            encoder("intl_plan_encoder", &["no", "yes"]),
            encoder("vm_plan_encoder", &["no", "yes"]),
            scaler,
        )
    }

    #[test]
    fn assembles_in_training_order() {
        let scaler = Arc::new(OffsetScaler {
            offset: 0.0,
            calls: AtomicUsize::new(0),
        });
        let features = pipeline(scaler).transform(&record()).unwrap();

        assert_eq!(
            features.as_slice(),
            &[
                2.0, 100.0, 415.0, 0.0, 1.0, 25.0, 100.0, 30.5, 90.0, 15.2, 80.0, 9.1, 4.0, 2.5,
                1.0
            ]
        );
        assert_eq!(features.get("State"), Some(2.0));
        assert_eq!(features.get("Customer service calls"), Some(1.0));
        assert_eq!(features.get("Customer_service_calls"), None);
    }

    #[test]
    fn scaler_sees_only_numeric_columns() {
        let scaler = Arc::new(OffsetScaler {
            offset: 1000.0,
            calls: AtomicUsize::new(0),
        });
        let features = pipeline(scaler.clone()).transform(&record()).unwrap();

        assert_eq!(scaler.calls.load(Ordering::SeqCst), 1);
        for column in TRAINING_COLUMNS {
            let value = features.get(column).unwrap();
            if NUMERIC_COLUMNS.contains(&column) {
                assert!(value >= 1000.0, "{column} should be scaled");
            } else {
                assert!(value < 1000.0, "{column} should not be scaled");
            }
        }
    }

    #[test]
    fn standard_scaler_output_lands_in_place() {
        let scaler = StandardScaler::new(
            None,
            Some(vec![100.0; NUMERIC_COLUMNS.len()]),
            Some(vec![10.0; NUMERIC_COLUMNS.len()]),
        )
        .unwrap();
        let features = pipeline(Arc::new(scaler)).transform(&record()).unwrap();

        assert_eq!(features.len(), 15);
        assert!((features.get("Account length").unwrap() - 0.0).abs() < 1e-12);
        assert!((features.get("Area code").unwrap() - 31.5).abs() < 1e-12);
        assert!((features.get("Total eve calls").unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_state_stops_before_scaling() {
        let scaler = Arc::new(OffsetScaler {
            offset: 0.0,
            calls: AtomicUsize::new(0),
        });
        let mut rec = record();
        rec.state = "ZZ".into();

        let err = pipeline(scaler.clone()).transform(&rec).unwrap_err();
        assert!(matches!(
            err,
            ModelError::UnknownCategory { ref encoder, ref value }
                if encoder == "state_encoder" && value == "ZZ"
        ));
        assert_eq!(scaler.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_plan_value_fails() {
        let scaler = Arc::new(OffsetScaler {
            offset: 0.0,
            calls: AtomicUsize::new(0),
        });
        let mut rec = record();
        rec.voice_mail_plan = "sometimes".into();

        let err = pipeline(scaler).transform(&rec).unwrap_err();
        assert!(matches!(err, ModelError::UnknownCategory { .. }));
    }

    #[test]
    fn scaler_dimension_error_propagates() {
        let scaler = StandardScaler::new(None, Some(vec![0.0; 11]), None).unwrap();
        let err = pipeline(Arc::new(scaler)).transform(&record()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::FeatureMismatch {
                expected: 11,
                found: 12
            }
        ));
    }

    #[test]
    fn record_batch_has_one_float_row() {
        let scaler = Arc::new(OffsetScaler {
            offset: 0.0,
            calls: AtomicUsize::new(0),
        });
        let batch = pipeline(scaler)
            .transform(&record())
            .unwrap()
            .to_record_batch()
            .unwrap();
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.num_columns(), 15);
        assert_eq!(batch.schema().field(0).name(), "State");
    }
}
