//! Text rendering for the CLI: prediction cards, feature tables, artifact summaries.
//!
//! Cards are built from the single-row training batch so every value is
//! shown under the column name the artifacts were fitted with.

use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use arrow::util::pretty::pretty_format_batches;
use churn_core::Prediction;
use churn_core::schema::columns::*;
use churn_model::ArtifactSummary;

// ── Card section groupings ──

const ACCOUNT: &[&str] = &[STATE, ACCOUNT_LENGTH, AREA_CODE];

const PLANS: &[&str] = &[INTERNATIONAL_PLAN, VOICE_MAIL_PLAN, NUMBER_VMAIL_MESSAGES];

const USAGE: &[&str] = &[
    TOTAL_DAY_CALLS,
    TOTAL_DAY_CHARGE,
    TOTAL_EVE_CALLS,
    TOTAL_EVE_CHARGE,
    TOTAL_NIGHT_CALLS,
    TOTAL_NIGHT_CHARGE,
    TOTAL_INTL_CALLS,
    TOTAL_INTL_CHARGE,
];

const SUPPORT: &[&str] = &[CUSTOMER_SERVICE_CALLS];

// ── Public API ──

/// Vertical card: the customer's raw row grouped by section, then the prediction.
pub fn render_prediction_card(raw: &RecordBatch, prediction: &Prediction) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(out, "=== {} ===", prediction.predicted_class)?;
    writeln!(out)?;

    render_section(&mut out, raw, "Account", ACCOUNT)?;
    render_section(&mut out, raw, "Plans", PLANS)?;
    render_section(&mut out, raw, "Usage", USAGE)?;
    render_section(&mut out, raw, "Support", SUPPORT)?;

    writeln!(out, "Prediction")?;
    writeln!(out, "  {:<26} {}", "predicted_class", prediction.predicted_class)?;
    writeln!(
        out,
        "  {:<26} {:.4}",
        "P(No Churn)", prediction.probabilities.no_churn
    )?;
    writeln!(out, "  {:<26} {:.4}", "P(Churn)", prediction.probabilities.churn)?;
    Ok(out)
}

/// One row per training column: raw value next to the encoded/scaled feature.
pub fn render_feature_table(raw: &RecordBatch, features: &RecordBatch) -> anyhow::Result<String> {
    let schema = raw.schema();
    let mut names = Vec::with_capacity(schema.fields().len());
    let mut raw_values = Vec::with_capacity(schema.fields().len());
    let mut feature_values = Vec::with_capacity(schema.fields().len());

    for (i, field) in schema.fields().iter().enumerate() {
        let feature = features
            .column_by_name(field.name())
            .and_then(|col| col.as_any().downcast_ref::<Float64Array>().map(|a| a.value(0)))
            .ok_or_else(|| anyhow::anyhow!("feature row has no float '{}' column", field.name()))?;

        names.push(field.name().clone());
        raw_values.push(array_value_to_string(raw.column(i).as_ref(), 0)?);
        feature_values.push(feature);
    }

    let table = RecordBatch::try_from_iter(vec![
        ("column", Arc::new(StringArray::from(names)) as ArrayRef),
        ("raw", Arc::new(StringArray::from(raw_values)) as ArrayRef),
        ("feature", Arc::new(Float64Array::from(feature_values)) as ArrayRef),
    ])?;
    Ok(pretty_format_batches(&[table])?.to_string())
}

pub fn render_artifact_summary(dir: &Path, summary: &ArtifactSummary) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "=== artifacts: {} ===", dir.display());
    let _ = writeln!(out, "  {:<26} {} classes", "state_encoder", summary.state_classes);
    let _ = writeln!(
        out,
        "  {:<26} {} classes",
        "intl_plan_encoder", summary.intl_plan_classes
    );
    let _ = writeln!(out, "  {:<26} {} classes", "vm_plan_encoder", summary.vm_plan_classes);
    let _ = writeln!(out, "  {:<26} {} features", "scaler", summary.scaler_features);
    let _ = writeln!(out, "  {:<26} {}", "classifier", summary.classifier);
    let _ = writeln!(out, "  {:<26} ok", "feature layout");
    out
}

// ── Section rendering ──

fn render_section(
    out: &mut String,
    batch: &RecordBatch,
    header: &str,
    cols: &[&str],
) -> anyhow::Result<()> {
    writeln!(out, "{header}")?;
    for &col_name in cols {
        let Some(col) = batch.column_by_name(col_name) else {
            continue;
        };
        if col.is_null(0) {
            continue;
        }
        writeln!(
            out,
            "  {:<26} {}",
            col_name,
            array_value_to_string(col.as_ref(), 0)?
        )?;
    }
    Ok(())
}
