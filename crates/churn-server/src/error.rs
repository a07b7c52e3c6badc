use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use churn_model::ModelError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Failures surfaced by `POST /predict`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body missing, malformed, or not matching the record schema.
    #[error("invalid request body: {0}")]
    Validation(#[from] JsonRejection),

    /// Anything after validation: unknown category, feature mismatch.
    #[error("prediction failed: {0}")]
    Model(#[from] ModelError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(rejection) => {
                let detail = rejection.body_text();
                warn!(status = %rejection.status(), %detail, "rejected request body");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "detail": detail })),
                )
                    .into_response()
            }
            // The cause stays in the log; callers get a generic failure.
            Self::Model(err) => {
                error!(error = %err, "prediction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}
