//! HTTP surface: `POST /predict` behind a fully permissive CORS layer.
//!
//! The router owns no state of its own; it is handed a [`PredictionService`]
//! built from the artifact store at startup.

mod error;
pub use error::ApiError;

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use churn_core::{CustomerRecord, Prediction};
use churn_model::PredictionService;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
struct AppState {
    service: Arc<PredictionService>,
}

/// Build the application router.
pub fn router(service: PredictionService) -> Router {
    let state = AppState {
        service: Arc::new(service),
    };
    Router::new()
        .route("/predict", post(predict))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// Every origin, method, and header is allowed, with credentials.
///
/// Credentials cannot be combined with a literal `*`, so origin, methods,
/// and headers are mirrored back from the request instead.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<CustomerRecord>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let Json(record) = payload?;
    let prediction = state.service.predict(&record)?;
    Ok(Json(prediction))
}

/// Serve on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, service: PredictionService) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
