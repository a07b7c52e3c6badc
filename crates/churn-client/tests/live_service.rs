//! Client against a real server bound to an ephemeral port.

use std::path::PathBuf;

use churn_client::{ClientError, PredictClient};
use churn_core::{ChurnClass, CustomerRecord};
use churn_model::ArtifactStore;

async fn start_service() -> String {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../artifacts");
    let service = ArtifactStore::load(&dir).unwrap().into_service();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(churn_server::serve(listener, service));
    format!("http://{addr}")
}

fn record(state: &str) -> CustomerRecord {
    CustomerRecord {
        state: state.into(),
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

#[tokio::test]
async fn round_trip_prediction() {
    let client = PredictClient::new(start_service().await);
    let prediction = client.predict(&record("OH")).await.unwrap();
    assert_eq!(prediction.predicted_class, ChurnClass::NoChurn);
    assert!((prediction.probabilities.total() - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn server_failure_carries_status() {
    let client = PredictClient::new(start_service().await);
    let err = client.predict(&record("ZZ")).await.unwrap_err();
    match err {
        ClientError::Server { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("Internal Server Error"), "{body}");
        }
        other => panic!("expected server error, got {other:?}"),
    }
}
