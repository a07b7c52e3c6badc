//! HTTP client for sending customer records to a churn prediction service.

use churn_core::{CustomerRecord, Prediction};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client for a service's `POST /predict` endpoint.
pub struct PredictClient {
    client: reqwest::Client,
    base_url: String,
}

impl PredictClient {
    /// Create a client for the given base URL, e.g. `http://localhost:8000`.
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.base_url)
    }

    /// Request a prediction for one record.
    ///
    /// Non-2xx responses come back as [`ClientError::Server`] with the body
    /// the service sent (validation detail for 422).
    pub async fn predict(&self, record: &CustomerRecord) -> Result<Prediction, ClientError> {
        let url = self.predict_url();

        info!(url = %url, state = %record.state, "requesting prediction");
        let resp = self.client.post(&url).json(record).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let prediction: Prediction = serde_json::from_str(&body)?;
        info!(predicted_class = %prediction.predicted_class, "prediction received");
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use churn_core::{ChurnClass, Probabilities};

    #[test]
    fn client_trims_trailing_slash() {
        let client = PredictClient::new("http://localhost:8000/".into());
        assert_eq!(client.base_url, "http://localhost:8000");
        assert_eq!(client.predict_url(), "http://localhost:8000/predict");
    }

    #[test]
    fn parses_service_response() {
        let body = r#"{
            "predicted_class": "No Churn",
            "probabilities": {"No Churn": 0.92, "Churn": 0.08}
        }"#;
        let parsed: Prediction = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.predicted_class, ChurnClass::NoChurn);
        assert_eq!(
            parsed.probabilities,
            Probabilities {
                no_churn: 0.92,
                churn: 0.08
            }
        );
    }

    #[test]
    fn rejects_unknown_label() {
        let body = r#"{
            "predicted_class": "Maybe",
            "probabilities": {"No Churn": 0.5, "Churn": 0.5}
        }"#;
        assert!(serde_json::from_str::<Prediction>(body).is_err());
    }

    #[test]
    fn record_serialises_with_request_names() {
        let record = CustomerRecord {
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
        };
        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 15);
        assert_eq!(object["Account_length"], 100);
        assert_eq!(object["Voice_mail_plan"], "yes");
    }

    #[tokio::test]
    async fn unreachable_service_is_http_error() {
        // Port 9 (discard) is not expected to run an HTTP service locally.
        let client = PredictClient::new("http://127.0.0.1:9".into());
        let record: CustomerRecord = serde_json::from_str(
            r#"{"State": "OH", "Account_length": 1, "Area_code": 415,
                "International_plan": "no", "Voice_mail_plan": "no",
                "Number_vmail_messages": 0, "Total_day_calls": 1, "Total_day_charge": 1.0,
                "Total_eve_calls": 1, "Total_eve_charge": 1.0, "Total_night_calls": 1,
                "Total_night_charge": 1.0, "Total_intl_calls": 1, "Total_intl_charge": 1.0,
                "Customer_service_calls": 0}"#,
        )
        .unwrap();
        let err = client.predict(&record).await.unwrap_err();
        assert!(matches!(err, ClientError::Http(_)), "{err}");
    }
}
