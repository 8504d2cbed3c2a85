use std::future::Future;

use formats::{PredictionPayload, service_error_message};
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::config::ForecastConfig;
use crate::error::ForecastError;
use crate::query::PredictionQuery;

/// Anything that can answer a prediction query.
pub trait PredictionSource {
    fn fetch(
        &self,
        query: &PredictionQuery,
    ) -> impl Future<Output = Result<PredictionPayload, ForecastError>> + Send;
}

/// `GET {base}/predict?date=..&time=..` against the demand service.
#[derive(Debug, Clone)]
pub struct HttpPredictionSource {
    client: Client,
    base_url: String,
}

impl HttpPredictionSource {
    pub fn new(config: &ForecastConfig) -> Result<Self, ForecastError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, &config.api_base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/predict", self.base_url)
    }
}

impl PredictionSource for HttpPredictionSource {
    async fn fetch(&self, query: &PredictionQuery) -> Result<PredictionPayload, ForecastError> {
        let url = self.endpoint();
        info!(%url, date = %query.date, time = %query.time, "fetching predictions");

        let resp = self
            .client
            .get(&url)
            .query(&[("date", query.date.as_str()), ("time", query.time.as_str())])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.ok();
            return Err(service_error(status, body.as_deref()));
        }

        let body = resp.text().await?;
        let payload = PredictionPayload::from_json_str(&body)?;
        debug!(entries = payload.len(), "predictions received");
        Ok(payload)
    }
}

/// Non-2xx response: the body's `error` message if it has one, else the reason phrase.
fn service_error(status: StatusCode, body: Option<&str>) -> ForecastError {
    let message = body
        .and_then(service_error_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string()
        });
    ForecastError::Service {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::service_error;
    use reqwest::StatusCode;

    #[test]
    fn unreadable_error_body_falls_back_to_reason_phrase() {
        assert_eq!(
            service_error(StatusCode::BAD_GATEWAY, None).to_string(),
            "API Error (502): Bad Gateway"
        );
    }

    #[test]
    fn error_body_message_wins_over_reason_phrase() {
        let err = service_error(
            StatusCode::BAD_REQUEST,
            Some(r#"{"error": "Invalid date or time format."}"#),
        );
        assert_eq!(err.to_string(), "API Error (400): Invalid date or time format.");
        assert_eq!(
            service_error(StatusCode::NOT_FOUND, Some("<html>nope</html>")).to_string(),
            "API Error (404): Not Found"
        );
    }
}
