use formats::PayloadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Please select both a date and a time.")]
    Validation,
    #[error("API Error ({status}): {message}")]
    Service { status: u16, message: String },
    #[error("prediction request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unreadable prediction response: {0}")]
    Payload(#[from] PayloadError),
}

#[cfg(test)]
mod tests {
    use super::ForecastError;

    #[test]
    fn user_facing_messages() {
        assert_eq!(
            ForecastError::Validation.to_string(),
            "Please select both a date and a time."
        );
        let err = ForecastError::Service {
            status: 400,
            message: "Missing 'date' or 'time'.".to_string(),
        };
        assert_eq!(err.to_string(), "API Error (400): Missing 'date' or 'time'.");
    }
}
