use chrono::{Days, NaiveDate};
use layers::TimeContext;

use crate::error::ForecastError;

pub const DEFAULT_QUERY_TIME: &str = "12:00";

/// Validated request parameters: `date` as `YYYY-MM-DD`, `time` as `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionQuery {
    pub date: String,
    pub time: String,
}

impl PredictionQuery {
    /// Fails when either field is blank. Formatting is left to the service.
    pub fn new(date: &str, time: &str) -> Result<Self, ForecastError> {
        let (date, time) = (date.trim(), time.trim());
        if date.is_empty() || time.is_empty() {
            return Err(ForecastError::Validation);
        }
        Ok(Self {
            date: date.to_string(),
            time: time.to_string(),
        })
    }

    pub fn time_context(&self) -> TimeContext {
        TimeContext::new(self.date.clone(), self.time.clone())
    }
}

/// Pre-filled date: the day after `today`.
pub fn default_query_date(today: NaiveDate) -> String {
    today
        .checked_add_days(Days::new(1))
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string()
}

pub fn default_query_date_local() -> String {
    default_query_date(chrono::Local::now().date_naive())
}
