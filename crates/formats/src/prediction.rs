//! Prediction service payloads: the success body (`zone id -> demand`) and
//! the error body (`{"error": "..."}`).

use foundation::{ZoneId, parse_leading_int};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("prediction response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("prediction response must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Raw service response, kept entry-by-entry so each one can be judged on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionPayload {
    entries: Map<String, Value>,
}

/// Interpretation of one response value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Demand {
    Value(f64),
    /// Negative values flag a per-zone failure upstream.
    Sentinel(f64),
    NotNumeric,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionEntry<'a> {
    pub key: &'a str,
    /// Integer prefix of `key`; `None` when the key is not a number at all.
    pub id: Option<i64>,
    /// `id` as a zone id, when it is one.
    pub zone: Option<ZoneId>,
    pub demand: Demand,
}

impl PredictionPayload {
    pub fn from_json_str(payload: &str) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_str(payload)?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> Result<Self, PayloadError> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            other => Err(PayloadError::NotAnObject(json_kind(&other))),
        }
    }

    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, f64)>) -> Self {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| {
                let value = Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null);
                (k.into(), value)
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = PredictionEntry<'_>> {
        self.entries.iter().map(|(key, value)| {
            let id = parse_leading_int(key);
            PredictionEntry {
                key: key.as_str(),
                id,
                zone: id.and_then(ZoneId::try_from_i64),
                demand: classify(value),
            }
        })
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries)
    }
}

fn classify(value: &Value) -> Demand {
    match value.as_f64() {
        Some(d) if d < 0.0 => Demand::Sentinel(d),
        Some(d) => Demand::Value(d),
        None => Demand::NotNumeric,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: Option<Value>,
}

/// Pulls the `error` message out of a failed response body, if it has one.
pub fn service_error_message(body: &str) -> Option<String> {
    let parsed: ServiceErrorBody = serde_json::from_str(body).ok()?;
    match parsed.error? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::String(_) | Value::Null => None,
        other => Some(other.to_string()),
    }
}
