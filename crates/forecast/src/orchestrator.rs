//! Predict-button flow: validate, clear, fetch, render.
//!
//! Each issued request gets a token. Only the completion carrying the most
//! recent token may touch the map; older ones are dropped as stale, so a slow
//! early response can never overwrite a newer one.

use formats::PredictionPayload;
use layers::{RenderSummary, ZoneMap};
use tracing::{error, info, warn};

use crate::client::PredictionSource;
use crate::error::ForecastError;
use crate::query::PredictionQuery;
use crate::status::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: u64,
}

impl RequestSequencer {
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub token: RequestToken,
    pub query: PredictionQuery,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Rendered(RenderSummary),
    /// A newer request was issued before this one completed.
    Stale(RequestToken),
}

#[derive(Debug)]
pub struct Orchestrator {
    sequencer: RequestSequencer,
    status: Status,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            sequencer: RequestSequencer::default(),
            status: Status::Idle,
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Validates the inputs and clears the map ahead of the response.
    /// No state changes on validation failure apart from the status text.
    pub fn issue(
        &mut self,
        map: &mut ZoneMap,
        date: &str,
        time: &str,
    ) -> Result<PendingRequest, ForecastError> {
        let query = match PredictionQuery::new(date, time) {
            Ok(q) => q,
            Err(err) => {
                warn!("prediction request rejected: {err}");
                self.status = Status::Failed(err.to_string());
                return Err(err);
            }
        };
        map.clear();
        let token = self.sequencer.issue();
        self.status = Status::Predicting;
        Ok(PendingRequest { token, query })
    }

    pub fn complete(
        &mut self,
        map: &mut ZoneMap,
        pending: PendingRequest,
        result: Result<PredictionPayload, ForecastError>,
    ) -> Result<FetchOutcome, ForecastError> {
        if !self.sequencer.is_current(pending.token) {
            info!(token = pending.token.0, "discarding stale prediction response");
            return Ok(FetchOutcome::Stale(pending.token));
        }

        match result {
            Ok(payload) => {
                let summary = map.render(&payload, &pending.query.time_context());
                self.status = Status::Rendered(summary.clone());
                Ok(FetchOutcome::Rendered(summary))
            }
            Err(err) => {
                error!("error fetching or processing predictions: {err}");
                map.clear();
                self.status = Status::Failed(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn request_predictions<S: PredictionSource>(
        &mut self,
        map: &mut ZoneMap,
        source: &S,
        date: &str,
        time: &str,
    ) -> Result<FetchOutcome, ForecastError> {
        let pending = self.issue(map, date, time)?;
        let result = source.fetch(&pending.query).await;
        self.complete(map, pending, result)
    }

    /// The "Clear Predictions" action.
    pub fn clear(&mut self, map: &mut ZoneMap) {
        map.clear();
        self.status = Status::Cleared;
    }
}
