pub mod client;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod query;
pub mod status;

pub use client::{HttpPredictionSource, PredictionSource};
pub use config::ForecastConfig;
pub use error::ForecastError;
pub use orchestrator::{FetchOutcome, Orchestrator, PendingRequest, RequestSequencer, RequestToken};
pub use query::PredictionQuery;
pub use status::Status;
