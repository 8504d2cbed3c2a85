use std::fmt;

use layers::RenderSummary;

/// Content of the status text region.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Predicting,
    Rendered(RenderSummary),
    Cleared,
    Failed(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => Ok(()),
            Status::Predicting => write!(f, "Predicting demand..."),
            Status::Rendered(summary) => write!(f, "{summary}"),
            Status::Cleared => write!(f, "Predictions cleared."),
            Status::Failed(message) => write!(f, "Error: {message}"),
        }
    }
}
