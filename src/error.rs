//! Error types for the climate-insights engine.

use thiserror::Error;

/// Result type alias for analysis, training and forecasting operations.
pub type Result<T> = std::result::Result<T, InsightsError>;

/// Errors that can occur anywhere in the analytical pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InsightsError {
    /// Missing or malformed request input (city, horizon, dates).
    #[error("invalid input: {0}")]
    InputValidation(String),

    /// No trained model or no stored history for the requested city.
    #[error("not found: {0}")]
    NotFound(String),

    /// Not enough daily observations for the requested operation.
    #[error("insufficient history: need at least {needed} days, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    /// The candidate grid was exhausted without a single converging fit.
    #[error("no convergent model among {candidates} candidates; widen the grid and retry")]
    NoConvergentModel { candidates: usize },

    /// The remote geocoding/weather collaborator returned empty or malformed data.
    #[error("upstream data error: {0}")]
    UpstreamData(String),

    /// Clustering was attempted on an empty monthly table.
    #[error("empty dataset: {0}")]
    EmptyDataset(String),

    /// A single model fit did not converge.
    #[error("optimizer did not converge: {0}")]
    ConvergenceFailure(String),

    /// Dimension mismatch between aligned inputs.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Numerical failure (singular system, non-finite objective).
    #[error("computation error: {0}")]
    Computation(String),

    /// Reading or writing a model artifact failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl InsightsError {
    /// Short machine-readable kind, used in run logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputValidation(_) => "input_validation",
            Self::NotFound(_) => "not_found",
            Self::InsufficientHistory { .. } => "insufficient_history",
            Self::NoConvergentModel { .. } => "no_convergent_model",
            Self::UpstreamData(_) => "upstream_data",
            Self::EmptyDataset(_) => "empty_dataset",
            Self::ConvergenceFailure(_) => "convergence_failure",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::Computation(_) => "computation",
            Self::Persistence(_) => "persistence",
        }
    }
}

impl From<std::io::Error> for InsightsError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for InsightsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = InsightsError::InsufficientHistory {
            needed: 1095,
            got: 400,
        };
        assert_eq!(
            err.to_string(),
            "insufficient history: need at least 1095 days, got 400"
        );

        let err = InsightsError::NoConvergentModel { candidates: 24 };
        assert_eq!(
            err.to_string(),
            "no convergent model among 24 candidates; widen the grid and retry"
        );

        let err = InsightsError::EmptyDataset("no monthly rows".to_string());
        assert_eq!(err.to_string(), "empty dataset: no monthly rows");
    }

    #[test]
    fn io_errors_become_persistence_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "meta.json");
        let err: InsightsError = io.into();
        assert_eq!(err.kind(), "persistence");
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = InsightsError::NotFound("paris_fr".to_string());
        let err2 = err1.clone();
        assert_eq!(err1, err2);
        assert_eq!(err1.kind(), "not_found");
    }
}
