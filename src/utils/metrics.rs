//! Accuracy metrics for forecast evaluation.

use crate::error::{InsightsError, Result};

/// Error summary between actual and predicted values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
}

/// Calculate MAE and RMSE between aligned slices.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() {
        return Err(InsightsError::EmptyDataset(
            "no values to score".to_string(),
        ));
    }
    if actual.len() != predicted.len() {
        return Err(InsightsError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    Ok(AccuracyMetrics {
        mae: mae(actual, predicted),
        rmse: rmse(actual, predicted),
    })
}

/// Mean absolute error; NaN on length mismatch or empty input.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Root mean squared error; NaN on length mismatch or empty input.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let mse = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;
    mse.sqrt()
}
