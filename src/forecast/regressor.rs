//! Recursive forecasting with the decision-forest regressor.
//!
//! Each predicted day is appended to the history before the next day's lag
//! and rolling features are built, so later steps consume earlier forecasts.

use super::{ForecastResponse, PredictionPoint};
use crate::core::DailySeries;
use crate::error::{InsightsError, Result};
use crate::features::lagged_features;
use crate::training::TrainedForest;
use chrono::{Duration, NaiveDate};

/// Fewest usable history days accepted by default.
pub const MIN_FORECAST_DAYS: usize = 15;

/// Forest forecaster for one city.
#[derive(Debug, Clone)]
pub struct ForestForecaster {
    trained: TrainedForest,
    model_info: serde_json::Value,
    min_history: usize,
}

impl ForestForecaster {
    pub fn new(trained: TrainedForest) -> Result<Self> {
        let model_info = serde_json::to_value(&trained.meta)?;
        Ok(Self {
            trained,
            model_info,
            min_history: MIN_FORECAST_DAYS,
        })
    }

    /// Set the minimum number of usable history days.
    pub fn with_min_history(mut self, days: usize) -> Self {
        self.min_history = days;
        self
    }

    pub fn trained(&self) -> &TrainedForest {
        &self.trained
    }

    /// Forecast `horizon` days after the last usable observation.
    pub fn forecast(
        &self,
        city_key: &str,
        history: &[(NaiveDate, f64)],
        horizon: usize,
    ) -> Result<ForecastResponse> {
        let usable: Vec<(NaiveDate, f64)> = history
            .iter()
            .copied()
            .filter(|(_, v)| v.is_finite())
            .collect();
        if usable.len() < self.min_history {
            return Err(InsightsError::InsufficientHistory {
                needed: self.min_history,
                got: usable.len(),
            });
        }

        let series = DailySeries::regularize(&usable)?;
        let mut values = series.values().to_vec();
        let mut date = series.end();
        let mut predictions = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            date += Duration::days(1);
            let row = lagged_features(&values, date).ok_or_else(|| {
                InsightsError::InsufficientHistory {
                    needed: self.min_history,
                    got: usable.len(),
                }
            })?;
            let tavg = self.trained.forest.predict_row(&row)?;
            values.push(tavg);
            predictions.push(PredictionPoint {
                date,
                tavg,
                lower_95: None,
                upper_95: None,
            });
        }

        Ok(ForecastResponse {
            city: city_key.to_string(),
            horizon_days: horizon,
            predictions,
            model_info: self.model_info.clone(),
        })
    }
}
