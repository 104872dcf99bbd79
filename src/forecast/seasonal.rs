//! Forecasting with a trained seasonal model.

use super::{ForecastResponse, PredictionPoint};
use crate::core::DailySeries;
use crate::error::{InsightsError, Result};
use crate::training::TrainedSeasonalModel;
use chrono::{Duration, NaiveDate};

/// Seasonal-model forecaster for one city.
#[derive(Debug, Clone)]
pub struct SeasonalForecaster {
    trained: TrainedSeasonalModel,
    model_info: serde_json::Value,
}

impl SeasonalForecaster {
    pub fn new(trained: TrainedSeasonalModel) -> Result<Self> {
        let model_info = serde_json::to_value(&trained.meta)?;
        Ok(Self {
            trained,
            model_info,
        })
    }

    pub fn trained(&self) -> &TrainedSeasonalModel {
        &self.trained
    }

    /// Forecast `horizon` days after the last observed day, with 95% bounds.
    ///
    /// Future regressors use the Fourier order and origin stored at training
    /// time, so the history passed here may start on any date.
    pub fn forecast(
        &self,
        city_key: &str,
        history: &[(NaiveDate, f64)],
        horizon: usize,
    ) -> Result<ForecastResponse> {
        let model = &self.trained.model;
        if history.is_empty() {
            return Err(InsightsError::InsufficientHistory {
                needed: model.min_history(),
                got: 0,
            });
        }
        let series = DailySeries::regularize(history)?;
        let forecast = model.forecast(&series, horizon)?;

        let last = series.end();
        let predictions = forecast
            .point()
            .iter()
            .enumerate()
            .map(|(h, &tavg)| {
                let bounds = forecast.bounds_at(h);
                PredictionPoint {
                    date: last + Duration::days(h as i64 + 1),
                    tavg,
                    lower_95: bounds.map(|(lo, _)| lo),
                    upper_95: bounds.map(|(_, hi)| hi),
                }
            })
            .collect();

        Ok(ForecastResponse {
            city: city_key.to_string(),
            horizon_days: horizon,
            predictions,
            model_info: self.model_info.clone(),
        })
    }
}
