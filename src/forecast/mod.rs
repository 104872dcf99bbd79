//! Multi-step forecasting from trained models.
//!
//! Two paths share one response shape: the seasonal model produces point
//! forecasts with 95% bounds, the decision forest predicts recursively and
//! reports points only.

mod cache;
mod regressor;
mod seasonal;

pub use cache::ForecasterCache;
pub use regressor::{ForestForecaster, MIN_FORECAST_DAYS};
pub use seasonal::SeasonalForecaster;

use crate::error::Result;
use crate::training::{ModelKind, TrainedModel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub date: NaiveDate,
    pub tavg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_95: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_95: Option<f64>,
}

/// Forecast returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub city: String,
    pub horizon_days: usize,
    pub predictions: Vec<PredictionPoint>,
    /// Training metadata of the model used.
    pub model_info: serde_json::Value,
}

/// A loaded forecaster of either kind.
#[derive(Debug, Clone)]
pub enum CityForecaster {
    Seasonal(SeasonalForecaster),
    Forest(ForestForecaster),
}

impl CityForecaster {
    /// Wrap a trained model; forests require `min_forecast_days` usable days.
    pub fn from_trained(trained: TrainedModel, min_forecast_days: usize) -> Result<Self> {
        Ok(match trained {
            TrainedModel::Seasonal(m) => Self::Seasonal(SeasonalForecaster::new(m)?),
            TrainedModel::Forest(m) => {
                Self::Forest(ForestForecaster::new(m)?.with_min_history(min_forecast_days))
            }
        })
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Seasonal(_) => ModelKind::Seasonal,
            Self::Forest(_) => ModelKind::Forest,
        }
    }

    /// Forecast `horizon` days past the end of `history`.
    pub fn forecast(
        &self,
        city_key: &str,
        history: &[(NaiveDate, f64)],
        horizon: usize,
    ) -> Result<ForecastResponse> {
        match self {
            Self::Seasonal(f) => f.forecast(city_key, history, horizon),
            Self::Forest(f) => f.forecast(city_key, history, horizon),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InsightsError;
    use crate::models::{
        ForestParams, FourierExog, RandomForest, SarimaxModel, SarimaxOrder, SeasonalOrder,
    };
    use crate::training::{
        ForestMeta, ForestMetrics, ForestSplit, SeasonalModelMeta, TrainedForest,
        TrainedSeasonalModel,
    };
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
    }

    fn history(days: i64, value: impl Fn(i64) -> f64) -> Vec<(NaiveDate, f64)> {
        (0..days).map(|i| (start() + Duration::days(i), value(i))).collect()
    }

    /// Random walk model with zero regression: forecasts repeat the last value.
    fn random_walk() -> TrainedModel {
        let order = SarimaxOrder::new(0, 1, 0);
        let seasonal_order = SeasonalOrder::new(0, 0, 0, 7);
        let exog = FourierExog::new(1, start());
        TrainedModel::Seasonal(TrainedSeasonalModel {
            model: SarimaxModel {
                order,
                seasonal_order,
                exog,
                intercept: 0.0,
                beta: vec![0.0; 3],
                ar: vec![],
                seasonal_ar: vec![],
                ma: vec![],
                seasonal_ma: vec![],
                sigma2: 1.0,
                n_obs: 100,
            },
            meta: SeasonalModelMeta {
                city: "quito_ec".into(),
                order,
                seasonal_order,
                seasonal_period: 7,
                fourier_k: 1,
                cv_folds: 1,
                cv_horizon_days: 30,
                cv_mae: 0.5,
                train_start: start(),
                train_end: start() + Duration::days(99),
                exog_cols: exog.column_names(),
                t0: start(),
                fitter: "css-nelder-mead".into(),
            },
        })
    }

    fn constant_forest(value: f64) -> TrainedModel {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64; 7]).collect();
        let y = vec![value; 30];
        TrainedModel::Forest(TrainedForest {
            forest: RandomForest::fit(&x, &y, &ForestParams::default().n_trees(3)).unwrap(),
            meta: ForestMeta {
                city: "quito_ec".into(),
                kind: "random_forest".into(),
                feature_cols: vec![],
                split: ForestSplit {
                    val_start: start(),
                    test_start: start(),
                },
                metrics: ForestMetrics {
                    val_mae: 0.0,
                    val_rmse: 0.0,
                    test_mae: 0.0,
                    test_rmse: 0.0,
                },
                train_start: start(),
                train_end: start(),
                n_trees: 3,
                rows: 30,
            },
        })
    }

    #[test]
    fn seasonal_path_reports_dated_bounds() {
        let forecaster = CityForecaster::from_trained(random_walk(), 15).unwrap();
        let hist = history(60, |i| 10.0 + (i % 3) as f64);
        let response = forecaster.forecast("quito_ec", &hist, 5).unwrap();

        assert_eq!(response.horizon_days, 5);
        assert_eq!(response.predictions.len(), 5);
        let last_value = hist[hist.len() - 1].1;
        for (h, p) in response.predictions.iter().enumerate() {
            assert_eq!(p.date, hist[hist.len() - 1].0 + Duration::days(h as i64 + 1));
            assert_relative_eq!(p.tavg, last_value, epsilon = 1e-9);
            let (lo, hi) = (p.lower_95.unwrap(), p.upper_95.unwrap());
            assert!(lo < p.tavg && p.tavg < hi);
        }
        assert_eq!(response.model_info["fourier_K"], 1);
    }

    #[test]
    fn forest_path_feeds_predictions_back() {
        let forecaster = CityForecaster::from_trained(constant_forest(4.0), 15).unwrap();
        let hist = history(20, |i| i as f64);
        let response = forecaster.forecast("quito_ec", &hist, 10).unwrap();

        assert_eq!(forecaster.kind(), ModelKind::Forest);
        assert_eq!(response.predictions.len(), 10);
        assert!(response.predictions.iter().all(|p| p.lower_95.is_none()));
        assert_relative_eq!(response.predictions[9].tavg, 4.0, epsilon = 1e-12);
        assert_eq!(response.predictions[0].date, start() + Duration::days(20));
    }

    #[test]
    fn forest_path_needs_fifteen_usable_days() {
        let forecaster = CityForecaster::from_trained(constant_forest(4.0), 15).unwrap();
        let mut hist = history(20, |i| i as f64);
        for point in hist.iter_mut().take(6) {
            point.1 = f64::NAN;
        }
        let err = forecaster.forecast("quito_ec", &hist, 3).unwrap_err();
        assert_eq!(
            err,
            InsightsError::InsufficientHistory {
                needed: 15,
                got: 14
            }
        );
    }

    #[test]
    fn serialized_points_omit_missing_bounds() {
        let point = PredictionPoint {
            date: start(),
            tavg: 3.5,
            lower_95: None,
            upper_95: None,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json, serde_json::json!({"date": "2021-01-01", "tavg": 3.5}));
    }

    #[test]
    fn cache_loads_once_until_invalidated() {
        let cache = ForecasterCache::new();
        let mut loads = 0;
        for _ in 0..3 {
            cache
                .get_or_load("quito_ec", || {
                    loads += 1;
                    CityForecaster::from_trained(random_walk(), 15)
                })
                .unwrap();
        }
        assert_eq!(loads, 1);
        assert!(cache.contains("quito_ec"));

        assert!(cache.invalidate("quito_ec"));
        assert!(!cache.invalidate("quito_ec"));
        let reloaded = cache
            .get_or_load("quito_ec", || CityForecaster::from_trained(constant_forest(1.0), 15))
            .unwrap();
        assert_eq!(reloaded.kind(), ModelKind::Forest);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let cache = ForecasterCache::new();
        let result = cache.get_or_load("nowhere", || {
            Err(InsightsError::NotFound("no model".into()))
        });
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
