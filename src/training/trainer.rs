//! Grid search for the seasonal model with exogenous regressors.
//!
//! Candidates are scored by walk-forward MAE and the winner is refit on the
//! full regularized history.

use super::cross_validation::walk_forward_mae;
use crate::config::TrainerConfig;
use crate::core::DailySeries;
use crate::error::{InsightsError, Result};
use crate::models::{FourierExog, SarimaxModel, SarimaxOrder, SeasonalFitter, SeasonalOrder};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Metadata persisted next to a fitted seasonal model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalModelMeta {
    pub city: String,
    pub order: SarimaxOrder,
    pub seasonal_order: SeasonalOrder,
    pub seasonal_period: usize,
    #[serde(rename = "fourier_K")]
    pub fourier_k: usize,
    pub cv_folds: usize,
    pub cv_horizon_days: usize,
    pub cv_mae: f64,
    pub train_start: NaiveDate,
    pub train_end: NaiveDate,
    pub exog_cols: Vec<String>,
    pub t0: NaiveDate,
    /// Estimator that produced the model.
    pub fitter: String,
}

/// A deployed seasonal model with its training metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedSeasonalModel {
    pub model: SarimaxModel,
    pub meta: SeasonalModelMeta,
}

/// One scored grid candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    pub order: SarimaxOrder,
    pub seasonal_order: SeasonalOrder,
    pub mean_mae: f64,
    pub folds: usize,
}

/// Selects and fits the seasonal model for one city.
#[derive(Clone)]
pub struct SeasonalTrainer {
    config: TrainerConfig,
    fitter: Arc<dyn SeasonalFitter>,
}

impl std::fmt::Debug for SeasonalTrainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeasonalTrainer")
            .field("config", &self.config)
            .field("fitter", &self.fitter.name())
            .finish()
    }
}

impl SeasonalTrainer {
    /// Trainer using the CSS estimator configured by `config`.
    pub fn new(config: TrainerConfig) -> Self {
        let fitter: Arc<dyn SeasonalFitter> = Arc::new(config.fitter());
        Self { config, fitter }
    }

    /// Replace the estimator.
    pub fn with_fitter(mut self, fitter: Arc<dyn SeasonalFitter>) -> Self {
        self.fitter = fitter;
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train on raw, possibly gapped `(date, tavg)` observations.
    ///
    /// Fails with [`InsightsError::InsufficientHistory`] before any candidate
    /// is fit when the regularized series is shorter than the configured
    /// minimum, and with [`InsightsError::NoConvergentModel`] when no
    /// candidate could be scored.
    pub fn train(&self, city_key: &str, raw: &[(NaiveDate, f64)]) -> Result<TrainedSeasonalModel> {
        let needed = self.config.min_history_days;
        if raw.is_empty() {
            return Err(InsightsError::InsufficientHistory { needed, got: 0 });
        }
        let series = DailySeries::regularize(raw)?;
        if series.len() < needed {
            return Err(InsightsError::InsufficientHistory {
                needed,
                got: series.len(),
            });
        }

        let exog = FourierExog::new(self.config.fourier_k, series.start());
        let best = self.search(&series, &exog)?;
        info!(
            city = city_key,
            order = %best.order,
            seasonal_order = %best.seasonal_order,
            cv_mae = best.mean_mae,
            "selected seasonal model"
        );

        let model = self
            .fitter
            .fit(&series, &exog, best.order, best.seasonal_order)?;

        let meta = SeasonalModelMeta {
            city: city_key.to_string(),
            order: best.order,
            seasonal_order: best.seasonal_order,
            seasonal_period: best.seasonal_order.period,
            fourier_k: self.config.fourier_k,
            cv_folds: best.folds,
            cv_horizon_days: self.config.cv.horizon,
            cv_mae: best.mean_mae,
            train_start: series.start(),
            train_end: series.end(),
            exog_cols: exog.column_names(),
            t0: exog.t0,
            fitter: self.fitter.name().to_string(),
        };
        Ok(TrainedSeasonalModel { model, meta })
    }

    /// Score every candidate; the lowest mean MAE wins, earlier candidates
    /// winning ties.
    pub fn search(&self, series: &DailySeries, exog: &FourierExog) -> Result<CandidateScore> {
        let candidates = self.config.candidates();
        let mut best: Option<CandidateScore> = None;

        for (order, seasonal_order) in &candidates {
            let scored = walk_forward_mae(series, &self.config.cv, |train, horizon| {
                let model = self.fitter.fit(train, exog, *order, *seasonal_order)?;
                Ok(model.forecast(train, horizon)?.point().to_vec())
            });

            let cv = match scored {
                Ok(cv) if cv.mean_mae.is_finite() => cv,
                Ok(_) => {
                    warn!(%order, %seasonal_order, "discarding candidate with non-finite score");
                    continue;
                }
                Err(err) => {
                    warn!(%order, %seasonal_order, error = %err, "discarding candidate");
                    continue;
                }
            };
            debug!(%order, %seasonal_order, mae = cv.mean_mae, "candidate scored");

            if best.map_or(true, |b| cv.mean_mae < b.mean_mae) {
                best = Some(CandidateScore {
                    order: *order,
                    seasonal_order: *seasonal_order,
                    mean_mae: cv.mean_mae,
                    folds: cv.n_folds(),
                });
            }
        }

        best.ok_or(InsightsError::NoConvergentModel {
            candidates: candidates.len(),
        })
    }
}
