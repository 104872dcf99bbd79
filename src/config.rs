//! Configuration for training, analysis and the service layer.
//!
//! Every struct deserializes with defaults for missing fields, so a JSON file
//! only needs the values it overrides.

use crate::error::{InsightsError, Result};
use crate::models::{CssFitter, ForestParams, SarimaxOrder, SeasonalOrder};
use crate::training::WalkForwardPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Seasonal period of the SARIMA component, in days.
pub const WEEKLY_PERIOD: usize = 7;

/// Seasonal model grid search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Fourier harmonics of the yearly cycle.
    pub fourier_k: usize,
    /// Minimum regularized history, in days.
    pub min_history_days: usize,
    pub cv: WalkForwardPolicy,
    /// Non-seasonal orders, searched in this order.
    pub orders: Vec<SarimaxOrder>,
    /// Seasonal orders, searched in this order for each non-seasonal order.
    pub seasonal_orders: Vec<SeasonalOrder>,
    /// Optimizer iteration cap per fit.
    pub max_iter: usize,
    /// Optimizer tolerance relative to the objective value.
    pub tolerance: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            fourier_k: 3,
            min_history_days: 3 * 365,
            cv: WalkForwardPolicy::default(),
            orders: vec![
                SarimaxOrder::new(1, 1, 1),
                SarimaxOrder::new(2, 1, 1),
                SarimaxOrder::new(1, 1, 2),
                SarimaxOrder::new(2, 1, 2),
                SarimaxOrder::new(1, 0, 1),
                SarimaxOrder::new(0, 1, 1),
            ],
            seasonal_orders: vec![
                SeasonalOrder::new(1, 0, 1, WEEKLY_PERIOD),
                SeasonalOrder::new(1, 1, 1, WEEKLY_PERIOD),
                SeasonalOrder::new(0, 1, 1, WEEKLY_PERIOD),
                SeasonalOrder::new(1, 0, 0, WEEKLY_PERIOD),
            ],
            max_iter: 2000,
            tolerance: 1e-8,
        }
    }
}

impl TrainerConfig {
    /// Set the Fourier order.
    pub fn fourier_k(mut self, k: usize) -> Self {
        self.fourier_k = k;
        self
    }

    /// Set the minimum history length.
    pub fn min_history_days(mut self, days: usize) -> Self {
        self.min_history_days = days;
        self
    }

    /// Set the walk-forward policy.
    pub fn cv(mut self, cv: WalkForwardPolicy) -> Self {
        self.cv = cv;
        self
    }

    /// Replace the candidate grid.
    pub fn grid(mut self, orders: Vec<SarimaxOrder>, seasonal_orders: Vec<SeasonalOrder>) -> Self {
        self.orders = orders;
        self.seasonal_orders = seasonal_orders;
        self
    }

    /// Set optimizer limits.
    pub fn optimizer(mut self, max_iter: usize, tolerance: f64) -> Self {
        self.max_iter = max_iter;
        self.tolerance = tolerance;
        self
    }

    /// Candidate pairs in enumeration order (orders outer, seasonal inner).
    pub fn candidates(&self) -> Vec<(SarimaxOrder, SeasonalOrder)> {
        self.orders
            .iter()
            .flat_map(|&o| self.seasonal_orders.iter().map(move |&s| (o, s)))
            .collect()
    }

    /// Default CSS fitter with this config's optimizer limits.
    pub fn fitter(&self) -> CssFitter {
        CssFitter::new(self.max_iter, self.tolerance)
    }
}

/// Decision-forest training settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub params: ForestParams,
    /// Minimum clean feature rows before training.
    pub min_training_rows: usize,
    /// Length of the validation block preceding the test block, in days.
    pub validation_days: i64,
    /// Length of the final test block, in days.
    pub test_days: i64,
    /// Minimum usable history days for a forecast.
    pub min_forecast_days: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            params: ForestParams::default(),
            min_training_rows: 900,
            validation_days: 365,
            test_days: 365,
            min_forecast_days: 15,
        }
    }
}

impl ForestConfig {
    /// Set forest hyper-parameters.
    pub fn params(mut self, params: ForestParams) -> Self {
        self.params = params;
        self
    }

    /// Set the minimum training rows.
    pub fn min_training_rows(mut self, rows: usize) -> Self {
        self.min_training_rows = rows;
        self
    }
}

/// Insight report and regime clustering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub k_years: usize,
    pub k_months: usize,
    /// |anomaly_z| at or above which a day counts as anomalous.
    pub anomaly_threshold: f64,
    /// Length of each extremes list.
    pub top_n: usize,
    /// Seed of the clustering restarts.
    pub seed: u64,
    /// Clustering restarts; the lowest-inertia run wins.
    pub n_init: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            k_years: 3,
            k_months: 3,
            anomaly_threshold: 2.0,
            top_n: 10,
            seed: 42,
            n_init: 10,
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory holding one artifact folder per city key.
    pub artifact_root: PathBuf,
    /// Version tag written with every insights cache row.
    pub cache_version: String,
    pub min_horizon: usize,
    pub max_horizon: usize,
    pub trainer: TrainerConfig,
    pub forest: ForestConfig,
    pub analysis: AnalysisConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            artifact_root: PathBuf::from("artifacts/models"),
            cache_version: "v1".to_string(),
            min_horizon: 1,
            max_horizon: 30,
            trainer: TrainerConfig::default(),
            forest: ForestConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            InsightsError::Persistence(format!("reading config {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the artifact root.
    pub fn artifact_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.artifact_root = root.into();
        self
    }

    /// Set the trainer configuration.
    pub fn trainer(mut self, trainer: TrainerConfig) -> Self {
        self.trainer = trainer;
        self
    }

    /// Set the forest configuration.
    pub fn forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }

    /// Set the analysis configuration.
    pub fn analysis(mut self, analysis: AnalysisConfig) -> Self {
        self.analysis = analysis;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_horizon == 0 || self.min_horizon > self.max_horizon {
            return Err(InsightsError::InputValidation(format!(
                "horizon bounds {}..={} are invalid",
                self.min_horizon, self.max_horizon
            )));
        }
        if self.trainer.orders.is_empty() || self.trainer.seasonal_orders.is_empty() {
            return Err(InsightsError::InputValidation(
                "trainer grid must contain at least one candidate".into(),
            ));
        }
        Ok(())
    }

    /// Clamp a requested horizon into the configured bounds.
    pub fn clamp_horizon(&self, requested: i64) -> usize {
        let lo = self.min_horizon as i64;
        let hi = self.max_horizon as i64;
        requested.clamp(lo, hi.max(lo)) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_grid_has_24_candidates_in_order() {
        let config = TrainerConfig::default();
        let candidates = config.candidates();
        assert_eq!(candidates.len(), 24);
        assert_eq!(candidates[0].0, SarimaxOrder::new(1, 1, 1));
        assert_eq!(candidates[1].1, SeasonalOrder::new(1, 1, 1, 7));
        assert_eq!(candidates[4].0, SarimaxOrder::new(2, 1, 1));
    }

    #[test]
    fn horizon_is_clamped() {
        let config = ServiceConfig::default();
        assert_eq!(config.clamp_horizon(-4), 1);
        assert_eq!(config.clamp_horizon(7), 7);
        assert_eq!(config.clamp_horizon(90), 30);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"artifact_root": "/tmp/models", "trainer": {{"fourier_k": 2, "orders": [[0,1,1]]}}}}"#
        )
        .unwrap();

        let config = ServiceConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.artifact_root, PathBuf::from("/tmp/models"));
        assert_eq!(config.trainer.fourier_k, 2);
        assert_eq!(config.trainer.orders, vec![SarimaxOrder::new(0, 1, 1)]);
        assert_eq!(config.trainer.seasonal_orders.len(), 4);
        assert_eq!(config.max_horizon, 30);
        assert_eq!(config.analysis.top_n, 10);
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        let config = ServiceConfig {
            min_horizon: 5,
            max_horizon: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_a_persistence_error() {
        let err = ServiceConfig::from_json_file("/nonexistent/config.json").unwrap_err();
        assert_eq!(err.kind(), "persistence");
    }
}
