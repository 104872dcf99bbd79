//! Training for the decision-forest forecaster.

use crate::config::ForestConfig;
use crate::core::DailySeries;
use crate::error::{InsightsError, Result};
use crate::features::{lagged_features, LAGGED_FEATURES, MIN_LAG_HISTORY};
use crate::models::RandomForest;
use crate::utils::calculate_metrics;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Chronological split boundaries; both dates start their block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestSplit {
    pub val_start: NaiveDate,
    pub test_start: NaiveDate,
}

/// Holdout scores of a trained forest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestMetrics {
    pub val_mae: f64,
    pub val_rmse: f64,
    pub test_mae: f64,
    pub test_rmse: f64,
}

/// Metadata persisted next to a trained forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestMeta {
    pub city: String,
    pub kind: String,
    pub feature_cols: Vec<String>,
    pub split: ForestSplit,
    pub metrics: ForestMetrics,
    pub train_start: NaiveDate,
    pub train_end: NaiveDate,
    pub n_trees: usize,
    /// Clean feature rows available before the split.
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedForest {
    pub forest: RandomForest,
    pub meta: ForestMeta,
}

#[derive(Default)]
struct Block {
    x: Vec<Vec<f64>>,
    y: Vec<f64>,
}

impl Block {
    fn push(&mut self, row: [f64; 7], target: f64) {
        self.x.push(row.to_vec());
        self.y.push(target);
    }
}

/// Trains the forest on lagged features of one city's tavg history.
#[derive(Debug, Clone, Default)]
pub struct ForestTrainer {
    config: ForestConfig,
}

impl ForestTrainer {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Train on raw `(date, tavg)` observations.
    ///
    /// The last `test_days` form the test block and the `validation_days`
    /// before them the validation block; the forest is fit on the rest.
    pub fn train(&self, city_key: &str, raw: &[(NaiveDate, f64)]) -> Result<TrainedForest> {
        let needed = self.config.min_training_rows;
        if raw.is_empty() {
            return Err(InsightsError::InsufficientHistory { needed, got: 0 });
        }
        let series = DailySeries::regularize(raw)?;
        let values = series.values();

        let rows: Vec<(NaiveDate, [f64; 7], f64)> = (MIN_LAG_HISTORY..values.len())
            .filter_map(|i| {
                let date = series.date_at(i);
                let row = lagged_features(&values[..i], date)?;
                values[i].is_finite().then_some((date, row, values[i]))
            })
            .collect();
        if rows.len() < needed {
            return Err(InsightsError::InsufficientHistory {
                needed,
                got: rows.len(),
            });
        }

        let last = series.end();
        let split = ForestSplit {
            val_start: last - Duration::days(self.config.test_days + self.config.validation_days),
            test_start: last - Duration::days(self.config.test_days),
        };

        let (mut train, mut val, mut test) = (Block::default(), Block::default(), Block::default());
        for (date, row, target) in &rows {
            if *date >= split.test_start {
                test.push(*row, *target);
            } else if *date >= split.val_start {
                val.push(*row, *target);
            } else {
                train.push(*row, *target);
            }
        }
        if train.y.is_empty() || val.y.is_empty() || test.y.is_empty() {
            return Err(InsightsError::InputValidation(format!(
                "holdout of {}+{} days leaves an empty block in {} rows",
                self.config.validation_days,
                self.config.test_days,
                rows.len()
            )));
        }

        let forest = RandomForest::fit(&train.x, &train.y, &self.config.params)?;
        let val_metrics = calculate_metrics(&val.y, &forest.predict(&val.x)?)?;
        let test_metrics = calculate_metrics(&test.y, &forest.predict(&test.x)?)?;
        let metrics = ForestMetrics {
            val_mae: val_metrics.mae,
            val_rmse: val_metrics.rmse,
            test_mae: test_metrics.mae,
            test_rmse: test_metrics.rmse,
        };

        info!(
            city = city_key,
            rows = rows.len(),
            train_rows = train.y.len(),
            val_mae = metrics.val_mae,
            test_mae = metrics.test_mae,
            "trained forest regressor"
        );

        let meta = ForestMeta {
            city: city_key.to_string(),
            kind: "random_forest".to_string(),
            feature_cols: LAGGED_FEATURES.iter().map(|s| s.to_string()).collect(),
            split,
            metrics,
            train_start: series.start(),
            train_end: last,
            n_trees: forest.n_trees(),
            rows: rows.len(),
        };
        Ok(TrainedForest { forest, meta })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ForestParams;

    fn history(days: i64) -> Vec<(NaiveDate, f64)> {
        let start = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        (0..days)
            .map(|i| {
                let t = i as f64;
                (
                    start + Duration::days(i),
                    12.0 + 10.0 * (2.0 * std::f64::consts::PI * t / 365.25).sin(),
                )
            })
            .collect()
    }

    fn quick() -> ForestTrainer {
        ForestTrainer::new(
            ForestConfig::default().params(ForestParams::default().n_trees(10).max_depth(8)),
        )
    }

    #[test]
    fn splits_are_chronological() {
        let raw = history(1200);
        let trained = quick().train("rome_it", &raw).unwrap();
        let meta = &trained.meta;

        let last = raw[raw.len() - 1].0;
        assert_eq!(meta.split.test_start, last - Duration::days(365));
        assert_eq!(meta.split.val_start, last - Duration::days(730));
        assert_eq!(meta.rows, 1200 - 7);
        assert_eq!(meta.feature_cols.len(), 7);
        assert_eq!(meta.n_trees, 10);
    }

    #[test]
    fn smooth_series_scores_well() {
        let trained = quick().train("rome_it", &history(1200)).unwrap();
        assert!(trained.meta.metrics.val_mae < 1.0);
        assert!(trained.meta.metrics.test_rmse < 1.5);
    }

    #[test]
    fn too_few_rows_is_rejected() {
        let err = quick().train("rome_it", &history(600)).unwrap_err();
        assert_eq!(
            err,
            InsightsError::InsufficientHistory {
                needed: 900,
                got: 593
            }
        );
    }
}
