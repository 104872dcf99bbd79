//! Walk-forward (rolling-origin) cross-validation.
//!
//! Validation windows are fixed-length blocks laid end to end against the
//! end of the series; each fold trains on everything strictly before its
//! window, so the training prefix expands from one fold to the next.

use crate::core::DailySeries;
use crate::error::{InsightsError, Result};
use crate::utils::metrics::calculate_metrics;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fold layout for walk-forward validation.
///
/// With `n` observations the configured fold count degrades to 2 when
/// `n < folds * horizon + margin` and to 1 when `n < 2 * horizon + margin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardPolicy {
    /// Requested number of folds.
    pub folds: usize,
    /// Length of every validation window, in days.
    pub horizon: usize,
    /// Extra observations required on top of the validation windows.
    pub margin: usize,
}

impl Default for WalkForwardPolicy {
    fn default() -> Self {
        Self {
            folds: 3,
            horizon: 30,
            margin: 30,
        }
    }
}

impl WalkForwardPolicy {
    pub fn new(folds: usize, horizon: usize) -> Self {
        Self {
            folds: folds.max(1),
            horizon: horizon.max(1),
            ..Self::default()
        }
    }

    /// Set the extra-length margin used by fold degradation.
    pub fn with_margin(mut self, margin: usize) -> Self {
        self.margin = margin;
        self
    }

    /// Fold count actually used for a series of length `n`.
    pub fn effective_folds(&self, n: usize) -> usize {
        let mut folds = self.folds.max(1);
        if n < self.folds * self.horizon + self.margin {
            folds = folds.min(2);
        }
        if n < 2 * self.horizon + self.margin {
            folds = 1;
        }
        folds
    }

    /// Validation windows for a series of length `n`, oldest first.
    pub fn windows(&self, n: usize) -> Vec<FoldWindow> {
        let folds = self.effective_folds(n);
        (0..folds)
            .filter_map(|i| {
                let val_end = n.checked_sub((folds - i - 1) * self.horizon)?;
                let train_end = val_end.checked_sub(self.horizon)?;
                (train_end > 0).then_some(FoldWindow {
                    index: i,
                    train_end,
                    val_end,
                })
            })
            .collect()
    }
}

/// One fold: train on `[0, train_end)`, validate on `[train_end, val_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldWindow {
    pub index: usize,
    pub train_end: usize,
    pub val_end: usize,
}

impl FoldWindow {
    pub fn horizon(&self) -> usize {
        self.val_end - self.train_end
    }
}

/// Per-fold and mean absolute error of a walk-forward run.
#[derive(Debug, Clone, PartialEq)]
pub struct CVResults {
    pub fold_mae: Vec<f64>,
    pub mean_mae: f64,
}

impl CVResults {
    pub fn n_folds(&self) -> usize {
        self.fold_mae.len()
    }
}

/// Score a fit-and-forecast procedure by walk-forward MAE.
///
/// `fit_and_forecast` receives the training prefix and the number of days
/// to forecast. Any fold error aborts the whole evaluation, so a candidate
/// is either scored on every fold or not at all.
pub fn walk_forward_mae<F>(
    series: &DailySeries,
    policy: &WalkForwardPolicy,
    mut fit_and_forecast: F,
) -> Result<CVResults>
where
    F: FnMut(&DailySeries, usize) -> Result<Vec<f64>>,
{
    let windows = policy.windows(series.len());
    if windows.is_empty() {
        return Err(InsightsError::InsufficientHistory {
            needed: policy.horizon + 1,
            got: series.len(),
        });
    }

    let mut fold_mae = Vec::with_capacity(windows.len());
    for window in &windows {
        let train = series.slice(0, window.train_end)?;
        let actual = &series.values()[window.train_end..window.val_end];
        let predicted = fit_and_forecast(&train, window.horizon())?;
        let metrics = calculate_metrics(actual, &predicted)?;
        debug!(
            fold = window.index,
            train_len = window.train_end,
            mae = metrics.mae,
            "walk-forward fold scored"
        );
        fold_mae.push(metrics.mae);
    }

    let mean_mae = fold_mae.iter().sum::<f64>() / fold_mae.len() as f64;
    Ok(CVResults { fold_mae, mean_mae })
}
