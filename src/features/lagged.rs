//! Lagged regressors for the decision-forest forecaster.
//!
//! Every feature for day `t` is computed from days strictly before `t`, so
//! the same function serves training rows and recursive forecast steps.

use super::daily::{doy_encoding, ROLLING_WINDOW};
use crate::utils::stats::{mean, std_dev};
use chrono::{Datelike, NaiveDate};

/// Column names in feature-vector order.
pub const LAGGED_FEATURES: [&str; 7] = [
    "tavg_lag_1",
    "tavg_lag_2",
    "tavg_lag_7",
    "tavg_roll_mean_7",
    "tavg_roll_std_7",
    "doy_sin",
    "doy_cos",
];

/// Shortest history that defines every lagged feature.
pub const MIN_LAG_HISTORY: usize = ROLLING_WINDOW;

/// Features for `date`, the day immediately after the end of `history`.
///
/// Returns `None` when the history is too short or any value the features
/// depend on is undefined.
pub fn lagged_features(history: &[f64], date: NaiveDate) -> Option<[f64; 7]> {
    let n = history.len();
    if n < MIN_LAG_HISTORY {
        return None;
    }
    let window = &history[n - ROLLING_WINDOW..];
    let (doy_sin, doy_cos) = doy_encoding(date.ordinal());
    let row = [
        history[n - 1],
        history[n - 2],
        history[n - 7],
        mean(window),
        std_dev(window),
        doy_sin,
        doy_cos,
    ];
    row.iter().all(|v| v.is_finite()).then_some(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn features_use_only_previous_days() {
        let history: Vec<f64> = (1..=10).map(f64::from).collect();
        let date = NaiveDate::from_ymd_opt(2021, 1, 11).unwrap();
        let row = lagged_features(&history, date).unwrap();

        assert_eq!(row[0], 10.0);
        assert_eq!(row[1], 9.0);
        assert_eq!(row[2], 4.0);
        // Days 4..=10
        assert_relative_eq!(row[3], 7.0, epsilon = 1e-12);
        assert_relative_eq!(row[4], (28.0_f64 / 6.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn short_or_gapped_history_is_undefined() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 11).unwrap();
        assert!(lagged_features(&[1.0; 6], date).is_none());

        let mut history = vec![1.0; 10];
        history[8] = f64::NAN;
        assert!(lagged_features(&history, date).is_none());
    }
}
