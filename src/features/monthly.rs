//! Monthly climate signatures aggregated from daily feature rows.

use crate::core::{DailyFeatureRow, MonthlyFeatureRow};
use crate::utils::stats::{finite_or, mean, std_dev};
use chrono::Datelike;
use std::collections::BTreeMap;

/// Aggregate daily rows into one row per (year, month), ordered chronologically.
///
/// Aggregates that are undefined for a month (such as the std of a single
/// day) are reported as 0.0.
pub fn build_monthly_features(daily: &[DailyFeatureRow]) -> Vec<MonthlyFeatureRow> {
    let mut groups: BTreeMap<(i32, u32), Vec<&DailyFeatureRow>> = BTreeMap::new();
    for row in daily {
        groups
            .entry((row.date.year(), row.date.month()))
            .or_default()
            .push(row);
    }

    groups
        .into_iter()
        .map(|((year, month), rows)| {
            let column = |f: fn(&DailyFeatureRow) -> f64| -> Vec<f64> {
                rows.iter().map(|&r| f(r)).collect()
            };
            let tavg = column(|r| r.tavg);
            MonthlyFeatureRow {
                year,
                month,
                tavg_mean: finite_or(mean(&tavg), 0.0),
                tavg_std: finite_or(std_dev(&tavg), 0.0),
                diurnal_mean: finite_or(mean(&column(|r| r.diurnal_range)), 0.0),
                roll_std_mean: finite_or(mean(&column(|r| r.roll_std_7)), 0.0),
                anomaly_mean: finite_or(mean(&column(|r| r.anomaly_z)), 0.0),
                delta_1_mean: finite_or(mean(&column(|r| r.delta_1)), 0.0),
            }
        })
        .collect()
}
