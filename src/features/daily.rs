//! Daily analysis features from raw temperature records.

use super::climatology::DayOfYearClimatology;
use super::window::{lag_difference, rolling_mean, rolling_std};
use crate::core::{DailyFeatureRow, DailyRecord, DailySeries, DAYS_PER_YEAR};
use crate::error::{InsightsError, Result};
use chrono::Datelike;
use std::f64::consts::PI;
use tracing::debug;

/// Rolling window length in days.
pub const ROLLING_WINDOW: usize = 7;

/// Sine/cosine encoding of the day of year with a 365.25-day period.
pub fn doy_encoding(ordinal: u32) -> (f64, f64) {
    let angle = 2.0 * PI * ordinal as f64 / DAYS_PER_YEAR;
    (angle.sin(), angle.cos())
}

/// Build the regularized daily feature table for one city.
///
/// Records are reindexed onto a contiguous calendar, gaps in each
/// temperature channel are filled, derived features are computed, and the
/// leading rows without full lag/rolling history are dropped. The output has
/// one row per calendar day in strictly increasing date order.
pub fn build_daily_features(records: &[DailyRecord]) -> Result<Vec<DailyFeatureRow>> {
    if records.len() < 2 {
        return Err(InsightsError::InsufficientHistory {
            needed: 2,
            got: records.len(),
        });
    }

    let channel = |f: fn(&DailyRecord) -> f64| -> Vec<(chrono::NaiveDate, f64)> {
        records.iter().map(|r| (r.date, f(r))).collect()
    };
    let tmin = DailySeries::regularize(&channel(|r| r.tmin))?;
    let tmax = DailySeries::regularize(&channel(|r| r.tmax))?;
    let tavg = DailySeries::regularize(&channel(|r| r.tavg))?;

    let dates: Vec<_> = tavg.dates().collect();
    let t = tavg.values();

    let delta_1 = lag_difference(t, 1);
    let delta_7 = lag_difference(t, 7);
    let roll_mean = rolling_mean(t, ROLLING_WINDOW);
    let roll_std = rolling_std(t, ROLLING_WINDOW);
    let climatology = DayOfYearClimatology::fit(&dates, t);

    let mut rows = Vec::with_capacity(dates.len());
    for (i, &date) in dates.iter().enumerate() {
        let (doy_sin, doy_cos) = doy_encoding(date.ordinal());
        let row = DailyFeatureRow {
            date,
            tmin: tmin.values()[i],
            tmax: tmax.values()[i],
            tavg: t[i],
            diurnal_range: tmax.values()[i] - tmin.values()[i],
            delta_1: delta_1[i],
            delta_7: delta_7[i],
            roll_mean_7: roll_mean[i],
            roll_std_7: roll_std[i],
            doy_sin,
            doy_cos,
            time_idx: i as f64 / DAYS_PER_YEAR,
            anomaly_z: climatology.anomaly_z(date, t[i]),
        };
        if is_defined(&row) {
            rows.push(row);
        }
    }

    debug!(
        input_rows = records.len(),
        calendar_days = dates.len(),
        output_rows = rows.len(),
        "built daily features"
    );
    Ok(rows)
}

fn is_defined(row: &DailyFeatureRow) -> bool {
    [
        row.tmin,
        row.tmax,
        row.tavg,
        row.diurnal_range,
        row.delta_1,
        row.delta_7,
        row.roll_mean_7,
        row.roll_std_7,
        row.anomaly_z,
    ]
    .iter()
    .all(|v| v.is_finite())
}
