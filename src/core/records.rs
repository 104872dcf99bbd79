//! Row types exchanged with the storage collaborator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One observed day of temperature for a city (°C).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub tmin: f64,
    pub tmax: f64,
    pub tavg: f64,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, tmin: f64, tmax: f64, tavg: f64) -> Self {
        Self {
            date,
            tmin,
            tmax,
            tavg,
        }
    }

    /// True when every temperature field is a finite number.
    pub fn is_complete(&self) -> bool {
        self.tmin.is_finite() && self.tmax.is_finite() && self.tavg.is_finite()
    }
}

/// A regularized day with derived analysis features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyFeatureRow {
    pub date: NaiveDate,
    pub tmin: f64,
    pub tmax: f64,
    pub tavg: f64,
    pub diurnal_range: f64,
    pub delta_1: f64,
    pub delta_7: f64,
    pub roll_mean_7: f64,
    pub roll_std_7: f64,
    pub doy_sin: f64,
    pub doy_cos: f64,
    /// Years elapsed since the first regularized day.
    pub time_idx: f64,
    pub anomaly_z: f64,
}

/// Monthly aggregate of daily feature rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFeatureRow {
    pub year: i32,
    pub month: u32,
    pub tavg_mean: f64,
    pub tavg_std: f64,
    pub diurnal_mean: f64,
    pub roll_std_mean: f64,
    pub anomaly_mean: f64,
    pub delta_1_mean: f64,
}

/// Names of the monthly signature features, in tensor order.
pub const MONTHLY_FEATURES: [&str; 6] = [
    "tavg_mean",
    "tavg_std",
    "diurnal_mean",
    "roll_std_mean",
    "anomaly_mean",
    "delta_1_mean",
];

impl MonthlyFeatureRow {
    /// Feature values in [`MONTHLY_FEATURES`] order.
    pub fn features(&self) -> [f64; 6] {
        [
            self.tavg_mean,
            self.tavg_std,
            self.diurnal_mean,
            self.roll_std_mean,
            self.anomaly_mean,
            self.delta_1_mean,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_features_follow_name_order() {
        let row = MonthlyFeatureRow {
            year: 2020,
            month: 7,
            tavg_mean: 1.0,
            tavg_std: 2.0,
            diurnal_mean: 3.0,
            roll_std_mean: 4.0,
            anomaly_mean: 5.0,
            delta_1_mean: 6.0,
        };
        assert_eq!(row.features(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(MONTHLY_FEATURES[3], "roll_std_mean");
    }

    #[test]
    fn incomplete_records_are_detected() {
        let date = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        assert!(DailyRecord::new(date, 1.0, 9.0, 5.0).is_complete());
        assert!(!DailyRecord::new(date, f64::NAN, 9.0, 5.0).is_complete());
    }
}
