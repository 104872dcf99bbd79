//! Serialized shape of an analysis report.

use super::streaks::Streak;
use crate::clustering::SignatureEntry;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Abbreviated calendar month names, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Short name of a 1-based month; out-of-range months print as numbers.
pub fn month_name(month: u32) -> String {
    match month {
        1..=12 => MONTH_NAMES[month as usize - 1].to_string(),
        _ => month.to_string(),
    }
}

/// Average monthly climate across all years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBaseline {
    pub month: u32,
    pub month_name: String,
    pub tavg_mean: f64,
    pub tavg_std: f64,
    pub diurnal_mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub hottest_month: Option<MonthBaseline>,
    pub coolest_month: Option<MonthBaseline>,
    pub annual_trend_c_per_year: f64,
    pub anomaly_days_count_abs_ge_2: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureDay {
    pub date: NaiveDate,
    pub tavg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDay {
    pub date: NaiveDate,
    pub anomaly_z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extremes {
    pub top_hot_days: Vec<TemperatureDay>,
    pub top_cold_days: Vec<TemperatureDay>,
    pub top_anomaly_days: Vec<AnomalyDay>,
    pub warm_anomaly_streak_abs_ge_2: Streak,
    pub cold_anomaly_streak_abs_ge_2: Streak,
}

/// A labeled regime with readable month names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternCluster {
    pub label: String,
    pub years: Vec<i32>,
    pub months: Vec<u32>,
    pub months_names: Vec<String>,
    pub signature_top5: Vec<SignatureEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patterns {
    pub k_years: usize,
    pub k_months: usize,
    pub features_used: Vec<String>,
    pub clusters: Vec<PatternCluster>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataHealth {
    pub data_start: NaiveDate,
    pub data_end: NaiveDate,
    pub expected_days: i64,
    pub actual_days: usize,
    pub coverage_ratio: f64,
}

/// Climate insights of one analysis run for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsPayload {
    pub city_key: String,
    pub analysis_run_id: String,
    pub data_start: Option<NaiveDate>,
    pub data_end: Option<NaiveDate>,
    pub summary: Summary,
    pub monthly_baseline: Vec<MonthBaseline>,
    pub extremes: Extremes,
    pub patterns: Patterns,
    /// Absent when the daily table is empty.
    pub data_health: Option<DataHealth>,
}
