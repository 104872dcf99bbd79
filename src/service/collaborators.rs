//! Interfaces of the storage and remote weather collaborators.

use crate::core::{DailyFeatureRow, DailyRecord, MonthlyFeatureRow};
use crate::error::Result;
use crate::insights::InsightsPayload;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Status of a run or of a cached insights row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Ok,
    Error,
}

/// Latest analysis state for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsCacheEntry {
    pub city_key: String,
    pub run_id: String,
    pub status: RunStatus,
    pub payload: Option<InsightsPayload>,
    pub error: Option<String>,
    pub data_start: Option<NaiveDate>,
    pub data_end: Option<NaiveDate>,
    pub version: String,
}

/// Where and over which range a city's history was ingested from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityMetadata {
    pub city_key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub source: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Geocoding result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub name: String,
    pub country_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Tabular store keyed by city.
///
/// Writes are upserts keyed by (city, date) or (city, year, month) and
/// return the number of rows written.
pub trait Storage: Send + Sync {
    /// Daily records ordered by date, optionally restricted to a range.
    fn get_daily_history(
        &self,
        city_key: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<DailyRecord>>;

    fn put_daily_records(&self, city_key: &str, records: &[DailyRecord]) -> Result<usize>;

    fn put_daily_features(&self, city_key: &str, rows: &[DailyFeatureRow]) -> Result<usize>;

    fn put_monthly_features(&self, city_key: &str, rows: &[MonthlyFeatureRow]) -> Result<usize>;

    /// Monthly rows ordered by (year, month).
    fn get_monthly_features(&self, city_key: &str) -> Result<Vec<MonthlyFeatureRow>>;

    /// Replace the cached insights row of `entry.city_key`.
    fn put_insights_cache(&self, entry: InsightsCacheEntry) -> Result<()>;

    fn put_city_metadata(&self, metadata: CityMetadata) -> Result<()>;

    /// Keys of every city with stored history.
    fn list_cities(&self) -> Result<Vec<String>>;

    fn log_run_start(
        &self,
        run_id: &str,
        endpoint: &str,
        city_key: &str,
        params: &serde_json::Value,
    ) -> Result<()>;

    fn log_run_end(
        &self,
        run_id: &str,
        status: RunStatus,
        duration_ms: u64,
        result: Option<&serde_json::Value>,
        error: Option<&str>,
    ) -> Result<()>;
}

/// Remote geocoding and daily weather archive.
pub trait WeatherSource: Send + Sync {
    fn geocode(&self, city: &str, country_code: Option<&str>) -> Result<GeoLocation>;

    /// Daily records for the inclusive date range.
    fn fetch_daily_series(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyRecord>>;
}
