//! In-memory [`Storage`] for tests and embedding.

use super::collaborators::{CityMetadata, InsightsCacheEntry, RunStatus, Storage};
use crate::core::{DailyFeatureRow, DailyRecord, MonthlyFeatureRow};
use crate::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One run log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub run_id: String,
    pub endpoint: String,
    pub city_key: String,
    pub params: serde_json::Value,
    pub started_at: DateTime<Utc>,
    pub status: RunStatus,
    pub duration_ms: Option<u64>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct Tables {
    daily: HashMap<String, BTreeMap<NaiveDate, DailyRecord>>,
    daily_features: HashMap<String, BTreeMap<NaiveDate, DailyFeatureRow>>,
    monthly: HashMap<String, BTreeMap<(i32, u32), MonthlyFeatureRow>>,
    insights: HashMap<String, InsightsCacheEntry>,
    cities: HashMap<String, CityMetadata>,
    runs: Vec<RunLogEntry>,
}

/// Thread-safe tables behind a single lock.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insights(&self, city_key: &str) -> Option<InsightsCacheEntry> {
        self.tables.read().insights.get(city_key).cloned()
    }

    pub fn city_metadata(&self, city_key: &str) -> Option<CityMetadata> {
        self.tables.read().cities.get(city_key).cloned()
    }

    pub fn daily_features(&self, city_key: &str) -> Vec<DailyFeatureRow> {
        self.tables
            .read()
            .daily_features
            .get(city_key)
            .map(|rows| rows.values().copied().collect())
            .unwrap_or_default()
    }

    /// Run log rows in insertion order.
    pub fn runs(&self) -> Vec<RunLogEntry> {
        self.tables.read().runs.clone()
    }
}

impl Storage for InMemoryStorage {
    fn get_daily_history(
        &self,
        city_key: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<DailyRecord>> {
        let tables = self.tables.read();
        let Some(rows) = tables.daily.get(city_key) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .values()
            .filter(|r| start.map_or(true, |s| r.date >= s) && end.map_or(true, |e| r.date <= e))
            .copied()
            .collect())
    }

    fn put_daily_records(&self, city_key: &str, records: &[DailyRecord]) -> Result<usize> {
        let mut tables = self.tables.write();
        let rows = tables.daily.entry(city_key.to_string()).or_default();
        for record in records {
            rows.insert(record.date, *record);
        }
        Ok(records.len())
    }

    fn put_daily_features(&self, city_key: &str, rows: &[DailyFeatureRow]) -> Result<usize> {
        let mut tables = self.tables.write();
        let table = tables.daily_features.entry(city_key.to_string()).or_default();
        for row in rows {
            table.insert(row.date, *row);
        }
        Ok(rows.len())
    }

    fn put_monthly_features(&self, city_key: &str, rows: &[MonthlyFeatureRow]) -> Result<usize> {
        let mut tables = self.tables.write();
        let table = tables.monthly.entry(city_key.to_string()).or_default();
        for row in rows {
            table.insert((row.year, row.month), *row);
        }
        Ok(rows.len())
    }

    fn get_monthly_features(&self, city_key: &str) -> Result<Vec<MonthlyFeatureRow>> {
        Ok(self
            .tables
            .read()
            .monthly
            .get(city_key)
            .map(|rows| rows.values().copied().collect())
            .unwrap_or_default())
    }

    fn put_insights_cache(&self, entry: InsightsCacheEntry) -> Result<()> {
        self.tables
            .write()
            .insights
            .insert(entry.city_key.clone(), entry);
        Ok(())
    }

    fn put_city_metadata(&self, metadata: CityMetadata) -> Result<()> {
        self.tables
            .write()
            .cities
            .insert(metadata.city_key.clone(), metadata);
        Ok(())
    }

    fn list_cities(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .tables
            .read()
            .daily
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn log_run_start(
        &self,
        run_id: &str,
        endpoint: &str,
        city_key: &str,
        params: &serde_json::Value,
    ) -> Result<()> {
        self.tables.write().runs.push(RunLogEntry {
            run_id: run_id.to_string(),
            endpoint: endpoint.to_string(),
            city_key: city_key.to_string(),
            params: params.clone(),
            started_at: Utc::now(),
            status: RunStatus::Running,
            duration_ms: None,
            result: None,
            error: None,
        });
        Ok(())
    }

    fn log_run_end(
        &self,
        run_id: &str,
        status: RunStatus,
        duration_ms: u64,
        result: Option<&serde_json::Value>,
        error: Option<&str>,
    ) -> Result<()> {
        let mut tables = self.tables.write();
        if let Some(run) = tables.runs.iter_mut().rev().find(|r| r.run_id == run_id) {
            run.status = status;
            run.duration_ms = Some(duration_ms);
            run.result = result.cloned();
            run.error = error.map(str::to_string);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, d).unwrap()
    }

    #[test]
    fn history_is_ordered_deduplicated_and_ranged() {
        let store = InMemoryStorage::new();
        store
            .put_daily_records(
                "kyiv_ua",
                &[
                    DailyRecord::new(day(3), 1.0, 5.0, 3.0),
                    DailyRecord::new(day(1), 0.0, 4.0, 2.0),
                    DailyRecord::new(day(3), 2.0, 6.0, 4.0),
                ],
            )
            .unwrap();

        let all = store.get_daily_history("kyiv_ua", None, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].date, day(1));
        assert_eq!(all[1].tavg, 4.0);

        let ranged = store.get_daily_history("kyiv_ua", Some(day(2)), None).unwrap();
        assert_eq!(ranged.len(), 1);
        assert!(store.get_daily_history("nowhere", None, None).unwrap().is_empty());
        assert_eq!(store.list_cities().unwrap(), vec!["kyiv_ua"]);
    }

    #[test]
    fn run_end_updates_the_started_run() {
        let store = InMemoryStorage::new();
        store
            .log_run_start("r1", "run_analysis", "kyiv_ua", &serde_json::json!({"k_years": 3}))
            .unwrap();
        store
            .log_run_end("r1", RunStatus::Error, 12, None, Some("boom"))
            .unwrap();

        let runs = store.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Error);
        assert_eq!(runs[0].duration_ms, Some(12));
        assert_eq!(runs[0].error.as_deref(), Some("boom"));
    }
}
