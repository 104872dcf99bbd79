//! Analysis pipeline: ingestion when missing, features, regimes, report.

use super::collaborators::{CityMetadata, InsightsCacheEntry, RunStatus, Storage, WeatherSource};
use super::hooks::{timed, StepHook, TracingHook};
use crate::clustering::{tricluster, Clusterer, KMeansClusterer};
use crate::config::ServiceConfig;
use crate::core::{city_key, DailyRecord};
use crate::error::{InsightsError, Result};
use crate::features::{build_daily_features, build_monthly_features};
use crate::insights::{compute_insights, InsightsPayload};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Source tag recorded for auto-ingested cities.
pub const INGEST_SOURCE: &str = "open-meteo-archive";

const ENDPOINT: &str = "run_analysis";

/// Parameters of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub city: String,
    pub country_code: Option<String>,
    /// Range fetched when the city has to be ingested.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub auto_ingest: bool,
    pub k_years: Option<usize>,
    pub k_months: Option<usize>,
}

impl AnalysisRequest {
    /// Request with auto-ingest enabled and default cluster counts.
    pub fn new(city: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            city: city.into(),
            country_code: None,
            start_date,
            end_date,
            auto_ingest: true,
            k_years: None,
            k_months: None,
        }
    }

    pub fn country_code(mut self, cc: impl Into<String>) -> Self {
        self.country_code = Some(cc.into());
        self
    }

    pub fn auto_ingest(mut self, enabled: bool) -> Self {
        self.auto_ingest = enabled;
        self
    }

    pub fn clusters(mut self, k_years: usize, k_months: usize) -> Self {
        self.k_years = Some(k_years);
        self.k_months = Some(k_months);
        self
    }
}

/// Runs the analysis pipeline against its collaborators.
pub struct AnalysisService {
    storage: Arc<dyn Storage>,
    weather: Arc<dyn WeatherSource>,
    clusterer: Arc<dyn Clusterer>,
    hook: Arc<dyn StepHook>,
    config: ServiceConfig,
}

impl std::fmt::Debug for AnalysisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AnalysisService {
    /// Service using k-means clustering and tracing step logs.
    pub fn new(
        storage: Arc<dyn Storage>,
        weather: Arc<dyn WeatherSource>,
        config: ServiceConfig,
    ) -> Self {
        let clusterer: Arc<dyn Clusterer> =
            Arc::new(KMeansClusterer::from_analysis(&config.analysis));
        Self {
            storage,
            weather,
            clusterer,
            hook: Arc::new(TracingHook),
            config,
        }
    }

    pub fn with_clusterer(mut self, clusterer: Arc<dyn Clusterer>) -> Self {
        self.clusterer = clusterer;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn StepHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Run the full analysis for one city and return its report.
    ///
    /// The insights cache holds a `running` row while the run is in flight
    /// and an `ok` or `error` row afterwards; the run log records the
    /// duration either way. Failures are re-raised after being recorded.
    pub fn run_analysis(&self, request: &AnalysisRequest) -> Result<InsightsPayload> {
        if request.start_date > request.end_date {
            return Err(InsightsError::InputValidation(format!(
                "start_date {} is after end_date {}",
                request.start_date, request.end_date
            )));
        }
        let requested_key = city_key(&request.city, request.country_code.as_deref())?;
        let k_years = request.k_years.unwrap_or(self.config.analysis.k_years);
        let k_months = request.k_months.unwrap_or(self.config.analysis.k_months);

        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let started = Instant::now();
        let params = serde_json::json!({
            "city": request.city,
            "country_code": request.country_code,
            "start": request.start_date,
            "end": request.end_date,
            "auto_ingest": request.auto_ingest,
            "k_years": k_years,
            "k_months": k_months,
        });
        self.storage
            .log_run_start(&run_id, ENDPOINT, &requested_key, &params)?;
        self.storage
            .put_insights_cache(self.cache_entry(&requested_key, &run_id, RunStatus::Running))?;
        info!(run_id = %run_id, city_key = %requested_key, "analysis started");

        let mut key = requested_key.clone();
        let outcome = self.execute(request, &run_id, &mut key, k_years, k_months);
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(payload) => {
                let summary = serde_json::json!({
                    "run_id": run_id,
                    "city_key": key,
                    "clusters": payload.patterns.clusters.len(),
                    "data_start": payload.data_start,
                    "data_end": payload.data_end,
                });
                let mut entry = self.cache_entry(&key, &run_id, RunStatus::Ok);
                entry.data_start = payload.data_start;
                entry.data_end = payload.data_end;
                entry.payload = Some(payload.clone());
                self.finish_cache(&requested_key, entry)?;
                self.storage
                    .log_run_end(&run_id, RunStatus::Ok, duration_ms, Some(&summary), None)?;
                info!(run_id = %run_id, city_key = %key, duration_ms, "analysis finished");
                Ok(payload)
            }
            Err(e) => {
                let message = e.to_string();
                error!(
                    run_id = %run_id,
                    city_key = %key,
                    error_kind = e.kind(),
                    duration_ms,
                    error = %message,
                    "analysis failed"
                );
                let mut entry = self.cache_entry(&key, &run_id, RunStatus::Error);
                entry.error = Some(message.clone());
                if let Err(cache_err) = self.finish_cache(&requested_key, entry) {
                    error!(
                        run_id = %run_id,
                        error = %cache_err,
                        "failed to cache analysis failure"
                    );
                }
                if let Err(log_err) = self.storage.log_run_end(
                    &run_id,
                    RunStatus::Error,
                    duration_ms,
                    None,
                    Some(&message),
                ) {
                    error!(
                        run_id = %run_id,
                        error = %log_err,
                        "failed to log analysis failure"
                    );
                }
                Err(e)
            }
        }
    }

    fn execute(
        &self,
        request: &AnalysisRequest,
        run_id: &str,
        key: &mut String,
        k_years: usize,
        k_months: usize,
    ) -> Result<InsightsPayload> {
        let hook = self.hook.as_ref();

        let mut history = timed(hook, "load_history", || {
            self.storage.get_daily_history(key.as_str(), None, None)
        })?;

        if history.is_empty() && request.auto_ingest {
            *key = timed(hook, "ingest", || self.ingest(request))?;
            history = self.storage.get_daily_history(key.as_str(), None, None)?;
        }
        let key = key.as_str();
        if history.is_empty() {
            return Err(InsightsError::NotFound(format!(
                "no history for '{key}'; ingest the city first or run the analysis with auto_ingest enabled"
            )));
        }

        let daily = timed(hook, "daily_features", || build_daily_features(&history))?;
        let daily_rows = self.storage.put_daily_features(key, &daily)?;

        let monthly = timed(hook, "monthly_features", || {
            Ok::<_, InsightsError>(build_monthly_features(&daily))
        })?;
        let monthly_rows = self.storage.put_monthly_features(key, &monthly)?;
        info!(city_key = %key, daily_rows, monthly_rows, "feature tables stored");

        let stored_monthly = self.storage.get_monthly_features(key)?;
        let tri = timed(hook, "tricluster", || {
            tricluster(&stored_monthly, k_years, k_months, self.clusterer.as_ref())
        })?;

        timed(hook, "insights", || {
            Ok(compute_insights(
                key,
                &daily,
                &stored_monthly,
                &tri,
                run_id,
                &self.config.analysis,
            ))
        })
    }

    /// Geocode, fetch and store the requested range; returns the key the
    /// data was stored under.
    fn ingest(&self, request: &AnalysisRequest) -> Result<String> {
        let location = self
            .weather
            .geocode(&request.city, request.country_code.as_deref())?;
        let cc = location
            .country_code
            .as_deref()
            .or(request.country_code.as_deref());
        let key = city_key(&location.name, cc)?;

        let records: Vec<DailyRecord> = self.weather.fetch_daily_series(
            location.latitude,
            location.longitude,
            request.start_date,
            request.end_date,
        )?;
        if records.is_empty() {
            return Err(InsightsError::UpstreamData(format!(
                "no data returned for '{key}' between {} and {}",
                request.start_date, request.end_date
            )));
        }

        let written = self.storage.put_daily_records(&key, &records)?;
        self.storage.put_city_metadata(CityMetadata {
            city_key: key.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            source: INGEST_SOURCE.to_string(),
            start_date: request.start_date,
            end_date: request.end_date,
        })?;
        info!(city_key = %key, written, "city ingested");
        Ok(key)
    }

    /// Write the final cache row; a run whose key changed during ingestion
    /// also settles the row it started under.
    fn finish_cache(&self, requested_key: &str, entry: InsightsCacheEntry) -> Result<()> {
        if entry.city_key != requested_key {
            let mut settled = entry.clone();
            settled.city_key = requested_key.to_string();
            settled.payload = None;
            self.storage.put_insights_cache(settled)?;
        }
        self.storage.put_insights_cache(entry)
    }

    fn cache_entry(&self, key: &str, run_id: &str, status: RunStatus) -> InsightsCacheEntry {
        InsightsCacheEntry {
            city_key: key.to_string(),
            run_id: run_id.to_string(),
            status,
            payload: None,
            error: None,
            data_start: None,
            data_end: None,
            version: self.config.cache_version.clone(),
        }
    }
}
