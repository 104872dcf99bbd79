//! Training and forecasting entry points over stored history.

use super::collaborators::{RunStatus, Storage};
use crate::config::ServiceConfig;
use crate::core::validate_key;
use crate::error::{InsightsError, Result};
use crate::forecast::{CityForecaster, ForecastResponse, ForecasterCache};
use crate::models::SeasonalFitter;
use crate::persistence::ArtifactStore;
use crate::training::{ForestTrainer, ModelKind, SeasonalTrainer, TrainedModel};
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

const TRAIN_ENDPOINT: &str = "train_city";

/// Owns the artifact store and the forecaster cache.
pub struct ModelService {
    storage: Arc<dyn Storage>,
    artifacts: ArtifactStore,
    cache: ForecasterCache,
    config: ServiceConfig,
    fitter: Option<Arc<dyn SeasonalFitter>>,
    train_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for ModelService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelService")
            .field("artifacts", &self.artifacts)
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ModelService {
    /// Artifacts live under `config.artifact_root`.
    pub fn new(storage: Arc<dyn Storage>, config: ServiceConfig) -> Self {
        Self {
            storage,
            artifacts: ArtifactStore::new(config.artifact_root.clone()),
            cache: ForecasterCache::new(),
            config,
            fitter: None,
            train_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Fit seasonal candidates with `fitter` instead of the configured CSS estimator.
    pub fn with_fitter(mut self, fitter: Arc<dyn SeasonalFitter>) -> Self {
        self.fitter = Some(fitter);
        self
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn cache(&self) -> &ForecasterCache {
        &self.cache
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Train `kind` on the stored history of `city_key` and persist it.
    ///
    /// Concurrent calls for the same city are serialized. On success the
    /// cached forecaster of the city is dropped before returning.
    pub fn train_city(&self, city_key: &str, kind: ModelKind) -> Result<TrainedModel> {
        let city_key = validate_key(city_key)?;
        let lock = self.train_lock(city_key);
        let _guard = lock.lock();

        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let started = Instant::now();
        let params = serde_json::json!({ "city_key": city_key, "kind": kind });
        self.storage
            .log_run_start(&run_id, TRAIN_ENDPOINT, city_key, &params)?;

        let outcome = self.train_and_save(city_key, kind);
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(trained) => {
                let meta = trained.meta_json()?;
                self.storage
                    .log_run_end(&run_id, RunStatus::Ok, duration_ms, Some(&meta), None)?;
                info!(city = city_key, %kind, duration_ms, "model trained");
                Ok(trained)
            }
            Err(e) => {
                let message = e.to_string();
                error!(
                    city = city_key,
                    %kind,
                    error_kind = e.kind(),
                    duration_ms,
                    error = %message,
                    "training failed"
                );
                if let Err(log_err) = self.storage.log_run_end(
                    &run_id,
                    RunStatus::Error,
                    duration_ms,
                    None,
                    Some(&message),
                ) {
                    error!(
                        city = city_key,
                        error = %log_err,
                        "failed to record training failure"
                    );
                }
                Err(e)
            }
        }
    }

    /// Forecast `horizon` days ahead with the persisted model of `city_key`.
    ///
    /// The horizon is clamped into the configured bounds.
    pub fn forecast(&self, city_key: &str, horizon: i64) -> Result<ForecastResponse> {
        let city_key = validate_key(city_key)?;
        let horizon = self.config.clamp_horizon(horizon);

        let forecaster = self.cache.get_or_load(city_key, || {
            let trained = self.artifacts.load(city_key)?;
            CityForecaster::from_trained(trained, self.config.forest.min_forecast_days)
        })?;

        let history = self.history(city_key)?;
        forecaster.forecast(city_key, &history, horizon)
    }

    fn train_and_save(&self, city_key: &str, kind: ModelKind) -> Result<TrainedModel> {
        let history = self.history(city_key)?;
        let trained: TrainedModel = match kind {
            ModelKind::Seasonal => {
                let mut trainer = SeasonalTrainer::new(self.config.trainer.clone());
                if let Some(fitter) = &self.fitter {
                    trainer = trainer.with_fitter(Arc::clone(fitter));
                }
                trainer.train(city_key, &history)?.into()
            }
            ModelKind::Forest => ForestTrainer::new(self.config.forest.clone())
                .train(city_key, &history)?
                .into(),
        };
        self.artifacts.save(city_key, &trained)?;
        self.cache.invalidate(city_key);
        Ok(trained)
    }

    /// Stored `(date, tavg)` pairs; an unknown city is `NotFound`.
    fn history(&self, city_key: &str) -> Result<Vec<(NaiveDate, f64)>> {
        let records = self.storage.get_daily_history(city_key, None, None)?;
        if records.is_empty() {
            return Err(InsightsError::NotFound(format!(
                "no history for '{city_key}'; ingest the city first"
            )));
        }
        Ok(records.iter().map(|r| (r.date, r.tavg)).collect())
    }

    fn train_lock(&self, city_key: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.train_locks
                .lock()
                .entry(city_key.to_string())
                .or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DailyRecord;
    use crate::service::InMemoryStorage;

    fn service(dir: &std::path::Path) -> (Arc<InMemoryStorage>, ModelService) {
        let storage = Arc::new(InMemoryStorage::new());
        let config = ServiceConfig::default().artifact_root(dir);
        (storage.clone(), ModelService::new(storage, config))
    }

    #[test]
    fn blank_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (_, svc) = service(dir.path());
        assert!(matches!(
            svc.forecast("  ", 7),
            Err(InsightsError::InputValidation(_))
        ));
        assert!(matches!(
            svc.train_city("", ModelKind::Forest),
            Err(InsightsError::InputValidation(_))
        ));
    }

    #[test]
    fn untrained_city_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (_, svc) = service(dir.path());
        assert!(matches!(
            svc.forecast("oslo_no", 7),
            Err(InsightsError::NotFound(_))
        ));
        assert!(svc.cache().is_empty());
    }

    #[test]
    fn training_without_history_is_logged_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let (storage, svc) = service(dir.path());
        let err = svc.train_city("oslo_no", ModelKind::Seasonal).unwrap_err();
        assert!(matches!(err, InsightsError::NotFound(_)));

        let runs = storage.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].endpoint, TRAIN_ENDPOINT);
        assert_eq!(runs[0].status, RunStatus::Error);
        assert_eq!(runs[0].params["kind"], "seasonal");
    }

    #[test]
    fn path_like_key_is_rejected_before_anything_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let (storage, svc) = service(&dir.path().join("artifacts"));
        let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        let records: Vec<DailyRecord> = (0..1500)
            .map(|i| {
                let t = 12.0 + 8.0 * (i as f64 / 58.0).sin();
                DailyRecord::new(start + chrono::Duration::days(i), t - 4.0, t + 4.0, t)
            })
            .collect();
        storage.put_daily_records("../escaped", &records).unwrap();

        for kind in [ModelKind::Forest, ModelKind::Seasonal] {
            assert!(matches!(
                svc.train_city("../escaped", kind),
                Err(InsightsError::InputValidation(_))
            ));
        }
        assert!(matches!(
            svc.forecast("../escaped", 7),
            Err(InsightsError::InputValidation(_))
        ));

        assert!(!dir.path().join("escaped").exists());
        assert!(!dir.path().join("artifacts").exists());
        assert!(storage.runs().is_empty());
    }
}
