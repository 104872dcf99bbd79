//! Training, persistence and forecasting through the model service.

use chrono::{Duration, NaiveDate};
use climate_insights::config::{ForestConfig, ServiceConfig, TrainerConfig};
use climate_insights::core::DailyRecord;
use climate_insights::models::{ForestParams, SarimaxOrder, SeasonalOrder};
use climate_insights::service::{InMemoryStorage, ModelService, RunStatus, Storage};
use climate_insights::training::{ModelKind, TrainedModel};
use climate_insights::InsightsError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::sync::Arc;

const CITY: &str = "synthville_xx";

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2012, 1, 1).unwrap()
}

/// Noise-free yearly cycle: mean 20°C, amplitude 15°C.
fn truth(day: usize) -> f64 {
    20.0 + 15.0 * (2.0 * PI * day as f64 / 365.25).sin()
}

fn seed_history(storage: &InMemoryStorage, days: usize) {
    let mut rng = StdRng::seed_from_u64(7);
    let records: Vec<DailyRecord> = (0..days)
        .map(|i| {
            let t = truth(i) + rng.gen_range(-0.5..0.5);
            DailyRecord::new(start() + Duration::days(i as i64), t - 6.0, t + 6.0, t)
        })
        .collect();
    storage.put_daily_records(CITY, &records).unwrap();
}

fn config(root: &std::path::Path) -> ServiceConfig {
    ServiceConfig::default()
        .artifact_root(root)
        .trainer(TrainerConfig::default().grid(
            vec![SarimaxOrder::new(1, 0, 0), SarimaxOrder::new(1, 0, 1)],
            vec![SeasonalOrder::new(1, 0, 0, 7)],
        ))
        .forest(ForestConfig::default().params(
            ForestParams::default()
                .n_trees(15)
                .max_depth(8)
                .min_samples_leaf(3),
        ))
}

fn setup(days: usize) -> (tempfile::TempDir, Arc<InMemoryStorage>, ModelService) {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(InMemoryStorage::new());
    seed_history(&storage, days);
    let service = ModelService::new(storage.clone(), config(dir.path()));
    (dir, storage, service)
}

#[test]
fn seasonal_model_tracks_the_yearly_cycle() {
    let days = 3653;
    let (_dir, storage, service) = setup(days);

    let trained = service.train_city(CITY, ModelKind::Seasonal).unwrap();
    let TrainedModel::Seasonal(seasonal) = &trained else {
        panic!("expected a seasonal model");
    };
    assert_eq!(seasonal.meta.fourier_k, 3);
    assert_eq!(seasonal.meta.cv_folds, 3);
    assert_eq!(seasonal.meta.train_start, start());
    assert!(seasonal.meta.cv_mae < 2.0);

    let response = service.forecast(CITY, 7).unwrap();
    assert_eq!(response.city, CITY);
    assert_eq!(response.horizon_days, 7);
    assert_eq!(response.predictions.len(), 7);
    assert_eq!(response.model_info["fourier_K"], 3);

    for (h, p) in response.predictions.iter().enumerate() {
        assert_eq!(p.date, start() + Duration::days((days + h) as i64));
        assert!(
            (p.tavg - truth(days + h)).abs() <= 3.0,
            "day {h}: predicted {} expected {}",
            p.tavg,
            truth(days + h)
        );
        let (lo, hi) = (p.lower_95.unwrap(), p.upper_95.unwrap());
        assert!(lo < p.tavg && p.tavg < hi);
    }

    let runs = storage.runs();
    assert_eq!(runs.last().unwrap().status, RunStatus::Ok);
    assert!(runs.last().unwrap().result.as_ref().unwrap()["cv_mae"].is_number());
}

#[test]
fn persisted_model_reproduces_forecasts() {
    let (dir, storage, service) = setup(1500);
    service.train_city(CITY, ModelKind::Seasonal).unwrap();

    let first = service.forecast(CITY, 10).unwrap();
    let cached = service.forecast(CITY, 10).unwrap();
    assert_eq!(first, cached);

    let reloaded = ModelService::new(storage, config(dir.path()));
    assert!(reloaded.cache().is_empty());
    let again = reloaded.forecast(CITY, 10).unwrap();
    assert_eq!(first.predictions, again.predictions);
    assert!(dir.path().join(CITY).join("meta.json").exists());
}

#[test]
fn forest_forecasts_recursively_without_bounds() {
    let (_dir, _storage, service) = setup(1500);

    let trained = service.train_city(CITY, ModelKind::Forest).unwrap();
    let TrainedModel::Forest(forest) = &trained else {
        panic!("expected a forest");
    };
    assert_eq!(forest.meta.rows, 1500 - 7);
    assert!(forest.meta.metrics.test_mae < 2.0);

    let response = service.forecast(CITY, 7).unwrap();
    assert_eq!(response.model_info["kind"], "random_forest");
    for (h, p) in response.predictions.iter().enumerate() {
        assert!(p.lower_95.is_none() && p.upper_95.is_none());
        assert!((p.tavg - truth(1500 + h)).abs() <= 3.0);
    }
}

#[test]
fn retraining_invalidates_the_cached_forecaster() {
    let (_dir, _storage, service) = setup(1500);

    service.train_city(CITY, ModelKind::Seasonal).unwrap();
    let seasonal = service.forecast(CITY, 3).unwrap();
    assert!(service.cache().contains(CITY));
    assert!(seasonal.predictions[0].lower_95.is_some());

    service.train_city(CITY, ModelKind::Forest).unwrap();
    assert!(!service.cache().contains(CITY));
    assert_eq!(service.artifacts().kind(CITY).unwrap(), ModelKind::Forest);

    let forest = service.forecast(CITY, 3).unwrap();
    assert!(forest.predictions[0].lower_95.is_none());
}

#[test]
fn horizon_is_clamped() {
    let (_dir, _storage, service) = setup(1500);
    service.train_city(CITY, ModelKind::Seasonal).unwrap();

    assert_eq!(service.forecast(CITY, 100).unwrap().predictions.len(), 30);
    assert_eq!(service.forecast(CITY, 0).unwrap().predictions.len(), 1);
    assert_eq!(service.forecast(CITY, -4).unwrap().horizon_days, 1);
}

#[test]
fn short_history_fails_training() {
    let (_dir, storage, service) = setup(400);

    let err = service.train_city(CITY, ModelKind::Seasonal).unwrap_err();
    assert_eq!(
        err,
        InsightsError::InsufficientHistory {
            needed: 1095,
            got: 400
        }
    );
    assert!(!service.artifacts().exists(CITY));
    assert_eq!(storage.runs()[0].status, RunStatus::Error);
}
