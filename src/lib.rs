//! # climate-insights
//!
//! Climate analytics for daily city temperature histories.
//!
//! Builds daily and monthly feature tables, trains a seasonal model with
//! Fourier regressors (selected by walk-forward cross-validation) or a
//! decision-forest regressor, forecasts from either, clusters year/month
//! regimes and assembles an insights report. Storage and remote weather data
//! are collaborators behind traits in [`service`].

#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod clustering;
pub mod config;
pub mod core;
pub mod error;
pub mod features;
pub mod forecast;
pub mod insights;
pub mod models;
pub mod persistence;
pub mod service;
pub mod telemetry;
pub mod training;
pub mod utils;

pub use error::{InsightsError, Result};

pub mod prelude {
    pub use crate::clustering::{tricluster, Clusterer, KMeansClusterer, TriclusterResult};
    pub use crate::config::{AnalysisConfig, ForestConfig, ServiceConfig, TrainerConfig};
    pub use crate::core::{city_key, DailyFeatureRow, DailyRecord, MonthlyFeatureRow};
    pub use crate::error::{InsightsError, Result};
    pub use crate::features::{build_daily_features, build_monthly_features};
    pub use crate::forecast::{CityForecaster, ForecastResponse, ForecasterCache};
    pub use crate::insights::{compute_insights, InsightsPayload};
    pub use crate::service::{
        AnalysisRequest, AnalysisService, InMemoryStorage, ModelService, Storage, WeatherSource,
    };
    pub use crate::training::{ModelKind, TrainedModel};
}
