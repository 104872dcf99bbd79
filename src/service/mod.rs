//! Pipelines wired to their storage and weather collaborators.
//!
//! [`AnalysisService::run_analysis`] produces the insights report of a city,
//! ingesting it first when allowed; [`ModelService`] trains and persists
//! forecasters and serves forecasts through a per-city cache.

mod analysis;
mod collaborators;
mod hooks;
mod memory;
mod models;

pub use analysis::{AnalysisRequest, AnalysisService, INGEST_SOURCE};
pub use collaborators::{
    CityMetadata, GeoLocation, InsightsCacheEntry, RunStatus, Storage, WeatherSource,
};
pub use hooks::{NoopHook, StepHook, TracingHook};
pub use memory::{InMemoryStorage, RunLogEntry};
pub use models::ModelService;
