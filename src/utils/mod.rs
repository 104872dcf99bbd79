//! Numerical utilities shared by the models and the pipeline.

pub mod metrics;
pub mod ols;
pub mod optimization;
pub mod stats;

pub use metrics::{calculate_metrics, mae, rmse, AccuracyMetrics};
pub use ols::{ols_fit, OlsFit};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{linear_slope, mean, population_std, std_dev, variance};
