//! Core data structures shared by every pipeline stage.

mod city;
mod forecast;
mod records;
mod series;

pub use city::{city_key, validate_key};
pub use forecast::Forecast;
pub use records::{DailyFeatureRow, DailyRecord, MonthlyFeatureRow, MONTHLY_FEATURES};
pub use series::{fill_gaps, DailySeries};

/// Days per year used for every seasonal encoding.
pub const DAYS_PER_YEAR: f64 = 365.25;
