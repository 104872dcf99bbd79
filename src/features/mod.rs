//! Daily and monthly feature construction.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, NaiveDate};
//! use climate_insights::core::DailyRecord;
//! use climate_insights::features::{build_daily_features, build_monthly_features};
//!
//! let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
//! let records: Vec<DailyRecord> = (0..50)
//!     .map(|i| {
//!         let t = 10.0 + (i as f64 / 10.0).sin();
//!         DailyRecord::new(start + Duration::days(i), t - 3.0, t + 3.0, t)
//!     })
//!     .collect();
//!
//! let daily = build_daily_features(&records).unwrap();
//! let monthly = build_monthly_features(&daily);
//! assert_eq!(monthly.len(), 2);
//! ```

pub mod climatology;
pub mod daily;
pub mod lagged;
pub mod monthly;
pub mod window;

pub use climatology::DayOfYearClimatology;
pub use daily::{build_daily_features, doy_encoding, ROLLING_WINDOW};
pub use lagged::{lagged_features, LAGGED_FEATURES, MIN_LAG_HISTORY};
pub use monthly::build_monthly_features;
pub use window::{lag_difference, rolling_mean, rolling_std, shift};
