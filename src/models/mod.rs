//! Forecasting models.

mod traits;

pub mod diff;
pub mod exog;
pub mod forest;
pub mod sarimax;

pub use exog::FourierExog;
pub use forest::{ForestParams, RandomForest, RegressionTree};
pub use sarimax::{CssFitter, SarimaxModel, SarimaxOrder, SeasonalOrder};
pub use traits::SeasonalFitter;
