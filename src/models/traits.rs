//! Pluggable estimation interface for the seasonal model.

use super::exog::FourierExog;
use super::sarimax::{SarimaxModel, SarimaxOrder, SeasonalOrder};
use crate::core::DailySeries;
use crate::error::Result;

/// Estimates a regression-with-SARIMA-errors model for a fixed order.
///
/// The trainer only relies on this interface, so any estimator producing a
/// [`SarimaxModel`] can be substituted. A fit that fails to converge must
/// return [`crate::error::InsightsError::ConvergenceFailure`] so the caller
/// can discard the candidate.
pub trait SeasonalFitter: Send + Sync {
    /// Fit on a contiguous daily series with regressors from `exog`.
    fn fit(
        &self,
        series: &DailySeries,
        exog: &FourierExog,
        order: SarimaxOrder,
        seasonal_order: SeasonalOrder,
    ) -> Result<SarimaxModel>;

    /// Short identifier recorded in training metadata.
    fn name(&self) -> &str;
}
