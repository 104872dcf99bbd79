//! Forecast container holding point predictions and optional intervals.

use crate::error::{InsightsError, Result};

/// A univariate forecast with optional lower/upper prediction bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
    level: Option<f64>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions only.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            ..Self::default()
        }
    }

    /// Create a forecast with prediction intervals at the given confidence level.
    pub fn with_intervals(
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        level: f64,
    ) -> Result<Self> {
        if lower.len() != values.len() {
            return Err(InsightsError::DimensionMismatch {
                expected: values.len(),
                got: lower.len(),
            });
        }
        if upper.len() != values.len() {
            return Err(InsightsError::DimensionMismatch {
                expected: values.len(),
                got: upper.len(),
            });
        }
        Ok(Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
            level: Some(level),
        })
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    /// Confidence level of the intervals, if any.
    pub fn level(&self) -> Option<f64> {
        self.level
    }

    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    /// Bounds for step `h` (0-indexed), if intervals were produced.
    pub fn bounds_at(&self, h: usize) -> Option<(f64, f64)> {
        let lower = self.lower.as_ref()?.get(h)?;
        let upper = self.upper.as_ref()?.get(h)?;
        Some((*lower, *upper))
    }
}
