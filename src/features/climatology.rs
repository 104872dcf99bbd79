//! Day-of-year climatology and anomaly z-scores.

use chrono::{Datelike, NaiveDate};

/// Per-day-of-year mean and sample standard deviation of a daily series.
///
/// Every available year contributes to every baseline, including the year
/// being scored.
#[derive(Debug, Clone)]
pub struct DayOfYearClimatology {
    /// Indexed by ordinal day (1..=366); index 0 unused.
    mean: [f64; 367],
    std: [f64; 367],
}

impl DayOfYearClimatology {
    /// Build the climatology from aligned dates and values.
    pub fn fit(dates: &[NaiveDate], values: &[f64]) -> Self {
        let mut sum = [0.0; 367];
        let mut count = [0usize; 367];
        for (date, &v) in dates.iter().zip(values) {
            if v.is_finite() {
                let d = date.ordinal() as usize;
                sum[d] += v;
                count[d] += 1;
            }
        }

        let mut mean = [f64::NAN; 367];
        for d in 1..=366 {
            if count[d] > 0 {
                mean[d] = sum[d] / count[d] as f64;
            }
        }

        let mut sq = [0.0; 367];
        for (date, &v) in dates.iter().zip(values) {
            if v.is_finite() {
                let d = date.ordinal() as usize;
                sq[d] += (v - mean[d]).powi(2);
            }
        }

        let mut std = [f64::NAN; 367];
        for d in 1..=366 {
            if count[d] > 1 {
                std[d] = (sq[d] / (count[d] - 1) as f64).sqrt();
            }
        }

        Self { mean, std }
    }

    /// Mean for an ordinal day, NaN if never observed.
    pub fn mean(&self, ordinal: u32) -> f64 {
        self.mean.get(ordinal as usize).copied().unwrap_or(f64::NAN)
    }

    /// Sample std for an ordinal day, NaN with fewer than two samples.
    pub fn std(&self, ordinal: u32) -> f64 {
        self.std.get(ordinal as usize).copied().unwrap_or(f64::NAN)
    }

    /// Standardized deviation of `value` on `date` from its day-of-year baseline.
    ///
    /// Zero when the baseline std is zero or undefined.
    pub fn anomaly_z(&self, date: NaiveDate, value: f64) -> f64 {
        let d = date.ordinal();
        let sd = self.std(d);
        if !sd.is_finite() || sd == 0.0 {
            return 0.0;
        }
        (value - self.mean(d)) / sd
    }
}
