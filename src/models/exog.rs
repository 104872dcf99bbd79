//! Fourier seasonality and trend regressors.

use crate::core::DAYS_PER_YEAR;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Exogenous design: `K` yearly sine/cosine harmonics plus a linear time index.
///
/// Columns are ordered `sin1, cos1, ..., sinK, cosK, time_idx`. The time index
/// is measured in years from `t0`, so a model fitted on one date range and
/// applied to later dates sees a continuous trend regressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FourierExog {
    pub fourier_k: usize,
    pub t0: NaiveDate,
}

impl FourierExog {
    pub fn new(fourier_k: usize, t0: NaiveDate) -> Self {
        Self { fourier_k, t0 }
    }

    /// Number of regressor columns.
    pub fn n_columns(&self) -> usize {
        2 * self.fourier_k + 1
    }

    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_columns());
        for k in 1..=self.fourier_k {
            names.push(format!("sin{k}"));
            names.push(format!("cos{k}"));
        }
        names.push("time_idx".to_string());
        names
    }

    /// Regressor values for a single date.
    pub fn row(&self, date: NaiveDate) -> Vec<f64> {
        let doy = date.ordinal() as f64;
        let mut row = Vec::with_capacity(self.n_columns());
        for k in 1..=self.fourier_k {
            let angle = 2.0 * PI * k as f64 * doy / DAYS_PER_YEAR;
            row.push(angle.sin());
            row.push(angle.cos());
        }
        row.push((date - self.t0).num_days() as f64 / DAYS_PER_YEAR);
        row
    }

    /// Column-major regressors for `len` consecutive days from `start`.
    pub fn columns(&self, start: NaiveDate, len: usize) -> Vec<Vec<f64>> {
        let mut cols = vec![Vec::with_capacity(len); self.n_columns()];
        for i in 0..len {
            let row = self.row(start + Duration::days(i as i64));
            for (col, v) in cols.iter_mut().zip(row) {
                col.push(v);
            }
        }
        cols
    }
}
