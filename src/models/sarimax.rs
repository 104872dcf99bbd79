//! Regression with seasonal ARIMA errors.
//!
//! The model is `y_t = c + x_t' beta + u_t` where the error `u_t` follows a
//! multiplicative SARIMA(p,d,q)(P,D,Q)_s process. Fitting proceeds in two
//! stages: `beta` is estimated by OLS on the differenced series and
//! regressors, then the SARMA coefficients of the differenced regression
//! error are estimated by conditional sum of squares (CSS).
//!
//! The fitted state is plain coefficients, so a model can be serialized,
//! reloaded, and applied to any history that shares its exogenous origin.

use super::diff::{apply_filter, differencing_polynomial, integrate, multiply};
use super::exog::FourierExog;
use super::traits::SeasonalFitter;
use crate::core::{DailySeries, Forecast};
use crate::error::{InsightsError, Result};
use crate::utils::ols::ols_fit;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;
use tracing::debug;

/// Coefficient bound keeping the AR/MA polynomials away from unit roots.
const COEF_BOUND: f64 = 0.99;

/// Non-seasonal order `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 3]", into = "[usize; 3]")]
pub struct SarimaxOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl SarimaxOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl From<[usize; 3]> for SarimaxOrder {
    fn from([p, d, q]: [usize; 3]) -> Self {
        Self { p, d, q }
    }
}

impl From<SarimaxOrder> for [usize; 3] {
    fn from(o: SarimaxOrder) -> Self {
        [o.p, o.d, o.q]
    }
}

impl fmt::Display for SarimaxOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// Seasonal order `(P, D, Q, period)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 4]", into = "[usize; 4]")]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl SeasonalOrder {
    pub const fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }

    /// Whether any seasonal component is present.
    pub fn is_active(&self) -> bool {
        self.p + self.d + self.q > 0
    }
}

impl From<[usize; 4]> for SeasonalOrder {
    fn from([p, d, q, period]: [usize; 4]) -> Self {
        Self { p, d, q, period }
    }
}

impl From<SeasonalOrder> for [usize; 4] {
    fn from(o: SeasonalOrder) -> Self {
        [o.p, o.d, o.q, o.period]
    }
}

impl fmt::Display for SeasonalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{},{})", self.p, self.d, self.q, self.period)
    }
}

/// A fitted regression-with-SARIMA-errors model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarimaxModel {
    pub order: SarimaxOrder,
    pub seasonal_order: SeasonalOrder,
    pub exog: FourierExog,
    /// Regression intercept; zero whenever the model differences.
    pub intercept: f64,
    /// One coefficient per exogenous column.
    pub beta: Vec<f64>,
    pub ar: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
    /// Innovation variance estimated from the CSS residuals.
    pub sigma2: f64,
    /// Observations used in the fit.
    pub n_obs: usize,
}

impl SarimaxModel {
    fn differencing(&self) -> Vec<f64> {
        differencing_polynomial(
            self.order.d,
            self.seasonal_order.d,
            self.seasonal_order.period,
        )
    }

    /// Expanded AR polynomial `phi(B) Phi(B^s)`, leading 1 included.
    pub fn ar_polynomial(&self) -> Vec<f64> {
        ar_polynomial(&self.ar, &self.seasonal_ar, self.seasonal_order.period)
    }

    /// Expanded MA polynomial `theta(B) Theta(B^s)`, leading 1 included.
    pub fn ma_polynomial(&self) -> Vec<f64> {
        ma_polynomial(&self.ma, &self.seasonal_ma, self.seasonal_order.period)
    }

    /// Shortest history the model can forecast from.
    pub fn min_history(&self) -> usize {
        self.differencing().len() + self.ar_polynomial().len() - 1
    }

    /// Regression part `c + x_t' beta` for `len` days from `start`.
    pub fn regression(&self, start: NaiveDate, len: usize) -> Vec<f64> {
        let cols = self.exog.columns(start, len);
        (0..len)
            .map(|i| {
                self.intercept
                    + self
                        .beta
                        .iter()
                        .zip(&cols)
                        .map(|(b, col)| b * col[i])
                        .sum::<f64>()
            })
            .collect()
    }

    /// Forecast `horizon` days after the end of `history` with 95% intervals.
    pub fn forecast(&self, history: &DailySeries, horizon: usize) -> Result<Forecast> {
        self.forecast_with_level(history, horizon, 0.95)
    }

    /// Forecast with intervals at the given coverage level in `(0, 1)`.
    ///
    /// The regression error is filtered over the whole history to recover
    /// the innovations, extended with zero future innovations, integrated
    /// back, and added to the future regression values. Interval widths come
    /// from the psi-weights of the full (differenced) ARMA representation.
    pub fn forecast_with_level(
        &self,
        history: &DailySeries,
        horizon: usize,
        level: f64,
    ) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(InsightsError::InputValidation(format!(
                "interval level must lie in (0, 1), got {level}"
            )));
        }
        let n = history.len();
        let needed = self.min_history();
        if n < needed {
            return Err(InsightsError::InsufficientHistory { needed, got: n });
        }
        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let reg = self.regression(history.start(), n + horizon);
        let u: Vec<f64> = history
            .values()
            .iter()
            .zip(&reg)
            .map(|(y, r)| y - r)
            .collect();

        let delta = self.differencing();
        let arp = self.ar_polynomial();
        let map = self.ma_polynomial();
        let w = apply_filter(&u, &delta);
        let e = sarma_residuals(&w, &arp, &map);

        let mut w_ext = w.clone();
        let mut e_ext = e;
        for _ in 0..horizon {
            let t = w_ext.len();
            let mut pred = 0.0;
            for (l, c) in arp.iter().enumerate().skip(1) {
                if l <= t {
                    pred -= c * w_ext[t - l];
                }
            }
            for (l, c) in map.iter().enumerate().skip(1) {
                if l <= t {
                    pred += c * e_ext[t - l];
                }
            }
            w_ext.push(pred);
            e_ext.push(0.0);
        }
        let u_future = integrate(&u, &w_ext[w.len()..], &delta);

        let point: Vec<f64> = u_future
            .iter()
            .enumerate()
            .map(|(h, uf)| reg[n + h] + uf)
            .collect();

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| InsightsError::Computation(format!("normal quantile: {e}")))?;
        let z = normal.inverse_cdf(0.5 + level / 2.0);
        let psi = psi_weights(&multiply(&arp, &delta), &map, horizon);

        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        let mut cum = 0.0;
        for (h, p) in point.iter().enumerate() {
            cum += psi[h] * psi[h];
            let half = z * (self.sigma2.max(0.0) * cum).sqrt();
            lower.push(p - half);
            upper.push(p + half);
        }

        Forecast::with_intervals(point, lower, upper, level)
    }
}

/// `(1 - sum phi_i B^i)(1 - sum Phi_j B^{js})`.
pub fn ar_polynomial(ar: &[f64], seasonal_ar: &[f64], period: usize) -> Vec<f64> {
    let mut regular = vec![1.0];
    regular.extend(ar.iter().map(|c| -c));
    multiply(&regular, &seasonal_lags(seasonal_ar, period, -1.0))
}

/// `(1 + sum theta_i B^i)(1 + sum Theta_j B^{js})`.
pub fn ma_polynomial(ma: &[f64], seasonal_ma: &[f64], period: usize) -> Vec<f64> {
    let mut regular = vec![1.0];
    regular.extend_from_slice(ma);
    multiply(&regular, &seasonal_lags(seasonal_ma, period, 1.0))
}

fn seasonal_lags(coefs: &[f64], period: usize, sign: f64) -> Vec<f64> {
    if coefs.is_empty() || period == 0 {
        return vec![1.0];
    }
    let mut poly = vec![0.0; coefs.len() * period + 1];
    poly[0] = 1.0;
    for (j, c) in coefs.iter().enumerate() {
        poly[(j + 1) * period] = sign * c;
    }
    poly
}

/// Innovations of an ARMA process given its AR and MA polynomials.
///
/// Positions before the AR degree have no full lag history and are left at
/// zero; they also serve as the zero pre-sample innovations of the MA part.
pub fn sarma_residuals(w: &[f64], ar_poly: &[f64], ma_poly: &[f64]) -> Vec<f64> {
    let start = ar_poly.len().saturating_sub(1);
    let mut e = vec![0.0; w.len()];
    for t in start..w.len() {
        let mut value: f64 = ar_poly
            .iter()
            .enumerate()
            .map(|(l, c)| c * w[t - l])
            .sum();
        for (l, c) in ma_poly.iter().enumerate().skip(1) {
            if l <= t {
                value -= c * e[t - l];
            }
        }
        e[t] = value;
    }
    e
}

/// First `horizon` psi-weights of `ma(B) / ar(B)`.
pub fn psi_weights(ar_poly: &[f64], ma_poly: &[f64], horizon: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(horizon);
    for j in 0..horizon {
        let mut value = if j == 0 {
            1.0
        } else {
            ma_poly.get(j).copied().unwrap_or(0.0)
        };
        for l in 1..=j.min(ar_poly.len().saturating_sub(1)) {
            value -= ar_poly[l] * psi[j - l];
        }
        psi.push(value);
    }
    psi
}

/// Conditional-sum-of-squares estimator backed by bounded Nelder-Mead.
///
/// A fit whose optimizer exhausts `max_iter` without meeting `tolerance` is
/// reported as [`InsightsError::ConvergenceFailure`].
#[derive(Debug, Clone, PartialEq)]
pub struct CssFitter {
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for CssFitter {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-8,
        }
    }
}

impl CssFitter {
    pub fn new(max_iter: usize, tolerance: f64) -> Self {
        Self {
            max_iter,
            tolerance,
        }
    }
}

/// Split an optimizer vector into `(ar, seasonal_ar, ma, seasonal_ma)`.
fn unpack(params: &[f64], order: SarimaxOrder, seasonal: SeasonalOrder) -> [Vec<f64>; 4] {
    let mut rest = params;
    let mut take = |k: usize| {
        let (head, tail) = rest.split_at(k);
        rest = tail;
        head.to_vec()
    };
    [take(order.p), take(seasonal.p), take(order.q), take(seasonal.q)]
}

impl SeasonalFitter for CssFitter {
    fn fit(
        &self,
        series: &DailySeries,
        exog: &FourierExog,
        order: SarimaxOrder,
        seasonal_order: SeasonalOrder,
    ) -> Result<SarimaxModel> {
        let period = seasonal_order.period;
        if seasonal_order.is_active() && period < 2 {
            return Err(InsightsError::InputValidation(format!(
                "seasonal order {seasonal_order} needs a period of at least 2"
            )));
        }

        let delta = differencing_polynomial(order.d, seasonal_order.d, period);
        let degree = delta.len() - 1;
        let ar_lag = order.p + seasonal_order.p * period;
        let ma_lag = order.q + seasonal_order.q * period;
        let n_params = order.p + order.q + seasonal_order.p + seasonal_order.q;
        let needed = degree + ar_lag.max(ma_lag) + n_params + exog.n_columns() + 2;
        if series.len() < needed {
            return Err(InsightsError::InsufficientHistory {
                needed,
                got: series.len(),
            });
        }

        let cols = exog.columns(series.start(), series.len());
        let y_d = apply_filter(series.values(), &delta);
        let x_d: Vec<Vec<f64>> = cols.iter().map(|c| apply_filter(c, &delta)).collect();
        let x_refs: Vec<&[f64]> = x_d.iter().map(Vec::as_slice).collect();
        let ols = ols_fit(&y_d, &x_refs, degree == 0)?;
        let w: Vec<f64> = (0..y_d.len())
            .map(|i| y_d[i] - ols.predict_row(&x_refs, i))
            .collect();

        let n_eff = (w.len() - ar_lag) as f64;
        let objective = |params: &[f64]| {
            let [ar, sar, ma, sma] = unpack(params, order, seasonal_order);
            let e = sarma_residuals(
                &w,
                &ar_polynomial(&ar, &sar, period),
                &ma_polynomial(&ma, &sma, period),
            );
            e[ar_lag..].iter().map(|v| v * v).sum::<f64>() / n_eff
        };

        let (params, sigma2, iterations) = if n_params == 0 {
            (vec![], objective(&[]), 0)
        } else {
            let initial = vec![0.1; n_params];
            let bounds = vec![(-COEF_BOUND, COEF_BOUND); n_params];
            let result = nelder_mead(
                &objective,
                &initial,
                Some(&bounds),
                NelderMeadConfig {
                    max_iter: self.max_iter,
                    tolerance: self.tolerance,
                    ..Default::default()
                },
            );
            if !result.converged || !result.optimal_value.is_finite() {
                return Err(InsightsError::ConvergenceFailure(format!(
                    "SARIMAX{order}x{seasonal_order} after {} iterations",
                    result.iterations
                )));
            }
            (result.optimal_point, result.optimal_value, result.iterations)
        };

        debug!(
            order = %order,
            seasonal_order = %seasonal_order,
            n_obs = series.len(),
            iterations,
            sigma2,
            "fitted SARIMAX"
        );

        let [ar, seasonal_ar, ma, seasonal_ma] = unpack(&params, order, seasonal_order);
        Ok(SarimaxModel {
            order,
            seasonal_order,
            exog: *exog,
            intercept: ols.intercept,
            beta: ols.coefficients,
            ar,
            seasonal_ar,
            ma,
            seasonal_ma,
            sigma2,
            n_obs: series.len(),
        })
    }

    fn name(&self) -> &str {
        "css-nelder-mead"
    }
}
