//! Ordinary Least Squares for exogenous regressors.
//!
//! Used by the seasonal model to estimate the regression part of a
//! regression-with-SARMA-errors fit before the error process is optimized.

use crate::error::{InsightsError, Result};

/// Fitted OLS coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    /// One coefficient per regressor column, in input order.
    pub coefficients: Vec<f64>,
    /// Intercept term (0.0 when fitted without intercept).
    pub intercept: f64,
}

impl OlsFit {
    /// Predict row `i` of the given columns.
    pub fn predict_row(&self, columns: &[&[f64]], i: usize) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(columns.iter())
                .map(|(b, col)| b * col[i])
                .sum::<f64>()
    }
}

/// Fit `y = [intercept] + X @ coefficients` by solving the normal equations.
///
/// # Arguments
/// * `y` - Target values (length n)
/// * `columns` - Regressor columns, each of length n
/// * `fit_intercept` - Whether to estimate an intercept
pub fn ols_fit(y: &[f64], columns: &[&[f64]], fit_intercept: bool) -> Result<OlsFit> {
    let n = y.len();
    if n == 0 {
        return Err(InsightsError::InsufficientHistory { needed: 1, got: 0 });
    }
    for col in columns {
        if col.len() != n {
            return Err(InsightsError::DimensionMismatch {
                expected: n,
                got: col.len(),
            });
        }
    }

    let k = columns.len();
    let offset = usize::from(fit_intercept);
    let num_params = k + offset;

    if num_params == 0 {
        return Ok(OlsFit {
            coefficients: vec![],
            intercept: 0.0,
        });
    }

    // X'X and X'y with an optional leading column of ones
    let mut xtx = vec![vec![0.0; num_params]; num_params];
    let mut xty = vec![0.0; num_params];
    let mut row = vec![0.0; num_params];

    for obs in 0..n {
        if fit_intercept {
            row[0] = 1.0;
        }
        for j in 0..k {
            row[j + offset] = columns[j][obs];
        }
        for i in 0..num_params {
            xty[i] += row[i] * y[obs];
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..num_params {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
        // Small ridge for numerical stability
        xtx[i][i] += 1e-8;
    }

    let beta = solve_symmetric(&xtx, &xty).ok_or_else(|| {
        InsightsError::Computation("OLS regression failed: matrix not positive definite".into())
    })?;

    Ok(OlsFit {
        intercept: if fit_intercept { beta[0] } else { 0.0 },
        coefficients: beta[offset..].to_vec(),
    })
}

/// Solve a symmetric positive definite system with a Cholesky decomposition.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // A = L @ L'
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // L @ y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // L' @ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ols_fit_simple_linear() {
        // y = 2 + 3*x
        let y = vec![5.0, 8.0, 11.0, 14.0, 17.0];
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];

        let fit = ols_fit(&y, &[&x], true).unwrap();

        assert_relative_eq!(fit.intercept, 2.0, epsilon = 1e-6);
        assert_relative_eq!(fit.coefficients[0], 3.0, epsilon = 1e-6);
        assert_relative_eq!(fit.predict_row(&[&x], 2), 11.0, epsilon = 1e-6);
    }

    #[test]
    fn ols_fit_without_intercept() {
        // y = 1.5*x1 - 2*x2
        let x1: Vec<f64> = (0..20).map(|i| (i as f64 * 0.3).sin()).collect();
        let x2: Vec<f64> = (0..20).map(|i| (i as f64 * 0.7).cos()).collect();
        let y: Vec<f64> = x1.iter().zip(&x2).map(|(a, b)| 1.5 * a - 2.0 * b).collect();

        let fit = ols_fit(&y, &[&x1, &x2], false).unwrap();

        assert_eq!(fit.intercept, 0.0);
        assert_relative_eq!(fit.coefficients[0], 1.5, epsilon = 1e-5);
        assert_relative_eq!(fit.coefficients[1], -2.0, epsilon = 1e-5);
    }

    #[test]
    fn ols_intercept_only_is_mean() {
        let y = vec![1.0, 2.0, 3.0, 6.0];
        let fit = ols_fit(&y, &[], true).unwrap();
        assert_relative_eq!(fit.intercept, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn ols_dimension_mismatch() {
        let y = vec![1.0, 2.0, 3.0];
        let x = vec![1.0, 2.0];
        assert!(matches!(
            ols_fit(&y, &[&x], true),
            Err(InsightsError::DimensionMismatch { .. })
        ));
    }
}
