//! Differencing polynomials for models with integrated components.
//!
//! A polynomial is stored as its coefficient vector in the backshift
//! operator `B`, lowest power first, so `[1.0, -1.0]` is `1 - B`.

/// Product of two backshift polynomials.
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return vec![];
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Coefficients of `(1 - B)^d (1 - B^period)^seasonal_d`.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = multiply(&poly, &seasonal);
        }
    }
    poly
}

/// Apply a backshift polynomial to a series.
///
/// The first `poly.len() - 1` positions have no full lag history and are
/// dropped, so the result is shorter than the input by the polynomial degree.
pub fn apply_filter(series: &[f64], poly: &[f64]) -> Vec<f64> {
    let degree = poly.len().saturating_sub(1);
    if series.len() <= degree {
        return vec![];
    }
    (degree..series.len())
        .map(|t| {
            poly.iter()
                .enumerate()
                .map(|(l, c)| c * series[t - l])
                .sum()
        })
        .collect()
}

/// Undo a differencing filter for values that follow `history`.
///
/// Solves `sum_l poly[l] * u[t - l] = w[t]` for each new `u[t]`, using the
/// tail of `history` and previously integrated values as the lagged terms.
/// `poly[0]` must be 1.
pub fn integrate(history: &[f64], differenced: &[f64], poly: &[f64]) -> Vec<f64> {
    let mut extended = history.to_vec();
    for &w in differenced {
        let t = extended.len();
        let lagged: f64 = poly
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(l, _)| *l <= t)
            .map(|(l, c)| c * extended[t - l])
            .sum();
        extended.push(w - lagged);
    }
    extended.split_off(history.len())
}
