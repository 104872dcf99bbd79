//! Statistical helpers.

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n-1 denominator); NaN when fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Sample standard deviation; NaN when fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Population standard deviation (n denominator); NaN for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    (values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Least-squares slope of `y` against `x`.
///
/// Returns 0.0 when fewer than two points are given or `x` has no spread.
pub fn linear_slope(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let mx = mean(&x[..n]);
    let my = mean(&y[..n]);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for i in 0..n {
        sxy += (x[i] - mx) * (y[i] - my);
        sxx += (x[i] - mx).powi(2);
    }
    if sxx == 0.0 {
        return 0.0;
    }
    sxy / sxx
}

/// Replace a non-finite value with a default.
pub fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_calculates_correctly() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn variance_calculates_correctly() {
        // Sample variance of [1, 2, 3, 4, 5] = 2.5
        assert_relative_eq!(variance(&[1.0, 2.0, 3.0, 4.0, 5.0]), 2.5, epsilon = 1e-10);
        assert!(variance(&[1.0]).is_nan());
        assert!(std_dev(&[]).is_nan());
    }

    #[test]
    fn population_std_uses_n() {
        // Population variance of [1, 2, 3, 4, 5] = 2.0
        assert_relative_eq!(
            population_std(&[1.0, 2.0, 3.0, 4.0, 5.0]),
            2.0_f64.sqrt(),
            epsilon = 1e-10
        );
        assert_relative_eq!(population_std(&[4.0]), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn slope_of_exact_line() {
        let x = [2000.0, 2001.0, 2002.0, 2003.0];
        let y = [10.0, 10.5, 11.0, 11.5];
        assert_relative_eq!(linear_slope(&x, &y), 0.5, epsilon = 1e-10);
    }

    #[test]
    fn slope_degenerate_cases() {
        assert_eq!(linear_slope(&[2000.0], &[10.0]), 0.0);
        assert_eq!(linear_slope(&[1.0, 1.0], &[3.0, 5.0]), 0.0);
    }

    #[test]
    fn finite_or_replaces_nan() {
        assert_eq!(finite_or(f64::NAN, 0.0), 0.0);
        assert_eq!(finite_or(1.5, 0.0), 1.5);
    }
}
