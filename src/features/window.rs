//! Trailing window statistics and lag helpers.
//!
//! Positions without a full window of history are NaN, which the feature
//! builders later drop.

/// Trailing rolling mean over `[i + 1 - window, i]`.
pub fn rolling_mean(series: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(series, window, 1, |s| s.iter().sum::<f64>() / s.len() as f64)
}

/// Trailing rolling sample standard deviation (n-1 denominator).
pub fn rolling_std(series: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(series, window, 2, |s| {
        let mean = s.iter().sum::<f64>() / s.len() as f64;
        let var = s.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (s.len() - 1) as f64;
        var.sqrt()
    })
}

/// `series[i] - series[i - lag]`, NaN for the first `lag` positions.
pub fn lag_difference(series: &[f64], lag: usize) -> Vec<f64> {
    (0..series.len())
        .map(|i| {
            if lag == 0 {
                0.0
            } else if i >= lag {
                series[i] - series[i - lag]
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Value `lag` positions back, NaN where unavailable.
pub fn shift(series: &[f64], lag: usize) -> Vec<f64> {
    (0..series.len())
        .map(|i| if i >= lag { series[i - lag] } else { f64::NAN })
        .collect()
}

fn rolling_apply<F>(series: &[f64], window: usize, min_window: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = series.len();
    let mut result = vec![f64::NAN; n];
    if window < min_window {
        return result;
    }
    for i in 0..n {
        if i + 1 < window {
            continue;
        }
        let segment = &series[i + 1 - window..=i];
        // A NaN anywhere in the window leaves the position undefined
        if segment.iter().all(|v| v.is_finite()) {
            result[i] = f(segment);
        }
    }
    result
}
