//! Contiguous daily series built from gapped observations.

use crate::error::{InsightsError, Result};
use chrono::{Duration, NaiveDate};

/// A daily series with exactly one value per calendar day from `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    start: NaiveDate,
    values: Vec<f64>,
}

impl DailySeries {
    /// Wrap values that are already one-per-day starting at `start`.
    pub fn from_contiguous(start: NaiveDate, values: Vec<f64>) -> Self {
        Self { start, values }
    }

    /// Reindex observations onto the full min→max calendar and fill gaps.
    ///
    /// Missing days (and non-finite observations) are linearly interpolated
    /// between their bracketing known values; leading and trailing gaps take
    /// the nearest known value. Observations need not be sorted; a later
    /// duplicate date overwrites an earlier one.
    pub fn regularize(points: &[(NaiveDate, f64)]) -> Result<Self> {
        let start = points
            .iter()
            .map(|(d, _)| *d)
            .min()
            .ok_or_else(|| InsightsError::EmptyDataset("no daily observations".into()))?;
        let end = points.iter().map(|(d, _)| *d).max().unwrap_or(start);

        let len = (end - start).num_days() as usize + 1;
        let mut values = vec![f64::NAN; len];
        for (date, value) in points {
            let idx = (*date - start).num_days() as usize;
            values[idx] = *value;
        }

        if !values.iter().any(|v| v.is_finite()) {
            return Err(InsightsError::InputValidation(
                "series contains no finite values".into(),
            ));
        }

        fill_gaps(&mut values);
        Ok(Self { start, values })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last calendar day covered.
    pub fn end(&self) -> NaiveDate {
        self.date_at(self.values.len().saturating_sub(1))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Calendar day of position `i`.
    pub fn date_at(&self, i: usize) -> NaiveDate {
        self.start + Duration::days(i as i64)
    }

    /// All calendar days in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.values.len()).map(move |i| self.date_at(i))
    }

    /// Sub-series covering positions `[from, to)`.
    pub fn slice(&self, from: usize, to: usize) -> Result<Self> {
        if from > to || to > self.values.len() {
            return Err(InsightsError::InputValidation(format!(
                "slice [{from}, {to}) out of range for series of length {}",
                self.values.len()
            )));
        }
        Ok(Self {
            start: self.date_at(from),
            values: self.values[from..to].to_vec(),
        })
    }
}

/// Fill non-finite entries in place.
///
/// Interior gaps are interpolated linearly; leading gaps are back-filled and
/// trailing gaps forward-filled. A slice with no finite value is left as is.
pub fn fill_gaps(values: &mut [f64]) {
    let known: Vec<usize> = (0..values.len())
        .filter(|&i| values[i].is_finite())
        .collect();

    let (first, last) = match (known.first(), known.last()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return,
    };

    for pair in known.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b - a > 1 {
            let (va, vb) = (values[a], values[b]);
            let span = (b - a) as f64;
            for i in a + 1..b {
                values[i] = va + (vb - va) * (i - a) as f64 / span;
            }
        }
    }

    let head = values[first];
    for v in &mut values[..first] {
        *v = head;
    }
    let tail = values[last];
    for v in &mut values[last + 1..] {
        *v = tail;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn regularize_fills_interior_gap_linearly() {
        let points = vec![(day(2020, 1, 1), 0.0), (day(2020, 1, 5), 8.0)];
        let series = DailySeries::regularize(&points).unwrap();

        assert_eq!(series.len(), 5);
        assert_eq!(series.end(), day(2020, 1, 5));
        assert_relative_eq!(series.values()[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(series.values()[2], 4.0, epsilon = 1e-12);
        assert_relative_eq!(series.values()[3], 6.0, epsilon = 1e-12);
    }

    #[test]
    fn regularize_sorts_unordered_input() {
        let points = vec![
            (day(2020, 1, 3), 3.0),
            (day(2020, 1, 1), 1.0),
            (day(2020, 1, 2), 2.0),
        ];
        let series = DailySeries::regularize(&points).unwrap();
        assert_eq!(series.start(), day(2020, 1, 1));
        assert_eq!(series.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn edge_gaps_take_nearest_known_value() {
        let mut values = vec![f64::NAN, f64::NAN, 5.0, f64::NAN, 7.0, f64::NAN];
        fill_gaps(&mut values);
        assert_eq!(values, vec![5.0, 5.0, 5.0, 6.0, 7.0, 7.0]);
    }

    #[test]
    fn all_missing_is_rejected() {
        let points = vec![(day(2020, 1, 1), f64::NAN), (day(2020, 1, 2), f64::NAN)];
        assert!(matches!(
            DailySeries::regularize(&points),
            Err(InsightsError::InputValidation(_))
        ));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            DailySeries::regularize(&[]),
            Err(InsightsError::EmptyDataset(_))
        ));
    }

    #[test]
    fn slice_keeps_calendar_alignment() {
        let series = DailySeries::from_contiguous(day(2020, 2, 27), vec![1.0, 2.0, 3.0, 4.0]);
        let tail = series.slice(2, 4).unwrap();
        assert_eq!(tail.start(), day(2020, 2, 29));
        assert_eq!(tail.values(), &[3.0, 4.0]);
        assert!(series.slice(3, 5).is_err());
    }
}
