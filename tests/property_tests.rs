//! Property-based tests for the feature builder, gap filling and streaks.

use chrono::{Duration, NaiveDate};
use climate_insights::core::{DailyRecord, DailySeries};
use climate_insights::features::build_daily_features;
use climate_insights::insights::longest_streak;
use proptest::prelude::*;

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

fn records(values: &[f64]) -> Vec<DailyRecord> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| DailyRecord::new(base() + Duration::days(i as i64), v - 3.0, v + 3.0, v))
        .collect()
}

/// Sorted distinct day offsets with observed values.
fn gapped_strategy() -> impl Strategy<Value = Vec<(i64, f64)>> {
    prop::collection::btree_map(0i64..120, -30.0..40.0_f64, 2..40)
        .prop_map(|m| m.into_iter().collect())
}

proptest! {
    #[test]
    fn rolling_and_lag_features_follow_their_definitions(
        values in prop::collection::vec(-30.0..40.0_f64, 10..80)
    ) {
        let rows = build_daily_features(&records(&values)).unwrap();
        prop_assert_eq!(rows.len(), values.len() - 7);

        for (j, row) in rows.iter().enumerate() {
            let i = j + 7;
            let window = &values[i - 6..=i];
            let mean = window.iter().sum::<f64>() / 7.0;
            prop_assert!((row.roll_mean_7 - mean).abs() < 1e-9);
            prop_assert!((row.delta_7 - (values[i] - values[i - 7])).abs() < 1e-9);
            prop_assert!((row.delta_1 - (values[i] - values[i - 1])).abs() < 1e-9);
            prop_assert!(row.roll_std_7.is_finite() && row.roll_std_7 >= 0.0);
            prop_assert!(row.anomaly_z.is_finite());
            prop_assert!(row.time_idx.is_finite());
        }
    }

    #[test]
    fn anomaly_scores_are_deterministic(
        values in prop::collection::vec(-30.0..40.0_f64, 10..60)
    ) {
        let first = build_daily_features(&records(&values)).unwrap();
        let second = build_daily_features(&records(&values)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn regularized_calendar_is_contiguous_and_interpolation_is_bounded(
        points in gapped_strategy()
    ) {
        let observed: Vec<(NaiveDate, f64)> = points
            .iter()
            .map(|&(d, v)| (base() + Duration::days(d), v))
            .collect();
        let series = DailySeries::regularize(&observed).unwrap();

        let first = points[0].0;
        let last = points[points.len() - 1].0;
        prop_assert_eq!(series.len() as i64, last - first + 1);
        prop_assert_eq!(series.start(), base() + Duration::days(first));

        for pair in points.windows(2) {
            let ((d0, v0), (d1, v1)) = (pair[0], pair[1]);
            let (lo, hi) = (v0.min(v1), v0.max(v1));
            for d in d0..=d1 {
                let v = series.values()[(d - first) as usize];
                prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
            }
        }
    }

    #[test]
    fn longest_streak_matches_a_brute_force_scan(
        z in prop::collection::vec(-4.0..4.0_f64, 0..60)
    ) {
        let days: Vec<(NaiveDate, f64)> = z
            .iter()
            .enumerate()
            .map(|(i, &v)| (base() + Duration::days(i as i64), v))
            .collect();
        let streak = longest_streak(&days, |v| v >= 2.0);

        let mut best = 0;
        let mut run = 0;
        for &v in &z {
            run = if v >= 2.0 { run + 1 } else { 0 };
            best = best.max(run);
        }
        prop_assert_eq!(streak.length, best);

        match (streak.start, streak.end) {
            (Some(s), Some(e)) => {
                prop_assert_eq!((e - s).num_days() + 1, best as i64);
                prop_assert!(days.iter().filter(|(d, _)| *d >= s && *d <= e).all(|(_, v)| *v >= 2.0));
            }
            (None, None) => prop_assert_eq!(best, 0),
            _ => prop_assert!(false, "streak bounds must both be set or both be empty"),
        }
    }
}
