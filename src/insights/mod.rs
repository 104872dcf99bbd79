//! Insight report built from the feature tables and the regime clusters.

mod payload;
mod streaks;

pub use payload::{
    month_name, AnomalyDay, DataHealth, Extremes, InsightsPayload, MonthBaseline, PatternCluster,
    Patterns, Summary, TemperatureDay, MONTH_NAMES,
};
pub use streaks::{longest_streak, Streak};

use crate::clustering::TriclusterResult;
use crate::config::AnalysisConfig;
use crate::core::{DailyFeatureRow, MonthlyFeatureRow};
use crate::utils::stats::finite_or;
use crate::utils::{linear_slope, mean};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Assemble the report for one run.
///
/// A pure function of its inputs: `daily` must be ordered by date as the
/// feature builder returns it.
pub fn compute_insights(
    city_key: &str,
    daily: &[DailyFeatureRow],
    monthly: &[MonthlyFeatureRow],
    tri: &TriclusterResult,
    run_id: &str,
    config: &AnalysisConfig,
) -> InsightsPayload {
    let data_start = daily.iter().map(|r| r.date).min();
    let data_end = daily.iter().map(|r| r.date).max();

    let baseline = monthly_baseline(monthly);
    let hottest_month = extreme_month(&baseline, Ordering::Greater);
    let coolest_month = extreme_month(&baseline, Ordering::Less);

    let threshold = config.anomaly_threshold;
    let anomaly_days: Vec<_> = daily.iter().map(|r| (r.date, r.anomaly_z)).collect();
    let anomaly_count = daily
        .iter()
        .filter(|r| r.anomaly_z.abs() >= threshold)
        .count();

    let extremes = Extremes {
        top_hot_days: top_by(daily, config.top_n, |r| r.tavg)
            .map(|r| TemperatureDay {
                date: r.date,
                tavg: r.tavg,
            })
            .collect(),
        top_cold_days: top_by(daily, config.top_n, |r| -r.tavg)
            .map(|r| TemperatureDay {
                date: r.date,
                tavg: r.tavg,
            })
            .collect(),
        top_anomaly_days: top_by(daily, config.top_n, |r| r.anomaly_z.abs())
            .map(|r| AnomalyDay {
                date: r.date,
                anomaly_z: r.anomaly_z,
            })
            .collect(),
        warm_anomaly_streak_abs_ge_2: longest_streak(&anomaly_days, |z| z >= threshold),
        cold_anomaly_streak_abs_ge_2: longest_streak(&anomaly_days, |z| z <= -threshold),
    };

    let data_health = data_start.zip(data_end).map(|(start, end)| {
        let expected_days = (end - start).num_days() + 1;
        DataHealth {
            data_start: start,
            data_end: end,
            expected_days,
            actual_days: daily.len(),
            coverage_ratio: if expected_days <= 0 {
                1.0
            } else {
                daily.len() as f64 / expected_days as f64
            },
        }
    });

    let clusters = tri
        .clusters
        .iter()
        .map(|c| PatternCluster {
            label: c.label.clone(),
            years: c.years.clone(),
            months: c.months.clone(),
            months_names: c.months.iter().map(|&m| month_name(m)).collect(),
            signature_top5: c.signature_top5.clone(),
        })
        .collect();

    InsightsPayload {
        city_key: city_key.to_string(),
        analysis_run_id: run_id.to_string(),
        data_start,
        data_end,
        summary: Summary {
            hottest_month,
            coolest_month,
            annual_trend_c_per_year: annual_trend(monthly),
            anomaly_days_count_abs_ge_2: anomaly_count,
        },
        monthly_baseline: baseline,
        extremes,
        patterns: Patterns {
            k_years: tri.k_years,
            k_months: tri.k_months,
            features_used: tri.features_used.clone(),
            clusters,
        },
        data_health,
    }
}

/// Per calendar month, the mean of each year's monthly aggregates.
pub fn monthly_baseline(monthly: &[MonthlyFeatureRow]) -> Vec<MonthBaseline> {
    let mut by_month: BTreeMap<u32, Vec<&MonthlyFeatureRow>> = BTreeMap::new();
    for row in monthly {
        by_month.entry(row.month).or_default().push(row);
    }
    by_month
        .into_iter()
        .map(|(month, rows)| {
            let avg = |f: fn(&MonthlyFeatureRow) -> f64| {
                mean(&rows.iter().map(|&r| f(r)).collect::<Vec<_>>())
            };
            MonthBaseline {
                month,
                month_name: month_name(month),
                tavg_mean: avg(|r| r.tavg_mean),
                tavg_std: finite_or(avg(|r| r.tavg_std), 0.0),
                diurnal_mean: finite_or(avg(|r| r.diurnal_mean), 0.0),
            }
        })
        .collect()
}

/// First month whose mean temperature compares as `wanted` to all others.
fn extreme_month(baseline: &[MonthBaseline], wanted: Ordering) -> Option<MonthBaseline> {
    baseline
        .iter()
        .fold(None::<&MonthBaseline>, |best, m| match best {
            Some(b) if m.tavg_mean.total_cmp(&b.tavg_mean) != wanted => Some(b),
            _ => Some(m),
        })
        .cloned()
}

/// Least-squares slope of the yearly mean of `tavg_mean` against the year.
pub fn annual_trend(monthly: &[MonthlyFeatureRow]) -> f64 {
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for row in monthly {
        by_year.entry(row.year).or_default().push(row.tavg_mean);
    }
    let (years, means): (Vec<f64>, Vec<f64>) = by_year
        .iter()
        .map(|(&y, values)| (f64::from(y), mean(values)))
        .unzip();
    finite_or(linear_slope(&years, &means), 0.0)
}

/// The `n` rows with the largest `key`, largest first; ties keep date order.
fn top_by<F>(daily: &[DailyFeatureRow], n: usize, key: F) -> impl Iterator<Item = &DailyFeatureRow>
where
    F: Fn(&DailyFeatureRow) -> f64,
{
    let mut ranked: Vec<&DailyFeatureRow> = daily.iter().collect();
    ranked.sort_by(|a, b| key(b).total_cmp(&key(a)));
    ranked.into_iter().take(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::{RegimeCluster, SignatureEntry};
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn daily_rows(tavg: &[f64], anomaly: &[f64]) -> Vec<DailyFeatureRow> {
        let start = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        tavg.iter()
            .zip(anomaly)
            .enumerate()
            .map(|(i, (&t, &z))| DailyFeatureRow {
                date: start + Duration::days(i as i64),
                tmin: t - 4.0,
                tmax: t + 4.0,
                tavg: t,
                diurnal_range: 8.0,
                delta_1: 0.0,
                delta_7: 0.0,
                roll_mean_7: t,
                roll_std_7: 0.0,
                doy_sin: 0.0,
                doy_cos: 1.0,
                time_idx: i as f64 / 365.25,
                anomaly_z: z,
            })
            .collect()
    }

    fn month(year: i32, month: u32, tavg_mean: f64) -> MonthlyFeatureRow {
        MonthlyFeatureRow {
            year,
            month,
            tavg_mean,
            tavg_std: 1.0,
            diurnal_mean: 8.0,
            roll_std_mean: 1.0,
            anomaly_mean: 0.0,
            delta_1_mean: 0.0,
        }
    }

    fn tri() -> TriclusterResult {
        TriclusterResult {
            features_used: vec!["tavg_mean".into()],
            k_years: 1,
            k_months: 2,
            clusters: vec![RegimeCluster {
                years: vec![2020],
                months: vec![1, 7, 12],
                signature_top5: vec![SignatureEntry::new("tavg_mean", 1.2)],
                label: "Seasonal regime".into(),
            }],
        }
    }

    #[test]
    fn report_summarizes_extremes_and_streaks() {
        let tavg = [20.0, 25.0, 18.0, 30.0, 22.0, 19.0, 21.0, 24.0, 23.0];
        let anomaly = [0.0, 0.0, 2.1, 2.5, 0.0, 3.0, 3.0, 3.0, -2.4];
        let daily = daily_rows(&tavg, &anomaly);
        let config = AnalysisConfig {
            top_n: 3,
            ..Default::default()
        };
        let payload = compute_insights("rome_it", &daily, &[], &tri(), "run-1", &config);

        let hot: Vec<f64> = payload.extremes.top_hot_days.iter().map(|d| d.tavg).collect();
        assert_eq!(hot, vec![30.0, 25.0, 24.0]);
        let cold: Vec<f64> = payload.extremes.top_cold_days.iter().map(|d| d.tavg).collect();
        assert_eq!(cold, vec![18.0, 19.0, 20.0]);
        assert_eq!(payload.extremes.top_anomaly_days[0].anomaly_z, 3.0);

        assert_eq!(payload.extremes.warm_anomaly_streak_abs_ge_2.length, 3);
        assert_eq!(
            payload.extremes.warm_anomaly_streak_abs_ge_2.end,
            Some(daily[7].date)
        );
        assert_eq!(payload.extremes.cold_anomaly_streak_abs_ge_2.length, 1);
        assert_eq!(payload.summary.anomaly_days_count_abs_ge_2, 6);

        let health = payload.data_health.unwrap();
        assert_eq!(health.expected_days, 9);
        assert_relative_eq!(health.coverage_ratio, 1.0);
    }

    #[test]
    fn baseline_and_trend_come_from_monthly_rows() {
        let monthly = vec![
            month(2018, 1, 2.0),
            month(2018, 7, 24.0),
            month(2019, 1, 4.0),
            month(2019, 7, 26.0),
            month(2020, 1, 6.0),
            month(2020, 7, 28.0),
        ];
        let baseline = monthly_baseline(&monthly);

        assert_eq!(baseline.len(), 2);
        assert_eq!(baseline[0].month_name, "Jan");
        assert_relative_eq!(baseline[0].tavg_mean, 4.0);
        assert_relative_eq!(annual_trend(&monthly), 2.0, epsilon = 1e-12);

        let payload = compute_insights("x", &[], &monthly, &tri(), "r", &AnalysisConfig::default());
        assert_eq!(payload.summary.hottest_month.unwrap().month, 7);
        assert_eq!(payload.summary.coolest_month.unwrap().month, 1);
        assert!(payload.data_health.is_none());
        assert!(payload.data_start.is_none());
    }

    #[test]
    fn single_year_has_flat_trend() {
        assert_eq!(annual_trend(&[month(2020, 1, 3.0), month(2020, 2, 9.0)]), 0.0);
        assert_eq!(annual_trend(&[]), 0.0);
    }

    #[test]
    fn equal_months_keep_the_first() {
        let baseline = monthly_baseline(&[month(2020, 3, 10.0), month(2020, 4, 10.0)]);
        assert_eq!(extreme_month(&baseline, Ordering::Greater).unwrap().month, 3);
        assert_eq!(extreme_month(&baseline, Ordering::Less).unwrap().month, 3);
    }

    #[test]
    fn clusters_gain_month_names() {
        let payload = compute_insights("x", &[], &[], &tri(), "r", &AnalysisConfig::default());
        let cluster = &payload.patterns.clusters[0];
        assert_eq!(cluster.months_names, vec!["Jan", "Jul", "Dec"]);
        assert_eq!(payload.patterns.k_months, 2);

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["summary"]["annual_trend_c_per_year"].is_number());
        assert!(json["extremes"]["warm_anomaly_streak_abs_ge_2"]["start"].is_null());
        assert_eq!(json["patterns"]["clusters"][0]["signature_top5"][0]["direction"], "high");
    }
}
