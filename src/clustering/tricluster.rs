//! Year-then-month triclustering of monthly climate signatures.
//!
//! The monthly table becomes a dense `years x 12 x features` tensor, each
//! feature z-scored over the whole tensor. Years are clustered on their
//! flattened blocks; then, inside every year cluster, the twelve rows of the
//! cluster's mean pattern are clustered into month groups. Each
//! (year cluster, month group) cell is summarized by its strongest features.

use super::labeling::label_regime;
use super::Clusterer;
use crate::core::{MonthlyFeatureRow, MONTHLY_FEATURES};
use crate::error::{InsightsError, Result};
use crate::utils::{mean, population_std};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

const MONTHS: usize = 12;
const SIGNATURE_LEN: usize = 5;

/// Sign of a signature z-score; zero counts as high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    High,
    Low,
}

/// One ranked feature of a regime signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub feature: String,
    pub zscore: f64,
    pub direction: Direction,
}

impl SignatureEntry {
    pub fn new(feature: &str, zscore: f64) -> Self {
        Self {
            feature: feature.to_string(),
            zscore,
            direction: if zscore >= 0.0 {
                Direction::High
            } else {
                Direction::Low
            },
        }
    }
}

/// One (year cluster, month group) regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeCluster {
    pub years: Vec<i32>,
    /// Calendar months, 1-based.
    pub months: Vec<u32>,
    pub signature_top5: Vec<SignatureEntry>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriclusterResult {
    pub features_used: Vec<String>,
    /// Year clusters requested after clamping.
    pub k_years: usize,
    /// Month groups requested after clamping.
    pub k_months: usize,
    pub clusters: Vec<RegimeCluster>,
}

/// Cluster the monthly table of one city.
///
/// `k_years` is clamped to the number of distinct years and `k_months` to
/// 12, both to at least 1. A clamped value of 1 yields a single group
/// without calling `clusterer`.
pub fn tricluster(
    monthly: &[MonthlyFeatureRow],
    k_years: usize,
    k_months: usize,
    clusterer: &dyn Clusterer,
) -> Result<TriclusterResult> {
    if monthly.is_empty() {
        return Err(InsightsError::EmptyDataset(
            "no monthly analysis data available for triclustering".into(),
        ));
    }

    let years: Vec<i32> = monthly
        .iter()
        .map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let tensor = normalized_tensor(monthly, &years);

    let ky = k_years.clamp(1, years.len());
    let km = k_months.clamp(1, MONTHS);

    let year_vectors: Vec<Vec<f64>> = tensor.iter().map(|block| block.concat()).collect();
    let year_labels = assign(clusterer, &year_vectors, ky)?;

    let mut clusters = Vec::new();
    for yc in distinct(&year_labels) {
        let members: Vec<usize> = (0..years.len()).filter(|&i| year_labels[i] == yc).collect();
        let pattern = mean_pattern(&tensor, &members);

        let month_labels = assign(clusterer, &pattern, km)?;
        for mc in distinct(&month_labels) {
            let month_idx: Vec<usize> = (0..MONTHS).filter(|&m| month_labels[m] == mc).collect();
            let signature = signature(&pattern, &month_idx);
            let label = label_regime(&signature).to_string();
            clusters.push(RegimeCluster {
                years: members.iter().map(|&i| years[i]).collect(),
                months: month_idx.iter().map(|&m| m as u32 + 1).collect(),
                signature_top5: signature,
                label,
            });
        }
    }

    debug!(
        years = years.len(),
        k_years = ky,
        k_months = km,
        regimes = clusters.len(),
        "triclustered monthly features"
    );

    Ok(TriclusterResult {
        features_used: MONTHLY_FEATURES.iter().map(|s| s.to_string()).collect(),
        k_years: ky,
        k_months: km,
        clusters,
    })
}

type Tensor = Vec<Vec<Vec<f64>>>;

/// Dense `years x 12 x features` tensor; missing cells take the feature's
/// mean over present cells, then each feature is z-scored over all cells.
fn normalized_tensor(monthly: &[MonthlyFeatureRow], years: &[i32]) -> Tensor {
    let n_features = MONTHLY_FEATURES.len();
    let mut tensor = vec![vec![vec![f64::NAN; n_features]; MONTHS]; years.len()];
    for row in monthly {
        let (Ok(y), Some(m)) = (years.binary_search(&row.year), row.month.checked_sub(1)) else {
            continue;
        };
        if (m as usize) < MONTHS {
            tensor[y][m as usize] = row.features().to_vec();
        }
    }

    for f in 0..n_features {
        let present: Vec<f64> = tensor
            .iter()
            .flatten()
            .map(|cell| cell[f])
            .filter(|v| v.is_finite())
            .collect();
        let fill = if present.is_empty() { 0.0 } else { mean(&present) };
        for cell in tensor.iter_mut().flatten() {
            if !cell[f].is_finite() {
                cell[f] = fill;
            }
        }

        let column: Vec<f64> = tensor.iter().flatten().map(|cell| cell[f]).collect();
        let mu = mean(&column);
        let sd = match population_std(&column) {
            sd if sd > 0.0 && sd.is_finite() => sd,
            _ => 1.0,
        };
        for cell in tensor.iter_mut().flatten() {
            cell[f] = (cell[f] - mu) / sd;
        }
    }
    tensor
}

fn assign(clusterer: &dyn Clusterer, points: &[Vec<f64>], k: usize) -> Result<Vec<usize>> {
    if k <= 1 {
        return Ok(vec![0; points.len()]);
    }
    let labels = clusterer.cluster(points, k)?;
    if labels.len() != points.len() {
        return Err(InsightsError::DimensionMismatch {
            expected: points.len(),
            got: labels.len(),
        });
    }
    Ok(labels)
}

fn distinct(labels: &[usize]) -> Vec<usize> {
    labels.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Mean `12 x features` pattern over the member years.
fn mean_pattern(tensor: &Tensor, members: &[usize]) -> Vec<Vec<f64>> {
    (0..MONTHS)
        .map(|m| {
            (0..MONTHLY_FEATURES.len())
                .map(|f| {
                    let values: Vec<f64> = members.iter().map(|&y| tensor[y][m][f]).collect();
                    mean(&values)
                })
                .collect()
        })
        .collect()
}

/// Top features of the mean of `month_idx` rows, by |z| descending.
fn signature(pattern: &[Vec<f64>], month_idx: &[usize]) -> Vec<SignatureEntry> {
    let mut scores: Vec<(usize, f64)> = (0..MONTHLY_FEATURES.len())
        .map(|f| {
            let values: Vec<f64> = month_idx.iter().map(|&m| pattern[m][f]).collect();
            (f, mean(&values))
        })
        .collect();
    scores.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    scores
        .into_iter()
        .take(SIGNATURE_LEN)
        .map(|(f, z)| SignatureEntry::new(MONTHLY_FEATURES[f], z))
        .collect()
}
