//! Climate regime discovery.
//!
//! Provides k-means clustering, the year-then-month triclustering of monthly
//! feature signatures, and the rule-based regime labels.
//!
//! # Example
//!
//! ```
//! use climate_insights::clustering::{kmeans, KMeansConfig};
//!
//! let points = vec![
//!     vec![1.0, 2.0, 1.0],
//!     vec![1.1, 2.1, 1.1],
//!     vec![10.0, 11.0, 10.0],
//!     vec![10.1, 11.1, 10.1],
//! ];
//! let result = kmeans(&points, &KMeansConfig::default().k(2).seed(42));
//! assert_eq!(result.centroids.len(), 2);
//! assert_eq!(result.labels[0], result.labels[1]);
//! ```

pub mod kmeans;
pub mod labeling;
pub mod tricluster;

pub use kmeans::{distinct_count, kmeans, KMeansConfig, KMeansResult};
pub use labeling::label_regime;
pub use tricluster::{tricluster, Direction, RegimeCluster, SignatureEntry, TriclusterResult};

use crate::config::AnalysisConfig;
use crate::error::Result;

/// Centroid-style clustering of equal-length vectors.
///
/// Returns one label per input. Labels need not be contiguous, but each
/// distinct label is treated as one group.
pub trait Clusterer: Send + Sync {
    fn cluster(&self, points: &[Vec<f64>], k: usize) -> Result<Vec<usize>>;
}

/// [`Clusterer`] backed by seeded k-means with restarts.
#[derive(Debug, Clone)]
pub struct KMeansClusterer {
    config: KMeansConfig,
}

impl Default for KMeansClusterer {
    fn default() -> Self {
        Self::new(KMeansConfig::default())
    }
}

impl KMeansClusterer {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    /// Seed and restarts taken from the analysis settings.
    pub fn from_analysis(config: &AnalysisConfig) -> Self {
        Self::new(
            KMeansConfig::default()
                .seed(config.seed)
                .n_init(config.n_init),
        )
    }
}

impl Clusterer for KMeansClusterer {
    fn cluster(&self, points: &[Vec<f64>], k: usize) -> Result<Vec<usize>> {
        let config = self.config.clone().k(k);
        Ok(kmeans(points, &config).labels)
    }
}
