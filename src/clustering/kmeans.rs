//! K-means clustering with k-means++ seeding and restarts.
//!
//! The requested `k` is capped at the number of distinct input vectors, and
//! clusters left empty after convergence are dropped with labels compacted,
//! so identical inputs always land in a single cluster.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// K-means configuration.
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Number of clusters
    pub k: usize,
    /// Maximum Lloyd iterations per restart
    pub max_iter: usize,
    /// Independent restarts; the lowest inertia wins
    pub n_init: usize,
    /// Seed for initialization
    pub seed: u64,
    /// Convergence tolerance on the inertia change
    pub tolerance: f64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 3,
            max_iter: 300,
            n_init: 10,
            seed: 42,
            tolerance: 1e-10,
        }
    }
}

impl KMeansConfig {
    /// Set number of clusters.
    pub fn k(mut self, k: usize) -> Self {
        self.k = k.max(1);
        self
    }

    /// Set maximum iterations.
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set number of restarts.
    pub fn n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    /// Set random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// K-means clustering result.
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster assignment of each input (0-indexed, no gaps)
    pub labels: Vec<usize>,
    /// One centroid per non-empty cluster
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,
    /// Iterations of the winning restart
    pub n_iter: usize,
}

impl KMeansResult {
    /// Indices of the inputs in `cluster`.
    pub fn cluster_members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == cluster)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for &label in &self.labels {
            if label < sizes.len() {
                sizes[label] += 1;
            }
        }
        sizes
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Number of distinct vectors, compared exactly.
pub fn distinct_count(points: &[Vec<f64>]) -> usize {
    let mut seen: Vec<&Vec<f64>> = Vec::new();
    for p in points {
        if !seen.iter().any(|s| *s == p) {
            seen.push(p);
        }
    }
    seen.len()
}

/// Cluster `points` into at most `config.k` groups.
pub fn kmeans(points: &[Vec<f64>], config: &KMeansConfig) -> KMeansResult {
    let n = points.len();
    let k = config.k.min(distinct_count(points));
    if n == 0 || k == 0 {
        return KMeansResult {
            labels: Vec::new(),
            centroids: Vec::new(),
            inertia: 0.0,
            n_iter: 0,
        };
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best: Option<KMeansResult> = None;
    for _ in 0..config.n_init.max(1) {
        let run = lloyd(points, initialize_centroids(points, k, &mut rng), config);
        if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
            best = Some(run);
        }
    }

    match best {
        Some(result) => compact(result),
        None => KMeansResult {
            labels: vec![0; n],
            centroids: vec![mean_of(points, &(0..n).collect::<Vec<_>>())],
            inertia: 0.0,
            n_iter: 0,
        },
    }
}

/// k-means++: each further centroid is drawn with probability proportional
/// to its squared distance from the nearest chosen centroid.
fn initialize_centroids(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..n)].clone());

    while centroids.len() < k {
        let distances: Vec<f64> = points
            .iter()
            .map(|p| {
                centroids
                    .iter()
                    .map(|c| squared_distance(p, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = distances.iter().sum();
        if total <= 0.0 {
            break;
        }

        let threshold = rng.gen::<f64>() * total;
        let mut cumsum = 0.0;
        let mut selected = None;
        for (i, &d) in distances.iter().enumerate() {
            cumsum += d;
            if d > 0.0 && cumsum >= threshold {
                selected = Some(i);
                break;
            }
        }
        // Rounding can leave the threshold just above the final sum
        let selected = selected.or_else(|| distances.iter().rposition(|&d| d > 0.0));
        match selected {
            Some(i) => centroids.push(points[i].clone()),
            None => break,
        }
    }
    centroids
}

fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_distance(point, c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

fn mean_of(points: &[Vec<f64>], members: &[usize]) -> Vec<f64> {
    let dim = points.first().map_or(0, Vec::len);
    let mut mean = vec![0.0; dim];
    for &i in members {
        for (m, v) in mean.iter_mut().zip(&points[i]) {
            *m += v;
        }
    }
    let count = members.len().max(1) as f64;
    mean.iter_mut().for_each(|m| *m /= count);
    mean
}

fn lloyd(points: &[Vec<f64>], mut centroids: Vec<Vec<f64>>, config: &KMeansConfig) -> KMeansResult {
    let mut labels = vec![0; points.len()];
    let mut prev_inertia = f64::INFINITY;
    let mut n_iter = 0;

    for iter in 0..config.max_iter.max(1) {
        n_iter = iter + 1;
        let mut inertia = 0.0;
        for (i, p) in points.iter().enumerate() {
            let (c, d) = nearest(p, &centroids);
            labels[i] = c;
            inertia += d;
        }
        if (prev_inertia - inertia).abs() <= config.tolerance {
            break;
        }
        prev_inertia = inertia;

        for (c, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<usize> = (0..points.len()).filter(|&i| labels[i] == c).collect();
            // Empty clusters keep their previous centroid
            if !members.is_empty() {
                *centroid = mean_of(points, &members);
            }
        }
    }

    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(p, &l)| squared_distance(p, &centroids[l]))
        .sum();
    KMeansResult {
        labels,
        centroids,
        inertia,
        n_iter,
    }
}

/// Drop empty clusters and renumber the rest in centroid order.
fn compact(result: KMeansResult) -> KMeansResult {
    let sizes = result.cluster_sizes();
    let mut remap = vec![usize::MAX; sizes.len()];
    let mut centroids = Vec::new();
    for (old, centroid) in result.centroids.into_iter().enumerate() {
        if sizes[old] > 0 {
            remap[old] = centroids.len();
            centroids.push(centroid);
        }
    }
    KMeansResult {
        labels: result.labels.iter().map(|&l| remap[l]).collect(),
        centroids,
        inertia: result.inertia,
        n_iter: result.n_iter,
    }
}
