//! Clustering of engineered records
//!
//! Encodes the feature table into one scaled vector per record and
//! partitions the records with K-means. Seeding is fixed so repeated runs
//! over the same input give the same labels.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use steelmatch_core::{min_max_scale, Error, RecordId, Result, Vector};
use tracing::{debug, info};

use crate::engine::{one_hot_rows, scaled_numeric_rows};
use crate::features::FeatureTable;

/// Seed of every K-means run
pub const KMEANS_SEED: u64 = 42;

pub const DEFAULT_CLUSTERS: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterConfig {
    #[serde(default = "default_k")]
    pub k: usize,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Stop once the summed squared centroid shift falls to this value
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// One-hot encoded columns, where present
    #[serde(default = "default_categorical_columns")]
    pub categorical_columns: Vec<String>,
}

fn default_k() -> usize {
    DEFAULT_CLUSTERS
}

fn default_max_iterations() -> usize {
    100
}

fn default_tolerance() -> f64 {
    1e-4
}

fn default_categorical_columns() -> Vec<String> {
    ["coating", "finish", "form", "surface_type"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            categorical_columns: default_categorical_columns(),
        }
    }
}

impl ClusterConfig {
    #[must_use]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub id: RecordId,
    pub cluster: usize,
}

/// Result of one clustering run
#[derive(Debug, Clone)]
pub struct Clustering {
    /// One entry per record, in table order
    pub assignments: Vec<ClusterAssignment>,
    pub centroids: Vec<Vector>,
    pub iterations: usize,
    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,
}

impl Clustering {
    pub fn labels(&self) -> Vec<usize> {
        self.assignments.iter().map(|a| a.cluster).collect()
    }

    /// Records per cluster, indexed by label
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for a in &self.assignments {
            sizes[a.cluster] += 1;
        }
        sizes
    }
}

/// Per-cluster statistics over the raw numeric features
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub cluster: usize,
    pub size: usize,
    /// Mean of each numeric column over members with a value
    pub means: Vec<(String, Option<f64>)>,
}

/// Encode each record as scaled numeric features followed by one-hot
/// categoricals, then scale the concatenation once more.
pub fn encode(features: &FeatureTable, config: &ClusterConfig) -> Vec<Vector> {
    let numeric = scaled_numeric_rows(features, features.numeric_columns().as_slice());
    let categorical_columns: Vec<&String> = config
        .categorical_columns
        .iter()
        .filter(|c| features.categorical_columns().contains(*c))
        .collect();
    let categorical = one_hot_rows(features, &categorical_columns);

    let mut rows: Vec<Vector> = numeric
        .into_iter()
        .zip(categorical)
        .map(|(mut row, onehot)| {
            row.extend(&onehot);
            row
        })
        .collect();
    min_max_scale(&mut rows);
    rows
}

/// Partition the records of `features` into `config.k` clusters
pub fn cluster(features: &FeatureTable, config: &ClusterConfig) -> Result<Clustering> {
    if config.k == 0 {
        return Err(Error::InvalidParameter("cluster count must be at least 1".to_string()));
    }
    if features.len() < config.k {
        return Err(Error::InvalidParameter(format!(
            "{} records cannot form {} clusters",
            features.len(),
            config.k
        )));
    }

    let rows = encode(features, config);
    let model = KMeans {
        k: config.k,
        max_iterations: config.max_iterations,
        tolerance: config.tolerance,
    }
    .fit(&rows, KMEANS_SEED);

    debug!(
        iterations = model.iterations,
        inertia = model.inertia,
        "k-means converged"
    );

    let assignments = features
        .ids()
        .into_iter()
        .zip(model.labels)
        .map(|(id, cluster)| ClusterAssignment { id, cluster })
        .collect();

    Ok(Clustering {
        assignments,
        centroids: model.centroids,
        iterations: model.iterations,
        inertia: model.inertia,
    })
}

/// Cluster sizes and numeric means, one summary per label
pub fn summarize(features: &FeatureTable, clustering: &Clustering) -> Vec<ClusterSummary> {
    let columns = features.numeric_columns();
    let labels = clustering.labels();

    clustering
        .sizes()
        .into_iter()
        .enumerate()
        .map(|(cluster, size)| {
            let means = columns
                .iter()
                .map(|column| {
                    let values: Vec<f64> = labels
                        .iter()
                        .enumerate()
                        .filter(|(_, label)| **label == cluster)
                        .filter_map(|(row, _)| features.number(row, column))
                        .collect();
                    let mean = if values.is_empty() {
                        None
                    } else {
                        Some(values.iter().sum::<f64>() / values.len() as f64)
                    };
                    (column.clone(), mean)
                })
                .collect();
            ClusterSummary { cluster, size, means }
        })
        .collect()
}

/// Log cluster sizes and numeric means
pub fn log_insights(summaries: &[ClusterSummary]) {
    for summary in summaries {
        info!(cluster = summary.cluster, size = summary.size, "records per cluster");
        for (column, mean) in &summary.means {
            if let Some(mean) = mean {
                info!(cluster = summary.cluster, column = %column, mean = *mean, "cluster mean");
            }
        }
    }
}

struct KMeans {
    k: usize,
    max_iterations: usize,
    tolerance: f64,
}

struct KMeansModel {
    labels: Vec<usize>,
    centroids: Vec<Vector>,
    iterations: usize,
    inertia: f64,
}

impl KMeans {
    /// k-means++ seeding followed by Lloyd iterations.
    /// Requires `rows.len() >= self.k`.
    fn fit(&self, rows: &[Vector], seed: u64) -> KMeansModel {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut centroids = self.init_centroids(rows, &mut rng);
        let mut labels = vec![0; rows.len()];
        let mut iterations = 0;

        for _ in 0..self.max_iterations.max(1) {
            iterations += 1;
            for (row, label) in rows.iter().zip(labels.iter_mut()) {
                *label = nearest(row, &centroids).0;
            }

            let mut shift = 0.0;
            for (cluster, centroid) in centroids.iter_mut().enumerate() {
                let mut sum: Option<Vector> = None;
                let mut count = 0usize;
                for (row, _) in rows.iter().zip(&labels).filter(|(_, l)| **l == cluster) {
                    sum = Some(match sum {
                        Some(acc) => &acc + row,
                        None => row.clone(),
                    });
                    count += 1;
                }
                // an empty cluster keeps its centroid
                if let Some(sum) = sum {
                    let updated = &sum * (1.0 / count as f64);
                    shift += centroid.squared_distance(&updated);
                    *centroid = updated;
                }
            }

            if shift <= self.tolerance {
                break;
            }
        }

        for (row, label) in rows.iter().zip(labels.iter_mut()) {
            *label = nearest(row, &centroids).0;
        }
        let inertia = rows
            .iter()
            .zip(&labels)
            .map(|(row, label)| row.squared_distance(&centroids[*label]))
            .sum();

        KMeansModel {
            labels,
            centroids,
            iterations,
            inertia,
        }
    }

    fn init_centroids(&self, rows: &[Vector], rng: &mut StdRng) -> Vec<Vector> {
        let mut centroids = Vec::with_capacity(self.k);
        centroids.push(rows[rng.random_range(0..rows.len())].clone());

        while centroids.len() < self.k {
            let weights: Vec<f64> = rows.iter().map(|row| nearest(row, &centroids).1).collect();
            let total: f64 = weights.iter().sum();

            let next = if total > 0.0 {
                let target = rng.random::<f64>() * total;
                let mut cumulative = 0.0;
                weights
                    .iter()
                    .position(|w| {
                        cumulative += w;
                        *w > 0.0 && cumulative >= target
                    })
                    .or_else(|| weights.iter().rposition(|w| *w > 0.0))
                    .unwrap_or(0)
            } else {
                // every row already sits on a centroid
                rng.random_range(0..rows.len())
            };
            centroids.push(rows[next].clone());
        }
        centroids
    }
}

/// Index of and squared distance to the closest centroid; ties go to the
/// lower index
fn nearest(row: &Vector, centroids: &[Vector]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, row.squared_distance(c)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}
