//! Unsupervised clustering primitive.
//!
//! The classifier only needs `cluster(points, k, seed) -> labels`, so the
//! algorithm sits behind a narrow trait and the rest of the engine can be
//! tested with a stub.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;

use crate::error::EngineError;
use crate::features::FeatureVector;

/// Distance-based clustering over raw 2-D points.
pub trait Clusterer: Send + Sync {
    /// Partition `points` into `k` groups, returning one label in
    /// `0..k` per point, in input order.
    ///
    /// Must be deterministic for a given `(points, k, seed)` triple:
    /// labels feed a persisted `cluster` field, so reproducibility across
    /// runs is a correctness requirement, not an optimization.
    fn cluster(
        &self,
        points: &[FeatureVector],
        k: usize,
        seed: u64,
    ) -> Result<Vec<usize>, EngineError>;
}

/// Lloyd's-iteration k-means with seeded initialization.
///
/// Initial centroids are `k` distinct input points drawn from a
/// `StdRng` seeded with the caller's seed. Assignment ties go to the
/// lowest cluster index; a cluster that loses all members keeps its
/// previous centroid. Points are used unscaled.
#[derive(Debug, Clone)]
pub struct SeededKMeans {
    max_iterations: usize,
}

impl Default for SeededKMeans {
    fn default() -> Self {
        Self {
            max_iterations: 100,
        }
    }
}

impl SeededKMeans {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl Clusterer for SeededKMeans {
    fn cluster(
        &self,
        points: &[FeatureVector],
        k: usize,
        seed: u64,
    ) -> Result<Vec<usize>, EngineError> {
        if k == 0 || points.len() < k {
            return Err(EngineError::InsufficientSamples {
                points: points.len(),
                clusters: k,
            });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut centroids: Vec<FeatureVector> = sample(&mut rng, points.len(), k)
            .into_iter()
            .map(|i| points[i])
            .collect();

        let mut labels = vec![0usize; points.len()];
        for _ in 0..self.max_iterations {
            let mut changed = false;
            for (i, point) in points.iter().enumerate() {
                let label = nearest_centroid(point, &centroids);
                if labels[i] != label {
                    labels[i] = label;
                    changed = true;
                }
            }

            let mut sums = vec![(0.0f64, 0.0f64, 0usize); k];
            for (point, &label) in points.iter().zip(&labels) {
                sums[label].0 += point.on_hand;
                sums[label].1 += point.sold;
                sums[label].2 += 1;
            }
            for (centroid, (sh, ss, n)) in centroids.iter_mut().zip(&sums) {
                if *n > 0 {
                    *centroid = FeatureVector {
                        on_hand: sh / *n as f64,
                        sold: ss / *n as f64,
                    };
                }
            }

            if !changed {
                break;
            }
        }

        Ok(labels)
    }
}

fn nearest_centroid(point: &FeatureVector, centroids: &[FeatureVector]) -> usize {
    let mut best = 0usize;
    let mut best_dist = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let d = point.distance_sq(centroid);
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}
