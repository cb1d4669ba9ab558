//! Movement classification: cluster items and designate the low-movement
//! group.

use std::collections::BTreeMap;

use stocksense_core::ItemId;

use crate::cluster::Clusterer;
use crate::error::EngineError;
use crate::features::ItemFeatures;

/// Output of one classification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementAssignments {
    /// Per-item cluster label in `0..k`.
    pub labels: BTreeMap<ItemId, usize>,
    /// The cluster with the minimum mean sales coordinate.
    pub low_movement_cluster: usize,
}

/// Clusters feature vectors and identifies the low-movement cluster.
#[derive(Debug, Clone)]
pub struct MovementClassifier<C: Clusterer> {
    clusterer: C,
    clusters: usize,
    seed: u64,
}

impl<C: Clusterer> MovementClassifier<C> {
    pub fn new(clusterer: C, clusters: usize, seed: u64) -> Self {
        Self {
            clusterer,
            clusters,
            seed,
        }
    }

    /// Fit clusters over the feature set and pick the low-movement one.
    ///
    /// The low-movement cluster is the label whose members have the
    /// minimum mean sales coordinate; ties break to the lowest index, and
    /// a cluster with no members is never selected.
    pub fn classify(&self, features: &[ItemFeatures]) -> Result<MovementAssignments, EngineError> {
        let points: Vec<_> = features.iter().map(|f| f.vector).collect();
        let labels = self.clusterer.cluster(&points, self.clusters, self.seed)?;

        let mut sums = vec![(0.0f64, 0usize); self.clusters];
        for (feature, &label) in features.iter().zip(&labels) {
            sums[label].0 += feature.vector.sold;
            sums[label].1 += 1;
        }

        let mut low_movement_cluster = 0usize;
        let mut best_mean = f64::INFINITY;
        for (cluster, (sum, count)) in sums.iter().enumerate() {
            if *count == 0 {
                continue;
            }
            let mean = sum / *count as f64;
            if mean < best_mean {
                best_mean = mean;
                low_movement_cluster = cluster;
            }
        }

        let labels = features
            .iter()
            .zip(labels)
            .map(|(f, label)| (f.item_id.clone(), label))
            .collect();

        Ok(MovementAssignments {
            labels,
            low_movement_cluster,
        })
    }
}
