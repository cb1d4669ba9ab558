//! Engine configuration.

/// Tunables for one analysis pipeline.
///
/// Defaults match the historical production values; changing `seed` or
/// `clusters` changes cluster identities against previously persisted
/// labels, so treat both as part of the stored data contract.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Trailing window (days) for "recent" sales used by the override rule.
    pub lookback_days: i64,
    /// Number of behavioral clusters (K).
    pub clusters: usize,
    /// Sell-through ratio at or above which an item is never deadstock.
    pub override_threshold: f64,
    /// Fixed clustering seed; reproducibility is a correctness requirement.
    pub seed: u64,
    /// Maximum writes submitted per persistence chunk.
    pub write_chunk_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            clusters: 2,
            override_threshold: 0.2,
            seed: 42,
            write_chunk_size: 500,
        }
    }
}

impl EngineConfig {
    pub fn with_lookback_days(mut self, lookback_days: i64) -> Self {
        self.lookback_days = lookback_days;
        self
    }

    pub fn with_clusters(mut self, clusters: usize) -> Self {
        self.clusters = clusters;
        self
    }

    pub fn with_override_threshold(mut self, override_threshold: f64) -> Self {
        self.override_threshold = override_threshold;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_write_chunk_size(mut self, write_chunk_size: usize) -> Self {
        self.write_chunk_size = write_chunk_size;
        self
    }
}
