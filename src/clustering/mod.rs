//! Incremental single-pass clustering
//!
//! Both algorithms follow the No-K-Means scheme: every incoming vector joins
//! the most similar active cluster if the cosine similarity reaches the
//! threshold, and otherwise starts a new cluster. Clusters that stay inactive
//! for longer than the freeze period are frozen and never receive vectors
//! again.
//!
//! - [`NoKMeans`] measures inactivity in processed vectors
//! - [`TemporalNoKMeans`] measures inactivity in seconds of a time attribute

pub mod no_k_means;
pub mod temporal;

pub use no_k_means::NoKMeans;
pub use temporal::TemporalNoKMeans;

use thiserror::Error;

use crate::vsm::{Cluster, ClusterId, Vector};

/// Errors raised by clustering algorithms
#[derive(Debug, Error)]
pub enum ClusteringError {
    #[error("Similarity threshold must be between 0 and 1, got {0}")]
    InvalidThreshold(f64),

    #[error("Freeze period must not be negative, got {0}")]
    InvalidFreezePeriod(f64),

    #[error("Vector has no numeric '{0}' attribute")]
    MissingTimeAttribute(String),
}

/// Result type for clustering operations
pub type ClusteringResult<T> = Result<T, ClusteringError>;

/// Common interface of the incremental clustering algorithms
pub trait ClusteringAlgorithm {
    /// Cluster the vectors one at a time
    ///
    /// Returns the ids of the clusters that received a vector during this
    /// call, de-duplicated, in the order they were first updated.
    fn cluster(&mut self, vectors: Vec<Vector>) -> ClusteringResult<Vec<ClusterId>>;

    /// Active clusters
    fn clusters(&self) -> &[Cluster];

    /// Frozen clusters, empty unless frozen clusters are stored
    fn frozen(&self) -> &[Cluster];

    /// Look up an active cluster
    fn get(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters().iter().find(|c| c.id() == id)
    }

    /// Look up an active cluster for mutation
    fn get_mut(&mut self, id: ClusterId) -> Option<&mut Cluster>;
}

/// Shared active/frozen bookkeeping of both variants
#[derive(Debug, Default)]
pub(crate) struct ClusterSet {
    pub active: Vec<Cluster>,
    pub frozen: Vec<Cluster>,
    pub store_frozen: bool,
}

impl ClusterSet {
    pub fn new(store_frozen: bool) -> Self {
        Self {
            active: Vec::new(),
            frozen: Vec::new(),
            store_frozen,
        }
    }

    /// Move every active cluster matching `expired` out of the active set
    pub fn freeze_where(&mut self, mut expired: impl FnMut(&Cluster) -> bool) -> usize {
        let (frozen, active): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.active).into_iter().partition(|c| expired(c));
        self.active = active;

        let count = frozen.len();
        if count > 0 {
            tracing::debug!(frozen = count, active = self.active.len(), "Froze inactive clusters");
        }
        if self.store_frozen {
            self.frozen.extend(frozen);
        }
        count
    }

    /// Index of the active cluster closest to `vector` and its similarity
    ///
    /// Ties keep the earliest cluster.
    pub fn closest(&self, vector: &Vector) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, cluster) in self.active.iter().enumerate() {
            let similarity = cluster.similarity(vector);
            match best {
                Some((_, s)) if s >= similarity => {}
                _ => best = Some((i, similarity)),
            }
        }
        best
    }

    pub fn get_mut(&mut self, id: ClusterId) -> Option<&mut Cluster> {
        self.active.iter_mut().find(|c| c.id() == id)
    }
}

/// Record `id` once, keeping first-update order
pub(crate) fn mark_updated(updated: &mut Vec<ClusterId>, id: ClusterId) {
    if !updated.contains(&id) {
        updated.push(id);
    }
}

pub(crate) fn validate_threshold(threshold: f64) -> ClusteringResult<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ClusteringError::InvalidThreshold(threshold));
    }
    Ok(())
}
