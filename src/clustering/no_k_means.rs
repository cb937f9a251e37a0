//! No-K-Means with a freeze period counted in processed vectors

use super::{
    mark_updated, validate_threshold, ClusterSet, ClusteringAlgorithm, ClusteringResult,
};
use crate::vsm::{Cluster, ClusterId, Vector};

/// Incremental clustering where clusters age by one per processed vector
#[derive(Debug)]
pub struct NoKMeans {
    threshold: f64,
    freeze_period: u64,
    set: ClusterSet,
}

impl NoKMeans {
    /// Create the algorithm, rejecting thresholds outside `[0, 1]`
    pub fn new(threshold: f64, freeze_period: u64, store_frozen: bool) -> ClusteringResult<Self> {
        validate_threshold(threshold)?;
        Ok(Self {
            threshold,
            freeze_period,
            set: ClusterSet::new(store_frozen),
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn freeze_period(&self) -> u64 {
        self.freeze_period
    }
}

impl ClusteringAlgorithm for NoKMeans {
    fn cluster(&mut self, vectors: Vec<Vector>) -> ClusteringResult<Vec<ClusterId>> {
        let mut updated = Vec::new();

        for vector in vectors {
            for cluster in &mut self.set.active {
                cluster.state.age += 1;
            }
            let freeze_period = self.freeze_period;
            self.set.freeze_where(|c| c.state.age > freeze_period);

            if let Some((index, similarity)) = self.set.closest(&vector) {
                if similarity >= self.threshold {
                    let cluster = &mut self.set.active[index];
                    cluster.add_vector(vector);
                    cluster.state.age = 0;
                    mark_updated(&mut updated, cluster.id());
                    continue;
                }
            }

            let cluster = Cluster::with_vectors(vec![vector]);
            mark_updated(&mut updated, cluster.id());
            self.set.active.push(cluster);
        }

        Ok(updated)
    }

    fn clusters(&self) -> &[Cluster] {
        &self.set.active
    }

    fn frozen(&self) -> &[Cluster] {
        &self.set.frozen
    }

    fn get_mut(&mut self, id: ClusterId) -> Option<&mut Cluster> {
        self.set.get_mut(id)
    }
}
