//! No-K-Means with a freeze period in seconds
//!
//! Vectors are sorted by their time attribute before clustering. Across calls
//! they are assumed to arrive in chronological order.

use super::{
    mark_updated, validate_threshold, ClusterSet, ClusteringAlgorithm, ClusteringError,
    ClusteringResult,
};
use crate::vsm::{Cluster, ClusterId, Vector};

/// Incremental clustering where a cluster's age is the time since its latest member
#[derive(Debug)]
pub struct TemporalNoKMeans {
    threshold: f64,
    freeze_period: f64,
    time_attribute: String,
    set: ClusterSet,
}

impl TemporalNoKMeans {
    /// Create the algorithm
    ///
    /// `freeze_period` is in the same unit as the time attribute, usually seconds.
    pub fn new(
        threshold: f64,
        freeze_period: f64,
        time_attribute: impl Into<String>,
        store_frozen: bool,
    ) -> ClusteringResult<Self> {
        validate_threshold(threshold)?;
        if freeze_period.is_nan() || freeze_period < 0.0 {
            return Err(ClusteringError::InvalidFreezePeriod(freeze_period));
        }

        Ok(Self {
            threshold,
            freeze_period,
            time_attribute: time_attribute.into(),
            set: ClusterSet::new(store_frozen),
        })
    }

    pub fn time_attribute(&self) -> &str {
        &self.time_attribute
    }

    fn time_of(&self, vector: &Vector) -> ClusteringResult<f64> {
        vector
            .numeric_attribute(&self.time_attribute)
            .ok_or_else(|| ClusteringError::MissingTimeAttribute(self.time_attribute.clone()))
    }
}

impl ClusteringAlgorithm for TemporalNoKMeans {
    fn cluster(&mut self, vectors: Vec<Vector>) -> ClusteringResult<Vec<ClusterId>> {
        let mut timed: Vec<(f64, Vector)> = vectors
            .into_iter()
            .map(|v| self.time_of(&v).map(|time| (time, v)))
            .collect::<ClusteringResult<_>>()?;
        timed.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut updated = Vec::new();
        for (time, vector) in timed {
            let freeze_period = self.freeze_period;
            self.set.freeze_where(|c| {
                let last = c.state.last_updated.unwrap_or(0.0);
                time - last > freeze_period
            });

            if let Some((index, similarity)) = self.set.closest(&vector) {
                if similarity >= self.threshold {
                    let cluster = &mut self.set.active[index];
                    cluster.add_vector(vector);
                    cluster.state.last_updated = Some(time);
                    mark_updated(&mut updated, cluster.id());
                    continue;
                }
            }

            let mut cluster = Cluster::with_vectors(vec![vector]);
            cluster.state.last_updated = Some(time);
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
