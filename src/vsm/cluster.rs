//! Centroid-based clusters
//!
//! A cluster keeps a running sum of its members' dimensions so that adding or
//! removing a vector updates the centroid without revisiting every member.
//! [`Cluster::recalculate_centroid`] rebuilds the sum from scratch and must
//! agree with the incremental result up to floating-point error.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::math;
use super::{Dimensions, Vector};

/// Sums closer to zero than this are dropped from the centroid on removal
const SUM_EPSILON: f64 = 1e-12;

/// Stable cluster identifier
pub type ClusterId = Uuid;

/// Bookkeeping attached to a cluster by clustering and pipelines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterState {
    /// Vectors processed since the cluster last received one (plain No-K-Means)
    pub age: u64,

    /// Timestamp of the most recent member (temporal No-K-Means)
    pub last_updated: Option<f64>,

    /// When a pipeline last checked the cluster for breaking terms
    pub last_checked: Option<f64>,

    /// Whether the cluster was already reported as breaking
    pub bursty: bool,
}

/// A group of vectors represented by their mean
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    id: ClusterId,
    vectors: Vec<Vector>,
    sum: Dimensions,
    centroid: Vector,
    pub state: ClusterState,
}

impl Default for Cluster {
    fn default() -> Self {
        Self::new()
    }
}

impl Cluster {
    /// Create an empty cluster
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            vectors: Vec::new(),
            sum: Dimensions::new(),
            centroid: Vector::default(),
            state: ClusterState::default(),
        }
    }

    /// Create a cluster holding the given vectors
    #[must_use]
    pub fn with_vectors(vectors: Vec<Vector>) -> Self {
        let mut cluster = Self::new();
        for vector in vectors {
            cluster.add_vector(vector);
        }
        cluster
    }

    pub fn id(&self) -> ClusterId {
        self.id
    }

    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    pub fn size(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// The mean of the current members
    pub fn centroid(&self) -> &Vector {
        &self.centroid
    }

    /// Add a vector and update the centroid incrementally
    pub fn add_vector(&mut self, vector: Vector) {
        for (term, weight) in vector.dimensions() {
            *self.sum.entry(term.clone()).or_insert(0.0) += weight;
        }
        self.vectors.push(vector);
        self.refresh_centroid();
    }

    /// Remove the member at `index`, returning it
    ///
    /// Removing the last member resets the centroid to the empty vector.
    pub fn remove_vector(&mut self, index: usize) -> Option<Vector> {
        if index >= self.vectors.len() {
            return None;
        }

        let vector = self.vectors.remove(index);
        if self.vectors.is_empty() {
            self.sum.clear();
        } else {
            for (term, weight) in vector.dimensions() {
                if let Some(sum) = self.sum.get_mut(term) {
                    *sum -= weight;
                    if sum.abs() < SUM_EPSILON {
                        self.sum.remove(term);
                    }
                }
            }
        }
        self.refresh_centroid();
        Some(vector)
    }

    /// Rebuild the centroid from all members
    pub fn recalculate_centroid(&mut self) {
        self.sum = math::concatenate(&self.vectors).into_dimensions();
        self.refresh_centroid();
    }

    fn refresh_centroid(&mut self) {
        if self.vectors.is_empty() {
            self.centroid = Vector::default();
            return;
        }

        let n = self.vectors.len() as f64;
        let dimensions = self
            .sum
            .iter()
            .map(|(term, sum)| (term.clone(), sum / n))
            .collect();
        self.centroid = Vector::new(dimensions);
    }

    /// Cosine similarity between `vector` and the centroid
    pub fn similarity(&self, vector: &Vector) -> f64 {
        math::cosine(&self.centroid, vector)
    }

    /// Mean cosine similarity of the members to the centroid, 0 when empty
    pub fn intra_similarity(&self) -> f64 {
        if self.vectors.is_empty() {
            return 0.0;
        }

        let total: f64 = self.vectors.iter().map(|v| self.similarity(v)).sum();
        total / self.vectors.len() as f64
    }

    /// The `n` members closest to the centroid, most similar first
    pub fn representative_vectors(&self, n: usize) -> Vec<&Vector> {
        let mut scored: Vec<(usize, f64)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, self.similarity(v)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored
            .into_iter()
            .take(n)
            .map(|(i, _)| &self.vectors[i])
            .collect()
    }
}
