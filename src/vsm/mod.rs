//! Vector space model primitives
//!
//! - [`Vector`] - sparse term vector with free-form attributes
//! - [`math`] - magnitude, normalization and similarity measures
//! - [`cluster`] - centroid-based clusters of vectors

pub mod cluster;
pub mod math;

pub use cluster::{Cluster, ClusterId, ClusterState};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Sparse dimensions of a vector (term -> weight)
pub type Dimensions = HashMap<String, f64>;

/// A sparse vector with attached attributes
///
/// Attributes carry anything the pipelines need to keep alongside the
/// weights, such as the timestamp or the original tweet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    #[serde(default)]
    dimensions: Dimensions,

    #[serde(default)]
    attributes: HashMap<String, Value>,
}

impl Vector {
    /// Create a vector from its dimensions
    #[must_use]
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            attributes: HashMap::new(),
        }
    }

    /// Create a vector from `(term, weight)` pairs
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, f64)>) -> Self {
        Self::new(pairs.into_iter().map(|(t, w)| (t.into(), w)).collect())
    }

    /// Attach an attribute, consuming and returning the vector
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    pub fn into_dimensions(self) -> Dimensions {
        self.dimensions
    }

    /// Weight of a single dimension, 0 when absent
    pub fn dimension(&self, name: &str) -> f64 {
        self.dimensions.get(name).copied().unwrap_or(0.0)
    }

    /// Set a dimension; a zero weight removes it
    pub fn set_dimension(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        if value == 0.0 {
            self.dimensions.remove(&name);
        } else {
            self.dimensions.insert(name, value);
        }
    }

    pub fn set_dimensions(&mut self, dimensions: Dimensions) {
        self.dimensions = dimensions;
    }

    pub fn clear_dimensions(&mut self) {
        self.dimensions.clear();
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Numeric attribute, typically a timestamp
    pub fn numeric_attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).and_then(Value::as_f64)
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn magnitude(&self) -> f64 {
        math::magnitude(self)
    }

    /// Scale the vector to unit length in place
    pub fn normalize(&mut self) {
        let normalized = math::normalize(self);
        self.dimensions = normalized.dimensions;
    }

    /// Divide every dimension by the largest one so that weights lie in `[0, 1]`
    ///
    /// Vectors with no positive maximum are left unchanged.
    pub fn rescale_to_unit_max(&mut self) {
        let max = self
            .dimensions
            .values()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        if max > 0.0 {
            for value in self.dimensions.values_mut() {
                *value /= max;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_defaults_to_zero() {
        let v = Vector::from_pairs([("a", 1.0)]);
        assert_eq!(v.dimension("a"), 1.0);
        assert_eq!(v.dimension("b"), 0.0);
    }

    #[test]
    fn test_set_dimension_zero_removes() {
        let mut v = Vector::from_pairs([("a", 1.0), ("b", 2.0)]);
        v.set_dimension("a", 0.0);
        assert_eq!(v.dimensions().len(), 1);
    }

    #[test]
    fn test_numeric_attribute() {
        let v = Vector::default()
            .with_attribute("timestamp", 12.5)
            .with_attribute("lang", "en");
        assert_eq!(v.numeric_attribute("timestamp"), Some(12.5));
        assert_eq!(v.numeric_attribute("lang"), None);
        assert_eq!(v.numeric_attribute("missing"), None);
    }

    #[test]
    fn test_rescale_to_unit_max() {
        let mut v = Vector::from_pairs([("a", 4.0), ("b", 2.0)]);
        v.rescale_to_unit_max();
        assert_eq!(v.dimension("a"), 1.0);
        assert_eq!(v.dimension("b"), 0.5);

        let mut empty = Vector::default();
        empty.rescale_to_unit_max();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_normalize_in_place() {
        let mut v = Vector::from_pairs([("a", 3.0), ("b", 4.0)]);
        v.normalize();
        assert!((v.magnitude() - 1.0).abs() < 1e-12);
        assert!((v.dimension("a") - 0.6).abs() < 1e-12);
    }
}
