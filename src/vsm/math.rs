//! Vector math over sparse dimensions

use super::{Dimensions, Vector};

/// Errors raised by vector math with invalid parameters
#[derive(Debug, thiserror::Error)]
pub enum VectorMathError {
    #[error("Augmentation must be between 0 and 1 inclusive, got {0}")]
    InvalidAugmentation(f64),
}

/// Euclidean length of the vector
pub fn magnitude(v: &Vector) -> f64 {
    v.dimensions().values().map(|w| w * w).sum::<f64>().sqrt()
}

/// Unit-length copy of `v`; zero vectors are returned unchanged
pub fn normalize(v: &Vector) -> Vector {
    let m = magnitude(v);
    let mut n = v.clone();
    if m > 0.0 {
        let dimensions = v
            .dimensions()
            .iter()
            .map(|(term, weight)| (term.clone(), weight / m))
            .collect();
        n.set_dimensions(dimensions);
    }
    n
}

/// Augmented normalization: `a + (1 - a) * f / max(f)`
pub fn augmented_normalize(v: &Vector, a: f64) -> Result<Vector, VectorMathError> {
    if !(0.0..=1.0).contains(&a) {
        return Err(VectorMathError::InvalidAugmentation(a));
    }

    let max = v.dimensions().values().copied().fold(f64::NEG_INFINITY, f64::max);
    let x = if v.dimensions().is_empty() { 1.0 } else { max };

    let mut n = v.clone();
    let dimensions = v
        .dimensions()
        .iter()
        .map(|(term, weight)| (term.clone(), a + (1.0 - a) * weight / x))
        .collect();
    n.set_dimensions(dimensions);
    Ok(n)
}

/// Sum the dimensions of every vector
pub fn concatenate<'a>(vectors: impl IntoIterator<Item = &'a Vector>) -> Vector {
    let mut dimensions = Dimensions::new();
    for vector in vectors {
        for (term, weight) in vector.dimensions() {
            *dimensions.entry(term.clone()).or_insert(0.0) += weight;
        }
    }
    Vector::new(dimensions)
}

/// Dot product, iterating over the smaller vector
pub fn dot(v1: &Vector, v2: &Vector) -> f64 {
    let (small, large) = if v1.dimensions().len() <= v2.dimensions().len() {
        (v1, v2)
    } else {
        (v2, v1)
    };

    small
        .dimensions()
        .iter()
        .map(|(term, weight)| weight * large.dimension(term))
        .sum()
}

/// Cosine similarity, defined as 0 when either vector has no magnitude
pub fn cosine(v1: &Vector, v2: &Vector) -> f64 {
    let m1 = magnitude(v1);
    let m2 = magnitude(v2);
    if m1 == 0.0 || m2 == 0.0 {
        return 0.0;
    }

    dot(v1, v2) / (m1 * m2)
}

/// Euclidean distance over the union of dimensions
pub fn euclidean(v1: &Vector, v2: &Vector) -> f64 {
    let mut sum = 0.0;
    for (term, weight) in v1.dimensions() {
        let diff = weight - v2.dimension(term);
        sum += diff * diff;
    }
    for (term, weight) in v2.dimensions() {
        if !v1.dimensions().contains_key(term) {
            sum += weight * weight;
        }
    }
    sum.sqrt()
}
