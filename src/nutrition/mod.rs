//! Time-indexed nutrition storage
//!
//! A nutrition store keeps one snapshot per completed time window. A snapshot
//! is either a term map (term -> nutrition) or a scalar volume, fixed by the
//! store's value type for its whole lifetime.
//!
//! Burst detectors only read from a store. The windowed consumer is the only
//! writer, adding one checkpoint per window and evicting windows that fall out
//! of the historical horizon.
//!
//! # Example
//!
//! ```
//! use eventline::nutrition::{MemoryNutritionStore, NutritionStore, TermNutrition};
//!
//! let mut store: MemoryNutritionStore<TermNutrition> = MemoryNutritionStore::new();
//! store.add(10, TermNutrition::from([("goal".to_string(), 1.0)]));
//! store.add(20, TermNutrition::new());
//!
//! assert_eq!(store.between(10, 20).len(), 1);
//! let old = store.until(20);
//! store.remove(&old);
//! assert!(store.get(10).is_none());
//! ```

pub mod memory;

pub use memory::MemoryNutritionStore;

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Per-term nutrition of a single time window
pub type TermNutrition = HashMap<String, f64>;

/// Scalar nutrition (total volume) of a single time window
pub type Volume = f64;

/// Errors raised by nutrition store persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on nutrition file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed nutrition JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid timestamp key '{0}': keys must be integers")]
    InvalidKey(String),
}

/// Result type for nutrition store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A time-indexed mapping from timestamps to nutrition snapshots
///
/// Range queries are half-open: `between(a, b)` covers `a <= t < b`.
pub trait NutritionStore<V> {
    /// Insert or overwrite the snapshot at `timestamp`
    fn add(&mut self, timestamp: i64, nutrition: V);

    /// Snapshot at exactly `timestamp`, if any
    fn get(&self, timestamp: i64) -> Option<&V>;

    /// All snapshots with `start <= timestamp < end`
    fn between(&self, start: i64, end: i64) -> BTreeMap<i64, V>;

    /// All snapshots with `timestamp >= start`
    fn since(&self, start: i64) -> BTreeMap<i64, V>;

    /// Every stored snapshot
    fn all(&self) -> BTreeMap<i64, V>;

    /// Remove the given timestamps; unknown timestamps are ignored
    fn remove(&mut self, timestamps: &[i64]);

    /// Stored timestamps strictly less than `timestamp`
    fn until(&self, timestamp: i64) -> Vec<i64>;

    /// Number of stored snapshots
    fn len(&self) -> usize;

    /// Whether the store holds no snapshots
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every snapshot older than `horizon`, returning how many were dropped
    fn evict_before(&mut self, horizon: i64) -> usize {
        let expired = self.until(horizon);
        self.remove(&expired);
        expired.len()
    }
}
