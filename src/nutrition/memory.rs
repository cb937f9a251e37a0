//! In-memory nutrition store backed by an ordered map

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::{NutritionStore, StoreError, StoreResult};

/// Nutrition store that keeps every snapshot in memory
///
/// Snapshots are kept in timestamp order, so range queries are logarithmic
/// in the number of stored windows.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryNutritionStore<V> {
    store: BTreeMap<i64, V>,
}

impl<V> Default for MemoryNutritionStore<V> {
    fn default() -> Self {
        Self {
            store: BTreeMap::new(),
        }
    }
}

impl<V: Clone> MemoryNutritionStore<V> {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate snapshots in ascending timestamp order without cloning
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&i64, &V)> {
        self.store.iter()
    }

    /// Earliest and latest stored timestamps
    pub fn span(&self) -> Option<(i64, i64)> {
        let first = self.store.keys().next()?;
        let last = self.store.keys().next_back()?;
        Some((*first, *last))
    }
}

impl<V: Clone> NutritionStore<V> for MemoryNutritionStore<V> {
    fn add(&mut self, timestamp: i64, nutrition: V) {
        self.store.insert(timestamp, nutrition);
    }

    fn get(&self, timestamp: i64) -> Option<&V> {
        self.store.get(&timestamp)
    }

    fn between(&self, start: i64, end: i64) -> BTreeMap<i64, V> {
        if start >= end {
            return BTreeMap::new();
        }

        self.store
            .range(start..end)
            .map(|(timestamp, nutrition)| (*timestamp, nutrition.clone()))
            .collect()
    }

    fn since(&self, start: i64) -> BTreeMap<i64, V> {
        self.store
            .range(start..)
            .map(|(timestamp, nutrition)| (*timestamp, nutrition.clone()))
            .collect()
    }

    fn all(&self) -> BTreeMap<i64, V> {
        self.store.clone()
    }

    fn remove(&mut self, timestamps: &[i64]) {
        for timestamp in timestamps {
            self.store.remove(timestamp);
        }
    }

    fn until(&self, timestamp: i64) -> Vec<i64> {
        self.store.range(..timestamp).map(|(t, _)| *t).collect()
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}

impl<V: Clone + Serialize + DeserializeOwned> MemoryNutritionStore<V> {
    /// Serialize as a JSON object keyed by decimal timestamps
    pub fn to_json(&self) -> StoreResult<String> {
        let keyed: BTreeMap<String, &V> = self
            .store
            .iter()
            .map(|(timestamp, nutrition)| (timestamp.to_string(), nutrition))
            .collect();

        Ok(serde_json::to_string_pretty(&keyed)?)
    }

    /// Parse a JSON object keyed by decimal timestamps
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let keyed: BTreeMap<String, V> = serde_json::from_str(json)?;
        let mut store = BTreeMap::new();
        for (key, nutrition) in keyed {
            let timestamp = key
                .trim()
                .parse::<i64>()
                .map_err(|_| StoreError::InvalidKey(key.clone()))?;
            store.insert(timestamp, nutrition);
        }

        Ok(Self { store })
    }

    /// Write every snapshot to `path`
    pub fn save_json(&self, path: &Path) -> StoreResult<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;

        tracing::debug!(path = %path.display(), snapshots = self.store.len(), "Saved nutrition store");
        Ok(())
    }

    /// Load a store previously written with [`save_json`](Self::save_json)
    pub fn load_json(path: &Path) -> StoreResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::TermNutrition;

    fn nutrition(pairs: &[(&str, f64)]) -> TermNutrition {
        pairs.iter().map(|(t, v)| (t.to_string(), *v)).collect()
    }

    #[test]
    fn test_add_overwrites() {
        let mut store = MemoryNutritionStore::new();
        store.add(10, nutrition(&[("a", 1.0)]));
        store.add(10, nutrition(&[("b", 2.0)]));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(10), Some(&nutrition(&[("b", 2.0)])));
    }

    #[test]
    fn test_get_unknown_timestamp() {
        let store: MemoryNutritionStore<TermNutrition> = MemoryNutritionStore::new();
        assert!(store.get(42).is_none());
    }

    #[test]
    fn test_between_is_half_open() {
        let mut store = MemoryNutritionStore::new();
        for t in [10, 20, 30, 40] {
            store.add(t, t as f64);
        }

        let range = store.between(20, 40);
        assert_eq!(range.keys().copied().collect::<Vec<_>>(), vec![20, 30]);
        assert!(store.between(40, 20).is_empty());
        assert!(store.between(20, 20).is_empty());
    }

    #[test]
    fn test_since_and_until() {
        let mut store = MemoryNutritionStore::new();
        for t in [10, 20, 30] {
            store.add(t, 1.0);
        }

        assert_eq!(store.since(20).len(), 2);
        assert_eq!(store.until(30), vec![10, 20]);
        assert!(store.until(10).is_empty());
    }

    #[test]
    fn test_remove_ignores_unknown() {
        let mut store = MemoryNutritionStore::new();
        store.add(10, 1.0);
        store.remove(&[10, 99]);
        assert!(store.is_empty());
    }

    #[test]
    fn test_evict_before() {
        let mut store = MemoryNutritionStore::new();
        for t in [10, 20, 30] {
            store.add(t, 1.0);
        }

        assert_eq!(store.evict_before(25), 2);
        assert_eq!(store.span(), Some((30, 30)));
    }

    #[test]
    fn test_json_round_trip() {
        let mut store = MemoryNutritionStore::new();
        store.add(60, nutrition(&[("a", 1.0), ("b", 0.5)]));
        store.add(120, nutrition(&[]));

        let json = store.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["60"]["b"], 0.5);
        assert!(value["120"].as_object().unwrap().is_empty());

        let restored = MemoryNutritionStore::<TermNutrition>::from_json(&json).unwrap();
        assert_eq!(restored, store);
    }

    #[test]
    fn test_json_rejects_non_integer_keys() {
        let result = MemoryNutritionStore::<f64>::from_json(r#"{"abc": 1.0}"#);
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nutrition.json");

        let mut store = MemoryNutritionStore::new();
        store.add(1, 3.0);
        store.add(2, 5.0);
        store.save_json(&path).unwrap();

        let loaded = MemoryNutritionStore::<f64>::load_json(&path).unwrap();
        assert_eq!(loaded.all(), store.all());
    }
}
