//! Cataldi burst detection
//!
//! Each term's burst compares its squared nutrition in the current window to
//! every historical window, with older windows damped by `log10(i + 2)`.
//! Terms are ranked by burst and cut at the critical drop: the first gap in
//! the ranking that is at least as large as the mean gap before the largest
//! one.

use std::collections::{BTreeMap, HashMap};

use super::{rank, BreakingTerm, TdtError, TdtResult};
use crate::nutrition::{NutritionStore, TermNutrition};

/// Cataldi et al.'s critical-drop burst detector
#[derive(Debug, Clone, Copy, Default)]
pub struct Cataldi;

impl Cataldi {
    pub fn new() -> Self {
        Self
    }

    /// Detect bursty terms in the checkpoint stored at `timestamp`
    ///
    /// History is every checkpoint in `[since, timestamp)`; without `since` it
    /// reaches back to the start of the store. An unknown timestamp yields no
    /// terms.
    pub fn detect<S>(&self, store: &S, timestamp: i64, since: Option<i64>) -> TdtResult<Vec<String>>
    where
        S: NutritionStore<TermNutrition>,
    {
        let nutrition = store.get(timestamp).cloned().unwrap_or_default();
        self.detect_nutrition(store, &nutrition, timestamp, since)
    }

    /// Detect bursty terms in `nutrition` against history before `timestamp`
    pub fn detect_nutrition<S>(
        &self,
        store: &S,
        nutrition: &TermNutrition,
        timestamp: i64,
        since: Option<i64>,
    ) -> TdtResult<Vec<String>>
    where
        S: NutritionStore<TermNutrition>,
    {
        let ranked = self.detect_ranked(store, nutrition, timestamp, since)?;
        Ok(ranked.into_iter().map(|t| t.term).collect())
    }

    /// Like [`Cataldi::detect_nutrition`], keeping each bursty term's score
    pub fn detect_ranked<S>(
        &self,
        store: &S,
        nutrition: &TermNutrition,
        timestamp: i64,
        since: Option<i64>,
    ) -> TdtResult<Vec<BreakingTerm>>
    where
        S: NutritionStore<TermNutrition>,
    {
        let historic = store.between(since.unwrap_or(i64::MIN), timestamp);
        let mut ranked = rank(self.compute_burst(nutrition, &historic));

        let drops = compute_drops(&ranked);
        let critical = critical_drop_index(&drops);
        let terms = bursty_terms(&ranked, critical)?;
        ranked.truncate(terms.len());

        tracing::debug!(
            timestamp,
            terms = nutrition.len(),
            history = historic.len(),
            bursty = terms.len(),
            "Cataldi detection"
        );
        Ok(ranked)
    }

    /// Burst of every term in `nutrition`
    pub fn compute_burst(
        &self,
        nutrition: &TermNutrition,
        historic: &BTreeMap<i64, TermNutrition>,
    ) -> HashMap<String, f64> {
        nutrition
            .iter()
            .map(|(term, value)| {
                let burst = historic
                    .values()
                    .rev()
                    .enumerate()
                    .map(|(i, window)| {
                        let past = window.get(term).copied().unwrap_or(0.0);
                        (value * value - past * past) / ((i + 2) as f64).log10()
                    })
                    .sum();
                (term.clone(), burst)
            })
            .collect()
    }
}

/// Differences between consecutive bursts of a descending ranking
pub fn compute_drops(ranked: &[BreakingTerm]) -> Vec<f64> {
    ranked.windows(2).map(|w| w[0].burst - w[1].burst).collect()
}

/// Number of leading terms considered bursty
///
/// - no drops: 0
/// - every drop is 0: all terms (`drops.len() + 1`)
/// - otherwise the drops are cut after the last occurrence of the largest
///   drop, and the index is one past the first drop reaching their mean
pub fn critical_drop_index(drops: &[f64]) -> usize {
    if drops.is_empty() {
        return 0;
    }
    if drops.iter().all(|d| *d == 0.0) {
        return drops.len() + 1;
    }

    let max = drops.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let last_max = drops.iter().rposition(|d| *d == max).unwrap_or(drops.len() - 1);
    let truncated = &drops[..=last_max];

    let mean = truncated.iter().sum::<f64>() / truncated.len() as f64;
    truncated
        .iter()
        .position(|d| *d >= mean)
        .map_or(truncated.len(), |i| i + 1)
}

/// The first `critical` terms of the ranking
pub fn bursty_terms(ranked: &[BreakingTerm], critical: usize) -> TdtResult<Vec<String>> {
    if critical > ranked.len() {
        return Err(TdtError::Invariant(format!(
            "critical drop index {critical} exceeds {} ranked terms",
            ranked.len()
        )));
    }

    Ok(ranked[..critical].iter().map(|t| t.term.clone()).collect())
}
