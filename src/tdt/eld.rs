//! ELD burst detection
//!
//! The burst of a term is the difference between its current nutrition and
//! its nutrition in each historical window, weighted by an exponential decay
//! and normalized by the sum of the weights. With nutrition rescaled to
//! `[0, 1]`, bursts lie in `[-1, 1]`: `1` for a term that went from absent
//! to dominant, `-1` for the reverse and `0` for unchanged popularity.
//!
//! Historical windows are weighted most recent first, so the window right
//! before the current one has weight `decay(1)`.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::{TdtError, TdtResult};
use crate::nutrition::{NutritionStore, TermNutrition};

/// Default decay rate
pub const DEFAULT_DECAY_RATE: f64 = 0.5;

/// Exponentially decayed burst detector
#[derive(Debug, Clone, Copy)]
pub struct Eld {
    decay_rate: f64,
}

impl Default for Eld {
    fn default() -> Self {
        Self {
            decay_rate: DEFAULT_DECAY_RATE,
        }
    }
}

impl Eld {
    /// Create a detector; smaller rates weight distant history more evenly
    pub fn new(decay_rate: f64) -> TdtResult<Self> {
        if !decay_rate.is_finite() || decay_rate <= 0.0 {
            return Err(TdtError::InvalidConfig(format!(
                "decay rate must be positive, got {decay_rate}"
            )));
        }
        Ok(Self { decay_rate })
    }

    pub fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    /// Weight of the `c`-th most recent historical window: `1 / e^c^rate`
    pub fn decay(&self, c: usize) -> f64 {
        1.0 / (c as f64).exp().powf(self.decay_rate)
    }

    /// Sum of the first `windows` decay weights; 1 when there is no history
    pub fn coefficient(&self, windows: usize) -> f64 {
        if windows == 0 {
            return 1.0;
        }
        (1..=windows).map(|c| self.decay(c)).sum()
    }

    /// Detect breaking terms in `nutrition`
    ///
    /// History is `[since, until)` when `until` is given, otherwise everything
    /// from `since` on. Only terms with a burst strictly above `min_burst` are
    /// returned. With a negative `min_burst`, terms that only appear in
    /// history are scored too, so that fading terms can be reported.
    pub fn detect<S>(
        &self,
        store: &S,
        nutrition: &TermNutrition,
        since: Option<i64>,
        until: Option<i64>,
        min_burst: f64,
    ) -> HashMap<String, f64>
    where
        S: NutritionStore<TermNutrition>,
    {
        let since = since.unwrap_or(i64::MIN);
        let historic = match until {
            Some(until) => store.between(since, until),
            None => store.since(since),
        };

        let terms = self.terms(nutrition, &historic, min_burst);
        let bursts = self.compute_burst(&terms, nutrition, &historic);
        let breaking: HashMap<String, f64> = bursts
            .into_iter()
            .filter(|(_, burst)| *burst > min_burst)
            .collect();

        tracing::debug!(
            terms = terms.len(),
            history = historic.len(),
            breaking = breaking.len(),
            min_burst,
            "ELD detection"
        );
        breaking
    }

    /// Burst of each term in `terms`
    pub fn compute_burst(
        &self,
        terms: &HashSet<String>,
        nutrition: &TermNutrition,
        historic: &BTreeMap<i64, TermNutrition>,
    ) -> HashMap<String, f64> {
        let coefficient = self.coefficient(historic.len());

        terms
            .iter()
            .map(|term| {
                let current = nutrition.get(term).copied().unwrap_or(0.0);
                let raw: f64 = historic
                    .values()
                    .rev()
                    .enumerate()
                    .map(|(c, window)| {
                        let past = window.get(term).copied().unwrap_or(0.0);
                        (current - past) * self.decay(c + 1)
                    })
                    .sum();
                (term.clone(), raw / coefficient)
            })
            .collect()
    }

    fn terms(
        &self,
        nutrition: &TermNutrition,
        historic: &BTreeMap<i64, TermNutrition>,
        min_burst: f64,
    ) -> HashSet<String> {
        let mut terms: HashSet<String> = nutrition.keys().cloned().collect();
        if min_burst < 0.0 {
            for window in historic.values() {
                terms.extend(window.keys().cloned());
            }
        }
        terms
    }
}
