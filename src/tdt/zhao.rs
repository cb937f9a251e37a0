//! Zhao burst detection over tweet volume
//!
//! Candidate windows are tried from the smallest up. Each window before the
//! timestamp is split in two halves; if the second half's volume is at least
//! `post_rate` times the first half's, the second half is reported as the
//! burst interval.

use super::{TdtError, TdtResult};
use crate::nutrition::{NutritionStore, Volume};

/// Default candidate window sizes in seconds
pub const DEFAULT_WINDOWS: [i64; 4] = [10, 20, 30, 60];

/// Default volume ratio that signals a burst
pub const DEFAULT_POST_RATE: f64 = 1.7;

/// Volume-doubling burst detector
#[derive(Debug, Clone)]
pub struct Zhao {
    post_rate: f64,
    windows: Vec<i64>,
}

impl Default for Zhao {
    fn default() -> Self {
        Self {
            post_rate: DEFAULT_POST_RATE,
            windows: DEFAULT_WINDOWS.to_vec(),
        }
    }
}

impl Zhao {
    /// Create a detector with the given ratio and window sizes
    ///
    /// Windows are sorted ascending. Each must be even and at least 2 seconds
    /// long, so that both halves hold the same number of one-second volumes.
    pub fn new(post_rate: f64, mut windows: Vec<i64>) -> TdtResult<Self> {
        if !post_rate.is_finite() || post_rate <= 0.0 {
            return Err(TdtError::InvalidConfig(format!(
                "post rate must be positive, got {post_rate}"
            )));
        }
        if windows.is_empty() {
            return Err(TdtError::InvalidConfig("at least one window is required".into()));
        }
        if let Some(w) = windows.iter().find(|w| **w < 2) {
            return Err(TdtError::InvalidConfig(format!(
                "windows must be at least 2 seconds long, got {w}"
            )));
        }
        if let Some(w) = windows.iter().find(|w| **w % 2 != 0) {
            return Err(TdtError::InvalidConfig(format!(
                "windows must be even so both halves are equal, got {w}"
            )));
        }

        windows.sort_unstable();
        windows.dedup();
        Ok(Self { post_rate, windows })
    }

    pub fn post_rate(&self) -> f64 {
        self.post_rate
    }

    pub fn windows(&self) -> &[i64] {
        &self.windows
    }

    /// Largest window, i.e. how much volume history detection needs
    pub fn horizon(&self) -> i64 {
        self.windows.last().copied().unwrap_or(0)
    }

    /// Detect a burst in the volume before `timestamp`
    ///
    /// Returns the first and last timestamps stored in the bursting half
    /// window, or `None` when no window size triggers.
    pub fn detect<S>(&self, store: &S, timestamp: i64) -> Option<(i64, i64)>
    where
        S: NutritionStore<Volume>,
    {
        for &window in &self.windows {
            let half = window / 2;
            let first = store.between(timestamp - window, timestamp - half);
            let second = store.between(timestamp - half, timestamp);

            let first_volume: f64 = first.values().sum();
            if first_volume == 0.0 {
                continue;
            }

            let second_volume: f64 = second.values().sum();
            let ratio = second_volume / first_volume;
            if ratio >= self.post_rate {
                let start = second.keys().next().copied()?;
                let end = second.keys().next_back().copied()?;
                tracing::debug!(timestamp, window, ratio, start, end, "Zhao burst");
                return Some((start, end));
            }
        }

        None
    }
}
