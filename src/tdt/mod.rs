//! Burst detection over nutrition stores
//!
//! Three independent detectors read windowed nutrition and report what is
//! breaking:
//!
//! | Detector  | Nutrition | Output                                   |
//! |-----------|-----------|------------------------------------------|
//! | [`Cataldi`] | per term  | terms ranked above the critical drop     |
//! | [`Eld`]     | per term  | term -> burst in `[-1, 1]`               |
//! | [`Zhao`]    | volume    | the half-window interval that burst      |
//!
//! Detectors never mutate the store they read from, so calling one twice on
//! unchanged input gives the same answer.

pub mod cataldi;
pub mod eld;
pub mod zhao;

pub use cataldi::Cataldi;
pub use eld::Eld;
pub use zhao::Zhao;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by burst detectors
#[derive(Debug, Error)]
pub enum TdtError {
    /// A ranking invariant did not hold; this indicates a bug, not bad input
    #[error("Invariant violation: {0}")]
    Invariant(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for burst detection
pub type TdtResult<T> = Result<T, TdtError>;

/// A term together with its burst score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakingTerm {
    pub term: String,
    pub burst: f64,
}

impl BreakingTerm {
    pub fn new(term: impl Into<String>, burst: f64) -> Self {
        Self {
            term: term.into(),
            burst,
        }
    }
}

/// Sort term bursts in descending order, ties broken alphabetically
pub fn rank(bursts: impl IntoIterator<Item = (String, f64)>) -> Vec<BreakingTerm> {
    let mut ranked: Vec<BreakingTerm> = bursts
        .into_iter()
        .map(|(term, burst)| BreakingTerm { term, burst })
        .collect();
    ranked.sort_by(|a, b| b.burst.total_cmp(&a.burst).then_with(|| a.term.cmp(&b.term)));
    ranked
}
