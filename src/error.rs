//! Unified error handling for the eventline crate
//!
//! Each module defines its own error enum. [`Error`] wraps all of them so that
//! code spanning several modules, such as the pipelines and the binary, can use
//! a single `Result` while keeping the detailed cause.
//!
//! # Architecture
//!
//! - [`EventlineErrorTrait`] - Common interface implemented by the unified error
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use eventline::error::{Error, EventlineErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = ?err.category(), "Retrying: {err}");
//!     } else {
//!         eprintln!("Fatal error: {err}");
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::ate::AteError;
pub use crate::clustering::ClusteringError;
pub use crate::consumer::{ConsumerError, WindowError};
pub use crate::nlp::WeightingError;
pub use crate::nutrition::StoreError;
pub use crate::reader::ReaderError;
pub use crate::tdt::TdtError;
pub use crate::twitter::TwitterError;
pub use crate::vsm::math::VectorMathError;

/// Common trait for eventline error types
pub trait EventlineErrorTrait: std::error::Error {
    /// Check if this error is recoverable (the operation can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A data structure invariant was broken
    Invariant,
    /// Invalid numeric input such as a log base or a degenerate distribution
    Numeric,
    /// Configuration and validation errors
    Config,
    /// Storage and I/O errors
    Storage,
    /// Malformed input items
    Parsing,
    /// Consumer lifecycle and window processing errors
    Consumer,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Invariant => "invariant violation",
            Self::Numeric => "numeric error",
            Self::Config => "configuration error",
            Self::Storage => "storage error",
            Self::Parsing => "parsing error",
            Self::Consumer => "consumer error",
            Self::Other => "other error",
        }
    }
}

/// Unified error type for the eventline crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Clustering error: {0}")]
    Clustering(#[from] ClusteringError),

    #[error("Detection error: {0}")]
    Tdt(#[from] TdtError),

    #[error("Consumer error: {0}")]
    Consumer(#[from] ConsumerError),

    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    #[error("Weighting error: {0}")]
    Weighting(#[from] WeightingError),

    #[error("Item error: {0}")]
    Twitter(#[from] TwitterError),

    #[error("Term extraction error: {0}")]
    Ate(#[from] AteError),

    #[error("Vector error: {0}")]
    VectorMath(#[from] VectorMathError),

    #[error("Reader error: {0}")]
    Reader(#[from] ReaderError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl EventlineErrorTrait for WindowError {
    /// Only a window failing on a malformed item can be skipped
    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Item(_))
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Detection(TdtError::Invariant(_)) => ErrorCategory::Invariant,
            Self::Detection(_) | Self::Clustering(_) => ErrorCategory::Config,
            Self::Item(_) => ErrorCategory::Parsing,
        }
    }
}

impl EventlineErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) | Self::Reader(ReaderError::Io { .. }) => true,
            Self::Store(StoreError::Io { .. }) => true,
            Self::Consumer(ConsumerError::Window { source, .. }) | Self::Window(source) => {
                source.is_recoverable()
            }
            _ => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Store(StoreError::InvalidKey(_)) => ErrorCategory::Parsing,
            Self::Store(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Clustering(_) | Self::Weighting(_) => ErrorCategory::Config,
            Self::Tdt(TdtError::Invariant(_)) => ErrorCategory::Invariant,
            Self::Tdt(_) => ErrorCategory::Config,
            Self::Consumer(ConsumerError::Timestamp(_)) => ErrorCategory::Parsing,
            Self::Consumer(ConsumerError::Window { source, .. }) | Self::Window(source) => {
                source.category()
            }
            Self::Consumer(
                ConsumerError::InvalidPeriodicity(_)
                | ConsumerError::InvalidWait(_)
                | ConsumerError::InvalidInactivity(_),
            ) => ErrorCategory::Config,
            Self::Consumer(_) => ErrorCategory::Consumer,
            Self::Twitter(_) | Self::Json(_) => ErrorCategory::Parsing,
            Self::Ate(_) | Self::VectorMath(_) => ErrorCategory::Numeric,
            Self::Reader(ReaderError::Io { .. }) => ErrorCategory::Storage,
            Self::Reader(_) | Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
