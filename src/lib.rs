//! eventline - Event detection over timelines of short documents
//!
//! Detects breaking topics in streams of tweets by tracking how the
//! importance of terms, or the volume of documents, changes over time.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`nutrition`] - Timestamped checkpoints of term importance or volume
//! - [`vsm`] - Sparse vectors, similarity and clusters
//! - [`nlp`] - Tokenization, term weighting and documents
//! - [`clustering`] - No-K-Means and its temporal variant
//! - [`tdt`] - Cataldi, ELD and Zhao burst detectors
//! - [`consumer`] - Buffered, windowed stream consumer
//! - [`pipelines`] - ELD, FIRE and Zhao window processors
//! - [`ate`] - Term co-occurrence statistics
//! - [`reader`] - JSON-lines corpus reader
//! - [`config`] - Configuration management and settings
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use eventline::config::Config;
//! use eventline::consumer::{WindowClock, WindowedConsumer};
//! use eventline::nlp::{DocumentBuilder, Tokenizer, TokenizerConfig};
//! use eventline::pipelines::EldPipeline;
//! use eventline::queue::Queue;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let builder = DocumentBuilder::new(Tokenizer::english(TokenizerConfig::default()));
//!     let pipeline = EldPipeline::new(
//!         config.eld.clone(),
//!         &config.clustering,
//!         config.burst.clone(),
//!         builder,
//!     )?;
//!
//!     let queue = Arc::new(Queue::new());
//!     let clock = WindowClock::StreamRelative { periodicity: config.eld.time_window as f64 };
//!     let mut consumer = WindowedConsumer::new(queue, pipeline, clock)?;
//!     let report = consumer.run(0.0, 5.0).await?;
//!     println!("{} windows", report.windows);
//!     Ok(())
//! }
//! ```

pub mod ate;
pub mod clustering;
pub mod config;
pub mod consumer;
pub mod error;
pub mod metrics;
pub mod nlp;
pub mod nutrition;
pub mod pipelines;
pub mod queue;
pub mod reader;
pub mod tdt;
pub mod twitter;
pub mod vsm;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clustering::{ClusteringAlgorithm, NoKMeans, TemporalNoKMeans};
    pub use crate::config::Config;
    pub use crate::consumer::{
        ConsumerReport, StopHandle, Window, WindowClock, WindowEffects, WindowProcessor,
        WindowedConsumer,
    };
    pub use crate::error::{Error, ErrorCategory, EventlineErrorTrait, Result};
    pub use crate::nutrition::{MemoryNutritionStore, NutritionStore, TermNutrition, Volume};
    pub use crate::pipelines::{EldPipeline, FirePipeline, ZhaoPipeline};
    pub use crate::queue::Queue;
    pub use crate::tdt::{BreakingTerm, Cataldi, Eld, Zhao};
    pub use crate::vsm::{Cluster, Vector};
}

// Direct re-exports for convenience
pub use consumer::{WindowClock, WindowedConsumer};
pub use nutrition::{MemoryNutritionStore, NutritionStore};
