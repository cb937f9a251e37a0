pub mod consume;
pub mod cooccur;
pub mod generate;
pub mod idf;

// Re-export command functions for convenience
pub use consume::{consume, ConsumeParams, PipelineKind};
pub use cooccur::cooccur;
pub use generate::{generate, GenerateParams};
pub use idf::idf;
