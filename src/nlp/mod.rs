//! Text processing: tokenization, term weighting and documents

pub mod document;
pub mod tokenizer;
pub mod weighting;

pub use document::{Document, DocumentBuilder, TEXT_ATTRIBUTE, TIMESTAMP_ATTRIBUTE};
pub use tokenizer::{Tokenizer, TokenizerConfig};
pub use weighting::{Idf, TermWeighting, Tf, TfIdf, WeightingError};
