//! Documents: text turned into weighted, normalized vectors

use std::sync::Arc;

use super::tokenizer::Tokenizer;
use super::weighting::{TermWeighting, Tf};
use crate::vsm::{math, Vector};

/// Attribute holding a document's original text
pub const TEXT_ATTRIBUTE: &str = "text";

/// Attribute holding a document's timestamp in seconds
pub const TIMESTAMP_ATTRIBUTE: &str = "timestamp";

/// A tokenized document and its vector
#[derive(Debug, Clone)]
pub struct Document {
    pub tokens: Vec<String>,
    pub vector: Vector,
}

impl Document {
    pub fn text(&self) -> &str {
        self.vector
            .attribute(TEXT_ATTRIBUTE)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }

    pub fn timestamp(&self) -> Option<f64> {
        self.vector.numeric_attribute(TIMESTAMP_ATTRIBUTE)
    }
}

/// Tokenizes and weights text into [`Document`]s
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    tokenizer: Tokenizer,
    scheme: Arc<dyn TermWeighting>,
}

impl DocumentBuilder {
    /// Builder with term-frequency weighting
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            scheme: Arc::new(Tf),
        }
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: Arc<dyn TermWeighting>) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Tokenize, weight and normalize `text`
    pub fn build(&self, text: &str) -> Document {
        let tokens = self.tokenizer.tokenize(text);
        let mut vector = Vector::new(self.scheme.score(&tokens)).with_attribute(TEXT_ATTRIBUTE, text);
        vector.normalize();
        Document { tokens, vector }
    }

    /// Concatenate documents and rescale their weights into `[0, 1]`
    ///
    /// This is the nutrition of a window or of a cluster.
    pub fn checkpoint<'a>(vectors: impl IntoIterator<Item = &'a Vector>) -> Vector {
        let mut concatenated = math::concatenate(vectors);
        concatenated.rescale_to_unit_max();
        concatenated
    }
}
