//! Term-weighting schemes

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::vsm::Dimensions;

/// Errors raised when building a weighting scheme
#[derive(Debug, thiserror::Error)]
pub enum WeightingError {
    #[error("Document count ({documents}) is smaller than the most common term's frequency ({max_df})")]
    InconsistentIdf { documents: usize, max_df: usize },
}

/// Converts tokens into weighted dimensions
pub trait TermWeighting: Send + Sync + std::fmt::Debug {
    fn score(&self, tokens: &[String]) -> Dimensions;
}

/// Raw term frequency
#[derive(Debug, Clone, Copy, Default)]
pub struct Tf;

impl TermWeighting for Tf {
    fn score(&self, tokens: &[String]) -> Dimensions {
        let mut weights = Dimensions::new();
        for token in tokens {
            *weights.entry(token.clone()).or_insert(0.0) += 1.0;
        }
        weights
    }
}

/// Inverse document frequency: `log10(N / (df + 1))`
///
/// Serialized as `{"documents": N, "document_frequency": {term: df}}`.
/// Deserializing validates the table like [`Idf::new`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IdfTable")]
pub struct Idf {
    documents: usize,
    document_frequency: HashMap<String, usize>,
}

#[derive(Deserialize)]
struct IdfTable {
    documents: usize,
    document_frequency: HashMap<String, usize>,
}

impl TryFrom<IdfTable> for Idf {
    type Error = WeightingError;

    fn try_from(table: IdfTable) -> Result<Self, Self::Error> {
        Self::new(table.document_frequency, table.documents)
    }
}

impl Idf {
    /// Build from a document-frequency table and the corpus size
    pub fn new(
        document_frequency: HashMap<String, usize>,
        documents: usize,
    ) -> Result<Self, WeightingError> {
        let max_df = document_frequency.values().copied().max().unwrap_or(0);
        if max_df > documents {
            return Err(WeightingError::InconsistentIdf { documents, max_df });
        }

        Ok(Self {
            document_frequency,
            documents,
        })
    }

    /// Count document frequencies over tokenized documents
    pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a [String]>) -> Self {
        let mut document_frequency = HashMap::new();
        let mut count = 0;
        for tokens in documents {
            count += 1;
            let unique: HashSet<&String> = tokens.iter().collect();
            for token in unique {
                *document_frequency.entry(token.clone()).or_insert(0) += 1;
            }
        }

        Self {
            document_frequency,
            documents: count,
        }
    }

    /// Fold another document-frequency table into this one
    pub fn update(&mut self, other: &Idf) {
        for (term, df) in &other.document_frequency {
            *self.document_frequency.entry(term.clone()).or_insert(0) += df;
        }
        self.documents += other.documents;
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Number of documents that contain `term`
    pub fn document_frequency(&self, term: &str) -> usize {
        self.document_frequency.get(term).copied().unwrap_or(0)
    }

    /// Number of distinct terms
    pub fn terms(&self) -> usize {
        self.document_frequency.len()
    }

    /// IDF of a single term; 0 for an empty corpus
    pub fn idf(&self, term: &str) -> f64 {
        if self.documents == 0 {
            return 0.0;
        }

        let df = self.document_frequency(term);
        (self.documents as f64 / (df + 1) as f64).log10()
    }
}

impl TermWeighting for Idf {
    fn score(&self, tokens: &[String]) -> Dimensions {
        tokens.iter().map(|t| (t.clone(), self.idf(t))).collect()
    }
}

/// TF multiplied by IDF
#[derive(Debug, Clone, Default)]
pub struct TfIdf {
    idf: Idf,
}

impl TfIdf {
    pub fn new(idf: Idf) -> Self {
        Self { idf }
    }

    pub fn idf(&self) -> &Idf {
        &self.idf
    }
}

impl TermWeighting for TfIdf {
    fn score(&self, tokens: &[String]) -> Dimensions {
        Tf.score(tokens)
            .into_iter()
            .map(|(term, tf)| {
                let weight = tf * self.idf.idf(&term);
                (term, weight)
            })
            .collect()
    }
}
