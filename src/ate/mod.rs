//! Term co-occurrence statistics for automatic term extraction
//!
//! A [`Corpus`] holds tokenized documents. Queries name either a single term
//! or a joint itemset through [`Term`], and may be accelerated by a
//! [`DocumentCache`] that the caller builds for the terms it expects to query
//! often.

pub mod statistics;

pub use statistics::{chi, chi_p_value, corpus_pmi, llratio, pmi, ContingencyTable};

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors raised by term statistics
#[derive(Debug, Error)]
pub enum AteError {
    #[error("Logarithm base must be positive and different from 1, got {0}")]
    InvalidBase(f64),

    #[error("Joint term must contain at least one token")]
    EmptyJointTerm,

    #[error("Statistical distribution error: {0}")]
    Distribution(String),
}

/// Result type for term statistics
pub type AteResult<T> = Result<T, AteError>;

/// A single term or a set of terms that must co-occur
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Single(String),
    Joint(Vec<String>),
}

impl Term {
    pub fn single(term: impl Into<String>) -> Self {
        Self::Single(term.into())
    }

    pub fn joint<S: Into<String>>(terms: impl IntoIterator<Item = S>) -> Self {
        Self::Joint(terms.into_iter().map(Into::into).collect())
    }

    /// Tokens making up the term
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            Self::Single(t) => vec![t.as_str()],
            Self::Joint(ts) => ts.iter().map(String::as_str).collect(),
        }
    }

    fn validate(&self) -> AteResult<()> {
        match self {
            Self::Joint(ts) if ts.is_empty() => Err(AteError::EmptyJointTerm),
            _ => Ok(()),
        }
    }
}

/// Every `(x, y)` pair of the two vocabularies as a joint term
pub fn joint_vocabulary(x: &[String], y: &[String]) -> Vec<Term> {
    x.iter()
        .flat_map(|a| y.iter().map(move |b| Term::joint([a.clone(), b.clone()])))
        .collect()
}

/// A tokenized document with per-token counts
#[derive(Debug, Clone, Default)]
struct Bag {
    counts: HashMap<String, usize>,
    length: usize,
}

impl Bag {
    fn new(tokens: &[String]) -> Self {
        let mut counts = HashMap::new();
        for token in tokens {
            *counts.entry(token.clone()).or_insert(0) += 1;
        }
        Self {
            counts,
            length: tokens.len(),
        }
    }

    /// Occurrences of the term; a joint term occurs as often as its rarest token
    fn count(&self, term: &Term) -> usize {
        term.tokens()
            .into_iter()
            .map(|t| self.counts.get(t).copied().unwrap_or(0))
            .min()
            .unwrap_or(0)
    }
}

/// Tokenized documents
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Bag>,
    tokens: usize,
}

impl Corpus {
    pub fn new<T: AsRef<[String]>>(documents: impl IntoIterator<Item = T>) -> Self {
        let documents: Vec<Bag> = documents.into_iter().map(|d| Bag::new(d.as_ref())).collect();
        let tokens = documents.iter().map(|d| d.length).sum();
        Self { documents, tokens }
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total number of tokens
    pub fn tokens(&self) -> usize {
        self.tokens
    }

    /// Number of documents containing the term
    ///
    /// When the cache indexes one of the term's tokens, only the documents
    /// listed there are scanned.
    pub fn document_frequency(&self, term: &Term, cache: Option<&DocumentCache>) -> usize {
        let contains = |i: &usize| self.documents.get(*i).is_some_and(|d| d.count(term) > 0);

        match cache.and_then(|c| c.smallest_posting(term)) {
            Some(posting) => posting.iter().filter(|i| contains(i)).count(),
            None => (0..self.documents.len()).filter(contains).count(),
        }
    }

    /// Token-level probability of the term
    ///
    /// Joint terms count, per document, as many times as their rarest token.
    /// An empty corpus gives 0.
    pub fn probability(&self, term: &Term, cache: Option<&DocumentCache>) -> AteResult<f64> {
        term.validate()?;
        if self.tokens == 0 {
            return Ok(0.0);
        }

        let count: usize = match cache.and_then(|c| c.smallest_posting(term)) {
            Some(posting) => posting
                .iter()
                .filter_map(|i| self.documents.get(*i))
                .map(|d| d.count(term))
                .sum(),
            None => self.documents.iter().map(|d| d.count(term)).sum(),
        };
        Ok(count as f64 / self.tokens as f64)
    }
}

/// Index of the documents containing selected tokens
///
/// The caller chooses which tokens to index; queries for other tokens fall
/// back to a full scan.
#[derive(Debug, Clone, Default)]
pub struct DocumentCache {
    postings: HashMap<String, Vec<usize>>,
}

impl DocumentCache {
    /// Index `tokens` over `corpus`
    pub fn build<'a>(corpus: &Corpus, tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let wanted: HashSet<&str> = tokens.into_iter().collect();
        let mut postings: HashMap<String, Vec<usize>> =
            wanted.iter().map(|t| (t.to_string(), Vec::new())).collect();

        for (i, document) in corpus.documents.iter().enumerate() {
            for token in document.counts.keys() {
                if let Some(posting) = postings.get_mut(token.as_str()) {
                    posting.push(i);
                }
            }
        }

        Self { postings }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.postings.contains_key(token)
    }

    /// The shortest posting list among the term's cached tokens
    fn smallest_posting(&self, term: &Term) -> Option<&Vec<usize>> {
        term.tokens()
            .into_iter()
            .filter_map(|t| self.postings.get(t))
            .min_by_key(|p| p.len())
    }
}
