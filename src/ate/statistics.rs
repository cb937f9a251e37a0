//! Association measures between two terms

use statrs::distribution::{ChiSquared, ContinuousCDF};

use super::{AteError, AteResult, Corpus, DocumentCache, Term};

/// Document counts for a pair of terms `x` and `y`
///
/// | | y | ¬y |
/// |---|---|---|
/// | x | a | b |
/// | ¬x | c | d |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContingencyTable {
    pub a: u64,
    pub b: u64,
    pub c: u64,
    pub d: u64,
}

impl ContingencyTable {
    pub fn new(a: u64, b: u64, c: u64, d: u64) -> Self {
        Self { a, b, c, d }
    }

    /// Count documents in `corpus` containing `x`, `y` or both
    pub fn from_corpus(
        corpus: &Corpus,
        x: &Term,
        y: &Term,
        cache: Option<&DocumentCache>,
    ) -> AteResult<Self> {
        let mut tokens: Vec<String> = x.tokens().into_iter().map(String::from).collect();
        tokens.extend(y.tokens().into_iter().map(String::from));
        if tokens.is_empty() {
            return Err(AteError::EmptyJointTerm);
        }

        let x_count = corpus.document_frequency(x, cache) as u64;
        let y_count = corpus.document_frequency(y, cache) as u64;
        let both = corpus.document_frequency(&Term::Joint(tokens), cache) as u64;

        Ok(Self::from_counts(both, x_count, y_count, corpus.len() as u64))
    }

    /// Build from `A`, the marginal counts of each term and the corpus size
    pub fn from_counts(both: u64, x: u64, y: u64, total: u64) -> Self {
        let b = x.saturating_sub(both);
        let c = y.saturating_sub(both);
        let d = total.saturating_sub(both + b + c);
        Self { a: both, b, c, d }
    }

    /// The table with the roles of `x` and `y` swapped
    #[must_use]
    pub fn transpose(self) -> Self {
        Self {
            a: self.a,
            b: self.c,
            c: self.b,
            d: self.d,
        }
    }

    pub fn total(&self) -> u64 {
        self.a + self.b + self.c + self.d
    }
}

/// Pearson's chi-square statistic of the table
///
/// `N(AD - CB)^2 / ((A + C)(B + D)(A + B)(C + D))`, or 0 when any marginal
/// is empty.
pub fn chi(table: &ContingencyTable) -> f64 {
    let (a, b, c, d) = (
        table.a as f64,
        table.b as f64,
        table.c as f64,
        table.d as f64,
    );

    // Multiplied in sorted order so that transposed tables agree exactly
    let mut marginals = [a + c, b + d, a + b, c + d];
    if marginals.iter().any(|m| *m == 0.0) {
        return 0.0;
    }
    marginals.sort_by(f64::total_cmp);
    let denominator: f64 = marginals.iter().product();

    let n = a + b + c + d;
    n * (a * d - c * b).powi(2) / denominator
}

/// Probability of a chi-square at least as large as the table's under
/// independence, with one degree of freedom
pub fn chi_p_value(table: &ContingencyTable) -> AteResult<f64> {
    let distribution =
        ChiSquared::new(1.0).map_err(|e| AteError::Distribution(e.to_string()))?;
    Ok(1.0 - distribution.cdf(chi(table)))
}

/// Pointwise mutual information, `log_base(p(x, y) / (p(x) p(y)))`
///
/// Returns 0 when any probability is 0.
pub fn pmi(px: f64, py: f64, pxy: f64, base: f64) -> AteResult<f64> {
    if !(base > 0.0 && base != 1.0 && base.is_finite()) {
        return Err(AteError::InvalidBase(base));
    }

    if px == 0.0 || py == 0.0 || pxy == 0.0 {
        return Ok(0.0);
    }
    Ok((pxy / (px * py)).log(base))
}

/// Pointwise mutual information of two terms over a corpus
pub fn corpus_pmi(
    corpus: &Corpus,
    x: &Term,
    y: &Term,
    base: f64,
    cache: Option<&DocumentCache>,
) -> AteResult<f64> {
    let mut tokens: Vec<String> = x.tokens().into_iter().map(String::from).collect();
    tokens.extend(y.tokens().into_iter().map(String::from));

    let px = corpus.probability(x, cache)?;
    let py = corpus.probability(y, cache)?;
    let pxy = corpus.probability(&Term::Joint(tokens), cache)?;
    pmi(px, py, pxy, base)
}

/// Log-likelihood ratio of the co-occurrence count, `2 O ln(O / E)`
///
/// `O` is `A`; `E` is the count expected under independence. An empty
/// observation or expectation contributes 0.
pub fn llratio(table: &ContingencyTable) -> f64 {
    let n = table.total() as f64;
    if n == 0.0 {
        return 0.0;
    }

    let observed = table.a as f64;
    let expected = (table.a + table.b) as f64 * (table.a + table.c) as f64 / n;
    if observed == 0.0 || expected == 0.0 {
        return 0.0;
    }
    2.0 * observed * (observed / expected).ln()
}
