use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::Path;

use eventline::ate::{chi, chi_p_value, corpus_pmi, llratio, ContingencyTable, Corpus, DocumentCache, Term};
use eventline::nlp::{Tokenizer, TokenizerConfig};
use eventline::twitter;

/// Report how strongly two terms co-occur across the tweets of a corpus
pub fn cooccur(input: &Path, x: &str, y: &str, base: f64) -> Result<()> {
    let tokenizer = Tokenizer::english(TokenizerConfig::default());
    let documents = tokenize_corpus(input, &tokenizer)?;

    let corpus = Corpus::new(&documents);
    let x_term = term(x);
    let y_term = term(y);

    let mut tokens = x_term.tokens();
    tokens.extend(y_term.tokens());
    let cache = DocumentCache::build(&corpus, tokens);

    let table = ContingencyTable::from_corpus(&corpus, &x_term, &y_term, Some(&cache))?;
    let pmi = corpus_pmi(&corpus, &x_term, &y_term, base, Some(&cache))?;

    println!("Co-occurrence of '{x}' and '{y}' in {} documents", corpus.len());
    println!("  Both:      {}", table.a);
    println!("  Only x:    {}", table.b);
    println!("  Only y:    {}", table.c);
    println!("  Neither:   {}", table.d);
    println!("  Chi:       {:.4}", chi(&table));
    println!("  p-value:   {:.6}", chi_p_value(&table)?);
    println!("  PMI:       {pmi:.4}");
    println!("  LL ratio:  {:.4}", llratio(&table));
    Ok(())
}

/// A space-separated argument is a joint term
fn term(text: &str) -> Term {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [single] => Term::single(*single),
        _ => Term::joint(tokens),
    }
}

/// Tokenize the full text of every tweet in a JSON-lines corpus
///
/// Malformed lines are logged and skipped.
pub fn tokenize_corpus(input: &Path, tokenizer: &Tokenizer) -> Result<Vec<Vec<String>>> {
    let file = std::fs::File::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;

    let mut documents = Vec::new();
    for (number, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", input.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<serde_json::Value>(&line) {
            Ok(tweet) => documents.push(tokenizer.tokenize(twitter::full_text(&tweet))),
            Err(e) => tracing::warn!(line = number + 1, error = %e, "Skipping malformed line"),
        }
    }
    Ok(documents)
}
