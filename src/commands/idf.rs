use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use eventline::nlp::{Idf, Tokenizer, TokenizerConfig};

use super::cooccur::tokenize_corpus;

/// Build one IDF table from the tweets of every input corpus
pub fn idf(inputs: &[PathBuf], output: &Path) -> Result<()> {
    let tokenizer = Tokenizer::english(TokenizerConfig::default());

    println!("Building IDF table");
    println!("==================");

    let mut table = Idf::default();
    for input in inputs {
        let documents = tokenize_corpus(input, &tokenizer)?;
        let corpus = Idf::from_documents(documents.iter().map(Vec::as_slice));
        println!("  {}: {} documents", input.display(), corpus.documents());
        table.update(&corpus);
    }

    let json = serde_json::to_string(&table).context("Failed to serialize IDF table")?;
    std::fs::write(output, json)
        .with_context(|| format!("Failed to write IDF table: {}", output.display()))?;

    println!(
        "\n{} documents, {} terms written to {}",
        table.documents(),
        table.terms(),
        output.display()
    );
    Ok(())
}

/// Load an IDF table written by [`idf`]
pub fn load_idf(path: &Path) -> Result<Idf> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read IDF table: {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse IDF table: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn corpus(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn test_idf_over_two_corpora() {
        let first = corpus(&[
            r#"{"text": "Messi scores a penalty"}"#,
            r#"{"text": "penalty saved"}"#,
        ]);
        let second = corpus(&[r#"{"text": "Penalty given"}"#, "{broken"]);
        let dir = tempdir().unwrap();
        let output = dir.path().join("idf.json");

        idf(&[first.path().to_path_buf(), second.path().to_path_buf()], &output).unwrap();
        let table = load_idf(&output).unwrap();

        assert_eq!(table.documents(), 3);
        assert_eq!(table.document_frequency("penalty"), 3);
        assert_eq!(table.document_frequency("messi"), 1);
    }

    #[test]
    fn test_load_rejects_inconsistent_table() {
        let file = corpus(&[r#"{"documents": 1, "document_frequency": {"goal": 4}}"#]);
        assert!(load_idf(file.path()).is_err());
    }
}
