//! Rule-based tweet tokenizer
//!
//! Rules run in a fixed order: hashtag splitting, case folding, URL and
//! alt-code removal, ASCII folding, repeated-character normalization, mention
//! and hashtag handling, number removal, then splitting on whitespace and
//! punctuation with stopword and length filtering.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

macro_rules! compile_regex {
    ($s:expr) => {
        Regex::new($s).expect(concat!("Invalid regex: ", $s))
    };
}

lazy_static! {
    static ref URL: Regex = compile_regex!(r"(https?://)?([^\s]+)?\.[a-zA-Z0-9]+?/?([^\s,.]+)?");
    static ref ALT_CODE: Regex = compile_regex!(r"&.+?;");
    static ref MENTION: Regex = compile_regex!(r"@[a-zA-Z0-9_]+");
    static ref HASHTAG: Regex = compile_regex!(r"#([a-zA-Z0-9_]+)");
    static ref CAMEL_CASE: Regex = compile_regex!(r"([a-z]+)?([A-Z]+|[0-9]+)");
    static ref NUMBER: Regex = compile_regex!(r"\b([0-9]{1,3}|[0-9]{5,})\b");
}

/// A small English stopword list
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "don", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Tokenizer options
#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    pub remove_mentions: bool,
    pub remove_hashtags: bool,
    pub split_hashtags: bool,
    pub remove_numbers: bool,
    pub remove_urls: bool,
    pub remove_alt_codes: bool,
    pub normalize_words: bool,
    /// Runs of this many identical characters or more collapse to one
    pub character_normalization_count: usize,
    pub case_fold: bool,
    pub remove_punctuation: bool,
    pub remove_unicode_entities: bool,
    pub min_length: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            remove_mentions: true,
            remove_hashtags: false,
            split_hashtags: true,
            remove_numbers: true,
            remove_urls: true,
            remove_alt_codes: true,
            normalize_words: false,
            character_normalization_count: 3,
            case_fold: true,
            remove_punctuation: true,
            remove_unicode_entities: false,
            min_length: 3,
        }
    }
}

/// Converts text into a list of tokens
#[derive(Debug, Clone)]
pub struct Tokenizer {
    config: TokenizerConfig,
    stopwords: HashSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

impl Tokenizer {
    /// Create a tokenizer without stopwords
    #[must_use]
    pub fn new(config: TokenizerConfig) -> Self {
        Self {
            config,
            stopwords: HashSet::new(),
        }
    }

    /// Create a tokenizer that drops [`ENGLISH_STOPWORDS`]
    #[must_use]
    pub fn english(config: TokenizerConfig) -> Self {
        Self::new(config).with_stopwords(ENGLISH_STOPWORDS.iter().copied())
    }

    #[must_use]
    pub fn with_stopwords<S: Into<String>>(mut self, stopwords: impl IntoIterator<Item = S>) -> Self {
        self.stopwords.extend(stopwords.into_iter().map(Into::into));
        self
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Tokenize `text`
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let c = &self.config;
        let mut text = if c.split_hashtags {
            split_hashtags(text)
        } else {
            text.to_string()
        };

        if c.case_fold {
            text = text.to_lowercase();
        }
        if c.remove_urls {
            text = URL.replace_all(&text, "").into_owned();
        }
        if c.remove_alt_codes {
            text = ALT_CODE.replace_all(&text, "").into_owned();
        }
        if c.remove_unicode_entities {
            text.retain(|ch| ch.is_ascii());
        }
        if c.normalize_words {
            text = collapse_repeats(&text, c.character_normalization_count);
        }
        if c.remove_mentions {
            text = MENTION.replace_all(&text, "").into_owned();
        }
        text = if c.remove_hashtags {
            HASHTAG.replace_all(&text, "").into_owned()
        } else {
            HASHTAG.replace_all(&text, "$1").into_owned()
        };
        if c.remove_numbers {
            text = NUMBER.replace_all(&text, "").into_owned();
        }

        self.postprocess(&text)
    }

    fn postprocess(&self, text: &str) -> Vec<String> {
        let split: Vec<String> = if self.config.remove_punctuation {
            text.split(|ch: char| ch.is_whitespace() || ch.is_ascii_punctuation())
                .map(str::to_string)
                .collect()
        } else {
            text.split_whitespace().map(str::to_string).collect()
        };

        split
            .into_iter()
            .filter(|token| !token.is_empty())
            .filter(|token| !self.stopwords.contains(token))
            .filter(|token| token.chars().count() >= self.config.min_length)
            .collect()
    }
}

/// Replace camel-case hashtags by their components
///
/// `#BreakingNews` becomes `Breaking News`; single-component hashtags are kept.
fn split_hashtags(text: &str) -> String {
    let mut result = text.to_string();
    for capture in HASHTAG.captures_iter(text) {
        let hashtag = &capture[1];
        let components = CAMEL_CASE.replace_all(hashtag, |c: &regex::Captures<'_>| {
            let lower = c.get(1).map_or("", |m| m.as_str());
            format!("{lower} {}", &c[2])
        });

        if components.split_whitespace().count() > 1 {
            result = result.replace(&format!("#{hashtag}"), &components);
        }
    }
    result
}

/// Collapse runs of `count` or more identical characters into one
fn collapse_repeats(text: &str, count: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let mut j = i;
        while j < chars.len() && chars[j] == chars[i] {
            j += 1;
        }
        let run = j - i;
        if run >= count.max(1) {
            result.push(chars[i]);
        } else {
            result.extend(&chars[i..j]);
        }
        i = j;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokenization() {
        let tokenizer = Tokenizer::default();
        assert_eq!(tokenizer.tokenize("Goal scored by Messi!"), vec!["goal", "scored", "messi"]);
    }

    #[test]
    fn test_removes_urls_and_mentions() {
        let tokenizer = Tokenizer::default();
        let tokens = tokenizer.tokenize("@fan watch https://t.co/abc123 highlights");
        assert_eq!(tokens, vec!["watch", "highlights"]);
    }

    #[test]
    fn test_splits_camel_case_hashtags() {
        let tokenizer = Tokenizer::default();
        assert_eq!(tokenizer.tokenize("#BreakingNews tonight"), vec!["breaking", "news", "tonight"]);
        assert_eq!(tokenizer.tokenize("#goal"), vec!["goal"]);
    }

    #[test]
    fn test_removes_numbers_but_keeps_years() {
        let tokenizer = Tokenizer::default();
        assert_eq!(tokenizer.tokenize("final 2018 score 12"), vec!["final", "2018", "score"]);
    }

    #[test]
    fn test_stopwords_and_min_length() {
        let tokenizer = Tokenizer::english(TokenizerConfig::default());
        assert_eq!(tokenizer.tokenize("this is the end of an era"), vec!["end", "era"]);
    }

    #[test]
    fn test_character_normalization() {
        let config = TokenizerConfig {
            normalize_words: true,
            ..TokenizerConfig::default()
        };
        let tokenizer = Tokenizer::new(config);
        assert_eq!(tokenizer.tokenize("goooool yess"), vec!["gol", "yess"]);
    }

    #[test]
    fn test_alt_codes() {
        let tokenizer = Tokenizer::default();
        assert_eq!(tokenizer.tokenize("fish &amp; chips"), vec!["fish", "chips"]);
    }

    #[test]
    fn test_unicode_entities() {
        let config = TokenizerConfig {
            remove_unicode_entities: true,
            ..TokenizerConfig::default()
        };
        assert_eq!(Tokenizer::new(config).tokenize("café ⚽ match"), vec!["caf", "match"]);
    }
}
