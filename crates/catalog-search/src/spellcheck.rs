//! Spelling classification of search text.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::SearchContext;
use crate::error::SearchResult;

/// How well the search text matches the indexed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpellingType {
    /// Every term exists in the index.
    Exact,
    /// Most terms exist in the index.
    MostExact,
    /// Most terms are unknown.
    MostFuzzy,
    /// No term exists in the index.
    Fuzzy,
    /// The text only contains stopwords.
    PureStopwords,
}

impl SpellingType {
    /// Exact classifications are answered with a filtered exact query.
    pub fn is_exact(&self) -> bool {
        matches!(self, SpellingType::Exact | SpellingType::MostExact)
    }

    pub fn is_fuzzy(&self) -> bool {
        matches!(self, SpellingType::Fuzzy | SpellingType::MostFuzzy)
    }
}

impl fmt::Display for SpellingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpellingType::Exact => "EXACT",
            SpellingType::MostExact => "MOST_EXACT",
            SpellingType::MostFuzzy => "MOST_FUZZY",
            SpellingType::Fuzzy => "FUZZY",
            SpellingType::PureStopwords => "PURE_STOPWORDS",
        };
        f.write_str(name)
    }
}

/// Classifies search text before the full-text query is built.
pub trait Spellchecker: Send + Sync {
    fn classify(&self, text: &str, context: &SearchContext) -> SearchResult<SpellingType>;
}

/// Classifies stopword-only text as [`SpellingType::PureStopwords`] and
/// everything else as [`SpellingType::Exact`].
#[derive(Debug, Clone)]
pub struct StopwordSpellchecker {
    stopwords: HashSet<String>,
}

impl StopwordSpellchecker {
    pub fn new<I, S>(stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stopwords: stopwords
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// English stopwords.
    pub fn english() -> Self {
        Self::new([
            "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into",
            "is", "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then",
            "there", "these", "they", "this", "to", "was", "will", "with",
        ])
    }

    fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(&token.to_lowercase())
    }
}

impl Default for StopwordSpellchecker {
    fn default() -> Self {
        Self::english()
    }
}

impl Spellchecker for StopwordSpellchecker {
    fn classify(&self, text: &str, _context: &SearchContext) -> SearchResult<SpellingType> {
        let all_stopwords = text.split_whitespace().all(|token| self.is_stopword(token));
        Ok(if all_stopwords {
            SpellingType::PureStopwords
        } else {
            SpellingType::Exact
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> SearchContext {
        SearchContext::new("quick_search", "default", "en_US", "catalog_product")
    }

    #[test]
    fn test_stopword_classification() {
        let checker = StopwordSpellchecker::english();
        assert_eq!(
            checker.classify("The a", &context()).unwrap(),
            SpellingType::PureStopwords
        );
        assert_eq!(
            checker.classify("the bag", &context()).unwrap(),
            SpellingType::Exact
        );
    }

    #[test]
    fn test_spelling_type_groups() {
        assert!(SpellingType::MostExact.is_exact());
        assert!(SpellingType::MostFuzzy.is_fuzzy());
        assert!(!SpellingType::PureStopwords.is_exact());
        assert_eq!(SpellingType::PureStopwords.to_string(), "PURE_STOPWORDS");
    }
}
