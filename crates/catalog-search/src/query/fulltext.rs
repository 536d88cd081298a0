//! Full-text query building.
//!
//! The spelling classification of the search text picks the strategy:
//!
//! | classification        | fragment                                              |
//! |-----------------------|-------------------------------------------------------|
//! | EXACT, MOST_EXACT     | `Filtered(weighted query, minimum-should-match filter)` |
//! | FUZZY, MOST_FUZZY     | `Bool/should(weighted query, fuzzy, phonetic)`        |
//! | PURE_STOPWORDS        | `MultiMatch` without minimum should match             |

use crate::error::ConfigurationError;
use crate::mapping::{Analyzer, FieldDescriptor, FieldMapping};
use crate::relevance::{FuzzinessConfig, RelevanceConfig};
use crate::spellcheck::SpellingType;

use super::fragment::{
    BoolQuery, MultiMatchQuery, MultiMatchType, QueryFragment, WeightedField,
};

/// Free text entered by the user.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchText {
    /// Raw text, analyzed by the engine.
    Text(String),
    /// Pre-tokenized terms; any of them may match.
    Terms(Vec<String>),
}

impl SearchText {
    /// Returns true when there is nothing to search for.
    pub fn is_blank(&self) -> bool {
        match self {
            SearchText::Text(text) => text.trim().is_empty(),
            SearchText::Terms(terms) => terms.iter().all(|t| t.trim().is_empty()),
        }
    }

    /// The text handed to the spellchecker.
    pub fn as_query_string(&self) -> String {
        match self {
            SearchText::Text(text) => text.clone(),
            SearchText::Terms(terms) => terms.join(" "),
        }
    }
}

impl From<&str> for SearchText {
    fn from(text: &str) -> Self {
        SearchText::Text(text.to_string())
    }
}

impl From<String> for SearchText {
    fn from(text: String) -> Self {
        SearchText::Text(text)
    }
}

impl From<Vec<String>> for SearchText {
    fn from(terms: Vec<String>) -> Self {
        SearchText::Terms(terms)
    }
}

/// Builds the full-text fragment of a search request.
pub struct FulltextQueryBuilder<'a> {
    mapping: &'a FieldMapping,
    config: &'a RelevanceConfig,
    phonetic_analysis: bool,
}

impl<'a> FulltextQueryBuilder<'a> {
    pub fn new(mapping: &'a FieldMapping, config: &'a RelevanceConfig) -> Self {
        Self {
            mapping,
            config,
            phonetic_analysis: true,
        }
    }

    /// Whether the searched index has `phonetic` sub-fields.
    pub fn with_phonetic_analysis(mut self, enabled: bool) -> Self {
        self.phonetic_analysis = enabled;
        self
    }

    /// Builds the fragment for `text` classified as `spelling`.
    pub fn build(
        &self,
        text: &SearchText,
        spelling: SpellingType,
    ) -> Result<QueryFragment, ConfigurationError> {
        if self.mapping.searchable_fields().next().is_none() {
            return Err(ConfigurationError::NoSearchableField);
        }

        Ok(match text {
            SearchText::Text(text) => self.build_text(text, spelling),
            SearchText::Terms(terms) => match terms.as_slice() {
                [] => self.build_text("", spelling),
                [single] => self.build_text(single, spelling),
                terms => QueryFragment::should(
                    terms
                        .iter()
                        .map(|term| self.build_text(term, spelling))
                        .collect(),
                ),
            },
        })
    }

    fn build_text(&self, text: &str, spelling: SpellingType) -> QueryFragment {
        match spelling {
            SpellingType::PureStopwords => self.pure_stopwords_query(text),
            SpellingType::Fuzzy | SpellingType::MostFuzzy => self.fuzzy_query(text),
            SpellingType::Exact | SpellingType::MostExact => {
                QueryFragment::filtered(self.weighted_search_query(text), self.exact_filter(text))
            }
        }
    }

    /// Scores every searchable field by its weight, plus the phrase bonus.
    fn weighted_search_query(&self, text: &str) -> QueryFragment {
        let mut query = MultiMatchQuery::new(self.weighted_fields(), text);
        query.tie_breaker = Some(self.config.tie_breaker);
        query.cutoff_frequency = self.config.cutoff();
        let query = QueryFragment::MultiMatch(query);

        match self.phrase_query(text) {
            Some(phrase) => QueryFragment::Bool(BoolQuery {
                must: vec![query],
                should: vec![phrase],
                ..BoolQuery::default()
            }),
            None => query,
        }
    }

    fn phrase_query(&self, text: &str) -> Option<QueryFragment> {
        let boost = self.config.phrase_match_boost?;
        let fields: Vec<WeightedField> = self
            .searchable_text_fields()
            .filter_map(|f| {
                f.mapping_property(Analyzer::Shingle)
                    .map(|property| WeightedField::new(property, f.search_weight()))
            })
            .collect();
        if fields.is_empty() {
            return None;
        }

        let mut query = MultiMatchQuery::new(fields, text);
        query.match_type = MultiMatchType::Phrase;
        query.boost = Some(boost);
        Some(QueryFragment::MultiMatch(query))
    }

    fn exact_filter(&self, text: &str) -> QueryFragment {
        let fields = self
            .mapping
            .searchable_fields()
            .map(|f| WeightedField::new(f.default_search_property(), 1.0))
            .collect();
        let mut query = MultiMatchQuery::new(fields, text);
        query.match_type = MultiMatchType::CrossFields;
        query.minimum_should_match = Some(self.config.minimum_should_match.clone());
        query.cutoff_frequency = self.config.cutoff();
        QueryFragment::MultiMatch(query)
    }

    fn fuzzy_query(&self, text: &str) -> QueryFragment {
        let mut clauses = vec![self.weighted_search_query(text)];

        if let Some(fuzziness) = &self.config.fuzziness {
            let fields = self.spellcheck_fields(true);
            clauses.extend(self.analyzed_match(text, &fields, Analyzer::Whitespace, Some(fuzziness)));
        }
        if let Some(phonetic) = self.config.phonetic.as_ref().filter(|_| self.phonetic_analysis) {
            let fields = self.spellcheck_fields(false);
            clauses.extend(self.analyzed_match(
                text,
                &fields,
                Analyzer::Phonetic,
                phonetic.fuzziness.as_ref(),
            ));
        }

        QueryFragment::should(clauses)
    }

    fn pure_stopwords_query(&self, text: &str) -> QueryFragment {
        let mut query = MultiMatchQuery::new(self.weighted_fields(), text);
        query.tie_breaker = Some(self.config.tie_breaker);
        QueryFragment::MultiMatch(query)
    }

    fn analyzed_match(
        &self,
        text: &str,
        fields: &[&FieldDescriptor],
        analyzer: Analyzer,
        fuzziness: Option<&FuzzinessConfig>,
    ) -> Option<QueryFragment> {
        let fields: Vec<WeightedField> = fields
            .iter()
            .filter_map(|f| {
                f.mapping_property(analyzer)
                    .map(|property| WeightedField::new(property, f.search_weight()))
            })
            .collect();
        if fields.is_empty() {
            return None;
        }

        let mut query = MultiMatchQuery::new(fields, text);
        query.minimum_should_match = Some(self.config.minimum_should_match.clone());
        query.cutoff_frequency = self.config.cutoff();
        query.fuzziness = fuzziness.cloned();
        Some(QueryFragment::MultiMatch(query))
    }

    fn weighted_fields(&self) -> Vec<WeightedField> {
        self.mapping
            .searchable_fields()
            .map(|f| WeightedField::new(f.default_search_property(), f.search_weight()))
            .collect()
    }

    fn searchable_text_fields(&self) -> impl Iterator<Item = &'a FieldDescriptor> {
        self.mapping
            .searchable_fields()
            .filter(|f| f.field_type().is_text())
    }

    /// Spellcheck text fields, or every searchable text field when none is
    /// flagged and `fallback` is set.
    fn spellcheck_fields(&self, fallback: bool) -> Vec<&'a FieldDescriptor> {
        let flagged: Vec<&FieldDescriptor> = self
            .searchable_text_fields()
            .filter(|f| f.is_used_in_spellcheck())
            .collect();
        if flagged.is_empty() && fallback {
            self.searchable_text_fields().collect()
        } else {
            flagged
        }
    }
}
