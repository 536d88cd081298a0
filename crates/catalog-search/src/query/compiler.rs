//! Search request compilation.

use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::context::SearchContext;
use crate::error::SearchResult;
use crate::index::IndexNaming;
use crate::mapping::MappingProvider;
use crate::relevance::RelevanceConfigResolver;
use crate::spellcheck::{SpellingType, Spellchecker};

use super::aggregation::{FacetRequest, build_aggregations};
use super::filter::{FilterCondition, FilterQueryBuilder};
use super::fragment::QueryFragment;
use super::fulltext::{FulltextQueryBuilder, SearchText};
use super::sort::{SortClause, SortOrder, build_sort};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Business-level search criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: Option<SearchText>,
    pub filters: Vec<FilterCondition>,
    pub sort: Vec<SortOrder>,
    pub facets: Vec<FacetRequest>,
    pub from: usize,
    pub size: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            filters: Vec::new(),
            sort: Vec::new(),
            facets: Vec::new(),
            from: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<SearchText>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_filter(mut self, condition: FilterCondition) -> Self {
        self.filters.push(condition);
        self
    }

    pub fn with_filters(mut self, conditions: impl IntoIterator<Item = FilterCondition>) -> Self {
        self.filters.extend(conditions);
        self
    }

    pub fn with_sort(mut self, order: SortOrder) -> Self {
        self.sort.push(order);
        self
    }

    pub fn with_facet(mut self, facet: FacetRequest) -> Self {
        self.facets.push(facet);
        self
    }

    /// Selects a 1-based page. Page 0 is treated as page 1.
    pub fn page(mut self, page: usize, size: usize) -> Self {
        self.from = page.saturating_sub(1).saturating_mul(size);
        self.size = size;
        self
    }

    /// Search text that is actually there.
    fn effective_text(&self) -> Option<&SearchText> {
        self.text.as_ref().filter(|text| !text.is_blank())
    }
}

/// A compiled search request, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Alias the request targets.
    pub index: String,
    pub query: QueryFragment,
    pub sort: Vec<SortClause>,
    pub aggregations: Map<String, Value>,
    pub from: usize,
    pub size: usize,
    /// Classification of the search text, if there was any.
    pub spelling: Option<SpellingType>,
}

impl SearchRequest {
    /// Renders the JSON request body.
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "from": self.from,
            "size": self.size,
            "track_total_hits": true,
            "query": self.query.to_dsl(),
            "sort": self.sort.iter().map(SortClause::to_dsl).collect::<Vec<_>>(),
        });
        if !self.aggregations.is_empty() {
            body["aggs"] = Value::Object(self.aggregations.clone());
        }
        body
    }
}

/// Turns a [`SearchQuery`] into a [`SearchRequest`] for a search context.
///
/// Compilation does no I/O beyond cache misses of the relevance resolver and
/// the mapping provider, and is safe to run concurrently.
pub struct SearchRequestCompiler {
    resolver: Arc<RelevanceConfigResolver>,
    mappings: Arc<dyn MappingProvider>,
    spellchecker: Arc<dyn Spellchecker>,
    naming: IndexNaming,
    phonetic_analysis: bool,
}

impl SearchRequestCompiler {
    pub fn new(
        resolver: Arc<RelevanceConfigResolver>,
        mappings: Arc<dyn MappingProvider>,
        spellchecker: Arc<dyn Spellchecker>,
        naming: IndexNaming,
    ) -> Self {
        Self {
            resolver,
            mappings,
            spellchecker,
            naming,
            phonetic_analysis: true,
        }
    }

    /// Must match `IndexSettingsConfig::phonetic_analysis` of the searched indices.
    pub fn with_phonetic_analysis(mut self, enabled: bool) -> Self {
        self.phonetic_analysis = enabled;
        self
    }

    pub fn compile(&self, context: &SearchContext, query: &SearchQuery) -> SearchResult<SearchRequest> {
        let config = self.resolver.resolve(&context.name, &context.locale)?;
        let mapping = self.mappings.mapping(&context.index_identifier)?;

        let (fulltext, spelling) = match query.effective_text() {
            Some(text) => {
                let spelling = self
                    .spellchecker
                    .classify(&text.as_query_string(), context)?;
                let fragment = FulltextQueryBuilder::new(&mapping, &config)
                    .with_phonetic_analysis(self.phonetic_analysis)
                    .build(text, spelling)?;
                (Some(fragment), Some(spelling))
            }
            None => (None, None),
        };

        let filter = if query.filters.is_empty() {
            None
        } else {
            Some(FilterQueryBuilder::new(&mapping).build(&query.filters, None)?)
        };

        let fragment = match (fulltext, filter) {
            (Some(fulltext), Some(filter)) => QueryFragment::filtered(fulltext, filter),
            (Some(fulltext), None) => fulltext,
            (None, Some(filter)) => filter,
            (None, None) => QueryFragment::MatchAll,
        };

        let request = SearchRequest {
            index: self.naming.alias(&context.store_code, &context.index_identifier),
            query: fragment,
            sort: build_sort(&mapping, &query.sort)?,
            aggregations: build_aggregations(&mapping, &query.facets)?,
            from: query.from,
            size: query.size,
            spelling,
        };

        tracing::debug!(
            context = %context,
            index = %request.index,
            spelling = ?request.spelling,
            filters = query.filters.len(),
            facets = query.facets.len(),
            "Compiled search request"
        );
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offsets() {
        assert_eq!(SearchQuery::new().page(3, 12).from, 24);
        assert_eq!(SearchQuery::new().page(1, 12).from, 0);
        assert_eq!(SearchQuery::new().page(0, 12).from, 0);
    }

    #[test]
    fn test_huge_page_saturates_offset() {
        let query = SearchQuery::new().page(usize::MAX, 2);
        assert_eq!(query.from, usize::MAX);
        assert_eq!(query.size, 2);
        assert_eq!(SearchQuery::new().page(3, usize::MAX).from, usize::MAX);
    }

    #[test]
    fn test_blank_text_is_ignored() {
        let query = SearchQuery::new().with_text("   ");
        assert!(query.effective_text().is_none());
        assert_eq!(query.size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_body_omits_empty_aggregations() {
        let request = SearchRequest {
            index: "magento2_default_catalog_product".to_string(),
            query: QueryFragment::MatchAll,
            sort: vec![SortClause::Score(Default::default())],
            aggregations: Map::new(),
            from: 20,
            size: 10,
            spelling: None,
        };
        let body = request.to_body();
        assert_eq!(body["query"], json!({ "match_all": {} }));
        assert_eq!(body["track_total_hits"], json!(true));
        assert_eq!(body["from"], json!(20));
        assert_eq!(body["sort"], json!([{ "_score": { "order": "desc" } }]));
        assert!(body.get("aggs").is_none());
    }
}
