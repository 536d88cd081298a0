//! Query compilation: typed fragments, the builders that produce them and the
//! compiler that assembles one search request.

mod aggregation;
mod compiler;
mod filter;
mod fragment;
mod fulltext;
mod sort;

pub use aggregation::{DEFAULT_TERMS_FACET_SIZE, FacetRange, FacetRequest, build_aggregations};
pub use compiler::{DEFAULT_PAGE_SIZE, SearchQuery, SearchRequest, SearchRequestCompiler};
pub use filter::{FilterCondition, FilterQueryBuilder, Operator, parse_filters};
pub use fragment::{
    BoolQuery, MatchQuery, MultiMatchQuery, MultiMatchType, QueryFragment, RangeQuery,
    WeightedField,
};
pub use fulltext::{FulltextQueryBuilder, SearchText};
pub use sort::{RELEVANCE_SORT_FIELD, SortClause, SortDirection, SortOrder, build_sort};
