//! Catalog search
//!
//! This crate compiles business-level search criteria (free text, structured
//! filters, facets, sort and pagination) plus per-context relevance tuning
//! into search engine requests, and manages the indices those requests run
//! against so that a full reindex never causes a visible outage.
//!
//! # Features
//!
//! - `elasticsearch` (default) - HTTP transport over the official client
//!
//! # Architecture
//!
//! - [`mapping`] - Read-only field schema and the engine mapping it renders
//! - [`relevance`] - Layered relevance configuration per search context and locale
//! - [`spellcheck`] - Spelling classification of search text
//! - [`query`] - Query fragments, their builders and the request compiler
//! - [`index`] - Index naming, settings and the zero-downtime lifecycle
//! - [`bulk`] - Batched document writes with partial failure reporting
//! - [`indexer`] - Full reindex jobs
//! - [`engine`] - Search execution
//! - [`transport`] - The engine boundary
//!
//! # Compiling a search
//!
//! ```
//! use std::sync::Arc;
//!
//! use catalog_search::index::{DEFAULT_INDEX_SUFFIX_PATTERN, IndexNaming};
//! use catalog_search::mapping::{
//!     CachedMappingProvider, FieldDescriptor, FieldMapping, FieldType, StaticMappingSource,
//! };
//! use catalog_search::query::{FilterCondition, Operator, SearchQuery, SearchRequestCompiler};
//! use catalog_search::relevance::{InMemoryOverrideStore, RelevanceConfigResolver, RelevanceSeed};
//! use catalog_search::spellcheck::StopwordSpellchecker;
//! use catalog_search::SearchContext;
//!
//! let mapping = FieldMapping::new(vec![
//!     FieldDescriptor::new("name", FieldType::Text).searchable().with_search_weight(5.0),
//!     FieldDescriptor::new("in_stock", FieldType::Integer).filterable(),
//! ])
//! .unwrap();
//!
//! let compiler = SearchRequestCompiler::new(
//!     Arc::new(RelevanceConfigResolver::new(
//!         Arc::new(InMemoryOverrideStore::new()),
//!         Arc::new(RelevanceSeed::default()),
//!     )),
//!     Arc::new(CachedMappingProvider::new(
//!         StaticMappingSource::new().with_mapping("catalog_product", mapping),
//!     )),
//!     Arc::new(StopwordSpellchecker::english()),
//!     IndexNaming::new("magento2", DEFAULT_INDEX_SUFFIX_PATTERN, ["catalog_product"]).unwrap(),
//! );
//!
//! let context = SearchContext::new("quick_search_container", "default", "en_US", "catalog_product");
//! let query = SearchQuery::new()
//!     .with_text("backpack")
//!     .with_filter(FilterCondition::new("in_stock", Operator::Eq, 1))
//!     .page(2, 12);
//!
//! let request = compiler.compile(&context, &query).unwrap();
//! assert_eq!(request.index, "magento2_default_catalog_product");
//! assert_eq!(request.from, 12);
//! ```

pub mod bulk;
pub mod cache;
pub mod context;
pub mod engine;
pub mod error;
pub mod index;
pub mod indexer;
pub mod mapping;
pub mod query;
pub mod relevance;
pub mod response;
pub mod spellcheck;
pub mod transport;

// Re-export commonly used types at crate root
pub use context::SearchContext;
pub use engine::SearchEngine;
pub use error::{ConfigurationError, LifecycleError, SearchError, SearchResult, TransportError};
pub use indexer::{ReindexReport, Reindexer};
pub use query::{SearchQuery, SearchRequest, SearchRequestCompiler};
pub use response::SearchResponse;
pub use transport::Transport;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
