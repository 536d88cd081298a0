//! Catalog fixtures.

use std::sync::Arc;

use serde_json::{Value, json};

use catalog_search::SearchContext;
use catalog_search::index::{DEFAULT_INDEX_SUFFIX_PATTERN, IndexNaming, IndexSettingsConfig, LogicalIndex};
use catalog_search::mapping::{
    Analyzer, CachedMappingProvider, FieldDescriptor, FieldMapping, FieldType, StaticMappingSource,
};
use catalog_search::query::SearchRequestCompiler;
use catalog_search::relevance::{InMemoryOverrideStore, RelevanceConfigResolver, RelevanceSeed};
use catalog_search::spellcheck::StopwordSpellchecker;

pub const PRODUCT_INDEX: &str = "catalog_product";
pub const CATEGORY_INDEX: &str = "catalog_category";
pub const STORE: &str = "default";

/// The product schema used across the suites.
pub fn product_mapping() -> FieldMapping {
    FieldMapping::new(vec![
        FieldDescriptor::new("sku", FieldType::Keyword)
            .searchable()
            .filterable()
            .with_search_weight(6.0),
        FieldDescriptor::new("name", FieldType::Text)
            .searchable()
            .filterable()
            .used_for_sort()
            .used_in_spellcheck()
            .with_search_weight(5.0),
        FieldDescriptor::new("description", FieldType::Text)
            .searchable()
            .with_default_analyzer(Analyzer::Standard),
        FieldDescriptor::new("color", FieldType::Keyword).filterable(),
        FieldDescriptor::new("in_stock", FieldType::Integer).filterable(),
        FieldDescriptor::nested("price.price", FieldType::Double, "price")
            .unwrap()
            .filterable()
            .used_for_sort(),
        FieldDescriptor::nested("price.customer_group_id", FieldType::Integer, "price")
            .unwrap()
            .filterable(),
    ])
    .unwrap()
}

pub fn category_mapping() -> FieldMapping {
    FieldMapping::new(vec![
        FieldDescriptor::new("name", FieldType::Text)
            .searchable()
            .filterable(),
    ])
    .unwrap()
}

pub fn product_index() -> LogicalIndex {
    LogicalIndex::new(PRODUCT_INDEX, Arc::new(product_mapping()))
}

pub fn category_index() -> LogicalIndex {
    LogicalIndex::new(CATEGORY_INDEX, Arc::new(category_mapping()))
}

pub fn naming() -> IndexNaming {
    IndexNaming::new("magento2", DEFAULT_INDEX_SUFFIX_PATTERN, [PRODUCT_INDEX, CATEGORY_INDEX]).unwrap()
}

/// Settings without the phonetic analysis plugin, which test engines lack.
pub fn settings() -> IndexSettingsConfig {
    IndexSettingsConfig {
        phonetic_analysis: false,
        ..Default::default()
    }
}

pub fn quick_search() -> SearchContext {
    SearchContext::new("quick_search_container", STORE, "en_US", PRODUCT_INDEX)
}

/// A compiler over the product schema, with the given override store.
pub fn compiler_with_store(store: Arc<InMemoryOverrideStore>) -> SearchRequestCompiler {
    let mappings = StaticMappingSource::new()
        .with_mapping(PRODUCT_INDEX, product_mapping())
        .with_mapping(CATEGORY_INDEX, category_mapping());

    SearchRequestCompiler::new(
        Arc::new(RelevanceConfigResolver::new(store, Arc::new(RelevanceSeed::default()))),
        Arc::new(CachedMappingProvider::new(mappings)),
        Arc::new(StopwordSpellchecker::english()),
        naming(),
    )
    .with_phonetic_analysis(settings().phonetic_analysis)
}

pub fn compiler() -> SearchRequestCompiler {
    compiler_with_store(Arc::new(InMemoryOverrideStore::new()))
}

/// `count` product documents keyed by id.
pub fn products(count: usize) -> Vec<(String, Value)> {
    (1..=count)
        .map(|i| {
            (
                i.to_string(),
                json!({
                    "sku": format!("24-MB{:02}", i),
                    "name": format!("Backpack {}", i),
                    "description": "A sturdy backpack for everyday use",
                    "color": if i % 2 == 0 { "black" } else { "blue" },
                    "in_stock": 1,
                    "price": [{ "price": 30.0 + i as f64, "customer_group_id": 0 }]
                }),
            )
        })
        .collect()
}
