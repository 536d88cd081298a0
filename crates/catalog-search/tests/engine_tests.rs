//! Search execution against the recording transport.

mod common;

use std::sync::Arc;

use serde_json::json;

use catalog_search::SearchEngine;
use catalog_search::query::{FacetRequest, SearchQuery};

use common::*;

fn engine(transport: &Arc<RecordingTransport>) -> SearchEngine {
    SearchEngine::new(compiler(), transport.clone())
}

#[tokio::test]
async fn test_search_targets_the_alias_and_parses_hits() {
    let transport = Arc::new(RecordingTransport::new());
    transport.set_search_response(json!({
        "hits": {
            "total": { "value": 1, "relation": "eq" },
            "max_score": 2.0,
            "hits": [ { "_index": "magento2_default_catalog_product_20250707_093823",
                        "_id": "1", "_score": 2.0, "_source": { "sku": "24-MB01" } } ]
        },
        "aggregations": {
            "color": { "buckets": [ { "key": "blue", "doc_count": 1 } ] }
        }
    }));
    let engine = engine(&transport);

    let query = SearchQuery::new()
        .with_text("backpack")
        .with_facet(FacetRequest::terms("color"));
    let response = engine.search(&quick_search(), &query).await.unwrap();

    assert_eq!(response.total, 1);
    assert_eq!(response.ids(), vec!["1"]);
    assert_eq!(response.facet("color").unwrap()[0].doc_count, 1);

    match &transport.calls()[0] {
        Call::Search { index, body } => {
            assert_eq!(index, "magento2_default_catalog_product");
            assert_eq!(body, &engine.compile(&quick_search(), &query).unwrap().to_body());
        }
        other => panic!("expected a search, got {:?}", other),
    }
}

#[tokio::test]
async fn test_compilation_errors_skip_the_transport() {
    let transport = Arc::new(RecordingTransport::new());
    let engine = engine(&transport);

    let query = SearchQuery::new().with_facet(FacetRequest::terms("weight"));
    assert!(engine.search(&quick_search(), &query).await.is_err());
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_availability() {
    let transport = Arc::new(RecordingTransport::new());
    let engine = engine(&transport);
    assert!(engine.is_available().await);

    transport.set_unavailable();
    assert!(!engine.is_available().await);
}
