//! Search response parsing.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::TransportError;

/// One matching document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub index: String,
    pub score: Option<f64>,
    pub source: Value,
}

/// One facet bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetBucket {
    /// Term, histogram key or range key.
    pub key: Value,
    pub doc_count: u64,
}

/// Hits, total and facet buckets of one search.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResponse {
    pub total: u64,
    pub max_score: Option<f64>,
    pub hits: Vec<SearchHit>,
    /// Buckets by facet name.
    pub facets: BTreeMap<String, Vec<FacetBucket>>,
}

impl SearchResponse {
    /// Parses a raw search response body.
    pub fn from_value(body: &Value) -> Result<Self, TransportError> {
        let hits = body
            .get("hits")
            .ok_or_else(|| TransportError::malformed("search", "missing hits"))?;

        // Older engines report the total as a bare number.
        let total = match hits.get("total") {
            Some(Value::Number(total)) => total.as_u64(),
            Some(total) => total.get("value").and_then(Value::as_u64),
            None => None,
        }
        .unwrap_or(0);

        let documents = hits
            .get("hits")
            .and_then(Value::as_array)
            .map(|documents| documents.iter().map(parse_hit).collect())
            .unwrap_or_default();

        let facets = body
            .get("aggregations")
            .and_then(Value::as_object)
            .map(|aggregations| {
                aggregations
                    .iter()
                    .map(|(name, aggregation)| (name.clone(), parse_buckets(name, aggregation)))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            total,
            max_score: hits.get("max_score").and_then(Value::as_f64),
            hits: documents,
            facets,
        })
    }

    pub fn facet(&self, name: &str) -> Option<&[FacetBucket]> {
        self.facets.get(name).map(Vec::as_slice)
    }

    /// Ids of the hits, in rank order.
    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|hit| hit.id.as_str()).collect()
    }
}

fn parse_hit(hit: &Value) -> SearchHit {
    let text = |field: &str| {
        hit.get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    SearchHit {
        id: text("_id"),
        index: text("_index"),
        score: hit.get("_score").and_then(Value::as_f64),
        source: hit.get("_source").cloned().unwrap_or(Value::Null),
    }
}

/// Buckets of aggregation `name`, looking through `nested` wrappers that
/// carry an inner aggregation of the same name.
fn parse_buckets(name: &str, aggregation: &Value) -> Vec<FacetBucket> {
    match aggregation.get("buckets") {
        Some(Value::Array(buckets)) => buckets.iter().map(array_bucket).collect(),
        Some(Value::Object(buckets)) => keyed_buckets(buckets),
        _ => aggregation
            .get(name)
            .map(|inner| parse_buckets(name, inner))
            .unwrap_or_default(),
    }
}

fn array_bucket(bucket: &Value) -> FacetBucket {
    FacetBucket {
        key: bucket.get("key").cloned().unwrap_or(Value::Null),
        doc_count: doc_count(bucket),
    }
}

fn keyed_buckets(buckets: &Map<String, Value>) -> Vec<FacetBucket> {
    buckets
        .iter()
        .map(|(key, bucket)| FacetBucket {
            key: Value::String(key.clone()),
            doc_count: doc_count(bucket),
        })
        .collect()
}

fn doc_count(bucket: &Value) -> u64 {
    bucket.get("doc_count").and_then(Value::as_u64).unwrap_or(0)
}
