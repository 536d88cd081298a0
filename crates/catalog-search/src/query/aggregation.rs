//! Facet requests and their aggregation DSL.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ConfigurationError;
use crate::mapping::{Analyzer, FieldMapping};

/// Number of buckets of a terms facet when none is requested.
pub const DEFAULT_TERMS_FACET_SIZE: usize = 10;

fn default_terms_size() -> usize {
    DEFAULT_TERMS_FACET_SIZE
}

fn default_min_doc_count() -> u64 {
    1
}

/// A keyed range bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetRange {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
}

/// A facet requested alongside the search hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FacetRequest {
    /// Most frequent values.
    Terms {
        name: String,
        field: String,
        #[serde(default = "default_terms_size")]
        size: usize,
    },
    /// Fixed-interval numeric buckets.
    Histogram {
        name: String,
        field: String,
        interval: f64,
        #[serde(default = "default_min_doc_count")]
        min_doc_count: u64,
    },
    /// Explicit numeric ranges.
    Range {
        name: String,
        field: String,
        ranges: Vec<FacetRange>,
    },
}

impl FacetRequest {
    /// A terms facet named after its field.
    pub fn terms(field: impl Into<String>) -> Self {
        let field = field.into();
        FacetRequest::Terms {
            name: field.clone(),
            field,
            size: DEFAULT_TERMS_FACET_SIZE,
        }
    }

    pub fn histogram(field: impl Into<String>, interval: f64) -> Self {
        let field = field.into();
        FacetRequest::Histogram {
            name: field.clone(),
            field,
            interval,
            min_doc_count: default_min_doc_count(),
        }
    }

    pub fn range(field: impl Into<String>, ranges: Vec<FacetRange>) -> Self {
        let field = field.into();
        FacetRequest::Range {
            name: field.clone(),
            field,
            ranges,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FacetRequest::Terms { name, .. }
            | FacetRequest::Histogram { name, .. }
            | FacetRequest::Range { name, .. } => name,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            FacetRequest::Terms { field, .. }
            | FacetRequest::Histogram { field, .. }
            | FacetRequest::Range { field, .. } => field,
        }
    }
}

/// Builds the `aggs` section for `facets`.
///
/// Facets on nested fields are wrapped in a `nested` aggregation carrying the
/// same name, so responses are unwrapped by name alone.
pub fn build_aggregations(
    mapping: &FieldMapping,
    facets: &[FacetRequest],
) -> Result<Map<String, Value>, ConfigurationError> {
    let mut aggregations = Map::new();

    for facet in facets {
        let field = mapping.field(facet.field())?;
        let property = field
            .mapping_property(Analyzer::Untouched)
            .ok_or_else(|| ConfigurationError::FieldNotUsable {
                field: field.name().to_string(),
                purpose: "facets".to_string(),
            })?;

        let aggregation = match facet {
            FacetRequest::Terms { size, .. } => json!({
                "terms": { "field": property, "size": size }
            }),
            FacetRequest::Histogram {
                interval,
                min_doc_count,
                ..
            } => json!({
                "histogram": {
                    "field": property,
                    "interval": interval,
                    "min_doc_count": min_doc_count,
                }
            }),
            FacetRequest::Range { ranges, .. } => json!({
                "range": { "field": property, "keyed": true, "ranges": ranges }
            }),
        };

        let aggregation = match field.nested_path() {
            Some(path) => json!({
                "nested": { "path": path },
                "aggs": { facet.name(): aggregation },
            }),
            None => aggregation,
        };
        aggregations.insert(facet.name().to_string(), aggregation);
    }

    Ok(aggregations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FieldDescriptor, FieldType};

    fn mapping() -> FieldMapping {
        FieldMapping::new(vec![
            FieldDescriptor::new("color", FieldType::Keyword).filterable(),
            FieldDescriptor::new("description", FieldType::Text).searchable(),
            FieldDescriptor::nested("price.price", FieldType::Double, "price")
                .unwrap()
                .filterable(),
        ])
        .unwrap()
    }

    #[test]
    fn test_terms_facet_default_size() {
        let aggs = build_aggregations(&mapping(), &[FacetRequest::terms("color")]).unwrap();
        assert_eq!(aggs["color"], json!({ "terms": { "field": "color", "size": 10 } }));
    }

    #[test]
    fn test_nested_facet_is_wrapped() {
        let aggs =
            build_aggregations(&mapping(), &[FacetRequest::histogram("price.price", 10.0)]).unwrap();
        let price = &aggs["price.price"];
        assert_eq!(price["nested"]["path"], "price");
        assert_eq!(price["aggs"]["price.price"]["histogram"]["interval"], 10.0);
    }

    #[test]
    fn test_range_facet() {
        let facet = FacetRequest::range(
            "price.price",
            vec![
                FacetRange {
                    key: "cheap".to_string(),
                    from: None,
                    to: Some(50.0),
                },
                FacetRange {
                    key: "expensive".to_string(),
                    from: Some(50.0),
                    to: None,
                },
            ],
        );
        let aggs = build_aggregations(&mapping(), &[facet]).unwrap();
        let range = &aggs["price.price"]["aggs"]["price.price"]["range"];
        assert_eq!(range["ranges"][0], json!({ "key": "cheap", "to": 50.0 }));
        assert_eq!(range["keyed"], true);
    }

    #[test]
    fn test_facet_on_pure_text_field_fails() {
        let err = build_aggregations(&mapping(), &[FacetRequest::terms("description")]).unwrap_err();
        assert!(matches!(err, ConfigurationError::FieldNotUsable { .. }));
    }

    #[test]
    fn test_facet_request_from_json() {
        let facet: FacetRequest =
            serde_json::from_value(json!({ "type": "terms", "name": "color", "field": "color" }))
                .unwrap();
        assert_eq!(facet, FacetRequest::terms("color"));
    }
}
