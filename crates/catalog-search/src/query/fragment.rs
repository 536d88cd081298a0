//! Query fragments: the typed query tree and its DSL serializer.
//!
//! Builders only ever produce [`QueryFragment`] values; the engine DSL is
//! rendered in exactly one place, [`QueryFragment::to_dsl`].

use serde_json::{Map, Value, json};

use crate::relevance::FuzzinessConfig;

/// A field with its relevance weight.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedField {
    pub field: String,
    pub weight: f64,
}

impl WeightedField {
    pub fn new(field: impl Into<String>, weight: f64) -> Self {
        Self {
            field: field.into(),
            weight,
        }
    }

    fn to_dsl(&self) -> String {
        if self.weight == 1.0 {
            self.field.clone()
        } else {
            format!("{}^{}", self.field, self.weight)
        }
    }
}

/// How a multi-field match scores its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultiMatchType {
    #[default]
    BestFields,
    MostFields,
    CrossFields,
    Phrase,
}

impl MultiMatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MultiMatchType::BestFields => "best_fields",
            MultiMatchType::MostFields => "most_fields",
            MultiMatchType::CrossFields => "cross_fields",
            MultiMatchType::Phrase => "phrase",
        }
    }
}

/// Full-text match on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchQuery {
    pub field: String,
    pub query: String,
    pub minimum_should_match: Option<String>,
    pub cutoff_frequency: Option<f64>,
    pub boost: Option<f64>,
}

impl MatchQuery {
    pub fn new(field: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            query: query.into(),
            minimum_should_match: None,
            cutoff_frequency: None,
            boost: None,
        }
    }
}

/// Full-text match across several weighted fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiMatchQuery {
    pub fields: Vec<WeightedField>,
    pub query: String,
    pub match_type: MultiMatchType,
    pub minimum_should_match: Option<String>,
    pub tie_breaker: Option<f64>,
    pub cutoff_frequency: Option<f64>,
    pub fuzziness: Option<FuzzinessConfig>,
    pub boost: Option<f64>,
}

impl MultiMatchQuery {
    pub fn new(fields: Vec<WeightedField>, query: impl Into<String>) -> Self {
        Self {
            fields,
            query: query.into(),
            match_type: MultiMatchType::default(),
            minimum_should_match: None,
            tie_breaker: None,
            cutoff_frequency: None,
            fuzziness: None,
            boost: None,
        }
    }
}

/// Range bounds on one field. At least one bound is set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangeQuery {
    pub field: String,
    pub gt: Option<Value>,
    pub gte: Option<Value>,
    pub lt: Option<Value>,
    pub lte: Option<Value>,
}

/// Boolean combination of fragments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoolQuery {
    pub must: Vec<QueryFragment>,
    pub should: Vec<QueryFragment>,
    pub must_not: Vec<QueryFragment>,
    pub minimum_should_match: Option<String>,
    pub boost: Option<f64>,
}

/// An immutable node of a search query tree.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFragment {
    MatchAll,
    Term { field: String, value: Value },
    Terms { field: String, values: Vec<Value> },
    Match(MatchQuery),
    MultiMatch(MultiMatchQuery),
    Range(RangeQuery),
    Bool(BoolQuery),
    Nested { path: String, query: Box<QueryFragment> },
    Not(Box<QueryFragment>),
    /// Scored `query` restricted by an unscored `filter`.
    Filtered {
        query: Box<QueryFragment>,
        filter: Box<QueryFragment>,
    },
}

impl QueryFragment {
    /// Conjunction of `clauses`. A single clause is returned unwrapped.
    pub fn must(mut clauses: Vec<QueryFragment>) -> QueryFragment {
        if clauses.len() == 1 {
            return clauses.remove(0);
        }
        QueryFragment::Bool(BoolQuery {
            must: clauses,
            ..BoolQuery::default()
        })
    }

    /// Disjunction of `clauses` (at least one must match).
    pub fn should(clauses: Vec<QueryFragment>) -> QueryFragment {
        QueryFragment::Bool(BoolQuery {
            should: clauses,
            minimum_should_match: Some("1".to_string()),
            ..BoolQuery::default()
        })
    }

    pub fn nested(path: impl Into<String>, query: QueryFragment) -> QueryFragment {
        QueryFragment::Nested {
            path: path.into(),
            query: Box::new(query),
        }
    }

    pub fn not(query: QueryFragment) -> QueryFragment {
        QueryFragment::Not(Box::new(query))
    }

    pub fn filtered(query: QueryFragment, filter: QueryFragment) -> QueryFragment {
        QueryFragment::Filtered {
            query: Box::new(query),
            filter: Box::new(filter),
        }
    }

    /// Renders the fragment as engine query DSL.
    pub fn to_dsl(&self) -> Value {
        match self {
            QueryFragment::MatchAll => json!({ "match_all": {} }),
            QueryFragment::Term { field, value } => json!({ "term": { field: value } }),
            QueryFragment::Terms { field, values } => json!({ "terms": { field: values } }),
            QueryFragment::Match(q) => {
                let mut body = Map::new();
                body.insert("query".to_string(), json!(q.query));
                insert_opt(&mut body, "minimum_should_match", &q.minimum_should_match);
                insert_opt(&mut body, "cutoff_frequency", &q.cutoff_frequency);
                insert_opt(&mut body, "boost", &q.boost);
                json!({ "match": { &q.field: body } })
            }
            QueryFragment::MultiMatch(q) => {
                let fields: Vec<String> = q.fields.iter().map(WeightedField::to_dsl).collect();
                let mut body = Map::new();
                body.insert("query".to_string(), json!(q.query));
                body.insert("fields".to_string(), json!(fields));
                body.insert("type".to_string(), json!(q.match_type.as_str()));
                // numeric searchable fields must not reject free text
                body.insert("lenient".to_string(), json!(true));
                insert_opt(&mut body, "minimum_should_match", &q.minimum_should_match);
                insert_opt(&mut body, "tie_breaker", &q.tie_breaker);
                insert_opt(&mut body, "cutoff_frequency", &q.cutoff_frequency);
                if let Some(fuzziness) = &q.fuzziness {
                    body.insert("fuzziness".to_string(), json!(fuzziness.value));
                    body.insert("prefix_length".to_string(), json!(fuzziness.prefix_length));
                    body.insert("max_expansions".to_string(), json!(fuzziness.max_expansion));
                }
                insert_opt(&mut body, "boost", &q.boost);
                json!({ "multi_match": body })
            }
            QueryFragment::Range(q) => {
                let mut bounds = Map::new();
                insert_opt(&mut bounds, "gt", &q.gt);
                insert_opt(&mut bounds, "gte", &q.gte);
                insert_opt(&mut bounds, "lt", &q.lt);
                insert_opt(&mut bounds, "lte", &q.lte);
                json!({ "range": { &q.field: bounds } })
            }
            QueryFragment::Bool(q) => {
                let mut body = Map::new();
                insert_clauses(&mut body, "must", &q.must);
                insert_clauses(&mut body, "should", &q.should);
                insert_clauses(&mut body, "must_not", &q.must_not);
                insert_opt(&mut body, "minimum_should_match", &q.minimum_should_match);
                insert_opt(&mut body, "boost", &q.boost);
                json!({ "bool": body })
            }
            QueryFragment::Nested { path, query } => json!({
                "nested": { "path": path, "query": query.to_dsl() }
            }),
            QueryFragment::Not(inner) => json!({
                "bool": { "must_not": [inner.to_dsl()] }
            }),
            QueryFragment::Filtered { query, filter } => json!({
                "bool": { "must": [query.to_dsl()], "filter": [filter.to_dsl()] }
            }),
        }
    }
}

fn insert_opt<T: serde::Serialize>(body: &mut Map<String, Value>, key: &str, value: &Option<T>) {
    if let Some(value) = value {
        body.insert(key.to_string(), json!(value));
    }
}

fn insert_clauses(body: &mut Map<String, Value>, key: &str, clauses: &[QueryFragment]) {
    if !clauses.is_empty() {
        let rendered: Vec<Value> = clauses.iter().map(QueryFragment::to_dsl).collect();
        body.insert(key.to_string(), Value::Array(rendered));
    }
}
