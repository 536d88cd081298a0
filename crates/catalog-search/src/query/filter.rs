//! Structured filter conditions and their query fragments.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::ConfigurationError;
use crate::mapping::{Analyzer, FieldDescriptor, FieldMapping, FilterLogicalOperator};

use super::fragment::{BoolQuery, MatchQuery, QueryFragment, RangeQuery};

/// Minimum should match of text filter conditions.
const TEXT_FILTER_MINIMUM_SHOULD_MATCH: &str = "100%";

/// Closed set of filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    In,
    Nin,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Match,
    Fulltext,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::In => "in",
            Operator::Nin => "nin",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Like => "like",
            Operator::Match => "match",
            Operator::Fulltext => "fulltext",
        }
    }

    fn is_negated(&self) -> bool {
        matches!(self, Operator::Neq | Operator::Nin)
    }

    fn is_range(&self) -> bool {
        matches!(self, Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte)
    }

    fn is_text(&self) -> bool {
        matches!(self, Operator::Like | Operator::Match | Operator::Fulltext)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Operator::Eq),
            "neq" => Ok(Operator::Neq),
            "in" => Ok(Operator::In),
            "nin" => Ok(Operator::Nin),
            "gt" => Ok(Operator::Gt),
            "gte" => Ok(Operator::Gte),
            "lt" => Ok(Operator::Lt),
            "lte" => Ok(Operator::Lte),
            "like" => Ok(Operator::Like),
            "match" => Ok(Operator::Match),
            "fulltext" => Ok(Operator::Fulltext),
            _ => Err(()),
        }
    }
}

/// A condition on one field: one or more `(operator, value)` clauses, all of
/// which must hold.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub field: String,
    pub clauses: Vec<(Operator, Value)>,
}

impl FilterCondition {
    /// A condition with a single clause.
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            clauses: vec![(operator, value.into())],
        }
    }

    /// Adds another clause on the same field.
    pub fn and(mut self, operator: Operator, value: impl Into<Value>) -> Self {
        self.clauses.push((operator, value.into()));
        self
    }

    /// Parses the JSON condition of `field`.
    ///
    /// An object maps operators to values (`{"gte": 10, "lt": 50}`); a bare
    /// scalar or list is an implicit `in`.
    pub fn from_json(field: impl Into<String>, condition: &Value) -> Result<Self, ConfigurationError> {
        let field = field.into();
        let clauses = match condition {
            Value::Object(operators) if operators.is_empty() => {
                return Err(ConfigurationError::InvalidCondition {
                    field,
                    message: "empty operator object".to_string(),
                });
            }
            Value::Object(operators) => operators
                .iter()
                .map(|(key, value)| {
                    key.parse::<Operator>()
                        .map(|op| (op, value.clone()))
                        .map_err(|_| ConfigurationError::UnknownOperator {
                            field: field.clone(),
                            operator: key.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => vec![(Operator::In, other.clone())],
        };
        Ok(Self { field, clauses })
    }
}

/// Parses a `{field: condition}` JSON object into ordered filter conditions.
pub fn parse_filters(filters: &Map<String, Value>) -> Result<Vec<FilterCondition>, ConfigurationError> {
    filters
        .iter()
        .map(|(field, condition)| FilterCondition::from_json(field.as_str(), condition))
        .collect()
}

/// Builds filter fragments validated against the field mapping.
pub struct FilterQueryBuilder<'a> {
    mapping: &'a FieldMapping,
}

impl<'a> FilterQueryBuilder<'a> {
    pub fn new(mapping: &'a FieldMapping) -> Self {
        Self { mapping }
    }

    /// Builds one fragment for all `filters`.
    ///
    /// `nested_path` is the nested document the fragment will run in, if any.
    /// Nested fields are wrapped in their own `Nested` fragment only when there
    /// is no such ambient path. An empty filter list matches everything.
    pub fn build(
        &self,
        filters: &[FilterCondition],
        nested_path: Option<&str>,
    ) -> Result<QueryFragment, ConfigurationError> {
        if filters.is_empty() {
            return Ok(QueryFragment::MatchAll);
        }
        let fragments = filters
            .iter()
            .map(|condition| self.build_condition(condition, nested_path))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(QueryFragment::must(fragments))
    }

    fn build_condition(
        &self,
        condition: &FilterCondition,
        nested_path: Option<&str>,
    ) -> Result<QueryFragment, ConfigurationError> {
        let field = self.mapping.field(&condition.field)?;

        match (field.nested_path(), nested_path) {
            (Some(own), Some(ambient)) if own != ambient => {
                return Err(ConfigurationError::InvalidNestedPath {
                    field: field.name().to_string(),
                    nested_path: ambient.to_string(),
                });
            }
            (None, Some(ambient)) => {
                return Err(ConfigurationError::InvalidNestedPath {
                    field: field.name().to_string(),
                    nested_path: ambient.to_string(),
                });
            }
            _ => {}
        }

        if condition.clauses.is_empty() {
            return Err(invalid(field, "no operator"));
        }

        let mut fragments = Vec::new();
        let mut range = RangeQuery {
            field: field.name().to_string(),
            ..RangeQuery::default()
        };
        let mut has_range = false;

        for (operator, value) in &condition.clauses {
            if operator.is_range() {
                let bound = scalar(field, value)?;
                let slot = match operator {
                    Operator::Gt => &mut range.gt,
                    Operator::Gte => &mut range.gte,
                    Operator::Lt => &mut range.lt,
                    _ => &mut range.lte,
                };
                *slot = Some(bound);
                has_range = true;
            } else if operator.is_text() {
                fragments.push(text_fragment(field, *operator, value)?);
            } else {
                let fragment = equality_fragment(field, value)?;
                fragments.push(if operator.is_negated() {
                    QueryFragment::not(fragment)
                } else {
                    fragment
                });
            }
        }
        if has_range {
            fragments.push(QueryFragment::Range(range));
        }

        let fragment = QueryFragment::must(fragments);
        Ok(match (field.nested_path(), nested_path) {
            (Some(path), None) => QueryFragment::nested(path, fragment),
            _ => fragment,
        })
    }
}

/// Equality against one or several values, honouring the field combination policy.
fn equality_fragment(field: &FieldDescriptor, value: &Value) -> Result<QueryFragment, ConfigurationError> {
    let values: Vec<Value> = match value {
        Value::Array(values) => values.clone(),
        other => vec![other.clone()],
    };
    if values.is_empty() {
        return Err(invalid(field, "empty value list"));
    }
    for value in &values {
        scalar(field, value)?;
    }

    match field.mapping_property(Analyzer::Untouched) {
        Some(property) => Ok(match field.filter_logical_operator() {
            FilterLogicalOperator::Or => QueryFragment::Terms {
                field: property,
                values,
            },
            FilterLogicalOperator::And => combine(
                field,
                values
                    .into_iter()
                    .map(|value| QueryFragment::Term {
                        field: property.clone(),
                        value,
                    })
                    .collect(),
            ),
        }),
        // no exact value indexed: match the analyzed text instead
        None => {
            let property = field.default_search_property();
            Ok(combine(
                field,
                values
                    .iter()
                    .map(|value| text_match(&property, value_to_text(value)))
                    .collect(),
            ))
        }
    }
}

/// Combines per-value clauses with the field's logical operator.
fn combine(field: &FieldDescriptor, mut clauses: Vec<QueryFragment>) -> QueryFragment {
    if clauses.len() == 1 {
        return clauses.remove(0);
    }
    match field.filter_logical_operator() {
        FilterLogicalOperator::And => QueryFragment::must(clauses),
        FilterLogicalOperator::Or => QueryFragment::Bool(BoolQuery {
            should: clauses,
            minimum_should_match: Some("1".to_string()),
            ..BoolQuery::default()
        }),
    }
}

fn text_fragment(
    field: &FieldDescriptor,
    operator: Operator,
    value: &Value,
) -> Result<QueryFragment, ConfigurationError> {
    let text = value_to_text(&scalar(field, value)?);
    let text = match operator {
        Operator::Like => text.trim_matches('%').to_string(),
        _ => text,
    };
    Ok(text_match(&field.default_search_property(), text))
}

fn text_match(property: &str, text: String) -> QueryFragment {
    let mut query = MatchQuery::new(property, text);
    query.minimum_should_match = Some(TEXT_FILTER_MINIMUM_SHOULD_MATCH.to_string());
    QueryFragment::Match(query)
}

fn scalar(field: &FieldDescriptor, value: &Value) -> Result<Value, ConfigurationError> {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(value.clone()),
        Value::Null => Err(invalid(field, "null value")),
        _ => Err(invalid(field, "expected a scalar value")),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn invalid(field: &FieldDescriptor, message: &str) -> ConfigurationError {
    ConfigurationError::InvalidCondition {
        field: field.name().to_string(),
        message: message.to_string(),
    }
}
