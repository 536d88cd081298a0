//! Sort orders.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ConfigurationError;
use crate::mapping::{Analyzer, FieldMapping};

/// Pseudo-field sorting by score.
pub const RELEVANCE_SORT_FIELD: &str = "relevance";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Where documents without a value go.
    fn missing(&self) -> &'static str {
        match self {
            SortDirection::Asc => "_last",
            SortDirection::Desc => "_first",
        }
    }
}

/// A requested sort order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Best matches first.
    pub fn relevance() -> Self {
        Self::desc(RELEVANCE_SORT_FIELD)
    }
}

/// A sort order resolved against the field mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum SortClause {
    Score(SortDirection),
    Field {
        property: String,
        direction: SortDirection,
        nested_path: Option<String>,
    },
}

impl SortClause {
    pub fn to_dsl(&self) -> Value {
        match self {
            SortClause::Score(direction) => json!({ "_score": { "order": direction.as_str() } }),
            SortClause::Field {
                property,
                direction,
                nested_path,
            } => {
                let mut body = json!({
                    "order": direction.as_str(),
                    "missing": direction.missing(),
                });
                if let Some(path) = nested_path {
                    body["nested"] = json!({ "path": path });
                }
                json!({ property: body })
            }
        }
    }
}

/// Resolves sort orders into sort clauses.
///
/// No order at all sorts by relevance.
pub fn build_sort(
    mapping: &FieldMapping,
    orders: &[SortOrder],
) -> Result<Vec<SortClause>, ConfigurationError> {
    if orders.is_empty() {
        return Ok(vec![SortClause::Score(SortDirection::Desc)]);
    }

    orders
        .iter()
        .map(|order| {
            if order.field == RELEVANCE_SORT_FIELD {
                return Ok(SortClause::Score(order.direction));
            }

            let field = mapping.field(&order.field)?;
            let property = field
                .is_used_for_sort()
                .then(|| field.mapping_property(Analyzer::Sortable))
                .flatten()
                .ok_or_else(|| ConfigurationError::FieldNotUsable {
                    field: order.field.clone(),
                    purpose: "sorting".to_string(),
                })?;

            Ok(SortClause::Field {
                property,
                direction: order.direction,
                nested_path: field.nested_path().map(str::to_string),
            })
        })
        .collect()
}
