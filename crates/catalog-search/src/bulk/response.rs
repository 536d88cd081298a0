//! Bulk response parsing and failure aggregation.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::TransportError;

use super::request::BulkAction;

/// Type reported for items of typeless engines.
pub const DEFAULT_DOC_TYPE: &str = "_doc";

/// Ids sampled per failure group.
pub const FAILURE_SAMPLE_SIZE: usize = 10;

/// Error attached to a failed bulk item.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemError {
    pub error_type: String,
    pub reason: String,
}

/// Outcome of one bulk operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItem {
    pub action: BulkAction,
    pub index: String,
    pub doc_type: String,
    pub id: String,
    pub status: u16,
    pub error: Option<BulkItemError>,
}

impl BulkItem {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status < 300
    }
}

/// Failed items sharing index, type, operation and reason.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureGroup {
    pub index: String,
    pub doc_type: String,
    pub operation: BulkAction,
    pub error_type: String,
    pub reason: String,
    pub count: usize,
    /// At most [`FAILURE_SAMPLE_SIZE`] ids, in response order.
    pub sample_ids: Vec<String>,
}

/// Per-item outcomes of a bulk request, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkResponse {
    items: Vec<BulkItem>,
}

impl BulkResponse {
    /// Parses a raw bulk response body.
    pub fn from_value(body: &Value) -> Result<Self, TransportError> {
        let items = body
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| TransportError::malformed("bulk", "missing items"))?;

        let items = items
            .iter()
            .map(parse_item)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { items })
    }

    pub fn items(&self) -> &[BulkItem] {
        &self.items
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|item| !item.is_success())
    }

    pub fn count_success(&self) -> usize {
        self.items.iter().filter(|item| item.is_success()).count()
    }

    pub fn count_errors(&self) -> usize {
        self.items.len() - self.count_success()
    }

    /// Groups failed items by (index, type, operation, reason), in order of
    /// first occurrence.
    pub fn aggregate_errors(&self) -> Vec<FailureGroup> {
        let mut groups: Vec<FailureGroup> = Vec::new();
        let mut positions: HashMap<(&str, &str, BulkAction, &str), usize> = HashMap::new();

        for item in self.items.iter().filter(|item| !item.is_success()) {
            let (error_type, reason) = match &item.error {
                Some(error) => (error.error_type.as_str(), error.reason.as_str()),
                None => ("unknown", "unknown"),
            };
            let key = (item.index.as_str(), item.doc_type.as_str(), item.action, reason);

            let position = *positions.entry(key).or_insert_with(|| {
                groups.push(FailureGroup {
                    index: item.index.clone(),
                    doc_type: item.doc_type.clone(),
                    operation: item.action,
                    error_type: error_type.to_string(),
                    reason: reason.to_string(),
                    count: 0,
                    sample_ids: Vec::new(),
                });
                groups.len() - 1
            });

            let group = &mut groups[position];
            group.count += 1;
            if group.sample_ids.len() < FAILURE_SAMPLE_SIZE {
                group.sample_ids.push(item.id.clone());
            }
        }

        groups
    }
}

fn parse_item(entry: &Value) -> Result<BulkItem, TransportError> {
    let (key, item) = entry
        .as_object()
        .and_then(|object| object.iter().next())
        .ok_or_else(|| TransportError::malformed("bulk", "empty item"))?;
    let action = BulkAction::from_key(key)
        .ok_or_else(|| TransportError::malformed("bulk", format!("unknown action '{}'", key)))?;

    let text = |field: &str| item.get(field).and_then(Value::as_str).map(str::to_string);

    let error = item.get("error").map(|error| BulkItemError {
        error_type: error
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        reason: error
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
    });

    Ok(BulkItem {
        action,
        index: text("_index").unwrap_or_default(),
        doc_type: text("_type").unwrap_or_else(|| DEFAULT_DOC_TYPE.to_string()),
        id: text("_id").unwrap_or_default(),
        status: item
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|status| u16::try_from(status).ok())
            .unwrap_or(0),
        error,
    })
}
