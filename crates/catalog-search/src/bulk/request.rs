//! Bulk request building.

use std::fmt;

use serde_json::{Map, Value, json};

/// Write action of one bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkAction {
    Index,
    Update,
    Delete,
}

impl BulkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::Index => "index",
            BulkAction::Update => "update",
            BulkAction::Delete => "delete",
        }
    }

    pub(crate) fn from_key(key: &str) -> Option<Self> {
        match key {
            "index" | "create" => Some(BulkAction::Index),
            "update" => Some(BulkAction::Update),
            "delete" => Some(BulkAction::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One document write, addressed by index, optional type and id.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOperation {
    pub action: BulkAction,
    pub index: String,
    /// Mapping type; omitted on the wire when unset.
    pub doc_type: Option<String>,
    pub id: String,
    /// Full document (index) or partial document (update).
    pub body: Option<Value>,
}

impl BulkOperation {
    pub fn index(index: impl Into<String>, id: impl Into<String>, document: Value) -> Self {
        Self::new(BulkAction::Index, index, id, Some(document))
    }

    pub fn update(index: impl Into<String>, id: impl Into<String>, partial: Value) -> Self {
        Self::new(BulkAction::Update, index, id, Some(partial))
    }

    pub fn delete(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(BulkAction::Delete, index, id, None)
    }

    fn new(action: BulkAction, index: impl Into<String>, id: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            action,
            index: index.into(),
            doc_type: None,
            id: id.into(),
            body,
        }
    }

    /// Sets the mapping type, for engines that still use one.
    pub fn with_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    fn header(&self) -> Value {
        let mut meta = Map::new();
        meta.insert("_index".to_string(), json!(self.index));
        if let Some(doc_type) = &self.doc_type {
            meta.insert("_type".to_string(), json!(doc_type));
        }
        meta.insert("_id".to_string(), json!(self.id));
        json!({ self.action.as_str(): meta })
    }

    fn body_line(&self) -> Option<Value> {
        match (self.action, &self.body) {
            (BulkAction::Delete, _) | (_, None) => None,
            (BulkAction::Update, Some(partial)) => Some(json!({ "doc": partial })),
            (BulkAction::Index, Some(document)) => Some(document.clone()),
        }
    }
}

/// An ordered batch of document writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkRequest {
    operations: Vec<BulkOperation>,
}

impl BulkRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: BulkOperation) -> &mut Self {
        self.operations.push(operation);
        self
    }

    /// Adds full documents keyed by id.
    pub fn add_documents<I>(&mut self, index: &str, documents: I) -> &mut Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        for (id, document) in documents {
            self.operations.push(BulkOperation::index(index, id, document));
        }
        self
    }

    /// Adds partial updates keyed by id.
    pub fn update_documents<I>(&mut self, index: &str, partials: I) -> &mut Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        for (id, partial) in partials {
            self.operations.push(BulkOperation::update(index, id, partial));
        }
        self
    }

    /// Adds deletions by id.
    pub fn delete_documents<I, S>(&mut self, index: &str, ids: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.operations.push(BulkOperation::delete(index, id));
        }
        self
    }

    pub fn operations(&self) -> &[BulkOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// The newline-delimited lines: one header per operation, then its body if any.
    pub fn to_lines(&self) -> Vec<Value> {
        let mut lines = Vec::with_capacity(self.operations.len() * 2);
        for operation in &self.operations {
            lines.push(operation.header());
            if let Some(body) = operation.body_line() {
                lines.push(body);
            }
        }
        lines
    }
}
