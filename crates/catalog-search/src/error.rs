//! Error types for query compilation and index management.
//!
//! Errors are grouped by category: configuration mistakes (always fatal and
//! never retried), transport failures (surfaced as soon as they happen), and
//! lifecycle ordering bugs. Partial bulk failures are deliberately absent here:
//! they are reported as data through [`crate::bulk::BulkResponse`].

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all catalog search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Invalid field, operator, scope, or configuration value.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The search engine could not be reached or rejected a request.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An index lifecycle step was invoked out of order.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Result alias used throughout the crate.
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors caused by the caller or by the deployed configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// The field is not part of the field mapping.
    #[error("unknown field: {field}")]
    UnknownField { field: String },

    /// The filter operator is not part of the closed operator vocabulary.
    #[error("unknown filter operator '{operator}' on field '{field}'")]
    UnknownOperator { field: String, operator: String },

    /// A filter condition carries no usable operator or value.
    #[error("invalid condition on field '{field}': {message}")]
    InvalidCondition { field: String, message: String },

    /// A nested field was used outside of its nested path, or a plain field
    /// was used inside a nested filter.
    #[error("field '{field}' cannot be used under nested path '{nested_path}'")]
    InvalidNestedPath { field: String, nested_path: String },

    /// A field descriptor violates the nested-path naming invariant.
    #[error("field '{field}' must start with '{nested_path}.' to be nested")]
    InvalidFieldName { field: String, nested_path: String },

    /// The same field name was declared twice in a mapping.
    #[error("duplicate field in mapping: {field}")]
    DuplicateField { field: String },

    /// No logical index is registered under this identifier.
    #[error("unknown index identifier: {identifier}")]
    UnknownIndex { identifier: String },

    /// A configuration value could not be parsed.
    #[error("invalid value '{value}' for configuration key '{key}'")]
    InvalidValue { key: String, value: String },

    /// A layer reader was asked for a scope it does not serve.
    #[error("{reader} reader cannot resolve scope {scope}")]
    ScopeMismatch { reader: String, scope: String },

    /// The field cannot be used for this purpose (sorting, full-text).
    #[error("field '{field}' is not usable for {purpose}")]
    FieldNotUsable { field: String, purpose: String },

    /// The mapping has no field to run a full-text query against.
    #[error("no searchable field in mapping")]
    NoSearchableField,

    /// The index name suffix pattern is malformed.
    #[error("invalid index name pattern '{pattern}': {message}")]
    InvalidNamePattern { pattern: String, message: String },
}

/// Errors raised by the transport layer.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The engine could not be reached at all.
    #[error("search engine unavailable: {message}")]
    Unavailable { message: String },

    /// The engine answered with a non-success status.
    #[error("{operation} failed with status {status}: {body}")]
    RequestFailed {
        operation: String,
        status: u16,
        body: String,
    },

    /// The engine response could not be decoded.
    #[error("malformed response for {operation}: {message}")]
    MalformedResponse { operation: String, message: String },

    /// Any other client-side failure.
    #[error("transport error during {operation}: {message}")]
    Internal {
        operation: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TransportError {
    /// Builds a [`TransportError::MalformedResponse`].
    pub fn malformed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError::MalformedResponse {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Errors signalling an ordering or deployment bug in the index lifecycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    /// The logical index was never created nor installed for this store.
    #[error(
        "index '{identifier}' does not exist yet for store '{store}'; make sure everything is reindexed"
    )]
    IndexNotInstalled { identifier: String, store: String },

    /// The physical index name does not follow the naming convention.
    #[error("'{name}' is not a physical index name")]
    NotAPhysicalIndex { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_names_offender() {
        let err = ConfigurationError::UnknownOperator {
            field: "price".to_string(),
            operator: "between".to_string(),
        };
        assert!(err.to_string().contains("between"));
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn test_search_error_from_configuration() {
        let err: SearchError = ConfigurationError::UnknownField {
            field: "color".to_string(),
        }
        .into();
        assert!(matches!(err, SearchError::Configuration(_)));
        assert_eq!(err.to_string(), "unknown field: color");
    }

    #[test]
    fn test_lifecycle_error_display() {
        let err = LifecycleError::IndexNotInstalled {
            identifier: "catalog_product".to_string(),
            store: "default".to_string(),
        };
        assert!(err.to_string().contains("catalog_product"));
        assert!(err.to_string().contains("reindexed"));
    }
}
