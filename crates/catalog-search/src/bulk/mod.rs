//! Batched document writes.
//!
//! A bulk request never fails as a whole because some of its documents were
//! rejected: per-item failures come back as data in the [`BulkResponse`] and
//! are logged once per failure group.

mod request;
mod response;

use std::sync::Arc;

use crate::error::SearchResult;
use crate::transport::Transport;

pub use request::{BulkAction, BulkOperation, BulkRequest};
pub use response::{
    BulkItem, BulkItemError, BulkResponse, DEFAULT_DOC_TYPE, FAILURE_SAMPLE_SIZE, FailureGroup,
};

/// Submits bulk requests and reports their per-item outcome.
#[derive(Clone)]
pub struct BulkExecutor {
    transport: Arc<dyn Transport>,
}

impl BulkExecutor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Sends `request` in one call.
    ///
    /// Only transport failures are errors; rejected documents are counted and
    /// grouped in the returned response.
    pub async fn execute(&self, request: &BulkRequest) -> SearchResult<BulkResponse> {
        if request.is_empty() {
            return Ok(BulkResponse::default());
        }

        let raw = self.transport.bulk(request.to_lines()).await?;
        let response = BulkResponse::from_value(&raw)?;

        if response.has_errors() {
            for group in response.aggregate_errors() {
                tracing::error!(
                    index = %group.index,
                    doc_type = %group.doc_type,
                    operation = %group.operation,
                    error_type = %group.error_type,
                    count = group.count,
                    sample_ids = ?group.sample_ids,
                    "Bulk {} operation failed {} times: {}",
                    group.operation,
                    group.count,
                    group.reason
                );
            }
        }

        tracing::debug!(
            operations = request.len(),
            success = response.count_success(),
            errors = response.count_errors(),
            "Bulk request executed"
        );
        Ok(response)
    }
}
