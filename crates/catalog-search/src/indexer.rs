//! Reindexing jobs.
//!
//! A full reindex builds a brand new physical index next to the live one and
//! swaps the alias only once every batch has been sent. Rejected documents do
//! not stop the job; they are reported in the [`ReindexReport`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::bulk::{BulkExecutor, BulkRequest, BulkResponse, FailureGroup};
use crate::error::SearchResult;
use crate::index::{IndexLifecycleManager, PhysicalIndex};
use crate::transport::Transport;

/// Outcome of a reindex job.
#[derive(Debug, Clone)]
pub struct ReindexReport {
    /// Physical index written to.
    pub index_name: String,
    /// Documents sent.
    pub documents: usize,
    /// Bulk requests sent.
    pub batches: usize,
    pub success: usize,
    pub errors: usize,
    /// Failure groups of every batch, in batch order.
    pub failures: Vec<FailureGroup>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReindexReport {
    fn new(index: &PhysicalIndex) -> Self {
        Self {
            index_name: index.name.clone(),
            documents: 0,
            batches: 0,
            success: 0,
            errors: 0,
            failures: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    fn record(&mut self, documents: usize, response: &BulkResponse) {
        self.documents += documents;
        self.batches += 1;
        self.success += response.count_success();
        self.errors += response.count_errors();
        self.failures.extend(response.aggregate_errors());
    }

    /// Returns true if any document was rejected.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Feeds documents into physical indices.
pub struct Reindexer {
    lifecycle: Arc<IndexLifecycleManager>,
    bulk: BulkExecutor,
}

impl Reindexer {
    pub fn new(lifecycle: Arc<IndexLifecycleManager>, transport: Arc<dyn Transport>) -> Self {
        Self {
            lifecycle,
            bulk: BulkExecutor::new(transport),
        }
    }

    /// Rebuilds `identifier` for `store_code` from `documents` (id, document).
    ///
    /// A transport failure aborts the job before install, leaving the live
    /// alias untouched.
    pub async fn full_reindex<I>(
        &self,
        identifier: &str,
        store_code: &str,
        documents: I,
    ) -> SearchResult<ReindexReport>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let index = self.lifecycle.create_index(identifier, store_code).await?;
        let batch_size = self.lifecycle.config().batch_indexing_size.max(1);
        let mut report = ReindexReport::new(&index);

        let mut batch: Vec<(String, Value)> = Vec::with_capacity(batch_size);
        for document in documents {
            batch.push(document);
            if batch.len() == batch_size {
                self.send_batch(&index, std::mem::take(&mut batch), &mut report)
                    .await?;
            }
        }
        if !batch.is_empty() {
            self.send_batch(&index, batch, &mut report).await?;
        }

        self.lifecycle.install_index(&index).await?;
        report.completed_at = Some(Utc::now());

        tracing::info!(
            index = %report.index_name,
            documents = report.documents,
            batches = report.batches,
            errors = report.errors,
            "Full reindex completed"
        );
        Ok(report)
    }

    /// Applies partial updates to the current index of `identifier`.
    pub async fn update_documents<I>(
        &self,
        identifier: &str,
        store_code: &str,
        partials: I,
    ) -> SearchResult<BulkResponse>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let index = self.lifecycle.get_index(identifier, store_code).await?;
        let mut request = BulkRequest::new();
        request.update_documents(&index.name, partials);
        self.bulk.execute(&request).await
    }

    /// Deletes documents from the current index of `identifier`.
    pub async fn delete_documents<I, S>(
        &self,
        identifier: &str,
        store_code: &str,
        ids: I,
    ) -> SearchResult<BulkResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = self.lifecycle.get_index(identifier, store_code).await?;
        let mut request = BulkRequest::new();
        request.delete_documents(&index.name, ids);
        self.bulk.execute(&request).await
    }

    async fn send_batch(
        &self,
        index: &PhysicalIndex,
        documents: Vec<(String, Value)>,
        report: &mut ReindexReport,
    ) -> SearchResult<()> {
        let count = documents.len();
        let mut request = BulkRequest::new();
        request.add_documents(&index.name, documents);

        let response = self.bulk.execute(&request).await?;
        report.record(count, &response);
        Ok(())
    }
}
