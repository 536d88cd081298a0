//! Search execution.

use std::sync::Arc;

use crate::context::SearchContext;
use crate::error::SearchResult;
use crate::query::{SearchQuery, SearchRequest, SearchRequestCompiler};
use crate::response::SearchResponse;
use crate::transport::Transport;

/// Compiles search queries and runs them against the engine.
pub struct SearchEngine {
    compiler: SearchRequestCompiler,
    transport: Arc<dyn Transport>,
}

impl SearchEngine {
    pub fn new(compiler: SearchRequestCompiler, transport: Arc<dyn Transport>) -> Self {
        Self {
            compiler,
            transport,
        }
    }

    pub fn compiler(&self) -> &SearchRequestCompiler {
        &self.compiler
    }

    /// Compiles `query` for `context` without running it.
    pub fn compile(&self, context: &SearchContext, query: &SearchQuery) -> SearchResult<SearchRequest> {
        self.compiler.compile(context, query)
    }

    /// Runs `query` in `context`.
    pub async fn search(&self, context: &SearchContext, query: &SearchQuery) -> SearchResult<SearchResponse> {
        let request = self.compiler.compile(context, query)?;
        let raw = self.transport.search(&request.index, request.to_body()).await?;
        let response = SearchResponse::from_value(&raw)?;

        tracing::debug!(
            context = %context,
            total = response.total,
            hits = response.hits.len(),
            "Search executed"
        );
        Ok(response)
    }

    /// Returns true if the engine answers. Transport failures count as unavailable.
    pub async fn is_available(&self) -> bool {
        match self.transport.ping().await {
            Ok(available) => available,
            Err(e) => {
                tracing::warn!(error = %e, "Search engine is not available");
                false
            }
        }
    }
}
