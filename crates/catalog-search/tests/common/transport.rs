//! In-memory transport that records every call and keeps a tiny model of
//! indices and aliases.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use catalog_search::TransportError;
use catalog_search::transport::{AliasAction, Transport};

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search { index: String, body: Value },
    CreateIndex { name: String, body: Value },
    IndexExists(String),
    GetMapping(String),
    PutSettings { name: String, settings: Value },
    GetAlias(String),
    UpdateAliases(Vec<AliasAction>),
    DeleteIndex(String),
    ForceMerge(String),
    Refresh(String),
    Bulk(Vec<Value>),
    Ping,
}

impl Call {
    /// Short name used by ordering assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            Call::Search { .. } => "search",
            Call::CreateIndex { .. } => "create_index",
            Call::IndexExists(_) => "index_exists",
            Call::GetMapping(_) => "get_mapping",
            Call::PutSettings { .. } => "put_settings",
            Call::GetAlias(_) => "get_alias",
            Call::UpdateAliases(_) => "update_aliases",
            Call::DeleteIndex(_) => "delete_index",
            Call::ForceMerge(_) => "force_merge",
            Call::Refresh(_) => "refresh",
            Call::Bulk(_) => "bulk",
            Call::Ping => "ping",
        }
    }
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    indices: BTreeSet<String>,
    aliases: BTreeMap<String, BTreeSet<String>>,
    bulk_responses: VecDeque<Value>,
    search_response: Option<Value>,
    fail_bulk_after: Option<usize>,
    unavailable: bool,
}

/// Records calls; answers bulk requests with all-success unless a response
/// was queued.
#[derive(Default)]
pub struct RecordingTransport {
    state: Mutex<State>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an existing index bearing `alias`.
    pub fn with_live_index(self, index: &str, alias: &str) -> Self {
        {
            let mut state = self.state.lock();
            state.indices.insert(index.to_string());
            state
                .aliases
                .entry(alias.to_string())
                .or_default()
                .insert(index.to_string());
        }
        self
    }

    /// Queues the raw response of the next bulk call.
    pub fn queue_bulk_response(&self, response: Value) {
        self.state.lock().bulk_responses.push_back(response);
    }

    pub fn set_search_response(&self, response: Value) {
        self.state.lock().search_response = Some(response);
    }

    /// Makes every bulk call after the first `successful` ones fail.
    pub fn fail_bulk_after(&self, successful: usize) {
        self.state.lock().fail_bulk_after = Some(successful);
    }

    /// Makes every call fail as if the engine was down.
    pub fn set_unavailable(&self) {
        self.state.lock().unavailable = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn call_kinds(&self) -> Vec<&'static str> {
        self.state.lock().calls.iter().map(Call::kind).collect()
    }

    pub fn indices(&self) -> Vec<String> {
        self.state.lock().indices.iter().cloned().collect()
    }

    pub fn alias_targets(&self, alias: &str) -> Vec<String> {
        self.state
            .lock()
            .aliases
            .get(alias)
            .map(|targets| targets.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn record(&self, call: Call) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.unavailable {
            return Err(TransportError::Unavailable {
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

/// Answers every header line of a bulk body with a success item.
fn all_success(lines: &[Value]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .filter_map(|line| {
            let (action, meta) = line.as_object()?.iter().next()?;
            if !matches!(action.as_str(), "index" | "update" | "delete") {
                return None;
            }
            let status = if action == "index" { 201 } else { 200 };
            Some(json!({
                action.clone(): {
                    "_index": meta["_index"],
                    "_id": meta["_id"],
                    "status": status,
                }
            }))
        })
        .collect();
    json!({ "took": 1, "errors": false, "items": items })
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn search(&self, index: &str, body: Value) -> Result<Value, TransportError> {
        self.record(Call::Search {
            index: index.to_string(),
            body,
        })?;
        Ok(self
            .state
            .lock()
            .search_response
            .clone()
            .unwrap_or_else(|| json!({ "hits": { "total": { "value": 0 }, "hits": [] } })))
    }

    async fn create_index(&self, name: &str, body: Value) -> Result<(), TransportError> {
        self.record(Call::CreateIndex {
            name: name.to_string(),
            body,
        })?;
        self.state.lock().indices.insert(name.to_string());
        Ok(())
    }

    async fn index_exists(&self, name: &str) -> Result<bool, TransportError> {
        self.record(Call::IndexExists(name.to_string()))?;
        let state = self.state.lock();
        Ok(state.indices.contains(name)
            || state.aliases.get(name).is_some_and(|targets| !targets.is_empty()))
    }

    async fn get_mapping(&self, name: &str) -> Result<Value, TransportError> {
        self.record(Call::GetMapping(name.to_string()))?;
        Ok(json!({ name: { "mappings": {} } }))
    }

    async fn put_settings(&self, name: &str, settings: Value) -> Result<(), TransportError> {
        self.record(Call::PutSettings {
            name: name.to_string(),
            settings,
        })
    }

    async fn get_alias(&self, alias: &str) -> Result<Vec<String>, TransportError> {
        self.record(Call::GetAlias(alias.to_string()))?;
        Ok(self.alias_targets(alias))
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), TransportError> {
        self.record(Call::UpdateAliases(actions.to_vec()))?;
        let mut state = self.state.lock();
        for action in actions {
            match action {
                AliasAction::Add { index, alias } => {
                    state.aliases.entry(alias.clone()).or_default().insert(index.clone());
                }
                AliasAction::Remove { index, alias } => {
                    if let Some(targets) = state.aliases.get_mut(alias) {
                        targets.remove(index);
                    }
                }
            }
        }
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<(), TransportError> {
        self.record(Call::DeleteIndex(name.to_string()))?;
        self.state.lock().indices.remove(name);
        Ok(())
    }

    async fn force_merge(&self, name: &str) -> Result<(), TransportError> {
        self.record(Call::ForceMerge(name.to_string()))
    }

    async fn refresh(&self, name: &str) -> Result<(), TransportError> {
        self.record(Call::Refresh(name.to_string()))
    }

    async fn bulk(&self, lines: Vec<Value>) -> Result<Value, TransportError> {
        self.record(Call::Bulk(lines.clone()))?;
        let mut state = self.state.lock();

        let sent = state
            .calls
            .iter()
            .filter(|call| matches!(call, Call::Bulk(_)))
            .count();
        if state.fail_bulk_after.is_some_and(|limit| sent > limit) {
            return Err(TransportError::RequestFailed {
                operation: "bulk".to_string(),
                status: 503,
                body: "cluster_block_exception".to_string(),
            });
        }

        Ok(state
            .bulk_responses
            .pop_front()
            .unwrap_or_else(|| all_success(&lines)))
    }

    async fn ping(&self) -> Result<bool, TransportError> {
        self.record(Call::Ping)?;
        Ok(true)
    }
}
