//! Raw sources of relevance configuration layers.
//!
//! Two sources feed every layer: the persisted override store (admin edits)
//! and a static seed document shipped with the deployment. Within a layer the
//! persisted store wins over the seed.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, SearchResult};

use super::config::RawLayer;

/// Scope types of the persisted override store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeType {
    /// Global defaults.
    Default,
    /// One search context, every store.
    Context,
    /// One search context in one store locale.
    ContextStore,
}

/// A resolved configuration scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfigScope {
    Default,
    Context { context: String },
    ContextLocale { context: String, locale: String },
}

impl ConfigScope {
    /// The store scope type for this scope.
    pub fn scope_type(&self) -> ScopeType {
        match self {
            ConfigScope::Default => ScopeType::Default,
            ConfigScope::Context { .. } => ScopeType::Context,
            ConfigScope::ContextLocale { .. } => ScopeType::ContextStore,
        }
    }

    /// The store scope code for this scope.
    pub fn scope_code(&self) -> String {
        match self {
            ConfigScope::Default => "default".to_string(),
            ConfigScope::Context { context } => context.clone(),
            ConfigScope::ContextLocale { context, locale } => format!("{}|{}", context, locale),
        }
    }
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.scope_type(), self.scope_code())
    }
}

/// Persisted key/value overrides scoped by (path, scope type, scope code).
pub trait OverrideStore: Send + Sync {
    /// Returns every `(path, value)` pair stored for the scope.
    fn read_scope(
        &self,
        scope_type: ScopeType,
        scope_code: &str,
    ) -> SearchResult<Vec<(String, String)>>;
}

/// An [`OverrideStore`] kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryOverrideStore {
    values: RwLock<HashMap<(ScopeType, String), BTreeMap<String, String>>>,
}

impl InMemoryOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` at `path` for `scope`.
    pub fn set(&self, scope: &ConfigScope, path: impl Into<String>, value: impl Into<String>) {
        self.values
            .write()
            .entry((scope.scope_type(), scope.scope_code()))
            .or_default()
            .insert(path.into(), value.into());
    }

    /// Removes the value at `path` for `scope`.
    pub fn remove(&self, scope: &ConfigScope, path: &str) -> bool {
        self.values
            .write()
            .get_mut(&(scope.scope_type(), scope.scope_code()))
            .map(|layer| layer.remove(path).is_some())
            .unwrap_or(false)
    }
}

impl OverrideStore for InMemoryOverrideStore {
    fn read_scope(
        &self,
        scope_type: ScopeType,
        scope_code: &str,
    ) -> SearchResult<Vec<(String, String)>> {
        Ok(self
            .values
            .read()
            .get(&(scope_type, scope_code.to_string()))
            .map(|layer| layer.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }
}

/// Seed layers for one search context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSeed {
    /// Context-scoped values.
    #[serde(default)]
    pub values: RawLayer,
    /// Context+locale scoped values, keyed by locale.
    #[serde(default)]
    pub locales: BTreeMap<String, RawLayer>,
}

/// Static relevance seed shipped with the deployment.
///
/// ```json
/// {
///   "default": { "fulltext.tie_breaker": "0.1" },
///   "contexts": {
///     "quick_search_container": {
///       "values": { "fuzziness.enabled": "1" },
///       "locales": { "fr_FR": { "phonetic.enabled": "1" } }
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelevanceSeed {
    #[serde(default)]
    pub default: RawLayer,
    #[serde(default)]
    pub contexts: BTreeMap<String, ContextSeed>,
}

impl RelevanceSeed {
    /// Parses a seed document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::InvalidValue {
            key: "relevance_seed".to_string(),
            value: e.to_string(),
        })
    }

    /// Returns the raw seed layer of `scope`, if any.
    pub fn layer(&self, scope: &ConfigScope) -> Option<&RawLayer> {
        match scope {
            ConfigScope::Default => Some(&self.default),
            ConfigScope::Context { context } => self.contexts.get(context).map(|c| &c.values),
            ConfigScope::ContextLocale { context, locale } => self
                .contexts
                .get(context)
                .and_then(|c| c.locales.get(locale)),
        }
    }
}

/// Loads the static relevance seed.
pub trait SeedSource: Send + Sync {
    fn load_seed(&self) -> SearchResult<RelevanceSeed>;
}

impl SeedSource for RelevanceSeed {
    fn load_seed(&self) -> SearchResult<RelevanceSeed> {
        Ok(self.clone())
    }
}

/// A seed read from a JSON file on every cache miss.
#[derive(Debug, Clone)]
pub struct JsonFileSeed {
    path: PathBuf,
}

impl JsonFileSeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SeedSource for JsonFileSeed {
    fn load_seed(&self) -> SearchResult<RelevanceSeed> {
        let json = std::fs::read_to_string(&self.path).map_err(|e| {
            ConfigurationError::InvalidValue {
                key: "relevance_seed".to_string(),
                value: format!("{}: {}", self.path.display(), e),
            }
        })?;
        Ok(RelevanceSeed::from_json_str(&json)?)
    }
}
