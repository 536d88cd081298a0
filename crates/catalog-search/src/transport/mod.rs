//! The boundary between the crate and the search engine.
//!
//! Everything above this module is engine-agnostic JSON; implementations turn
//! each call into one HTTP request.

#[cfg(feature = "elasticsearch")]
mod elasticsearch;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::TransportError;

#[cfg(feature = "elasticsearch")]
pub use self::elasticsearch::{ClientAuth, ClientConfig, ElasticsearchTransport};

/// One action of an atomic alias update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasAction {
    Add { index: String, alias: String },
    Remove { index: String, alias: String },
}

impl AliasAction {
    pub fn to_dsl(&self) -> Value {
        match self {
            AliasAction::Add { index, alias } => {
                json!({ "add": { "index": index, "alias": alias } })
            }
            AliasAction::Remove { index, alias } => {
                json!({ "remove": { "index": index, "alias": alias } })
            }
        }
    }
}

/// HTTP/JSON search engine operations.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Runs a search against an index or alias.
    async fn search(&self, index: &str, body: Value) -> Result<Value, TransportError>;

    /// Creates an index with the given settings and mappings body.
    async fn create_index(&self, name: &str, body: Value) -> Result<(), TransportError>;

    /// Returns true if an index (or alias) exists.
    async fn index_exists(&self, name: &str) -> Result<bool, TransportError>;

    /// Returns the mapping of an index.
    async fn get_mapping(&self, name: &str) -> Result<Value, TransportError>;

    /// Updates dynamic settings of an index.
    async fn put_settings(&self, name: &str, settings: Value) -> Result<(), TransportError>;

    /// Returns the indices currently bearing `alias`. Empty if the alias does not exist.
    async fn get_alias(&self, alias: &str) -> Result<Vec<String>, TransportError>;

    /// Applies all alias actions in one atomic call.
    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), TransportError>;

    async fn delete_index(&self, name: &str) -> Result<(), TransportError>;

    /// Merges segments after a full build.
    async fn force_merge(&self, name: &str) -> Result<(), TransportError>;

    async fn refresh(&self, name: &str) -> Result<(), TransportError>;

    /// Sends newline-delimited action/body lines; returns the raw bulk response.
    async fn bulk(&self, lines: Vec<Value>) -> Result<Value, TransportError>;

    /// Returns true if the engine answers.
    async fn ping(&self) -> Result<bool, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_actions() {
        let add = AliasAction::Add {
            index: "magento2_default_catalog_product_20250707_093823".to_string(),
            alias: "magento2_default_catalog_product".to_string(),
        };
        assert_eq!(
            add.to_dsl(),
            json!({
                "add": {
                    "index": "magento2_default_catalog_product_20250707_093823",
                    "alias": "magento2_default_catalog_product"
                }
            })
        );
    }
}
