//! [`Transport`] over the official Elasticsearch client.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::request::JsonBody;
use elasticsearch::http::response::Response;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::indices::{
    IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesForcemergeParts,
    IndicesGetAliasParts, IndicesGetMappingParts, IndicesPutSettingsParts, IndicesRefreshParts,
};
use elasticsearch::{BulkParts, Elasticsearch, SearchParts};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::TransportError;

use super::{AliasAction, Transport};

/// Authentication configuration for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientAuth {
    /// Basic username/password authentication.
    Basic {
        /// The username for basic auth.
        username: String,
        /// The password for basic auth.
        password: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// The bearer token.
        token: String,
    },
}

/// Connection configuration of the engine client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Node URLs (e.g., `["http://localhost:9200"]`).
    /// Currently uses the first node (single-node connection pool).
    #[serde(default = "default_nodes")]
    pub nodes: Vec<String>,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<ClientAuth>,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,
}

fn default_nodes() -> Vec<String> {
    vec!["http://localhost:9200".to_string()]
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            request_timeout_ms: default_request_timeout_ms(),
            auth: None,
            disable_certificate_validation: false,
        }
    }
}

/// Engine transport backed by [`Elasticsearch`].
pub struct ElasticsearchTransport {
    client: Elasticsearch,
    config: ClientConfig,
}

impl Debug for ElasticsearchTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ElasticsearchTransport {
    /// Creates a transport with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let client = Self::build_client(&config)?;
        Ok(Self { client, config })
    }

    fn build_client(config: &ClientConfig) -> Result<Elasticsearch, TransportError> {
        let url = config
            .nodes
            .first()
            .cloned()
            .unwrap_or_else(|| "http://localhost:9200".to_string());

        let parsed_url: elasticsearch::http::Url =
            url.parse().map_err(|e| TransportError::Unavailable {
                message: format!("Invalid URL: {}", e),
            })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);

        let mut builder = TransportBuilder::new(conn_pool)
            .timeout(Duration::from_millis(config.request_timeout_ms));

        if config.disable_certificate_validation {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some(ref auth) = config.auth {
            builder = match auth {
                ClientAuth::Basic { username, password } => {
                    builder.auth(Credentials::Basic(username.clone(), password.clone()))
                }
                ClientAuth::Bearer { token } => builder.auth(Credentials::Bearer(token.clone())),
            };
        }

        let transport = builder.build().map_err(|e| TransportError::Unavailable {
            message: format!("Failed to build transport: {}", e),
        })?;

        Ok(Elasticsearch::new(transport))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

fn send_error(operation: &str, e: elasticsearch::Error) -> TransportError {
    TransportError::Internal {
        operation: operation.to_string(),
        message: e.to_string(),
        source: Some(Box::new(e)),
    }
}

/// Fails on non-success statuses, keeping the response body for diagnostics.
async fn ensure_success(operation: &str, response: Response) -> Result<Response, TransportError> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::RequestFailed {
        operation: operation.to_string(),
        status: status.as_u16(),
        body,
    })
}

async fn json_body(operation: &str, response: Response) -> Result<Value, TransportError> {
    let response = ensure_success(operation, response).await?;
    response
        .json::<Value>()
        .await
        .map_err(|e| TransportError::malformed(operation, e.to_string()))
}

#[async_trait]
impl Transport for ElasticsearchTransport {
    async fn search(&self, index: &str, body: Value) -> Result<Value, TransportError> {
        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(body)
            .send()
            .await
            .map_err(|e| send_error("search", e))?;
        json_body("search", response).await
    }

    async fn create_index(&self, name: &str, body: Value) -> Result<(), TransportError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(body)
            .send()
            .await
            .map_err(|e| send_error("create index", e))?;
        ensure_success("create index", response).await?;
        Ok(())
    }

    async fn index_exists(&self, name: &str) -> Result<bool, TransportError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| send_error("index exists", e))?;
        Ok(response.status_code().is_success())
    }

    async fn get_mapping(&self, name: &str) -> Result<Value, TransportError> {
        let response = self
            .client
            .indices()
            .get_mapping(IndicesGetMappingParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| send_error("get mapping", e))?;
        json_body("get mapping", response).await
    }

    async fn put_settings(&self, name: &str, settings: Value) -> Result<(), TransportError> {
        let response = self
            .client
            .indices()
            .put_settings(IndicesPutSettingsParts::Index(&[name]))
            .body(settings)
            .send()
            .await
            .map_err(|e| send_error("put settings", e))?;
        ensure_success("put settings", response).await?;
        Ok(())
    }

    async fn get_alias(&self, alias: &str) -> Result<Vec<String>, TransportError> {
        let response = self
            .client
            .indices()
            .get_alias(IndicesGetAliasParts::Name(&[alias]))
            .send()
            .await
            .map_err(|e| send_error("get alias", e))?;

        if response.status_code().as_u16() == 404 {
            return Ok(Vec::new());
        }
        let body = json_body("get alias", response).await?;
        let indices = body
            .as_object()
            .ok_or_else(|| TransportError::malformed("get alias", "expected an object"))?;
        Ok(indices.keys().cloned().collect())
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), TransportError> {
        let actions: Vec<Value> = actions.iter().map(AliasAction::to_dsl).collect();
        let response = self
            .client
            .indices()
            .update_aliases()
            .body(json!({ "actions": actions }))
            .send()
            .await
            .map_err(|e| send_error("update aliases", e))?;
        ensure_success("update aliases", response).await?;
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| send_error("delete index", e))?;
        ensure_success("delete index", response).await?;
        Ok(())
    }

    async fn force_merge(&self, name: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .indices()
            .forcemerge(IndicesForcemergeParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| send_error("force merge", e))?;
        ensure_success("force merge", response).await?;
        Ok(())
    }

    async fn refresh(&self, name: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| send_error("refresh", e))?;
        ensure_success("refresh", response).await?;
        Ok(())
    }

    async fn bulk(&self, lines: Vec<Value>) -> Result<Value, TransportError> {
        let body: Vec<JsonBody<Value>> = lines.into_iter().map(JsonBody::new).collect();
        let response = self
            .client
            .bulk(BulkParts::None)
            .body(body)
            .send()
            .await
            .map_err(|e| send_error("bulk", e))?;
        json_body("bulk", response).await
    }

    async fn ping(&self) -> Result<bool, TransportError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| TransportError::Unavailable {
                message: e.to_string(),
            })?;
        Ok(response.status_code().is_success())
    }
}
