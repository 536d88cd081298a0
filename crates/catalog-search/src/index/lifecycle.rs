//! Zero-downtime index lifecycle.
//!
//! Each logical index has one live physical index per store, reached through
//! a stable alias. A rebuild creates a new timestamped physical index next to
//! the live one, fills it, then installs it: install-time settings, one
//! atomic alias swap, and deletion of the indices it replaced.
//!
//! Installation takes no lock. Callers must not install the same logical
//! index for the same store concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{ConfigurationError, LifecycleError, SearchResult};
use crate::transport::{AliasAction, Transport};

use super::naming::IndexNaming;
use super::settings::{IndexSettingsConfig, LogicalIndex};

/// Handle on one physical index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalIndex {
    pub name: String,
    pub alias: String,
    pub identifier: String,
    pub store_code: String,
    /// True until the index has been installed behind its alias.
    pub needs_install: bool,
}

/// Creates, installs and retires physical indices.
pub struct IndexLifecycleManager {
    transport: Arc<dyn Transport>,
    config: IndexSettingsConfig,
    naming: IndexNaming,
    indices: HashMap<String, LogicalIndex>,
    handles: RwLock<HashMap<(String, String), PhysicalIndex>>,
}

impl IndexLifecycleManager {
    /// Creates a manager for the given logical indices.
    pub fn new<I>(
        transport: Arc<dyn Transport>,
        config: IndexSettingsConfig,
        indices: I,
    ) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = LogicalIndex>,
    {
        let indices: HashMap<String, LogicalIndex> = indices
            .into_iter()
            .map(|index| (index.identifier().to_string(), index))
            .collect();
        let naming = IndexNaming::new(
            config.alias_prefix.clone(),
            &config.index_name_suffix,
            indices.keys().cloned(),
        )?;

        Ok(Self {
            transport,
            config,
            naming,
            indices,
            handles: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &IndexSettingsConfig {
        &self.config
    }

    pub fn naming(&self) -> &IndexNaming {
        &self.naming
    }

    /// Looks up a registered logical index.
    pub fn logical_index(&self, identifier: &str) -> Result<&LogicalIndex, ConfigurationError> {
        self.indices
            .get(identifier)
            .ok_or_else(|| ConfigurationError::UnknownIndex {
                identifier: identifier.to_string(),
            })
    }

    /// Creates a new physical index for `identifier` in `store_code`, with
    /// build-time settings. The index is not reachable through the alias
    /// until [`install_index`](Self::install_index).
    pub async fn create_index(&self, identifier: &str, store_code: &str) -> SearchResult<PhysicalIndex> {
        let logical = self.logical_index(identifier)?;
        let name = self.naming.physical_name(store_code, identifier, Utc::now());

        self.transport
            .create_index(&name, logical.create_body(&self.config, store_code))
            .await?;

        let index = PhysicalIndex {
            name,
            alias: self.naming.alias(store_code, identifier),
            identifier: identifier.to_string(),
            store_code: store_code.to_string(),
            needs_install: true,
        };
        tracing::info!(index = %index.name, alias = %index.alias, "Created index");

        self.handles.write().insert(
            (identifier.to_string(), store_code.to_string()),
            index.clone(),
        );
        Ok(index)
    }

    /// Returns the index to write to for `identifier` in `store_code`.
    ///
    /// An index created by this manager wins; otherwise the live index behind
    /// the alias is returned. Fails if neither exists.
    pub async fn get_index(&self, identifier: &str, store_code: &str) -> SearchResult<PhysicalIndex> {
        self.logical_index(identifier)?;

        let key = (identifier.to_string(), store_code.to_string());
        let existing = self.handles.read().get(&key).cloned();
        if let Some(index) = existing {
            return Ok(index);
        }

        let alias = self.naming.alias(store_code, identifier);
        if !self.transport.index_exists(&alias).await? {
            return Err(LifecycleError::IndexNotInstalled {
                identifier: identifier.to_string(),
                store: store_code.to_string(),
            }
            .into());
        }

        let index = PhysicalIndex {
            name: alias.clone(),
            alias,
            identifier: identifier.to_string(),
            store_code: store_code.to_string(),
            needs_install: false,
        };
        self.handles.write().insert(key, index.clone());
        Ok(index)
    }

    /// Puts `index` live behind its alias and deletes the indices it replaces.
    ///
    /// No-op for an index that is already live.
    pub async fn install_index(&self, index: &PhysicalIndex) -> SearchResult<()> {
        if !index.needs_install {
            return Ok(());
        }

        self.transport
            .put_settings(&index.name, self.config.install_settings())
            .await?;
        self.transport.force_merge(&index.name).await?;

        let previous: Vec<String> = self
            .transport
            .get_alias(&index.alias)
            .await?
            .into_iter()
            .filter(|name| name != &index.name)
            .collect();

        let mut actions = vec![AliasAction::Add {
            index: index.name.clone(),
            alias: index.alias.clone(),
        }];
        actions.extend(previous.iter().map(|name| AliasAction::Remove {
            index: name.clone(),
            alias: index.alias.clone(),
        }));
        self.transport.update_aliases(&actions).await?;
        tracing::info!(
            index = %index.name,
            alias = %index.alias,
            replaced = previous.len(),
            "Installed index"
        );

        for name in &previous {
            if self.naming.is_physical(name) {
                self.transport.delete_index(name).await?;
                tracing::info!(index = %name, "Deleted replaced index");
            } else {
                tracing::warn!(index = %name, alias = %index.alias, "Not deleting index that is not a timestamped physical index");
            }
        }

        self.transport.refresh(&index.name).await?;

        let key = (index.identifier.clone(), index.store_code.clone());
        if let Some(handle) = self.handles.write().get_mut(&key) {
            if handle.name == index.name {
                handle.needs_install = false;
            }
        }
        Ok(())
    }

    /// Makes recently written documents searchable.
    pub async fn refresh_index(&self, index: &PhysicalIndex) -> SearchResult<()> {
        self.transport.refresh(&index.name).await?;
        Ok(())
    }

    /// Returns true if an index or alias called `name` exists.
    pub async fn index_exists(&self, name: &str) -> SearchResult<bool> {
        Ok(self.transport.index_exists(name).await?)
    }

    /// Parses `name`, failing unless it is a timestamped physical index.
    pub fn parse_physical_name(&self, name: &str) -> Result<(String, String), LifecycleError> {
        self.naming
            .parse(name)
            .map(|parsed| (parsed.store_code, parsed.identifier))
            .ok_or_else(|| LifecycleError::NotAPhysicalIndex {
                name: name.to_string(),
            })
    }
}
