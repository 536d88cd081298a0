//! Index settings and logical index definitions.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::mapping::{FieldMapping, render_mapping};

use super::naming::DEFAULT_INDEX_SUFFIX_PATTERN;

/// Index-level settings shared by every logical index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSettingsConfig {
    /// Alias and index name prefix (default: `"magento2"`).
    /// Aliases are named `{prefix}_{store}_{identifier}`.
    #[serde(default = "default_alias_prefix")]
    pub alias_prefix: String,

    /// Timestamp suffix pattern of physical index names (default: `"{{Ymd}}_{{His}}"`).
    #[serde(default = "default_index_name_suffix")]
    pub index_name_suffix: String,

    /// Number of primary shards per index (default: 1).
    #[serde(default = "default_shards")]
    pub number_of_shards: u32,

    /// Number of replicas once installed (default: 1). Always 0 while building.
    #[serde(default = "default_replicas")]
    pub number_of_replicas: u32,

    /// Refresh interval once installed (default: "1s"). Disabled while building.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,

    /// Maximum result window size (default: 10000).
    #[serde(default = "default_max_result_window")]
    pub max_result_window: u32,

    /// Documents per bulk request during a full reindex (default: 100).
    #[serde(default = "default_batch_indexing_size")]
    pub batch_indexing_size: usize,

    /// Whether the phonetic analyzer is declared (default: true).
    /// Requires the engine's phonetic analysis plugin.
    #[serde(default = "default_phonetic_analysis")]
    pub phonetic_analysis: bool,
}

fn default_alias_prefix() -> String {
    "magento2".to_string()
}

fn default_index_name_suffix() -> String {
    DEFAULT_INDEX_SUFFIX_PATTERN.to_string()
}

fn default_shards() -> u32 {
    1
}

fn default_replicas() -> u32 {
    1
}

fn default_refresh_interval() -> String {
    "1s".to_string()
}

fn default_max_result_window() -> u32 {
    10000
}

fn default_batch_indexing_size() -> usize {
    100
}

fn default_phonetic_analysis() -> bool {
    true
}

impl Default for IndexSettingsConfig {
    fn default() -> Self {
        Self {
            alias_prefix: default_alias_prefix(),
            index_name_suffix: default_index_name_suffix(),
            number_of_shards: default_shards(),
            number_of_replicas: default_replicas(),
            refresh_interval: default_refresh_interval(),
            max_result_window: default_max_result_window(),
            batch_indexing_size: default_batch_indexing_size(),
            phonetic_analysis: default_phonetic_analysis(),
        }
    }
}

impl IndexSettingsConfig {
    /// Settings of a freshly created index: no replicas, no refresh.
    pub fn build_settings(&self) -> Value {
        json!({
            "number_of_shards": self.number_of_shards,
            "number_of_replicas": 0,
            "refresh_interval": "-1",
            "max_result_window": self.max_result_window,
            "analysis": self.analysis(),
        })
    }

    /// Settings applied when the index goes live.
    pub fn install_settings(&self) -> Value {
        json!({
            "index": {
                "number_of_replicas": self.number_of_replicas,
                "refresh_interval": self.refresh_interval,
            }
        })
    }

    /// Analyzers and normalizers referenced by rendered mappings.
    pub fn analysis(&self) -> Value {
        let mut analysis = json!({
            "analyzer": {
                "standard": {
                    "type": "custom",
                    "tokenizer": "standard",
                    "filter": ["lowercase", "asciifolding"]
                },
                "whitespace": {
                    "type": "custom",
                    "tokenizer": "whitespace",
                    "filter": ["lowercase", "asciifolding"]
                },
                "shingle": {
                    "type": "custom",
                    "tokenizer": "whitespace",
                    "filter": ["lowercase", "asciifolding", "shingle"]
                }
            },
            "normalizer": {
                "sortable": {
                    "type": "custom",
                    "filter": ["lowercase", "asciifolding"]
                }
            }
        });

        if self.phonetic_analysis {
            analysis["filter"] = json!({
                "phonetic": { "type": "phonetic", "encoder": "metaphone" }
            });
            analysis["analyzer"]["phonetic"] = json!({
                "type": "custom",
                "tokenizer": "whitespace",
                "filter": ["lowercase", "asciifolding", "phonetic"]
            });
        }
        analysis
    }
}

/// A logical index: one identifier, one field mapping, physical copies per store.
#[derive(Debug, Clone)]
pub struct LogicalIndex {
    identifier: String,
    mapping: Arc<FieldMapping>,
    store_settings: HashMap<String, Map<String, Value>>,
}

impl LogicalIndex {
    pub fn new(identifier: impl Into<String>, mapping: Arc<FieldMapping>) -> Self {
        Self {
            identifier: identifier.into(),
            mapping,
            store_settings: HashMap::new(),
        }
    }

    /// Adds index settings applied only to the physical indices of `store_code`.
    pub fn with_store_settings(mut self, store_code: impl Into<String>, settings: Map<String, Value>) -> Self {
        self.store_settings.insert(store_code.into(), settings);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    /// The create-index body for `store_code`.
    pub fn create_body(&self, config: &IndexSettingsConfig, store_code: &str) -> Value {
        let mut settings = config.build_settings();
        if let (Some(target), Some(extra)) =
            (settings.as_object_mut(), self.store_settings.get(store_code))
        {
            for (key, value) in extra {
                target.insert(key.clone(), value.clone());
            }
        }

        json!({
            "settings": settings,
            "mappings": render_mapping(&self.mapping, config.phonetic_analysis),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FieldDescriptor, FieldType};

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: IndexSettingsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.alias_prefix, "magento2");
        assert_eq!(config.index_name_suffix, "{{Ymd}}_{{His}}");
        assert_eq!(config.batch_indexing_size, 100);
        assert!(config.phonetic_analysis);
    }

    #[test]
    fn test_build_and_install_settings() {
        let config = IndexSettingsConfig {
            number_of_replicas: 2,
            ..IndexSettingsConfig::default()
        };
        let build = config.build_settings();
        assert_eq!(build["number_of_replicas"], 0);
        assert_eq!(build["refresh_interval"], "-1");

        let install = config.install_settings();
        assert_eq!(install["index"]["number_of_replicas"], 2);
        assert_eq!(install["index"]["refresh_interval"], "1s");
    }

    #[test]
    fn test_phonetic_analysis_is_optional() {
        let config = IndexSettingsConfig {
            phonetic_analysis: false,
            ..IndexSettingsConfig::default()
        };
        let analysis = config.analysis();
        assert!(analysis.get("filter").is_none());
        assert!(analysis["analyzer"].get("phonetic").is_none());
        assert!(IndexSettingsConfig::default().analysis()["analyzer"]["phonetic"].is_object());
    }

    #[test]
    fn test_store_settings_are_merged() {
        let mapping = FieldMapping::new(vec![FieldDescriptor::new("sku", FieldType::Keyword)]).unwrap();
        let mut extra = Map::new();
        extra.insert("number_of_shards".to_string(), json!(3));
        let index = LogicalIndex::new("catalog_product", Arc::new(mapping))
            .with_store_settings("fr", extra);

        let config = IndexSettingsConfig::default();
        assert_eq!(index.create_body(&config, "fr")["settings"]["number_of_shards"], 3);
        assert_eq!(index.create_body(&config, "en")["settings"]["number_of_shards"], 1);
        assert_eq!(
            index.create_body(&config, "en")["mappings"]["properties"]["sku"]["type"],
            "keyword"
        );
    }
}
