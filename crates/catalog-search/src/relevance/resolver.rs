//! Layered relevance configuration resolution.

use std::sync::Arc;

use crate::cache::{ConfigCache, RELEVANCE_TAG};
use crate::error::{ConfigurationError, SearchResult};

use super::config::{RelevanceConfig, RelevanceOverrides};
use super::store::{ConfigScope, OverrideStore, RelevanceSeed, SeedSource};

const SEED_CACHE_KEY: &str = "relevance_seed";

/// Reads one raw configuration layer.
///
/// The default reader only serves the default scope; asking it for anything
/// else is a wiring bug and fails with [`ConfigurationError::ScopeMismatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerReader {
    Default,
    Scoped,
}

impl LayerReader {
    /// Reads the overrides of `scope`. Persisted values win over seeded ones.
    pub fn read(
        &self,
        store: &dyn OverrideStore,
        seed: &RelevanceSeed,
        scope: &ConfigScope,
    ) -> SearchResult<RelevanceOverrides> {
        let serves = match self {
            LayerReader::Default => matches!(scope, ConfigScope::Default),
            LayerReader::Scoped => !matches!(scope, ConfigScope::Default),
        };
        if !serves {
            return Err(ConfigurationError::ScopeMismatch {
                reader: format!("{:?}", self).to_lowercase(),
                scope: scope.to_string(),
            }
            .into());
        }

        let seeded = match seed.layer(scope) {
            Some(layer) => layer.to_overrides()?,
            None => RelevanceOverrides::default(),
        };
        let entries = store.read_scope(scope.scope_type(), &scope.scope_code())?;
        let stored =
            RelevanceOverrides::from_entries(entries.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;

        Ok(seeded.merged_with(&stored))
    }
}

/// Resolves the [`RelevanceConfig`] of a (search context, locale) pair.
///
/// Layers, least to most specific: shipped defaults plus the default scope,
/// the context scope, then the context+locale scope. Results are cached per
/// pair until [`RelevanceConfigResolver::invalidate`] is called, so edits in
/// the override store are invisible until then.
pub struct RelevanceConfigResolver {
    store: Arc<dyn OverrideStore>,
    seed_source: Arc<dyn SeedSource>,
    configs: ConfigCache<RelevanceConfig>,
    seed: ConfigCache<RelevanceSeed>,
}

impl RelevanceConfigResolver {
    pub fn new(store: Arc<dyn OverrideStore>, seed_source: Arc<dyn SeedSource>) -> Self {
        Self {
            store,
            seed_source,
            configs: ConfigCache::new(),
            seed: ConfigCache::new(),
        }
    }

    /// Resolves the configuration for `context` in `locale`.
    pub fn resolve(&self, context: &str, locale: &str) -> SearchResult<Arc<RelevanceConfig>> {
        let key = format!("{}|{}", context, locale);
        self.configs
            .get_or_try_insert_with(&key, RELEVANCE_TAG, || self.load(context, locale))
    }

    /// Drops every cached configuration and the cached seed.
    pub fn invalidate(&self) {
        self.configs.invalidate_tag(RELEVANCE_TAG);
        self.seed.invalidate_tag(RELEVANCE_TAG);
    }

    fn load(&self, context: &str, locale: &str) -> SearchResult<RelevanceConfig> {
        let seed = self.seed()?;
        let store = self.store.as_ref();

        let default_layer = LayerReader::Default.read(store, &seed, &ConfigScope::Default)?;
        let context_layer = LayerReader::Scoped.read(
            store,
            &seed,
            &ConfigScope::Context {
                context: context.to_string(),
            },
        )?;
        let locale_layer = LayerReader::Scoped.read(
            store,
            &seed,
            &ConfigScope::ContextLocale {
                context: context.to_string(),
                locale: locale.to_string(),
            },
        )?;

        let merged = RelevanceOverrides::shipped_defaults()
            .merged_with(&default_layer)
            .merged_with(&context_layer)
            .merged_with(&locale_layer);

        tracing::debug!(context, locale, "Resolved relevance configuration");
        Ok(RelevanceConfig::from_overrides(&merged))
    }

    fn seed(&self) -> SearchResult<Arc<RelevanceSeed>> {
        self.seed
            .get_or_try_insert_with(SEED_CACHE_KEY, RELEVANCE_TAG, || {
                self.seed_source.load_seed()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use crate::relevance::store::InMemoryOverrideStore;

    fn context_scope() -> ConfigScope {
        ConfigScope::Context {
            context: "quick_search".to_string(),
        }
    }

    fn locale_scope() -> ConfigScope {
        ConfigScope::ContextLocale {
            context: "quick_search".to_string(),
            locale: "fr_FR".to_string(),
        }
    }

    fn resolver(store: Arc<InMemoryOverrideStore>) -> RelevanceConfigResolver {
        RelevanceConfigResolver::new(store, Arc::new(RelevanceSeed::default()))
    }

    #[test]
    fn test_three_layer_merge() {
        let store = Arc::new(InMemoryOverrideStore::new());
        store.set(&ConfigScope::Default, "fulltext.minimum_should_match", "90%");
        store.set(&ConfigScope::Default, "fulltext.tie_breaker", "0.1");
        store.set(&ConfigScope::Default, "cutoff_frequency.value", "0.1");
        store.set(&context_scope(), "fulltext.tie_breaker", "0.2");
        store.set(&context_scope(), "cutoff_frequency.value", "0.2");
        store.set(&locale_scope(), "cutoff_frequency.value", "0.3");

        let config = resolver(store).resolve("quick_search", "fr_FR").unwrap();
        assert_eq!(config.minimum_should_match, "90%");
        assert_eq!(config.tie_breaker, 0.2);
        assert_eq!(config.cutoff_frequency, 0.3);
    }

    #[test]
    fn test_unset_layers_fall_back_to_shipped_defaults() {
        let config = resolver(Arc::new(InMemoryOverrideStore::new()))
            .resolve("catalog_view", "en_US")
            .unwrap();
        assert_eq!(*config, RelevanceConfig::default());
    }

    #[test]
    fn test_store_wins_over_seed() {
        let seed = RelevanceSeed::from_json_str(
            r#"{
                "default": { "fulltext.tie_breaker": "0.4" },
                "contexts": {
                    "quick_search": {
                        "values": { "fuzziness.enabled": "1", "fulltext.minimum_should_match": "80%" }
                    }
                }
            }"#,
        )
        .unwrap();
        let store = Arc::new(InMemoryOverrideStore::new());
        store.set(&context_scope(), "fulltext.minimum_should_match", "60%");

        let resolver = RelevanceConfigResolver::new(store, Arc::new(seed));
        let config = resolver.resolve("quick_search", "fr_FR").unwrap();
        assert_eq!(config.tie_breaker, 0.4);
        assert_eq!(config.minimum_should_match, "60%");
        assert!(config.is_fuzziness_enabled());
    }

    #[test]
    fn test_resolution_is_cached_until_invalidated() {
        let store = Arc::new(InMemoryOverrideStore::new());
        let resolver = resolver(Arc::clone(&store));

        let first = resolver.resolve("quick_search", "fr_FR").unwrap();
        let second = resolver.resolve("quick_search", "fr_FR").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        store.set(&locale_scope(), "fulltext.minimum_should_match", "50%");
        let stale = resolver.resolve("quick_search", "fr_FR").unwrap();
        assert_eq!(stale.minimum_should_match, "100%");

        resolver.invalidate();
        let fresh = resolver.resolve("quick_search", "fr_FR").unwrap();
        assert_eq!(fresh.minimum_should_match, "50%");
    }

    #[test]
    fn test_default_reader_rejects_scoped_scope() {
        let store = InMemoryOverrideStore::new();
        let err = LayerReader::Default
            .read(&store, &RelevanceSeed::default(), &context_scope())
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::Configuration(ConfigurationError::ScopeMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_stored_value_is_an_error() {
        let store = Arc::new(InMemoryOverrideStore::new());
        store.set(&context_scope(), "fuzziness.value", "seven");
        assert!(resolver(store).resolve("quick_search", "fr_FR").is_err());
    }
}
