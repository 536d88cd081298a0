//! Field mapping providers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{ConfigCache, MAPPING_TAG};
use crate::error::ConfigurationError;

use super::FieldMapping;

/// Supplies the field mapping of a logical index.
pub trait MappingProvider: Send + Sync {
    /// Returns the mapping for `index_identifier`.
    fn mapping(&self, index_identifier: &str) -> Result<Arc<FieldMapping>, ConfigurationError>;
}

/// Builds field mappings from the host attribute schema.
pub trait MappingSource: Send + Sync {
    /// Builds the mapping for `index_identifier`.
    fn load_mapping(&self, index_identifier: &str) -> Result<FieldMapping, ConfigurationError>;
}

/// A mapping source backed by mappings declared up front.
#[derive(Debug, Default)]
pub struct StaticMappingSource {
    mappings: HashMap<String, FieldMapping>,
}

impl StaticMappingSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the mapping of a logical index.
    pub fn with_mapping(mut self, index_identifier: impl Into<String>, mapping: FieldMapping) -> Self {
        self.mappings.insert(index_identifier.into(), mapping);
        self
    }
}

impl MappingSource for StaticMappingSource {
    fn load_mapping(&self, index_identifier: &str) -> Result<FieldMapping, ConfigurationError> {
        self.mappings
            .get(index_identifier)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownIndex {
                identifier: index_identifier.to_string(),
            })
    }
}

/// Caches mappings built by a [`MappingSource`] until the mapping tag is invalidated.
pub struct CachedMappingProvider<S> {
    source: S,
    cache: Arc<ConfigCache<FieldMapping>>,
}

impl<S: MappingSource> CachedMappingProvider<S> {
    /// Creates a provider with its own cache.
    pub fn new(source: S) -> Self {
        Self::with_cache(source, Arc::new(ConfigCache::new()))
    }

    /// Creates a provider sharing an existing cache.
    pub fn with_cache(source: S, cache: Arc<ConfigCache<FieldMapping>>) -> Self {
        Self { source, cache }
    }

    /// Drops every cached mapping (schema changed).
    pub fn invalidate(&self) {
        self.cache.invalidate_tag(MAPPING_TAG);
    }
}

impl<S: MappingSource> MappingProvider for CachedMappingProvider<S> {
    fn mapping(&self, index_identifier: &str) -> Result<Arc<FieldMapping>, ConfigurationError> {
        self.cache
            .get_or_try_insert_with(index_identifier, MAPPING_TAG, || {
                self.source.load_mapping(index_identifier)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FieldDescriptor, FieldType};

    #[test]
    fn test_cached_provider_returns_shared_mapping() {
        let mapping =
            FieldMapping::new(vec![FieldDescriptor::new("sku", FieldType::Keyword)]).unwrap();
        let provider = CachedMappingProvider::new(
            StaticMappingSource::new().with_mapping("catalog_product", mapping),
        );

        let first = provider.mapping("catalog_product").unwrap();
        let second = provider.mapping("catalog_product").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        provider.invalidate();
        let third = provider.mapping("catalog_product").unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }

    #[test]
    fn test_unknown_index() {
        let provider = CachedMappingProvider::new(StaticMappingSource::new());
        assert!(matches!(
            provider.mapping("catalog_category"),
            Err(ConfigurationError::UnknownIndex { .. })
        ));
    }
}
