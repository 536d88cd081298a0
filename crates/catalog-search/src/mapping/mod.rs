//! Field mapping: the read-only schema of indexed fields.
//!
//! A [`FieldMapping`] is built once per schema version and shared read-only by
//! every query builder. Each [`FieldDescriptor`] knows which sub-field serves
//! which analyzer, so builders never compose property paths by hand.
//!
//! # Property paths
//!
//! Text fields that are filterable keep their untouched value in the main
//! (keyword) property and expose analyzed variants as sub-fields:
//!
//! ```text
//! name            keyword, untouched
//! name.standard   text, standard analyzer
//! name.whitespace text, whitespace analyzer (spellcheck/fuzzy)
//! name.phonetic   text, phonetic analyzer
//! name.sortable   keyword, lowercase normalizer
//! ```
//!
//! Pure text fields (not filterable) have no untouched value: their main
//! property is analyzed with the default analyzer.

mod provider;
mod schema;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

pub use provider::{CachedMappingProvider, MappingProvider, MappingSource, StaticMappingSource};
pub use schema::render_mapping;

/// Semantic type of an indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Analyzed text.
    Text,
    /// Exact-value string.
    Keyword,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Long,
    /// Double precision number.
    Double,
    /// Boolean flag.
    Boolean,
    /// Date or datetime.
    Date,
}

impl FieldType {
    /// Returns the engine mapping type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Keyword => "keyword",
            FieldType::Integer => "integer",
            FieldType::Long => "long",
            FieldType::Double => "double",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
        }
    }

    /// Returns true for analyzed text.
    pub fn is_text(&self) -> bool {
        matches!(self, FieldType::Text)
    }
}

/// Analyzer flavours exposed as sub-fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Analyzer {
    /// The raw, untouched value.
    Untouched,
    /// Standard tokenization and lowercasing.
    Standard,
    /// Whitespace tokenization, used for spellcheck and fuzzy matching.
    Whitespace,
    /// Word shingles, used for phrase matching.
    Shingle,
    /// Phonetic encoding.
    Phonetic,
    /// Lowercased keyword used for sorting.
    Sortable,
}

impl Analyzer {
    /// Returns the analyzer name, also used as the sub-field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Analyzer::Untouched => "untouched",
            Analyzer::Standard => "standard",
            Analyzer::Whitespace => "whitespace",
            Analyzer::Shingle => "shingle",
            Analyzer::Phonetic => "phonetic",
            Analyzer::Sortable => "sortable",
        }
    }
}

impl fmt::Display for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How several values filtered on the same field combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLogicalOperator {
    /// Any value matches.
    #[default]
    Or,
    /// Every value must match.
    And,
}

/// Schema entry for one indexed field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    field_type: FieldType,
    nested_path: Option<String>,
    searchable: bool,
    filterable: bool,
    filterable_in_search: bool,
    used_for_sort: bool,
    used_in_spellcheck: bool,
    search_weight: f64,
    default_analyzer: Analyzer,
    filter_logical_operator: FilterLogicalOperator,
}

impl FieldDescriptor {
    /// Creates a top-level field with no search/filter flags set.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nested_path: None,
            searchable: false,
            filterable: false,
            filterable_in_search: false,
            used_for_sort: false,
            used_in_spellcheck: false,
            search_weight: 1.0,
            default_analyzer: Analyzer::Standard,
            filter_logical_operator: FilterLogicalOperator::Or,
        }
    }

    /// Creates a field stored inside the nested document at `nested_path`.
    ///
    /// Fails unless `name` starts with `nested_path + "."`.
    pub fn nested(
        name: impl Into<String>,
        field_type: FieldType,
        nested_path: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();
        let nested_path = nested_path.into();

        let valid = !nested_path.is_empty()
            && name
                .strip_prefix(nested_path.as_str())
                .is_some_and(|rest| rest.len() > 1 && rest.starts_with('.'));
        if !valid {
            return Err(ConfigurationError::InvalidFieldName {
                field: name,
                nested_path,
            });
        }

        let mut field = Self::new(name, field_type);
        field.nested_path = Some(nested_path);
        Ok(field)
    }

    /// Marks the field as full-text searchable.
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Marks the field as filterable (layered navigation).
    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    /// Marks the field as filterable on search result pages.
    pub fn filterable_in_search(mut self) -> Self {
        self.filterable_in_search = true;
        self
    }

    /// Marks the field as usable for sorting.
    pub fn used_for_sort(mut self) -> Self {
        self.used_for_sort = true;
        self
    }

    /// Marks the field as a spellcheck source.
    pub fn used_in_spellcheck(mut self) -> Self {
        self.used_in_spellcheck = true;
        self
    }

    /// Sets the full-text weight.
    pub fn with_search_weight(mut self, weight: f64) -> Self {
        self.search_weight = weight;
        self
    }

    /// Sets the default search analyzer.
    pub fn with_default_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.default_analyzer = analyzer;
        self
    }

    /// Sets how multiple filter values combine.
    pub fn with_filter_logical_operator(mut self, operator: FilterLogicalOperator) -> Self {
        self.filter_logical_operator = operator;
        self
    }

    /// Field name (full dotted path).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic type.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Nested document path, if the field lives in a nested document.
    pub fn nested_path(&self) -> Option<&str> {
        self.nested_path.as_deref()
    }

    /// Returns true if the field lives in a nested document.
    pub fn is_nested(&self) -> bool {
        self.nested_path.is_some()
    }

    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    pub fn is_filterable(&self) -> bool {
        self.filterable
    }

    pub fn is_filterable_in_search(&self) -> bool {
        self.filterable_in_search
    }

    pub fn is_used_for_sort(&self) -> bool {
        self.used_for_sort
    }

    pub fn is_used_in_spellcheck(&self) -> bool {
        self.used_in_spellcheck
    }

    pub fn search_weight(&self) -> f64 {
        self.search_weight
    }

    pub fn default_analyzer(&self) -> Analyzer {
        self.default_analyzer
    }

    pub fn filter_logical_operator(&self) -> FilterLogicalOperator {
        self.filter_logical_operator
    }

    /// Returns true if an untouched (exact value) property exists.
    pub fn has_untouched_value(&self) -> bool {
        !self.field_type.is_text() || self.filterable || self.filterable_in_search
    }

    /// Returns the property path serving `analyzer`, or `None` when the field
    /// has no such property (e.g. the untouched value of a pure text field).
    pub fn mapping_property(&self, analyzer: Analyzer) -> Option<String> {
        if !self.field_type.is_text() {
            return Some(self.name.clone());
        }

        match analyzer {
            Analyzer::Untouched if self.has_untouched_value() => Some(self.name.clone()),
            Analyzer::Untouched => None,
            Analyzer::Sortable if !self.used_for_sort => None,
            a if a == self.default_analyzer && !self.has_untouched_value() => {
                Some(self.name.clone())
            }
            a => Some(format!("{}.{}", self.name, a.as_str())),
        }
    }

    /// Returns the property queried by full-text matching on this field.
    pub fn default_search_property(&self) -> String {
        self.mapping_property(self.default_analyzer)
            .unwrap_or_else(|| self.name.clone())
    }

    /// Returns the analyzed sub-fields rendered for this text field.
    ///
    /// The phonetic sub-field only exists when the index declares the
    /// phonetic analyzer.
    pub(crate) fn analyzed_subfields(&self, phonetic_analysis: bool) -> Vec<Analyzer> {
        if !self.field_type.is_text() {
            return Vec::new();
        }
        let mut analyzers = vec![self.default_analyzer];
        if self.searchable {
            analyzers.push(Analyzer::Whitespace);
            analyzers.push(Analyzer::Shingle);
        }
        if self.used_in_spellcheck {
            analyzers.push(Analyzer::Whitespace);
            if phonetic_analysis {
                analyzers.push(Analyzer::Phonetic);
            }
        }
        let mut unique: Vec<Analyzer> = Vec::with_capacity(analyzers.len());
        for analyzer in analyzers {
            if analyzer != Analyzer::Untouched && !unique.contains(&analyzer) {
                unique.push(analyzer);
            }
        }
        unique
    }
}

/// Read-only set of field descriptors for one logical index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldMapping {
    fields: Vec<FieldDescriptor>,
    by_name: HashMap<String, usize>,
}

impl FieldMapping {
    /// Builds a mapping, rejecting duplicate field names.
    pub fn new<I>(fields: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = FieldDescriptor>,
    {
        let mut mapping = Self::default();
        for field in fields {
            if mapping.by_name.contains_key(field.name()) {
                return Err(ConfigurationError::DuplicateField {
                    field: field.name().to_string(),
                });
            }
            mapping
                .by_name
                .insert(field.name().to_string(), mapping.fields.len());
            mapping.fields.push(field);
        }
        Ok(mapping)
    }

    /// Looks up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|idx| &self.fields[*idx])
    }

    /// Looks up a field by name, failing with [`ConfigurationError::UnknownField`].
    pub fn field(&self, name: &str) -> Result<&FieldDescriptor, ConfigurationError> {
        self.get(name).ok_or_else(|| ConfigurationError::UnknownField {
            field: name.to_string(),
        })
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Fields taking part in full-text search.
    pub fn searchable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_searchable())
    }

    /// Searchable fields that feed the spellchecker.
    pub fn spellcheck_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.searchable_fields().filter(|f| f.is_used_in_spellcheck())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_name_must_start_with_path() {
        assert!(FieldDescriptor::nested("price.price", FieldType::Double, "price").is_ok());

        let err = FieldDescriptor::nested("final_price", FieldType::Double, "price").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidFieldName { .. }));

        // "pricey" starts with "price" but not with "price."
        assert!(FieldDescriptor::nested("pricey.value", FieldType::Double, "price").is_err());
        assert!(FieldDescriptor::nested("price.", FieldType::Double, "price").is_err());
        assert!(FieldDescriptor::nested("price", FieldType::Double, "price").is_err());
    }

    #[test]
    fn test_filterable_text_properties() {
        let field = FieldDescriptor::new("name", FieldType::Text)
            .searchable()
            .filterable()
            .used_for_sort();

        assert_eq!(field.mapping_property(Analyzer::Untouched).as_deref(), Some("name"));
        assert_eq!(
            field.mapping_property(Analyzer::Standard).as_deref(),
            Some("name.standard")
        );
        assert_eq!(
            field.mapping_property(Analyzer::Sortable).as_deref(),
            Some("name.sortable")
        );
        assert_eq!(field.default_search_property(), "name.standard");
    }

    #[test]
    fn test_pure_text_field_has_no_untouched_value() {
        let field = FieldDescriptor::new("description", FieldType::Text).searchable();

        assert!(field.mapping_property(Analyzer::Untouched).is_none());
        assert_eq!(field.default_search_property(), "description");
        assert_eq!(
            field.mapping_property(Analyzer::Whitespace).as_deref(),
            Some("description.whitespace")
        );
    }

    #[test]
    fn test_non_text_field_uses_its_name() {
        let field = FieldDescriptor::new("in_stock", FieldType::Integer).filterable();
        assert_eq!(field.mapping_property(Analyzer::Untouched).as_deref(), Some("in_stock"));
        assert_eq!(field.mapping_property(Analyzer::Standard).as_deref(), Some("in_stock"));
    }

    #[test]
    fn test_mapping_rejects_duplicates() {
        let err = FieldMapping::new(vec![
            FieldDescriptor::new("sku", FieldType::Keyword),
            FieldDescriptor::new("sku", FieldType::Keyword),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateField {
                field: "sku".to_string()
            }
        );
    }

    #[test]
    fn test_mapping_lookup() {
        let mapping = FieldMapping::new(vec![
            FieldDescriptor::new("name", FieldType::Text).searchable(),
            FieldDescriptor::new("sku", FieldType::Keyword)
                .searchable()
                .used_in_spellcheck(),
            FieldDescriptor::new("in_stock", FieldType::Integer).filterable(),
        ])
        .unwrap();

        assert_eq!(mapping.len(), 3);
        assert!(mapping.get("sku").is_some());
        assert!(mapping.field("color").is_err());
        assert_eq!(mapping.searchable_fields().count(), 2);
        assert_eq!(mapping.spellcheck_fields().count(), 1);
    }
}
