//! Search context: the named search surface a request runs against.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named search surface (quick search, category listing, autocomplete, ...)
/// scoped to one store and locale.
///
/// Every request carries exactly one context and it never changes during the
/// request. The context selects the relevance tuning layers, the logical index
/// to query, and the store alias of that index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchContext {
    /// Context name (e.g. `quick_search_container`).
    pub name: String,
    /// Store code used to address the store alias.
    pub store_code: String,
    /// Locale used by the most specific relevance layer.
    pub locale: String,
    /// Identifier of the logical index this context searches.
    pub index_identifier: String,
}

impl SearchContext {
    /// Creates a new search context.
    pub fn new(
        name: impl Into<String>,
        store_code: impl Into<String>,
        locale: impl Into<String>,
        index_identifier: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            store_code: store_code.into(),
            locale: locale.into(),
            index_identifier: index_identifier.into(),
        }
    }
}

impl fmt::Display for SearchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}/{} ({})",
            self.name, self.store_code, self.locale, self.index_identifier
        )
    }
}
