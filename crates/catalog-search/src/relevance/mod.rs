//! Per-context relevance tuning.
//!
//! See [`RelevanceConfigResolver`] for the layering rules.

mod config;
mod resolver;
mod store;

pub use config::{
    DEFAULT_FUZZINESS_MAX_EXPANSION, DEFAULT_FUZZINESS_PREFIX_LENGTH, DEFAULT_MINIMUM_SHOULD_MATCH,
    DEFAULT_PHRASE_MATCH_BOOST, Fuzziness, FuzzinessConfig, FuzzinessOverrides, PhoneticConfig,
    RawLayer, RelevanceConfig, RelevanceOverrides,
};
pub use resolver::{LayerReader, RelevanceConfigResolver};
pub use store::{
    ConfigScope, ContextSeed, InMemoryOverrideStore, JsonFileSeed, OverrideStore, RelevanceSeed,
    ScopeType, SeedSource,
};
