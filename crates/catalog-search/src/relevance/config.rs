//! Relevance configuration and its layered overrides.
//!
//! Raw layers are flat key/value entries. Each layer parses into a
//! [`RelevanceOverrides`] where every key is optional; layers merge key by key
//! (most specific wins) and the merged result is turned into the nested
//! [`RelevanceConfig`] in one place, [`RelevanceConfig::from_overrides`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Minimum should match applied when nothing overrides it.
pub const DEFAULT_MINIMUM_SHOULD_MATCH: &str = "100%";

/// Phrase boost used when phrase matching is enabled without a boost value.
pub const DEFAULT_PHRASE_MATCH_BOOST: f64 = 10.0;

/// Fuzzy prefix length used when fuzziness is enabled without one.
pub const DEFAULT_FUZZINESS_PREFIX_LENGTH: u32 = 1;

/// Fuzzy max expansions used when fuzziness is enabled without one.
pub const DEFAULT_FUZZINESS_MAX_EXPANSION: u32 = 10;

/// Edit distance allowed by fuzzy matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fuzziness {
    /// Engine-chosen distance based on term length.
    #[default]
    Auto,
    /// Fixed edit distance (0, 1 or 2).
    Edits(u8),
}

impl fmt::Display for Fuzziness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fuzziness::Auto => write!(f, "AUTO"),
            Fuzziness::Edits(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for Fuzziness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Fuzziness::Auto);
        }
        match s.parse::<u8>() {
            Ok(n) if n <= 2 => Ok(Fuzziness::Edits(n)),
            _ => Err(format!("unsupported fuzziness: {}", s)),
        }
    }
}

impl Serialize for Fuzziness {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Fuzziness::Auto => serializer.serialize_str("AUTO"),
            Fuzziness::Edits(n) => serializer.serialize_u8(*n),
        }
    }
}

/// Fuzzy matching parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzinessConfig {
    pub value: Fuzziness,
    pub prefix_length: u32,
    pub max_expansion: u32,
}

impl FuzzinessConfig {
    fn from_overrides(overrides: &FuzzinessOverrides) -> Self {
        Self {
            value: overrides.value.unwrap_or_default(),
            prefix_length: overrides
                .prefix_length
                .unwrap_or(DEFAULT_FUZZINESS_PREFIX_LENGTH),
            max_expansion: overrides
                .max_expansion
                .unwrap_or(DEFAULT_FUZZINESS_MAX_EXPANSION),
        }
    }
}

/// Phonetic matching parameters, with its own optional fuzziness.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhoneticConfig {
    pub fuzziness: Option<FuzzinessConfig>,
}

/// Resolved relevance tuning for one (context, locale) scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelevanceConfig {
    pub minimum_should_match: String,
    pub tie_breaker: f64,
    /// Boost of the phrase clause; `None` when phrase matching is disabled.
    pub phrase_match_boost: Option<f64>,
    /// Rendered on match clauses when greater than zero (default `0.0`).
    ///
    /// Only Elasticsearch 7.x and older accept `cutoff_frequency`; 8.x engines
    /// reject the request, so leave it at zero against them.
    pub cutoff_frequency: f64,
    pub fuzziness: Option<FuzzinessConfig>,
    pub phonetic: Option<PhoneticConfig>,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self::from_overrides(&RelevanceOverrides::shipped_defaults())
    }
}

impl RelevanceConfig {
    /// Builds the nested configuration from merged flat overrides.
    ///
    /// Sub-objects only exist when their own enable flag is set.
    pub fn from_overrides(merged: &RelevanceOverrides) -> Self {
        let fuzziness = merged
            .fuzziness_enabled
            .unwrap_or(false)
            .then(|| FuzzinessConfig::from_overrides(&merged.fuzziness));

        let phonetic = merged.phonetic_enabled.unwrap_or(false).then(|| PhoneticConfig {
            fuzziness: merged
                .phonetic_fuzziness_enabled
                .unwrap_or(false)
                .then(|| FuzzinessConfig::from_overrides(&merged.phonetic_fuzziness)),
        });

        let phrase_match_boost = merged
            .phrase_match_enabled
            .unwrap_or(false)
            .then(|| merged.phrase_match_boost.unwrap_or(DEFAULT_PHRASE_MATCH_BOOST));

        Self {
            minimum_should_match: merged
                .minimum_should_match
                .clone()
                .unwrap_or_else(|| DEFAULT_MINIMUM_SHOULD_MATCH.to_string()),
            tie_breaker: merged.tie_breaker.unwrap_or(0.0),
            phrase_match_boost,
            cutoff_frequency: merged.cutoff_frequency.unwrap_or(0.0),
            fuzziness,
            phonetic,
        }
    }

    pub fn is_fuzziness_enabled(&self) -> bool {
        self.fuzziness.is_some()
    }

    /// Cutoff frequency to attach to match fragments, if any.
    pub fn cutoff(&self) -> Option<f64> {
        (self.cutoff_frequency > 0.0).then_some(self.cutoff_frequency)
    }
}

/// Optional fuzziness keys of one layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FuzzinessOverrides {
    pub value: Option<Fuzziness>,
    pub prefix_length: Option<u32>,
    pub max_expansion: Option<u32>,
}

impl FuzzinessOverrides {
    fn merged_with(&self, over: &Self) -> Self {
        Self {
            value: over.value.or(self.value),
            prefix_length: over.prefix_length.or(self.prefix_length),
            max_expansion: over.max_expansion.or(self.max_expansion),
        }
    }
}

/// The keys one configuration layer defines. Unset keys defer to less specific layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelevanceOverrides {
    pub minimum_should_match: Option<String>,
    pub tie_breaker: Option<f64>,
    pub phrase_match_enabled: Option<bool>,
    pub phrase_match_boost: Option<f64>,
    pub cutoff_frequency: Option<f64>,
    pub fuzziness_enabled: Option<bool>,
    pub fuzziness: FuzzinessOverrides,
    pub phonetic_enabled: Option<bool>,
    pub phonetic_fuzziness_enabled: Option<bool>,
    pub phonetic_fuzziness: FuzzinessOverrides,
}

impl RelevanceOverrides {
    /// The defaults shipped with the crate (least specific layer).
    pub fn shipped_defaults() -> Self {
        Self {
            minimum_should_match: Some(DEFAULT_MINIMUM_SHOULD_MATCH.to_string()),
            tie_breaker: Some(0.0),
            phrase_match_enabled: Some(false),
            cutoff_frequency: Some(0.0),
            fuzziness_enabled: Some(false),
            phonetic_enabled: Some(false),
            phonetic_fuzziness_enabled: Some(false),
            ..Self::default()
        }
    }

    /// Parses flat `path = value` entries. Unknown paths are ignored.
    pub fn from_entries<'a, I>(entries: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut overrides = Self::default();
        for (key, value) in entries {
            overrides.set(key, value)?;
        }
        Ok(overrides)
    }

    /// Sets a single key from its raw string value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigurationError> {
        match key {
            "fulltext.minimum_should_match" => {
                self.minimum_should_match = Some(value.trim().to_string())
            }
            "fulltext.tie_breaker" => self.tie_breaker = Some(parse(key, value)?),
            "phrase_match.enabled" => self.phrase_match_enabled = Some(parse_flag(key, value)?),
            "phrase_match.boost" => self.phrase_match_boost = Some(parse(key, value)?),
            "cutoff_frequency.value" => self.cutoff_frequency = Some(parse(key, value)?),
            "fuzziness.enabled" => self.fuzziness_enabled = Some(parse_flag(key, value)?),
            "fuzziness.value" => self.fuzziness.value = Some(parse(key, value)?),
            "fuzziness.prefix_length" => self.fuzziness.prefix_length = Some(parse(key, value)?),
            "fuzziness.max_expansion" => self.fuzziness.max_expansion = Some(parse(key, value)?),
            "phonetic.enabled" => self.phonetic_enabled = Some(parse_flag(key, value)?),
            "phonetic.fuzziness.enabled" => {
                self.phonetic_fuzziness_enabled = Some(parse_flag(key, value)?)
            }
            "phonetic.fuzziness.value" => self.phonetic_fuzziness.value = Some(parse(key, value)?),
            "phonetic.fuzziness.prefix_length" => {
                self.phonetic_fuzziness.prefix_length = Some(parse(key, value)?)
            }
            "phonetic.fuzziness.max_expansion" => {
                self.phonetic_fuzziness.max_expansion = Some(parse(key, value)?)
            }
            other => {
                tracing::debug!(key = other, "Ignoring unknown relevance configuration key");
            }
        }
        Ok(())
    }

    /// Returns a copy of `self` where every key `over` defines replaces ours.
    pub fn merged_with(&self, over: &Self) -> Self {
        Self {
            minimum_should_match: over
                .minimum_should_match
                .clone()
                .or_else(|| self.minimum_should_match.clone()),
            tie_breaker: over.tie_breaker.or(self.tie_breaker),
            phrase_match_enabled: over.phrase_match_enabled.or(self.phrase_match_enabled),
            phrase_match_boost: over.phrase_match_boost.or(self.phrase_match_boost),
            cutoff_frequency: over.cutoff_frequency.or(self.cutoff_frequency),
            fuzziness_enabled: over.fuzziness_enabled.or(self.fuzziness_enabled),
            fuzziness: self.fuzziness.merged_with(&over.fuzziness),
            phonetic_enabled: over.phonetic_enabled.or(self.phonetic_enabled),
            phonetic_fuzziness_enabled: over
                .phonetic_fuzziness_enabled
                .or(self.phonetic_fuzziness_enabled),
            phonetic_fuzziness: self.phonetic_fuzziness.merged_with(&over.phonetic_fuzziness),
        }
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigurationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigurationError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigurationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigurationError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Serializable form of a flat layer, used by the static seed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawLayer(pub std::collections::BTreeMap<String, String>);

impl RawLayer {
    /// Parses the layer into typed overrides.
    pub fn to_overrides(&self) -> Result<RelevanceOverrides, ConfigurationError> {
        RelevanceOverrides::from_entries(self.0.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}
