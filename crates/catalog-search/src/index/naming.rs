//! Physical index and alias naming.
//!
//! Aliases are `{prefix}_{store}_{identifier}`; physical indices append a
//! timestamp suffix built from a pattern such as `{{Ymd}}_{{His}}`, whose
//! placeholders hold date characters (`Y y m d H i s`).

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::ConfigurationError;

/// Suffix pattern used when none is configured.
pub const DEFAULT_INDEX_SUFFIX_PATTERN: &str = "{{Ymd}}_{{His}}";

/// Store code and logical identifier recovered from a physical index name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIndexName {
    pub store_code: String,
    pub identifier: String,
    pub suffix: String,
}

/// Generates and parses index names.
#[derive(Debug, Clone)]
pub struct IndexNaming {
    prefix: String,
    suffix_format: String,
    parser: Regex,
    /// Known identifiers, longest first.
    identifiers: Vec<String>,
}

impl IndexNaming {
    /// Creates a naming scheme.
    ///
    /// `identifiers` are the known logical index identifiers; parsing only
    /// recognizes names built from one of them.
    pub fn new<I, S>(
        prefix: impl Into<String>,
        suffix_pattern: &str,
        identifiers: I,
    ) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefix = prefix.into();
        let (suffix_format, suffix_regex) = compile_suffix_pattern(suffix_pattern)?;

        let head = if prefix.is_empty() {
            String::new()
        } else {
            format!("{}_", regex::escape(&prefix))
        };
        let parser = Regex::new(&format!("^{}(?P<rest>.+)_(?P<suffix>{})$", head, suffix_regex))
            .map_err(|e| ConfigurationError::InvalidNamePattern {
                pattern: suffix_pattern.to_string(),
                message: e.to_string(),
            })?;

        let mut identifiers: Vec<String> = identifiers.into_iter().map(Into::into).collect();
        identifiers.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        identifiers.dedup();

        Ok(Self {
            prefix,
            suffix_format,
            parser,
            identifiers,
        })
    }

    /// The stable alias of a logical index in a store.
    pub fn alias(&self, store_code: &str, identifier: &str) -> String {
        if self.prefix.is_empty() {
            format!("{}_{}", store_code, identifier)
        } else {
            format!("{}_{}_{}", self.prefix, store_code, identifier)
        }
    }

    /// A fresh physical index name timestamped with `at`.
    pub fn physical_name(&self, store_code: &str, identifier: &str, at: DateTime<Utc>) -> String {
        format!(
            "{}_{}",
            self.alias(store_code, identifier),
            at.format(&self.suffix_format)
        )
    }

    /// Parses a physical index name. Aliases and foreign names yield `None`.
    pub fn parse(&self, name: &str) -> Option<ParsedIndexName> {
        let captures = self.parser.captures(name)?;
        let rest = captures.name("rest")?.as_str();
        let suffix = captures.name("suffix")?.as_str();

        self.identifiers.iter().find_map(|identifier| {
            let store_code = rest.strip_suffix(identifier.as_str())?.strip_suffix('_')?;
            (!store_code.is_empty()).then(|| ParsedIndexName {
                store_code: store_code.to_string(),
                identifier: identifier.clone(),
                suffix: suffix.to_string(),
            })
        })
    }

    /// Returns true if `name` is a timestamped physical index.
    pub fn is_physical(&self, name: &str) -> bool {
        self.parse(name).is_some()
    }
}

/// Turns a suffix pattern into a chrono format string and a matching regex.
fn compile_suffix_pattern(pattern: &str) -> Result<(String, String), ConfigurationError> {
    let invalid = |message: &str| ConfigurationError::InvalidNamePattern {
        pattern: pattern.to_string(),
        message: message.to_string(),
    };

    let mut format = String::new();
    let mut matcher = String::new();
    let mut rest = pattern;

    while let Some(start) = rest.find("{{") {
        push_literal(&rest[..start], &mut format, &mut matcher);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| invalid("unclosed placeholder"))?;
        let placeholder = &after[..end];
        if placeholder.is_empty() {
            return Err(invalid("empty placeholder"));
        }
        for c in placeholder.chars() {
            let (directive, digits) = match c {
                'Y' => ("%Y", 4),
                'y' => ("%y", 2),
                'm' => ("%m", 2),
                'd' => ("%d", 2),
                'H' => ("%H", 2),
                'i' => ("%M", 2),
                's' => ("%S", 2),
                other => {
                    return Err(invalid(&format!("unsupported date character '{}'", other)));
                }
            };
            format.push_str(directive);
            matcher.push_str(&format!("\\d{{{}}}", digits));
        }
        rest = &after[end + 2..];
    }
    push_literal(rest, &mut format, &mut matcher);

    if matcher.is_empty() {
        return Err(invalid("empty suffix"));
    }
    Ok((format, matcher))
}

fn push_literal(literal: &str, format: &mut String, matcher: &mut String) {
    format.push_str(&literal.replace('%', "%%"));
    matcher.push_str(&regex::escape(literal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn naming() -> IndexNaming {
        IndexNaming::new(
            "magento2",
            DEFAULT_INDEX_SUFFIX_PATTERN,
            ["product", "catalog_product", "catalog_category"],
        )
        .unwrap()
    }

    #[test]
    fn test_physical_name() {
        let at = Utc.with_ymd_and_hms(2025, 7, 7, 9, 38, 23).unwrap();
        assert_eq!(
            naming().physical_name("default", "catalog_product", at),
            "magento2_default_catalog_product_20250707_093823"
        );
        assert_eq!(
            naming().alias("default", "catalog_product"),
            "magento2_default_catalog_product"
        );
    }

    #[test]
    fn test_parse_prefers_longest_identifier() {
        let parsed = naming()
            .parse("magento2_shop_catalog_product_catalog_product_20250707_093823")
            .unwrap();
        assert_eq!(parsed.store_code, "shop_catalog_product");
        assert_eq!(parsed.identifier, "catalog_product");
        assert_eq!(parsed.suffix, "20250707_093823");
    }

    #[test]
    fn test_aliases_and_foreign_names_are_not_physical() {
        let naming = naming();
        assert!(!naming.is_physical("magento2_default_catalog_product"));
        assert!(!naming.is_physical("other_default_catalog_product_20250707_093823"));
        assert!(!naming.is_physical("magento2_default_cms_page_20250707_093823"));
        assert!(naming.is_physical("magento2_default_catalog_product_20250707_093823"));
    }

    #[test]
    fn test_custom_pattern() {
        let naming = IndexNaming::new("shop", "v{{ymdHi}}", ["product"]).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let name = naming.physical_name("fr", "product", at);
        assert_eq!(name, "shop_fr_product_v2401020304");
        assert_eq!(naming.parse(&name).unwrap().store_code, "fr");
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(IndexNaming::new("p", "{{Ymd", ["product"]).is_err());
        assert!(IndexNaming::new("p", "{{Q}}", ["product"]).is_err());
        assert!(IndexNaming::new("p", "", ["product"]).is_err());
    }
}
