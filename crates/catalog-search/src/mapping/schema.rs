//! Engine mapping rendering.
//!
//! Turns a [`FieldMapping`] into the `mappings` body sent when a physical
//! index is created. Fields living under a nested path are grouped into a
//! `nested` object so that array entries match as whole units.

use serde_json::{Map, Value, json};

use super::{Analyzer, FieldDescriptor, FieldMapping, FieldType};

/// Renders the `mappings` section for the given field mapping.
///
/// `phonetic_analysis` must match the analysis settings of the index: without
/// it no `phonetic` sub-field is rendered.
pub fn render_mapping(mapping: &FieldMapping, phonetic_analysis: bool) -> Value {
    let mut properties = Map::new();

    for field in mapping.fields() {
        let segments: Vec<&str> = field.name().split('.').collect();
        let nested_depth = field
            .nested_path()
            .map(|path| path.split('.').count())
            .unwrap_or(0);
        insert_property(
            &mut properties,
            &segments,
            nested_depth,
            field_property(field, phonetic_analysis),
        );
    }

    json!({
        "dynamic": false,
        "properties": Value::Object(properties),
    })
}

/// Inserts a leaf property at `segments`, creating intermediate objects.
///
/// The object reached after `nested_depth` segments is typed `nested`.
fn insert_property(
    properties: &mut Map<String, Value>,
    segments: &[&str],
    nested_depth: usize,
    leaf: Value,
) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        properties.insert((*head).to_string(), leaf);
        return;
    }

    let entry = properties
        .entry((*head).to_string())
        .or_insert_with(|| json!({ "properties": {} }));

    if nested_depth == 1 {
        entry["type"] = json!("nested");
    }

    if !entry["properties"].is_object() {
        entry["properties"] = json!({});
    }
    if let Some(children) = entry["properties"].as_object_mut() {
        insert_property(children, rest, nested_depth.saturating_sub(1), leaf);
    }
}

/// Builds the property definition for a single field.
fn field_property(field: &FieldDescriptor, phonetic_analysis: bool) -> Value {
    match field.field_type() {
        FieldType::Text => text_property(field, phonetic_analysis),
        FieldType::Date => json!({
            "type": "date",
            "format": "strict_date_optional_time||yyyy-MM-dd HH:mm:ss||yyyy-MM-dd||epoch_millis"
        }),
        other => json!({ "type": other.as_str() }),
    }
}

fn text_property(field: &FieldDescriptor, phonetic_analysis: bool) -> Value {
    let mut subfields = Map::new();
    for analyzer in field.analyzed_subfields(phonetic_analysis) {
        if analyzer == field.default_analyzer() && !field.has_untouched_value() {
            // analyzed in the main property
            continue;
        }
        subfields.insert(
            analyzer.as_str().to_string(),
            json!({ "type": "text", "analyzer": analyzer.as_str() }),
        );
    }

    if field.is_used_for_sort() {
        subfields.insert(
            Analyzer::Sortable.as_str().to_string(),
            json!({ "type": "keyword", "normalizer": "sortable" }),
        );
    }

    let mut property = if field.has_untouched_value() {
        json!({ "type": "keyword", "ignore_above": 256 })
    } else {
        json!({ "type": "text", "analyzer": field.default_analyzer().as_str() })
    };

    if !subfields.is_empty() {
        property["fields"] = Value::Object(subfields);
    }
    property
}
