//! Maps field definitions to search-index mapping parameters.
//!
//! # Type Mapping Table
//!
//! | Field type | Mapping | Notes |
//! |------------|---------|-------|
//! | `keyword` | `{"type": "keyword", "ignore_above": 1024}` | Caps indexed term length |
//! | `text` | `{"type": "text", "norms": false}` | Scoring norms disabled |
//! | `scaled_float` | `{"type": "scaled_float", "scaling_factor": 1000}` | Unless the field sets its own factor |
//! | `object` | `{"type": "object"}` | Children become `properties` |
//! | `nested` | `{"type": "nested"}` | Children become `properties` |
//! | `group` | `{"type": "object"}` | Schema-only spelling of `object` |
//! | `alias` | `{"type": "alias", "path": ...}` | `path` taken from the field |
//! | anything else | `{"type": <type>}` | Passed through unchanged |
//!
//! A field with `index: false` also gets `"index": false` (and
//! `"doc_values": false` for non-keyword types, matching an unsearchable,
//! stored-only field).

use serde_json::{Map, Value, json};

use crate::schema::{FieldDef, MultiField};

/// Default `ignore_above` applied to keyword fields.
pub const KEYWORD_IGNORE_ABOVE: u64 = 1024;

/// Default `scaling_factor` applied to `scaled_float` fields.
pub const DEFAULT_SCALING_FACTOR: u64 = 1000;

/// Whether a field type holds child properties rather than a value.
pub fn is_container_type(field_type: &str) -> bool {
    matches!(field_type, "object" | "nested" | "group")
}

/// Build the mapping entry for a field, including its multi-fields.
pub fn field_mapping(field: &FieldDef) -> Map<String, Value> {
    let mut mapping = type_mapping(&field.field_type, None);

    match field.field_type.as_str() {
        "scaled_float" => {
            let factor = field
                .extra
                .get("scaling_factor")
                .and_then(serde_yaml::Value::as_u64)
                .unwrap_or(DEFAULT_SCALING_FACTOR);
            mapping.insert("scaling_factor".into(), json!(factor));
        }
        "alias" => {
            if let Some(path) = field.extra.get("path").and_then(serde_yaml::Value::as_str) {
                mapping.insert("path".into(), json!(path));
            }
        }
        _ => {}
    }

    if field.index == Some(false) {
        mapping.insert("index".into(), json!(false));
        if field.field_type != "keyword" {
            mapping.insert("doc_values".into(), json!(false));
        }
    }

    if !field.multi_fields.is_empty() {
        let subfields: Map<String, Value> = field
            .multi_fields
            .iter()
            .map(|mf| (mf.name.clone(), Value::Object(multi_field_mapping(mf))))
            .collect();
        mapping.insert("fields".into(), Value::Object(subfields));
    }

    mapping
}

/// Build the mapping entry for a multi-field.
pub fn multi_field_mapping(mf: &MultiField) -> Map<String, Value> {
    type_mapping(&mf.field_type, mf.norms)
}

/// Base mapping for a bare type name.
///
/// `norms` overrides the default norms setting of `text` types.
fn type_mapping(field_type: &str, norms: Option<bool>) -> Map<String, Value> {
    // `group` only exists in schema documents; the index knows it as `object`.
    let index_type = if field_type == "group" {
        "object"
    } else {
        field_type
    };

    let mut mapping = Map::new();
    mapping.insert("type".into(), json!(index_type));

    match field_type {
        "keyword" => {
            mapping.insert("ignore_above".into(), json!(KEYWORD_IGNORE_ABOVE));
        }
        "text" | "match_only_text" => {
            mapping.insert("norms".into(), json!(norms.unwrap_or(false)));
        }
        _ => {
            if let Some(norms) = norms {
                mapping.insert("norms".into(), json!(norms));
            }
        }
    }

    mapping
}
