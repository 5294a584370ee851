//! Search-index mapping template generation.
//!
//! Flat names are split on `.` to build nested `properties`; each leaf gets
//! its mapping from [`crate::type_map::field_mapping`].

use serde_json::{Map, Value, json};

use crate::error::{Error, Result};
use crate::schema::FlatSchema;
use crate::type_map::{KEYWORD_IGNORE_ABOVE, field_mapping, is_container_type};

/// Render the index template for `flat` as pretty-printed JSON.
pub fn generate(flat: &FlatSchema, version: &str) -> Result<String> {
    let properties = build_properties(flat)?;
    let template = json!({
        "index_patterns": [format!("ecs-{version}-*")],
        "order": 1,
        "settings": {
            "index": {
                "mapping": {
                    "total_fields": {
                        "limit": 10000
                    }
                },
                "refresh_interval": "5s"
            }
        },
        "mappings": {
            "_meta": {
                "version": version
            },
            "date_detection": false,
            "dynamic_templates": [
                {
                    "strings_as_keyword": {
                        "mapping": {
                            "ignore_above": KEYWORD_IGNORE_ABOVE,
                            "type": "keyword"
                        },
                        "match_mapping_type": "string"
                    }
                }
            ],
            "properties": properties
        }
    });

    let mut out = serde_json::to_string_pretty(&template)?;
    out.push('\n');
    Ok(out)
}

/// Build the nested `properties` tree for every field of `flat`.
pub fn build_properties(flat: &FlatSchema) -> Result<Map<String, Value>> {
    let mut properties = Map::new();
    for field in flat.values() {
        insert_leaf(&mut properties, &field.flat_name, field_mapping(field))?;
    }
    Ok(properties)
}

/// Insert a leaf mapping at the dotted path `flat_name`, creating
/// intermediate `properties` objects as needed.
///
/// A leaf that was already created as an intermediate node (its children were
/// inserted first) keeps its `properties` and gains the leaf's parameters.
fn insert_leaf(
    properties: &mut Map<String, Value>,
    flat_name: &str,
    mapping: Map<String, Value>,
) -> Result<()> {
    let mut parts: Vec<&str> = flat_name.split('.').collect();
    let Some(leaf) = parts.pop() else {
        return Ok(());
    };

    let not_an_object =
        |part: &str| Error::Codegen(format!("'{flat_name}': '{part}' is not an object mapping"));

    let mut current = properties;
    for part in parts {
        let node = current
            .entry(part)
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| not_an_object(part))?;

        // Intermediate nodes created here have no type; typed ones must hold children.
        if let Some(field_type) = node.get("type").and_then(Value::as_str) {
            if !is_container_type(field_type) {
                return Err(not_an_object(part));
            }
        }

        current = node
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| not_an_object(part))?;
    }

    match current.get_mut(leaf) {
        Some(Value::Object(existing)) => {
            for (key, value) in mapping {
                existing.insert(key, value);
            }
        }
        _ => {
            current.insert(leaf.to_string(), Value::Object(mapping));
        }
    }
    Ok(())
}
