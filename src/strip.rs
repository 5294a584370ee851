//! Minimal per-field projection used for lightweight export.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::schema::{FieldDef, FlatSchema, NestedSchema};

/// Stripped records keyed by flat name.
pub type StrippedFlat = BTreeMap<String, StrippedField>;

/// A field reduced to `description`, `example`, and `type`.
///
/// Attributes absent from the source field are omitted when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrippedField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_yaml::Value>,

    #[serde(rename = "type")]
    pub field_type: String,
}

impl From<&FieldDef> for StrippedField {
    fn from(field: &FieldDef) -> Self {
        Self {
            description: field.description.clone(),
            example: field.example.clone(),
            field_type: field.field_type.clone(),
        }
    }
}

/// Project every field of `flat` to its [`StrippedField`].
pub fn strip(flat: &FlatSchema) -> StrippedFlat {
    flat.iter()
        .map(|(flat_name, field)| (flat_name.clone(), StrippedField::from(field)))
        .collect()
}

/// The canonical structures handed to every artifact generator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalSchema {
    pub nested: NestedSchema,
    pub flat: FlatSchema,
    pub stripped: StrippedFlat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaSource, load};

    fn flat() -> FlatSchema {
        load(&[SchemaSource::embedded(
            "test.yml",
            r#"
- name: event
  fields:
    category:
      type: keyword
      level: core
      description: Event category.
      example: authentication
      normalize: [array]
    duration:
      type: long
    id:
      type: keyword
      example: null
"#,
        )])
        .unwrap()
        .flat
    }

    #[test]
    fn keeps_only_documentation_attributes() {
        let stripped = strip(&flat());
        let value = serde_yaml::to_value(&stripped["event.category"]).unwrap();
        let map = value.as_mapping().unwrap();

        let keys: Vec<&str> = map.keys().filter_map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["description", "example", "type"]);
        assert_eq!(map["type"].as_str(), Some("keyword"));
        assert_eq!(map["example"].as_str(), Some("authentication"));
    }

    #[test]
    fn absent_attributes_are_omitted() {
        let stripped = strip(&flat());
        let value = serde_yaml::to_value(&stripped["event.duration"]).unwrap();
        let map = value.as_mapping().unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map["type"].as_str(), Some("long"));
    }

    #[test]
    fn explicit_null_example_survives() {
        let stripped = strip(&flat());
        let value = serde_yaml::to_value(&stripped["event.id"]).unwrap();
        let map = value.as_mapping().unwrap();

        assert!(map.contains_key("example"));
        assert!(map["example"].is_null());
    }

    #[test]
    fn values_are_copied_unchanged() {
        let flat = flat();
        let stripped = strip(&flat);

        assert_eq!(stripped.len(), flat.len());
        for (name, field) in &flat {
            let record = &stripped[name];
            assert_eq!(record.description, field.description);
            assert_eq!(record.example, field.example);
            assert_eq!(record.field_type, field.field_type);
        }
    }
}
