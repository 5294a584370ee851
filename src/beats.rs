//! Beats field definitions.
//!
//! One `ecs` section holding the fields of root groups (and fields marked
//! `root`) at the top level, sorted by name, followed by one `type: group`
//! entry per remaining group whose fields keep their local names.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::schema::{FieldDef, MultiField, NestedSchema};
use crate::type_map::KEYWORD_IGNORE_ABOVE;

/// Field metadata copied through to the Beats definition when present.
const PASSTHROUGH_KEYS: &[&str] = &[
    "default_field",
    "doc_values",
    "format",
    "input_format",
    "object_type",
    "output_format",
    "output_precision",
    "path",
    "required",
    "scaling_factor",
];

#[derive(Serialize)]
struct Section<'a> {
    key: &'static str,
    title: &'static str,
    description: &'static str,
    fields: Vec<Entry<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Entry<'a> {
    Field(BeatsField<'a>),
    Group(BeatsGroup<'a>),
}

#[derive(Serialize)]
struct BeatsGroup<'a> {
    name: &'a str,
    title: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a serde_yaml::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,

    #[serde(rename = "type")]
    group_type: &'static str,

    fields: Vec<BeatsField<'a>>,
}

#[derive(Serialize)]
struct BeatsField<'a> {
    name: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<&'a str>,

    #[serde(rename = "type")]
    field_type: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    ignore_above: Option<u64>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    multi_fields: Vec<BeatsMultiField<'a>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    example: Option<&'a serde_yaml::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<bool>,

    #[serde(flatten)]
    extra: BTreeMap<&'a str, &'a serde_yaml::Value>,
}

#[derive(Serialize)]
struct BeatsMultiField<'a> {
    name: &'a str,

    #[serde(rename = "type")]
    field_type: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    norms: Option<bool>,
}

impl<'a> BeatsField<'a> {
    fn new(field: &'a FieldDef, name: &'a str) -> Self {
        let ignore_above = (field.field_type == "keyword").then(|| {
            field
                .extra
                .get("ignore_above")
                .and_then(serde_yaml::Value::as_u64)
                .unwrap_or(KEYWORD_IGNORE_ABOVE)
        });

        Self {
            name,
            level: field.level.as_deref(),
            field_type: &field.field_type,
            ignore_above,
            multi_fields: field.multi_fields.iter().map(BeatsMultiField::from).collect(),
            description: field.description.as_deref().map(str::trim),
            example: field.example.as_ref(),
            index: field.index,
            extra: PASSTHROUGH_KEYS
                .iter()
                .filter_map(|key| field.extra.get(*key).map(|value| (*key, value)))
                .collect(),
        }
    }
}

impl<'a> From<&'a MultiField> for BeatsMultiField<'a> {
    fn from(mf: &'a MultiField) -> Self {
        Self {
            name: &mf.name,
            field_type: &mf.field_type,
            norms: mf.norms,
        }
    }
}

/// Render the Beats field definition file for `nested`.
pub fn generate(nested: &NestedSchema, version: &str) -> Result<String> {
    let mut top_level = Vec::new();
    let mut groups = Vec::new();

    for group in nested.values() {
        let mut grouped = Vec::new();
        for field in group.fields.values() {
            if group.root || !field.flat_name.starts_with(&group.prefix) {
                top_level.push(BeatsField::new(field, &field.flat_name));
            } else {
                grouped.push(BeatsField::new(field, &field.name));
            }
        }

        if !group.root {
            groups.push(BeatsGroup {
                name: &group.name,
                title: &group.title,
                group: group.extra.get("group"),
                description: group.description.as_deref().map(str::trim),
                group_type: "group",
                fields: grouped,
            });
        }
    }
    top_level.sort_by(|a, b| a.name.cmp(b.name));

    let fields = top_level
        .into_iter()
        .map(Entry::Field)
        .chain(groups.into_iter().map(Entry::Group))
        .collect();
    let sections = [Section {
        key: "ecs",
        title: "ECS",
        description: "ECS Fields.",
        fields,
    }];

    let body = serde_yaml::to_string(&sections)
        .map_err(|e| Error::Codegen(format!("serializing beats fields: {e}")))?;
    Ok(format!(
        "# Generated by ecs-field-gen from schema version {version}. Do not edit.\n{body}"
    ))
}
