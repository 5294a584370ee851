//! Markdown field reference.
//!
//! One section per group, root groups first, each with a table of its fields
//! sorted by flat name.

use std::fmt::Write;

use crate::codegen::example_text;
use crate::schema::{FieldDef, Group, NestedSchema};

/// Render the field reference for `nested`.
pub fn generate(nested: &NestedSchema, version: &str) -> String {
    let mut out = String::new();

    writeln!(out, "# Field Reference").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "Schema version: {version}").unwrap();

    let mut groups: Vec<&Group> = nested.values().collect();
    groups.sort_by(|a, b| (!a.root, &a.name).cmp(&(!b.root, &b.name)));

    for group in groups {
        write_group(&mut out, group);
    }

    out
}

fn write_group(out: &mut String, group: &Group) {
    writeln!(out).unwrap();
    writeln!(out, "## {}", group.title).unwrap();

    if let Some(description) = &group.description {
        writeln!(out).unwrap();
        writeln!(out, "{}", description.trim()).unwrap();
    }

    let mut fields: Vec<&FieldDef> = group.fields.values().collect();
    if fields.is_empty() {
        return;
    }
    fields.sort_by(|a, b| a.flat_name.cmp(&b.flat_name));

    writeln!(out).unwrap();
    writeln!(out, "| Field | Description | Level | Type | Example |").unwrap();
    writeln!(out, "|-------|-------------|-------|------|---------|").unwrap();

    for field in fields {
        let example = example_text(field.example.as_ref());
        let example = if example.is_empty() {
            String::new()
        } else {
            format!("`{}`", escape_cell(&example))
        };
        writeln!(
            out,
            "| `{}` | {} | {} | {} | {} |",
            field.flat_name,
            escape_cell(&describe(field)),
            field.level.as_deref().unwrap_or(""),
            field.field_type,
            example
        )
        .unwrap();
    }
}

/// The description cell: description, then allowed values and multi-fields.
fn describe(field: &FieldDef) -> String {
    let mut text = field.description.clone().unwrap_or_default();

    if !field.allowed_values.is_empty() {
        let names: Vec<&str> = field
            .allowed_values
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        write!(text, " Allowed values: {}.", names.join(", ")).unwrap();
    }

    if !field.multi_fields.is_empty() {
        let names: Vec<String> = field
            .multi_fields
            .iter()
            .map(|mf| format!("{} ({})", mf.flat_name, mf.field_type))
            .collect();
        write!(text, " Multi-fields: {}.", names.join(", ")).unwrap();
    }

    if field.index == Some(false) {
        text.push_str(" Not indexed.");
    }

    text.trim().to_string()
}

/// Make a value safe inside a Markdown table cell.
fn escape_cell(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaSource, load};

    fn nested() -> NestedSchema {
        load(&[SchemaSource::embedded(
            "test.yml",
            r#"
- name: event
  title: Event
  description: |
    Event fields.
  fields:
    outcome:
      type: keyword
      level: core
      description: "Outcome | result\nof the event."
      allowed_values:
        - name: success
        - name: failure
- name: base
  title: Base
  root: true
  fields:
    message:
      type: text
      level: core
      description: Log message.
      example: Hello World
- name: empty
  title: Empty Group
"#,
        )])
        .unwrap()
        .nested
    }

    #[test]
    fn root_groups_come_first() {
        let doc = generate(&nested(), "8.4.0");
        let base = doc.find("## Base").unwrap();
        let empty = doc.find("## Empty Group").unwrap();
        let event = doc.find("## Event").unwrap();
        assert!(base < empty && empty < event);
        assert!(doc.starts_with("# Field Reference\n\nSchema version: 8.4.0\n"));
    }

    #[test]
    fn field_rows_are_rendered() {
        let doc = generate(&nested(), "8.4.0");
        assert!(doc.contains("| `message` | Log message. | core | text | `Hello World` |"));
        assert!(doc.contains(
            "| `event.outcome` | Outcome \\| result of the event. Allowed values: success, failure. | core | keyword |  |"
        ));
    }

    #[test]
    fn empty_group_has_no_table() {
        let doc = generate(&nested(), "8.4.0");
        let section = doc.split("## Empty Group").nth(1).unwrap();
        let section = section.split("## ").next().unwrap();
        assert!(!section.contains("| Field |"));
    }
}
