//! CSV field catalog.
//!
//! One row per field and one per multi-field. Rows of root fields (field set
//! `base`) come first, then everything else by flat name.

use crate::codegen::example_text;
use crate::error::{Error, Result};
use crate::schema::{FieldDef, FlatSchema};

const HEADER: [&str; 9] = [
    "ECS_Version",
    "Indexed",
    "Field_Set",
    "Field",
    "Type",
    "Level",
    "Normalization",
    "Example",
    "Description",
];

/// Field set of a flat name: its first dotted segment, or `base` when the
/// name has no dot.
pub fn field_set(flat_name: &str) -> &str {
    match flat_name.split_once('.') {
        Some((set, _)) => set,
        None => "base",
    }
}

/// Render the CSV catalog for `flat`.
pub fn generate(flat: &FlatSchema, version: &str) -> Result<String> {
    let mut fields: Vec<&FieldDef> = flat.values().collect();
    fields.sort_by(|a, b| {
        let key_a = (field_set(&a.flat_name) != "base", &a.flat_name);
        let key_b = (field_set(&b.flat_name) != "base", &b.flat_name);
        key_a.cmp(&key_b)
    });

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for field in fields {
        let set = field_set(&field.flat_name);
        let indexed = if field.index == Some(false) {
            "false"
        } else {
            "true"
        };
        let level = field.level.as_deref().unwrap_or("");
        let description = field.description.as_deref().unwrap_or("");

        writer.write_record([
            version,
            indexed,
            set,
            field.flat_name.as_str(),
            field.field_type.as_str(),
            level,
            field.normalize.join(", ").as_str(),
            example_text(field.example.as_ref()).as_str(),
            description,
        ])?;

        for mf in &field.multi_fields {
            writer.write_record([
                version,
                "true",
                set,
                mf.flat_name.as_str(),
                mf.field_type.as_str(),
                level,
                "",
                "",
                description,
            ])?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Codegen(format!("flushing CSV: {e}")))?;
    String::from_utf8(bytes).map_err(|e| Error::Codegen(format!("CSV is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaSource, load};

    fn flat() -> FlatSchema {
        load(&[SchemaSource::embedded(
            "test.yml",
            r#"
- name: base
  root: true
  fields:
    tags:
      type: keyword
      level: core
      normalize: [array]
      example: '["production", "env2"]'
      description: List of keywords.
- name: agent
  fields:
    name:
      type: keyword
      level: core
      description: Custom name, with a comma.
      example: foo
      multi_fields:
        - { name: text, type: text }
    ephemeral_id:
      type: keyword
      level: extended
      index: false
"#,
        )])
        .unwrap()
        .flat
    }

    #[test]
    fn field_set_is_first_segment() {
        assert_eq!(field_set("host.os.name"), "host");
        assert_eq!(field_set("@timestamp"), "base");
    }

    #[test]
    fn rows_are_ordered_base_first() {
        let csv = generate(&flat(), "8.4.0").unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "ECS_Version,Indexed,Field_Set,Field,Type,Level,Normalization,Example,Description"
        );
        assert!(lines[1].starts_with("8.4.0,true,base,tags,keyword,core,array,"));
        assert!(lines[2].starts_with("8.4.0,false,agent,agent.ephemeral_id,keyword,extended"));
        assert!(lines[3].starts_with("8.4.0,true,agent,agent.name,keyword,core,,foo,"));
        assert!(lines[4].starts_with("8.4.0,true,agent,agent.name.text,text,core,,,"));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn values_with_commas_and_quotes_are_escaped() {
        let csv = generate(&flat(), "8.4.0").unwrap();
        assert!(csv.contains("\"Custom name, with a comma.\""));
        assert!(csv.contains("\"[\"\"production\"\", \"\"env2\"\"]\""));
    }

    #[test]
    fn parses_back_with_same_column_count() {
        let csv = generate(&flat(), "8.4.0").unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        for record in reader.records() {
            assert_eq!(record.unwrap().len(), HEADER.len());
        }
    }
}
