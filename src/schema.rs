//! Field schema types and loading.
//!
//! A schema corpus is a set of YAML documents, each a sequence of groups.
//! Every group declares its fields either as a mapping of local name to
//! attributes or as a sequence of attribute maps carrying a `name`:
//!
//! ```yaml
//! - name: event
//!   title: Event
//!   description: Attributes of the event itself.
//!   fields:
//!     category:
//!       type: keyword
//!       level: core
//!       description: Event category.
//!       example: authentication
//! ```
//!
//! Loading produces a [`Schema`]: the nested group tree plus the flat map
//! keyed by fully dotted field name. See [`crate::normalize`] for how flat
//! names and defaults are derived.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::normalize::Normalizer;

/// Groups keyed by group name.
pub type NestedSchema = BTreeMap<String, Group>;

/// Field definitions keyed by flat (fully dotted) name.
pub type FlatSchema = BTreeMap<String, FieldDef>;

/// The built-in corpus, embedded at compile time.
const BUILTIN_SCHEMAS: &[(&str, &str)] = &[
    ("base.yml", include_str!("../schemas/base.yml")),
    ("event.yml", include_str!("../schemas/event.yml")),
    ("host.yml", include_str!("../schemas/host.yml")),
    ("source.yml", include_str!("../schemas/source.yml")),
    ("user.yml", include_str!("../schemas/user.yml")),
];

/// A loaded schema: the nested group tree and its flat counterpart.
///
/// The two maps always describe the same set of fields; every stage that
/// produces a `Schema` rebuilds both together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub nested: NestedSchema,
    pub flat: FlatSchema,
}

impl Schema {
    /// Number of groups in the nested tree.
    pub fn group_count(&self) -> usize {
        self.nested.len()
    }

    /// Number of fields in the flat map.
    pub fn field_count(&self) -> usize {
        self.flat.len()
    }

    /// Whether flattening the nested tree reproduces the flat map exactly.
    pub fn is_consistent(&self) -> bool {
        crate::normalize::flatten(&self.nested) == self.flat
    }

    /// Fail with the first flat name (in sorted order) on which the nested
    /// tree and the flat map disagree.
    pub fn check_consistency(&self) -> Result<()> {
        let rebuilt = crate::normalize::flatten(&self.nested);
        let names: BTreeSet<&String> = rebuilt.keys().chain(self.flat.keys()).collect();

        match names
            .into_iter()
            .find(|name| rebuilt.get(*name) != self.flat.get(*name))
        {
            Some(field) => Err(Error::Inconsistent {
                field: field.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// A named group of fields (e.g. `event`, `host`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub name: String,

    /// Display title. Defaults to the group name.
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    /// Root groups contribute top-level field names (no `<group>.` prefix).
    pub root: bool,

    /// Namespace prefix every field in this group carries: `"<name>."`, or
    /// empty for root groups.
    pub prefix: String,

    /// Group metadata not interpreted by the pipeline.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,

    /// Fields keyed by local name.
    pub fields: BTreeMap<String, FieldDef>,
}

/// A normalized field definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDef {
    /// Local name within the group (may itself be dotted, e.g. `os.name`).
    pub name: String,

    /// Fully dotted name, unique across the flat map.
    pub flat_name: String,

    /// Primitive type tag (`keyword`, `long`, `date`, ...).
    #[serde(rename = "type")]
    pub field_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// One-line summary. Defaults to the description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_yaml::Value>,

    /// `core`, `extended`, or `custom`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Normalization rules applied to values (e.g. `array`, `to_lower`).
    pub normalize: Vec<String>,

    /// Whether the field is indexed. `None` means the default (indexed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<bool>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<AllowedValue>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub multi_fields: Vec<MultiField>,

    /// Field metadata not interpreted by the pipeline.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// An alternate indexing of a field, such as a `text` sub-field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiField {
    pub name: String,

    /// `<parent flat_name>.<name>`.
    pub flat_name: String,

    #[serde(rename = "type")]
    pub field_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub norms: Option<bool>,
}

/// One documented value of an enumerated field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowedValue {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

// ── Raw (as written) schema documents ──────────────────────────────────

/// A group exactly as written in a schema document.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGroup {
    pub name: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub short: Option<String>,

    #[serde(default)]
    pub root: bool,

    #[serde(default)]
    pub fields: RawFields,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// The two accepted spellings of a group's `fields`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawFields {
    /// `fields: { category: { type: keyword } }`
    Map(BTreeMap<String, RawField>),
    /// `fields: [ { name: category, type: keyword } ]`
    List(Vec<RawField>),
}

impl Default for RawFields {
    fn default() -> Self {
        RawFields::Map(BTreeMap::new())
    }
}

/// A field exactly as written. `type` is optional here so that a missing type
/// can be reported with the field's flat name.
#[derive(Debug, Clone, Deserialize)]
pub struct RawField {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "type", default)]
    pub field_type: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub short: Option<String>,

    /// An explicit `example: null` is kept as `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present")]
    pub example: Option<serde_yaml::Value>,

    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub normalize: Vec<String>,

    #[serde(default)]
    pub index: Option<bool>,

    /// A root field keeps its local name as its flat name.
    #[serde(default)]
    pub root: bool,

    #[serde(default)]
    pub allowed_values: Vec<AllowedValue>,

    #[serde(default)]
    pub multi_fields: Vec<RawMultiField>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Deserialize a key that is present, including one set to `null`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<serde_yaml::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_yaml::Value::deserialize(deserializer).map(Some)
}

/// A multi-field exactly as written.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMultiField {
    pub name: String,

    #[serde(rename = "type", default)]
    pub field_type: Option<String>,

    #[serde(default)]
    pub norms: Option<bool>,
}

// ── Sources ────────────────────────────────────────────────────────────

/// Where a schema document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// A YAML file on disk.
    File(PathBuf),
    /// A named in-memory document (the built-in corpus, or test input).
    Embedded { name: String, content: String },
}

impl SchemaSource {
    /// Create an in-memory source.
    pub fn embedded(name: impl Into<String>, content: impl Into<String>) -> Self {
        SchemaSource::Embedded {
            name: name.into(),
            content: content.into(),
        }
    }

    fn read(&self) -> Result<Cow<'_, str>> {
        match self {
            SchemaSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|e| Error::Read {
                    path: path.clone(),
                    source: e,
                }),
            SchemaSource::Embedded { content, .. } => Ok(Cow::Borrowed(content)),
        }
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaSource::File(path) => write!(f, "{}", path.display()),
            SchemaSource::Embedded { name, .. } => write!(f, "<builtin>/{name}"),
        }
    }
}

/// The built-in corpus, in load order.
pub fn builtin_sources() -> Vec<SchemaSource> {
    BUILTIN_SCHEMAS
        .iter()
        .map(|(name, content)| SchemaSource::embedded(*name, *content))
        .collect()
}

/// List the `*.yml` / `*.yaml` files of a directory, sorted by path.
pub fn sources_in_dir(dir: &Path) -> Result<Vec<SchemaSource>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::Read {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yml") | Some("yaml")
        );
        if is_yaml && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    Ok(paths.into_iter().map(SchemaSource::File).collect())
}

/// Parse one schema document into its raw groups.
///
/// An empty document yields no groups.
pub fn parse_groups(origin: &str, content: &str) -> Result<Vec<RawGroup>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let groups: Option<Vec<RawGroup>> =
        serde_yaml::from_str(content).map_err(|e| Error::Parse {
            origin: origin.to_string(),
            source: e,
        })?;
    Ok(groups.unwrap_or_default())
}

/// Load and normalize schema sources, in order.
///
/// Later sources may add groups, or add fields to groups seen earlier. A flat
/// name defined twice with different attributes is an error; resolving
/// conflicts between independently loaded schemas is the job of
/// [`crate::merge`].
pub fn load(sources: &[SchemaSource]) -> Result<Schema> {
    let mut normalizer = Normalizer::new();

    for source in sources {
        let origin = source.to_string();
        let content = source.read()?;
        let groups = parse_groups(&origin, &content)?;
        debug!(%origin, groups = groups.len(), "parsed schema source");

        for group in groups {
            normalizer.add_group(group)?;
        }
    }

    let schema = normalizer.finish();
    info!(
        sources = sources.len(),
        groups = schema.group_count(),
        fields = schema.field_count(),
        "loaded schema"
    );
    Ok(schema)
}

/// Load the built-in corpus.
pub fn load_builtin() -> Result<Schema> {
    load(&builtin_sources())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_schema_yaml() -> &'static str {
        r#"
- name: base
  title: Base
  root: true
  description: Top-level fields.
  fields:
    "@timestamp":
      type: date
      level: core
      description: Date/time when the event originated.
      example: "2016-05-23T08:05:34.853Z"
    message:
      type: text
      level: core
      description: Log message.
- name: event
  title: Event
  description: Attributes of the event itself.
  fields:
    - name: category
      type: keyword
      level: core
      description: Event category.
      example: authentication
    - name: duration
      type: long
      level: core
      description: Duration in nanoseconds.
"#
    }

    #[test]
    fn parse_minimal_schema() {
        let groups = parse_groups("test.yml", minimal_schema_yaml()).unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups[0].root);
        assert!(matches!(groups[0].fields, RawFields::Map(_)));
        assert!(matches!(groups[1].fields, RawFields::List(_)));
    }

    #[test]
    fn load_derives_flat_names() {
        let schema = load(&[SchemaSource::embedded("test.yml", minimal_schema_yaml())]).unwrap();

        assert_eq!(schema.group_count(), 2);
        assert_eq!(schema.field_count(), 4);
        assert!(schema.flat.contains_key("@timestamp"));
        assert!(schema.flat.contains_key("message"));
        assert!(schema.flat.contains_key("event.category"));
        assert!(schema.flat.contains_key("event.duration"));

        let category = &schema.nested["event"].fields["category"];
        assert_eq!(category.flat_name, "event.category");
        assert_eq!(category.field_type, "keyword");
        assert_eq!(
            category.example,
            Some(serde_yaml::Value::String("authentication".into()))
        );
    }

    #[test]
    fn load_keeps_unknown_metadata() {
        let yaml = r#"
- name: host
  title: Host
  group: 2
  type: group
  fields:
    name:
      type: keyword
      ignore_above: 1024
"#;
        let schema = load(&[SchemaSource::embedded("host.yml", yaml)]).unwrap();
        let host = &schema.nested["host"];
        assert_eq!(host.extra["group"].as_u64(), Some(2));
        assert_eq!(host.extra["type"].as_str(), Some("group"));
        assert_eq!(
            schema.flat["host.name"].extra["ignore_above"].as_u64(),
            Some(1024)
        );
    }

    #[test]
    fn explicit_null_example_is_kept() {
        let yaml = r#"
- name: event
  fields:
    kind: { type: keyword, example: null }
    id: { type: keyword }
"#;
        let schema = load(&[SchemaSource::embedded("event.yml", yaml)]).unwrap();
        assert_eq!(schema.flat["event.kind"].example, Some(serde_yaml::Value::Null));
        assert_eq!(schema.flat["event.id"].example, None);

        let flat = serde_yaml::to_string(&schema.flat).unwrap();
        assert!(flat.contains("example: null"));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = load(&[SchemaSource::embedded("bad.yml", "- name: [unclosed")]).unwrap_err();
        assert!(matches!(err, Error::Parse { ref origin, .. } if origin == "<builtin>/bad.yml"));
    }

    #[test]
    fn missing_type_reports_flat_name() {
        let yaml = r#"
- name: event
  fields:
    category:
      description: no type here
"#;
        let err = load(&[SchemaSource::embedded("event.yml", yaml)]).unwrap_err();
        match err {
            Error::MissingType { flat_name } => assert_eq!(flat_name, "event.category"),
            other => panic!("expected MissingType, got {other:?}"),
        }
    }

    #[test]
    fn later_sources_add_fields_to_existing_groups() {
        let first = r#"
- name: event
  title: Event
  fields:
    category: { type: keyword }
"#;
        let second = r#"
- name: event
  title: Ignored Title
  fields:
    kind: { type: keyword }
- name: host
  fields:
    name: { type: keyword }
"#;
        let schema = load(&[
            SchemaSource::embedded("a.yml", first),
            SchemaSource::embedded("b.yml", second),
        ])
        .unwrap();

        assert_eq!(schema.nested["event"].title, "Event");
        assert_eq!(schema.nested["event"].fields.len(), 2);
        assert!(schema.flat.contains_key("event.kind"));
        assert!(schema.flat.contains_key("host.name"));
        assert!(schema.is_consistent());
    }

    #[test]
    fn empty_document_has_no_groups() {
        let schema = load(&[SchemaSource::embedded("empty.yml", "\n")]).unwrap();
        assert_eq!(schema, Schema::default());
    }

    #[test]
    fn check_consistency_names_first_differing_field() {
        let mut schema = load(&[SchemaSource::embedded("test.yml", minimal_schema_yaml())]).unwrap();
        assert!(schema.check_consistency().is_ok());

        let mut orphan = schema.flat["event.category"].clone();
        orphan.flat_name = "category".to_string();
        schema.flat.insert("category".to_string(), orphan);
        schema.flat.get_mut("message").unwrap().field_type = "keyword".to_string();

        let err = schema.check_consistency().unwrap_err();
        assert!(matches!(err, Error::Inconsistent { ref field } if field == "category"));
    }

    #[test]
    fn builtin_corpus_is_consistent() {
        let schema = load_builtin().unwrap();
        assert!(schema.nested.contains_key("base"));
        assert!(schema.nested.contains_key("event"));
        assert!(schema.flat.contains_key("@timestamp"));
        assert_eq!(schema.flat["event.category"].field_type, "keyword");
        assert!(schema.is_consistent());
    }

    #[test]
    fn sources_in_dir_lists_sorted_yaml_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.yml"), "").unwrap();
        std::fs::write(dir.path().join("a.yaml"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let sources = sources_in_dir(dir.path()).unwrap();
        assert_eq!(
            sources,
            vec![
                SchemaSource::File(dir.path().join("a.yaml")),
                SchemaSource::File(dir.path().join("b.yml")),
            ]
        );
    }

    #[test]
    fn sources_in_missing_dir_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = sources_in_dir(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
