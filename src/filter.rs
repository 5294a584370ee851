//! Restricting a schema to fields under a set of name prefixes.
//!
//! The prefixes come from an object selection file, a YAML document whose
//! top-level entries are the prefixes:
//!
//! ```yaml
//! - event.
//! - host.name
//! ```
//!
//! A mapping is also accepted; its keys are the prefixes.
//!
//! Matching is a plain, case-sensitive string prefix test against each
//! field's flat name. The nested and flat results are computed independently
//! and must agree (see [`crate::normalize::flatten`]).

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::schema::{FlatSchema, NestedSchema, Schema};

/// The set of allowed flat-name prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixSet {
    prefixes: BTreeSet<String>,
}

impl PrefixSet {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Load an object selection file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&path.display().to_string(), &content)
    }

    /// Parse an object selection document.
    pub fn from_yaml(origin: &str, content: &str) -> Result<Self> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| Error::Parse {
                origin: origin.to_string(),
                source: e,
            })?;

        let entries: Vec<&serde_yaml::Value> = match &value {
            serde_yaml::Value::Sequence(seq) => seq.iter().collect(),
            serde_yaml::Value::Mapping(map) => map.keys().collect(),
            serde_yaml::Value::Null => Vec::new(),
            _ => {
                return Err(Error::Schema(format!(
                    "{origin}: object selection must be a list of prefixes"
                )));
            }
        };

        let prefixes = entries
            .into_iter()
            .map(|entry| {
                entry.as_str().map(str::to_string).ok_or_else(|| {
                    Error::Schema(format!("{origin}: prefix {entry:?} is not a string"))
                })
            })
            .collect::<Result<BTreeSet<_>>>()?;

        Ok(Self { prefixes })
    }

    /// Whether `flat_name` starts with any prefix in the set.
    pub fn matches(&self, flat_name: &str) -> bool {
        self.prefixes.iter().any(|p| flat_name.starts_with(p.as_str()))
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }
}

/// Keep only fields whose flat name matches `prefixes`.
///
/// A group survives if at least one of its fields does, with its metadata
/// copied from `schema`. The input is left untouched.
pub fn filter_by_prefix(schema: &Schema, prefixes: &PrefixSet) -> Schema {
    let nested = filter_nested(&schema.nested, prefixes);
    let flat = filter_flat(&schema.flat, prefixes);

    if flat.is_empty() && !schema.flat.is_empty() {
        warn!(prefixes = prefixes.len(), "object selection retained no fields");
    }
    info!(
        groups = nested.len(),
        fields = flat.len(),
        "filtered schema by prefix"
    );
    Schema { nested, flat }
}

fn filter_nested(nested: &NestedSchema, prefixes: &PrefixSet) -> NestedSchema {
    let mut filtered = NestedSchema::new();

    for (group_name, group) in nested {
        for (local_name, field) in &group.fields {
            if !prefixes.matches(&field.flat_name) {
                continue;
            }
            filtered
                .entry(group_name.clone())
                .or_insert_with(|| {
                    let mut kept = group.clone();
                    kept.fields.clear();
                    kept
                })
                .fields
                .insert(local_name.clone(), field.clone());
        }
    }

    filtered
}

fn filter_flat(flat: &FlatSchema, prefixes: &PrefixSet) -> FlatSchema {
    flat.iter()
        .filter(|(flat_name, _)| prefixes.matches(flat_name))
        .map(|(flat_name, field)| (flat_name.clone(), field.clone()))
        .collect()
}
