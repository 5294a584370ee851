//! Field normalization: derived attributes and the flat map.
//!
//! The [`Normalizer`] turns raw groups into [`Group`]s and, as a side output,
//! builds the flat map keyed by each field's fully dotted name:
//!
//! - `flat_name` is `<group>.<local name>`, or the local name alone for
//!   fields of a root group and fields that declare `root: true`
//! - `short` defaults to `description`
//! - group `title` defaults to the group name
//! - multi-field flat names are `<parent flat_name>.<name>`
//!
//! A flat name that is produced twice with different attributes within one
//! load is rejected with [`Error::DuplicateField`].

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::{
    FieldDef, FlatSchema, Group, MultiField, NestedSchema, RawField, RawFields, RawGroup,
    RawMultiField, Schema,
};

/// Group attributes the normalizer derives; a value written in a source is dropped.
const DERIVED_GROUP_KEYS: &[&str] = &["prefix"];

/// Field attributes the normalizer derives.
const DERIVED_FIELD_KEYS: &[&str] = &["flat_name"];

/// Accumulates groups from one or more sources into a single [`Schema`].
#[derive(Debug, Default)]
pub struct Normalizer {
    nested: NestedSchema,
    flat: FlatSchema,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize one raw group and add its fields.
    ///
    /// If a group of the same name was added before, its metadata is kept and
    /// the new fields are added to it.
    pub fn add_group(&mut self, raw: RawGroup) -> Result<()> {
        let RawGroup {
            name,
            title,
            description,
            short,
            root,
            fields,
            extra,
        } = raw;

        if name.trim().is_empty() {
            return Err(Error::Schema("group with an empty name".to_string()));
        }

        let named_fields = named_fields(&name, fields)?;

        let group = self.nested.entry(name.clone()).or_insert_with(|| Group {
            title: title.unwrap_or_else(|| name.clone()),
            short: short.or_else(|| description.clone()),
            description,
            root,
            prefix: if root {
                String::new()
            } else {
                format!("{name}.")
            },
            extra: without_derived(extra, DERIVED_GROUP_KEYS, &name),
            fields: BTreeMap::new(),
            name: name.clone(),
        });

        for (local_name, raw_field) in named_fields {
            let field = normalize_field(&group.prefix, &local_name, raw_field)?;

            if let Some(existing) = group.fields.get(&local_name) {
                if *existing != field {
                    return Err(Error::DuplicateField {
                        flat_name: field.flat_name,
                    });
                }
            }
            insert_flat(&mut self.flat, &field)?;
            group.fields.insert(local_name, field);
        }

        Ok(())
    }

    /// Finish loading and hand out the nested tree and flat map.
    pub fn finish(self) -> Schema {
        Schema {
            nested: self.nested,
            flat: self.flat,
        }
    }
}

/// Rebuild the flat map from a nested tree.
///
/// For any schema produced by this crate, `flatten(&schema.nested)` equals
/// `schema.flat`.
pub fn flatten(nested: &NestedSchema) -> FlatSchema {
    nested
        .values()
        .flat_map(|group| group.fields.values())
        .map(|field| (field.flat_name.clone(), field.clone()))
        .collect()
}

/// Pair each raw field with its local name.
fn named_fields(group: &str, fields: RawFields) -> Result<Vec<(String, RawField)>> {
    match fields {
        RawFields::Map(map) => Ok(map.into_iter().collect()),
        RawFields::List(list) => list
            .into_iter()
            .enumerate()
            .map(|(i, field)| match field.name.clone() {
                Some(name) if !name.trim().is_empty() => Ok((name, field)),
                _ => Err(Error::Schema(format!(
                    "field #{} in group '{group}' has no name",
                    i + 1
                ))),
            })
            .collect(),
    }
}

fn normalize_field(prefix: &str, local_name: &str, raw: RawField) -> Result<FieldDef> {
    let flat_name = if raw.root {
        local_name.to_string()
    } else {
        format!("{prefix}{local_name}")
    };

    let field_type = match raw.field_type {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(Error::MissingType { flat_name }),
    };

    let extra = without_derived(raw.extra, DERIVED_FIELD_KEYS, &flat_name);
    let multi_fields = raw
        .multi_fields
        .into_iter()
        .map(|mf| normalize_multi_field(&flat_name, mf))
        .collect::<Result<Vec<_>>>()?;

    Ok(FieldDef {
        name: local_name.to_string(),
        short: raw.short.or_else(|| raw.description.clone()),
        description: raw.description,
        example: raw.example,
        level: raw.level,
        normalize: raw.normalize,
        index: raw.index,
        allowed_values: raw.allowed_values,
        multi_fields,
        extra,
        field_type,
        flat_name,
    })
}

fn normalize_multi_field(parent: &str, raw: RawMultiField) -> Result<MultiField> {
    let flat_name = format!("{parent}.{}", raw.name);
    let field_type = match raw.field_type {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(Error::MissingType { flat_name }),
    };
    Ok(MultiField {
        name: raw.name,
        flat_name,
        field_type,
        norms: raw.norms,
    })
}

/// Remove derived keys from pass-through metadata so they serialize once.
fn without_derived(
    mut extra: BTreeMap<String, serde_yaml::Value>,
    derived: &[&str],
    owner: &str,
) -> BTreeMap<String, serde_yaml::Value> {
    for key in derived {
        if extra.remove(*key).is_some() {
            debug!(%owner, key = *key, "derived attribute in source ignored");
        }
    }
    extra
}

/// Insert a field into the flat map, rejecting a conflicting redefinition.
fn insert_flat(flat: &mut FlatSchema, field: &FieldDef) -> Result<()> {
    match flat.get(&field.flat_name) {
        Some(existing) if existing != field => Err(Error::DuplicateField {
            flat_name: field.flat_name.clone(),
        }),
        Some(_) => {
            debug!(field = %field.flat_name, "identical redefinition ignored");
            Ok(())
        }
        None => {
            flat.insert(field.flat_name.clone(), field.clone());
            Ok(())
        }
    }
}
