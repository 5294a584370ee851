//! Combining a base schema with a user-supplied custom schema.
//!
//! Exactly one [`MergePolicy`] applies per run:
//!
//! - [`MergePolicy::SafeMerge`] (default): custom fields and groups are added,
//!   but an entry that already exists in the base is never replaced. Flat-name
//!   collisions are not errors; the base silently wins. A custom group that
//!   changes a base group's namespace is rejected.
//! - [`MergePolicy::Validate`]: every field present in both schemas must have
//!   the same `type`. The first mismatch aborts the run. On success the custom
//!   schema is returned on its own; the base is discarded, not merged.
//!
//! # Example
//!
//! ```
//! use ecs_field_gen::merge::{merge, MergePolicy};
//! use ecs_field_gen::schema::{load, SchemaSource};
//!
//! let base = load(&[SchemaSource::embedded(
//!     "base.yml",
//!     "- name: event\n  fields:\n    category: { type: keyword }\n",
//! )])?;
//! let custom = load(&[SchemaSource::embedded(
//!     "custom.yml",
//!     "- name: event\n  fields:\n    category: { type: long }\n    custom_id: { type: keyword }\n",
//! )])?;
//!
//! let merged = merge(&base, custom.clone(), MergePolicy::SafeMerge)?;
//! assert_eq!(merged.flat["event.category"].field_type, "keyword");
//! assert!(merged.flat.contains_key("event.custom_id"));
//!
//! assert!(merge(&base, custom, MergePolicy::Validate).is_err());
//! # Ok::<(), ecs_field_gen::error::Error>(())
//! ```

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::schema::{FlatSchema, NestedSchema, Schema};

/// How a custom schema is combined with the base schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Add custom entries; never override base entries.
    #[default]
    SafeMerge,
    /// Check overlapping field types; on success use the custom schema alone.
    Validate,
}

/// Combine `base` and `custom` under `policy`.
pub fn merge(base: &Schema, custom: Schema, policy: MergePolicy) -> Result<Schema> {
    match policy {
        MergePolicy::SafeMerge => safe_merge(base, &custom),
        MergePolicy::Validate => validate_merge(base, custom),
    }
}

/// Add every custom group and field that the base does not already define.
///
/// The result flattens to exactly the merged flat map. A custom group whose
/// namespace differs from the base group of the same name, or a custom field
/// that would take a base field's local name under a new flat name, is an
/// [`Error::Schema`]: no single entry could then appear in both views.
pub fn safe_merge(base: &Schema, custom: &Schema) -> Result<Schema> {
    let nested = safe_merge_nested(&base.nested, &custom.nested, &base.flat)?;
    let flat = safe_merge_flat(&base.flat, &custom.flat);

    info!(
        base_fields = base.field_count(),
        custom_fields = custom.field_count(),
        merged_fields = flat.len(),
        "safe merge complete"
    );
    Ok(Schema { nested, flat })
}

/// Insert each custom entry whose key is absent from `base`.
pub fn safe_merge_flat(base: &FlatSchema, custom: &FlatSchema) -> FlatSchema {
    let mut merged = base.clone();
    for (flat_name, field) in custom {
        if merged.contains_key(flat_name) {
            debug!(field = %flat_name, "custom field ignored, base definition kept");
            continue;
        }
        merged.insert(flat_name.clone(), field.clone());
    }
    merged
}

/// Merge group-by-group, field-by-field, never replacing base entries.
///
/// Base group metadata always wins. Whether a custom field is added is decided
/// by its flat name alone: a name already in `base_flat` is skipped, so the
/// nested tree gains exactly the entries [`safe_merge_flat`] adds.
pub fn safe_merge_nested(
    base: &NestedSchema,
    custom: &NestedSchema,
    base_flat: &FlatSchema,
) -> Result<NestedSchema> {
    let mut merged = base.clone();

    for (group_name, custom_group) in custom {
        let group = merged.entry(group_name.clone()).or_insert_with(|| {
            let mut group = custom_group.clone();
            group.fields.clear();
            group
        });

        if group.prefix != custom_group.prefix {
            return Err(Error::Schema(format!(
                "custom group '{group_name}' has prefix '{}' but the base group has prefix '{}'",
                custom_group.prefix, group.prefix
            )));
        }

        for (local_name, field) in &custom_group.fields {
            if base_flat.contains_key(&field.flat_name) {
                continue;
            }
            if let Some(existing) = group.fields.get(local_name) {
                return Err(Error::Schema(format!(
                    "custom field '{}' reuses the local name '{local_name}' of base field '{}' in group '{group_name}'",
                    field.flat_name, existing.flat_name
                )));
            }
            group.fields.insert(local_name.clone(), field.clone());
        }
    }

    Ok(merged)
}

/// Check that no custom field changes the type of a base field.
///
/// Overlapping fields are compared in flat-name order and the first mismatch
/// is returned as [`Error::ValidationMismatch`]. On success `custom` is
/// returned unchanged.
pub fn validate_merge(base: &Schema, custom: Schema) -> Result<Schema> {
    for (flat_name, custom_field) in &custom.flat {
        let Some(base_field) = base.flat.get(flat_name) else {
            continue;
        };
        if custom_field.field_type != base_field.field_type {
            return Err(Error::ValidationMismatch {
                field: flat_name.clone(),
                custom_type: custom_field.field_type.clone(),
                base_type: base_field.field_type.clone(),
            });
        }
    }

    info!(
        fields = custom.field_count(),
        "custom schema validated against base"
    );
    Ok(custom)
}
