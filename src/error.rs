//! Error types for the ecs-field-gen crate.

use std::path::PathBuf;

/// Errors that can occur while loading, merging, or generating a field schema.
///
/// Every variant is fatal to a generator run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A schema source (or object selection file) is not valid YAML, or does
    /// not have the expected shape.
    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        source: serde_yaml::Error,
    },

    /// A field or multi-field declares no `type`.
    #[error("schema error: field '{flat_name}' has no type")]
    MissingType { flat_name: String },

    /// Two definitions within one load produce the same flat name.
    #[error("schema error: field '{flat_name}' is defined more than once with different attributes")]
    DuplicateField { flat_name: String },

    /// The nested tree and the flat map no longer describe the same fields.
    #[error("schema error: nested and flat views disagree at field '{field}'")]
    Inconsistent { field: String },

    /// Any other structurally invalid group or field.
    #[error("schema error: {0}")]
    Schema(String),

    /// A custom field overrides a base field with a different type.
    #[error(
        "validation failed: field {field} has type {custom_type} in custom schema but type {base_type} in base schema"
    )]
    ValidationMismatch {
        field: String,
        custom_type: String,
        base_type: String,
    },

    /// Failed to write generated artifacts.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read a file from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error.
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Artifact rendering error.
    #[error("codegen error: {0}")]
    Codegen(String),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
