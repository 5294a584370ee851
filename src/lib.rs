//! Generate field catalogs, CSV, index templates, and docs from a grouped
//! YAML field schema.
//!
//! `ecs-field-gen` loads a corpus of field groups (the built-in corpus, or any
//! directory of YAML files), optionally combines it with a user-supplied
//! custom schema, optionally narrows it to a set of name prefixes, and hands
//! the result to the artifact generators.
//!
//! # Features
//!
//! - Nested (by group) and flat (by dotted name) views kept in sync
//! - Safe merge: custom schemas add fields but never override the base
//! - Validate mode: custom fields must keep the base field's type
//! - Prefix filtering via an object selection file
//! - Intermediate YAML, CSV catalog, index mapping template, Beats field
//!   definitions, and Markdown docs
//! - Deterministic output: byte-identical across runs
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! use ecs_field_gen::codegen::{generate, GenerateOptions};
//! use ecs_field_gen::pipeline::{run, PipelineConfig};
//!
//! let canonical = run(&PipelineConfig::default())?;
//! let options = GenerateOptions {
//!     version: "8.4.0".to_string(),
//!     ..GenerateOptions::default()
//! };
//! let stats = generate(&canonical, &options, Path::new("generated/"))?;
//! eprintln!("Generated {} artifacts for {} fields", stats.artifacts_written, stats.fields);
//! # Ok::<(), ecs_field_gen::error::Error>(())
//! ```

pub mod beats;
pub mod codegen;
pub mod csv_export;
pub mod docs;
pub mod error;
pub mod es_template;
pub mod filter;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod strip;
pub mod type_map;
