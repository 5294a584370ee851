//! End-to-end schema pipeline: load, merge, filter, strip.
//!
//! ```no_run
//! use ecs_field_gen::pipeline::{run, PipelineConfig};
//!
//! let canonical = run(&PipelineConfig::default())?;
//! eprintln!("{} fields", canonical.flat.len());
//! # Ok::<(), ecs_field_gen::error::Error>(())
//! ```

use std::path::Path;

use tracing::info;

use crate::codegen::{GenerateOptions, GenerationStats, generate};
use crate::error::{Error, Result};
use crate::filter::{PrefixSet, filter_by_prefix};
use crate::merge::{MergePolicy, merge};
use crate::schema::{SchemaSource, builtin_sources, load};
use crate::strip::{CanonicalSchema, strip};

/// Everything one pipeline run needs. Built once per run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sources of the base schema. Defaults to the built-in corpus.
    pub default_sources: Vec<SchemaSource>,

    /// Sources of a user schema to combine with the base.
    pub custom_sources: Option<Vec<SchemaSource>>,

    /// How the user schema is combined with the base.
    pub policy: MergePolicy,

    /// Restrict the result to these flat-name prefixes.
    pub prefixes: Option<PrefixSet>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_sources: builtin_sources(),
            custom_sources: None,
            policy: MergePolicy::default(),
            prefixes: None,
        }
    }
}

impl PipelineConfig {
    /// Whether this run only checks a schema rather than building full docs.
    pub fn is_preflight(&self) -> bool {
        self.policy == MergePolicy::Validate || self.prefixes.is_some()
    }
}

/// Run the pipeline and return the canonical structures.
///
/// The prefix filter, when configured, is applied after the merge.
pub fn run(config: &PipelineConfig) -> Result<CanonicalSchema> {
    info!("loading default schemas");
    let mut schema = load(&config.default_sources)?;

    if let Some(custom_sources) = &config.custom_sources {
        info!(sources = custom_sources.len(), "loading user defined schemas");
        let custom = load(custom_sources)?;
        schema = merge(&schema, custom, config.policy)?;
    }

    if let Some(prefixes) = &config.prefixes {
        schema = filter_by_prefix(&schema, prefixes);
    }

    schema.check_consistency()?;

    let stripped = strip(&schema.flat);
    Ok(CanonicalSchema {
        nested: schema.nested,
        flat: schema.flat,
        stripped,
    })
}

/// Run the pipeline, then generate artifacts into `output_dir`.
///
/// Generation starts only after every pipeline stage has succeeded, so a
/// failed run writes nothing. Pre-flight runs skip documentation.
pub fn build(
    config: &PipelineConfig,
    version: &str,
    intermediate_only: bool,
    output_dir: &Path,
) -> Result<GenerationStats> {
    let canonical = run(config)?;
    let options = GenerateOptions {
        version: version.to_string(),
        intermediate_only,
        preflight: config.is_preflight(),
    };
    generate(&canonical, &options, output_dir)
}

/// Read the schema version string from a file, trimming trailing whitespace.
pub fn read_version(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let version = content.trim_end().to_string();
    if version.is_empty() {
        return Err(Error::Schema(format!(
            "version file {} is empty",
            path.display()
        )));
    }
    Ok(version)
}
