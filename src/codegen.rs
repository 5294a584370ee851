//! Artifact generation from the canonical schema.
//!
//! Generates, in stage order:
//! - **Intermediate** files: `ecs/ecs_nested.yml`, `ecs/ecs_flat.yml`,
//!   `ecs/ecs_stripped_flat.yml`
//! - **Catalog** files: `csv/fields.csv`, `elasticsearch/template.json`
//! - **Documentation**: `beats/fields.ecs.yml`, `docs/fields.md`
//!
//! `intermediate_only` stops after the first stage; pre-flight runs (validate
//! policy or object selection) stop after the catalog.
//!
//! Every selected artifact is rendered in memory before the first file is
//! written, so a rendering failure leaves the output directory untouched. The
//! output is deterministic: identical input always produces byte-identical
//! files.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::strip::CanonicalSchema;
use crate::{beats, csv_export, docs, es_template};

/// A group of artifacts that are generated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Intermediate,
    Catalog,
    Documentation,
}

/// Options controlling which stages run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Schema version stamped into the catalog and docs.
    pub version: String,

    /// Stop after the intermediate files.
    pub intermediate_only: bool,

    /// The run is a pre-flight check; skip documentation.
    pub preflight: bool,
}

impl GenerateOptions {
    /// The stages this run produces, in order.
    pub fn stages(&self) -> Vec<Stage> {
        if self.intermediate_only {
            vec![Stage::Intermediate]
        } else if self.preflight {
            vec![Stage::Intermediate, Stage::Catalog]
        } else {
            vec![Stage::Intermediate, Stage::Catalog, Stage::Documentation]
        }
    }
}

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the output directory.
    pub path: PathBuf,
    pub content: String,
}

impl Artifact {
    fn new(path: impl Into<PathBuf>, content: String) -> Self {
        Self {
            path: path.into(),
            content,
        }
    }
}

/// Statistics collected during generation for reporting.
#[derive(Debug, Default)]
pub struct GenerationStats {
    pub groups: usize,
    pub fields: usize,
    pub artifacts_written: usize,
    pub stages: Vec<Stage>,
}

/// Render and write every artifact selected by `options`.
pub fn generate(
    schema: &CanonicalSchema,
    options: &GenerateOptions,
    output_dir: &Path,
) -> Result<GenerationStats> {
    let artifacts = render(schema, options)?;
    write_artifacts(output_dir, &artifacts)?;

    Ok(GenerationStats {
        groups: schema.nested.len(),
        fields: schema.flat.len(),
        artifacts_written: artifacts.len(),
        stages: options.stages(),
    })
}

/// Render every artifact selected by `options` without touching the disk.
pub fn render(schema: &CanonicalSchema, options: &GenerateOptions) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();

    for stage in options.stages() {
        debug!(?stage, "rendering stage");
        match stage {
            Stage::Intermediate => {
                artifacts.push(Artifact::new(
                    "ecs/ecs_nested.yml",
                    to_yaml(&schema.nested, "nested schema")?,
                ));
                artifacts.push(Artifact::new(
                    "ecs/ecs_flat.yml",
                    to_yaml(&schema.flat, "flat schema")?,
                ));
                artifacts.push(Artifact::new(
                    "ecs/ecs_stripped_flat.yml",
                    to_yaml(&schema.stripped, "stripped flat schema")?,
                ));
            }
            Stage::Catalog => {
                artifacts.push(Artifact::new(
                    "csv/fields.csv",
                    csv_export::generate(&schema.flat, &options.version)?,
                ));
                artifacts.push(Artifact::new(
                    "elasticsearch/template.json",
                    es_template::generate(&schema.flat, &options.version)?,
                ));
            }
            Stage::Documentation => {
                artifacts.push(Artifact::new(
                    "beats/fields.ecs.yml",
                    beats::generate(&schema.nested, &options.version)?,
                ));
                artifacts.push(Artifact::new(
                    "docs/fields.md",
                    docs::generate(&schema.nested, &options.version),
                ));
            }
        }
    }

    Ok(artifacts)
}

/// Write rendered artifacts under `output_dir`.
pub fn write_artifacts(output_dir: &Path, artifacts: &[Artifact]) -> Result<()> {
    for artifact in artifacts {
        let path = output_dir.join(&artifact.path);
        write_file(&path, &artifact.content)?;
        debug!(path = %path.display(), bytes = artifact.content.len(), "wrote artifact");
    }
    info!(
        count = artifacts.len(),
        dir = %output_dir.display(),
        "artifacts written"
    );
    Ok(())
}

/// Render a YAML example value as plain text.
///
/// Strings are used as-is, other scalars use their YAML spelling, and
/// sequences or mappings are rendered as block YAML.
pub fn example_text(example: Option<&serde_yaml::Value>) -> String {
    match example {
        None | Some(serde_yaml::Value::Null) => String::new(),
        Some(serde_yaml::Value::String(s)) => s.clone(),
        Some(serde_yaml::Value::Bool(b)) => b.to_string(),
        Some(serde_yaml::Value::Number(n)) => n.to_string(),
        Some(other) => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn to_yaml<T: serde::Serialize>(value: &T, what: &str) -> Result<String> {
    serde_yaml::to_string(value).map_err(|e| Error::Codegen(format!("serializing {what}: {e}")))
}

/// Write content to a file, creating parent directories as needed.
fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_selection() {
        let full = GenerateOptions::default();
        assert_eq!(
            full.stages(),
            vec![Stage::Intermediate, Stage::Catalog, Stage::Documentation]
        );

        let preflight = GenerateOptions {
            preflight: true,
            ..GenerateOptions::default()
        };
        assert_eq!(preflight.stages(), vec![Stage::Intermediate, Stage::Catalog]);

        let intermediate = GenerateOptions {
            intermediate_only: true,
            preflight: true,
            ..GenerateOptions::default()
        };
        assert_eq!(intermediate.stages(), vec![Stage::Intermediate]);
    }

    #[test]
    fn example_text_renders_scalars() {
        use serde_yaml::Value;

        assert_eq!(example_text(None), "");
        assert_eq!(example_text(Some(&Value::Null)), "");
        assert_eq!(example_text(Some(&Value::from("abc"))), "abc");
        assert_eq!(example_text(Some(&Value::from(true))), "true");
        assert_eq!(example_text(Some(&Value::from(443))), "443");
    }

    #[test]
    fn example_text_renders_sequences() {
        let value: serde_yaml::Value = serde_yaml::from_str("[a, b]").unwrap();
        assert_eq!(example_text(Some(&value)), "- a\n- b");
    }

    #[test]
    fn full_run_renders_every_artifact() {
        let artifacts = render(&CanonicalSchema::default(), &GenerateOptions::default()).unwrap();
        let paths: Vec<&Path> = artifacts.iter().map(|a| a.path.as_path()).collect();

        assert_eq!(
            paths,
            vec![
                Path::new("ecs/ecs_nested.yml"),
                Path::new("ecs/ecs_flat.yml"),
                Path::new("ecs/ecs_stripped_flat.yml"),
                Path::new("csv/fields.csv"),
                Path::new("elasticsearch/template.json"),
                Path::new("beats/fields.ecs.yml"),
                Path::new("docs/fields.md"),
            ]
        );
    }

    #[test]
    fn write_artifacts_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(
            dir.path(),
            &[Artifact::new("a/b/c.txt", "hello".to_string())],
        )
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a/b/c.txt")).unwrap(),
            "hello"
        );
    }
}
