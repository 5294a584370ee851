use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ecs_field_gen::filter::PrefixSet;
use ecs_field_gen::merge::MergePolicy;
use ecs_field_gen::pipeline::{PipelineConfig, build, read_version};
use ecs_field_gen::schema::{builtin_sources, sources_in_dir};

/// Generate field artifacts from a grouped YAML field schema.
///
/// Loads the default schema corpus, optionally merges or validates a directory
/// of custom field definitions, optionally narrows the result to the prefixes
/// of an object selection file, and writes intermediate files, a CSV catalog,
/// an index mapping template, Beats field definitions and Markdown docs.
#[derive(Parser)]
#[command(name = "ecs-field-gen", version, about)]
struct Cli {
    /// Generate intermediate files only.
    #[arg(long)]
    intermediate_only: bool,

    /// Include a directory of custom field definitions (*.yml).
    #[arg(long, value_name = "DIR")]
    include: Option<PathBuf>,

    /// Validate the custom field definitions against the default schema
    /// instead of merging them. Stops before documentation is generated.
    #[arg(long, requires = "include")]
    validate: bool,

    /// Build only fields whose names start with a prefix listed in this file.
    /// Stops before documentation is generated.
    #[arg(long, value_name = "FILE")]
    object: Option<PathBuf>,

    /// Load the default schema from this directory instead of the built-in
    /// corpus.
    #[arg(long, value_name = "DIR", env = "ECS_SCHEMA_DIR")]
    schema_dir: Option<PathBuf>,

    /// Output directory for generated files.
    #[arg(long, default_value = "generated")]
    out: PathBuf,

    /// File holding the schema version string.
    #[arg(long, default_value = "version")]
    version_file: PathBuf,

    /// Suppress non-error output.
    #[arg(long, short)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    if let Err(e) = run_cli(cli) {
        eprintln!("error: {e}");

        // Print cause chain.
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }

        process::exit(1);
    }
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_cli(cli: Cli) -> ecs_field_gen::error::Result<()> {
    let version = read_version(&cli.version_file)?;
    info!(%version, "running generator");

    let default_sources = match &cli.schema_dir {
        Some(dir) => sources_in_dir(dir)?,
        None => builtin_sources(),
    };
    let custom_sources = cli.include.as_deref().map(sources_in_dir).transpose()?;
    let prefixes = cli.object.as_deref().map(PrefixSet::load).transpose()?;

    let config = PipelineConfig {
        default_sources,
        custom_sources,
        policy: if cli.validate {
            MergePolicy::Validate
        } else {
            MergePolicy::SafeMerge
        },
        prefixes,
    };

    let stats = build(&config, &version, cli.intermediate_only, &cli.out)?;

    info!(
        groups = stats.groups,
        fields = stats.fields,
        artifacts = stats.artifacts_written,
        stages = ?stats.stages,
        "done"
    );
    Ok(())
}
