//! Command implementations.
//!
//! Each command returns its user-facing output as lines, so `main` stays a
//! thin printer and the commands can be tested without capturing stdout.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use amof_common::{get_times, DeploymentMode, QcFlagSet};
use amof_netcdf::{
    apply_time_fields, change_qc_flags, find_placeholders, update_variable_with,
    EmptyVariablePruner, FileBuilder, FileNameComponents, MetadataMerger, PromptProvider,
    UpdateOptions, STANDARD_DIMENSIONS, STANDARD_VARIABLES,
};
use amof_schema::{list_products, ResolvedSchema, SchemaResolver};
use amof_vocab::{VocabularyStore, VocabularyTables};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::cli::{
    Command, CreateArgs, MetadataArgs, OutputArgs, ProductArgs, PruneArgs, QcFlagArgs,
    ResolveArgs, TimesArgs, UpdateArgs,
};
use crate::config::Settings;

/// Run one command and return the lines to print.
pub fn execute(command: Command, settings: &Settings) -> Result<Vec<String>> {
    match command {
        Command::Create(args) => create(args, settings),
        Command::CreateFromProduct(args) => create_from_product(args, settings),
        Command::ListProducts { instrument } => list(instrument.as_deref(), settings),
        Command::Resolve(args) => resolve(args, settings),
        Command::Update(args) => update(args),
        Command::Times(args) => times(args),
        Command::AddMetadata(args) => add_metadata(args),
        Command::ChangeQcFlags(args) => change_flags(args),
        Command::Prune(args) => prune(args, settings),
        Command::Placeholders { file } => placeholders(&file),
    }
}

fn load_tables(settings: &Settings) -> Result<Arc<VocabularyTables>> {
    let mut store = VocabularyStore::new();
    store
        .load(
            &settings.vocab_url,
            &settings.vocab_version,
            settings.vocab_path.as_deref(),
        )
        .with_context(|| format!("Failed to load vocabulary {}", settings.vocab_version))
}

// ============================================================================
// File creation
// ============================================================================

fn create(args: CreateArgs, settings: &Settings) -> Result<Vec<String>> {
    let tables = load_tables(settings)?;
    let schema = SchemaResolver::new(&tables).resolve(
        &args.instrument,
        &args.products,
        args.output.mode,
        args.output.platform.as_deref(),
    )?;
    build(&schema, &args.output, settings)
}

fn create_from_product(args: ProductArgs, settings: &Settings) -> Result<Vec<String>> {
    let tables = load_tables(settings)?;
    let schema = SchemaResolver::new(&tables).resolve_for_product(
        &args.product,
        args.output.mode,
        args.output.platform.as_deref(),
    )?;
    build(&schema, &args.output, settings)
}

fn build(schema: &ResolvedSchema, output: &OutputArgs, settings: &Settings) -> Result<Vec<String>> {
    let mut lengths: HashMap<String, usize> = settings.dimension_lengths.clone();
    lengths.extend(output.dimensions.iter().cloned());

    let mut names = FileNameComponents::from_schema(schema)
        .with_options(output.options.iter().cloned())
        .with_version(
            output
                .product_version
                .clone()
                .unwrap_or_else(|| settings.product_version.clone()),
        );
    if let Some(date) = &output.date {
        names = names.with_date(date.clone());
    }

    let mut builder = FileBuilder::new(schema).with_lengths(lengths);
    if output.interactive {
        builder = builder.with_provider(PromptProvider::stdin());
    }
    let location = output.output_dir.as_ref().unwrap_or(&settings.output_dir);
    let mut built = builder
        .build(location, &names)
        .context("Failed to create file")?;

    if let Some(metadata) = &output.metadata {
        MetadataMerger::new()
            .apply(&mut built.file, metadata, None)
            .with_context(|| format!("Failed to merge metadata from {}", metadata.display()))?;
    }
    Ok(vec![built.path.display().to_string()])
}

// ============================================================================
// Read-only commands
// ============================================================================

fn list(instrument: Option<&str>, settings: &Settings) -> Result<Vec<String>> {
    let tables = load_tables(settings)?;
    match instrument {
        Some(id) => Ok(SchemaResolver::new(&tables).list_instrument_products(id)?),
        None => Ok(list_products(&tables)),
    }
}

fn resolve(args: ResolveArgs, settings: &Settings) -> Result<Vec<String>> {
    let tables = load_tables(settings)?;
    let schema = resolve_request(
        &tables,
        args.instrument.as_deref(),
        &args.products,
        args.mode,
        args.platform.as_deref(),
    )?;
    Ok(vec![serde_json::to_string_pretty(&schema)?])
}

/// Resolve with an instrument when given, else a single product on its own.
fn resolve_request(
    tables: &VocabularyTables,
    instrument: Option<&str>,
    products: &[String],
    mode: DeploymentMode,
    platform: Option<&str>,
) -> Result<ResolvedSchema> {
    let resolver = SchemaResolver::new(tables);
    let schema = match (instrument, products) {
        (_, []) => anyhow::bail!("At least one --product is required"),
        (Some(instrument), products) => resolver.resolve(instrument, products, mode, platform)?,
        (None, [product]) => resolver.resolve_for_product(product, mode, platform)?,
        (None, _) => anyhow::bail!("Resolving several products requires --instrument"),
    };
    Ok(schema)
}

fn placeholders(file: &Path) -> Result<Vec<String>> {
    let file = netcdf::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    Ok(find_placeholders(&file))
}

// ============================================================================
// File updates
// ============================================================================

fn open_for_update(path: &Path) -> Result<netcdf::FileMut> {
    netcdf::append(path).with_context(|| format!("Failed to open {} for writing", path.display()))
}

/// Numbers separated by commas or whitespace. `nan` marks missing values.
fn parse_numbers(text: &str) -> Result<Vec<f64>> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .with_context(|| format!("Invalid number '{}'", s))
        })
        .collect()
}

fn read_timestamps(path: &Path) -> Result<Vec<DateTime<Utc>>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            DateTime::parse_from_rfc3339(l)
                .map(|t| t.with_timezone(&Utc))
                .with_context(|| format!("Invalid timestamp '{}'", l))
        })
        .collect()
}

fn update(args: UpdateArgs) -> Result<Vec<String>> {
    let text = fs::read_to_string(&args.data)
        .with_context(|| format!("Failed to read {}", args.data.display()))?;
    let data = parse_numbers(&text)?;

    let mut file = open_for_update(&args.file)?;
    let options = UpdateOptions {
        qc_data_error: !args.lenient_qc,
    };
    update_variable_with(&mut file, &args.variable, &data, options)?;
    info!(variable = %args.variable, count = data.len(), "Updated variable");
    Ok(Vec::new())
}

fn times(args: TimesArgs) -> Result<Vec<String>> {
    let timestamps = read_timestamps(&args.times)?;
    let fields = get_times(&timestamps)?;

    if let Some(path) = &args.file {
        let mut file = open_for_update(path)?;
        apply_time_fields(&mut file, &fields)?;
    }
    Ok(vec![serde_json::to_string_pretty(&fields)?])
}

fn add_metadata(args: MetadataArgs) -> Result<Vec<String>> {
    let mut file = open_for_update(&args.file)?;
    let applied = MetadataMerger::new()
        .with_geospatial_bounds(args.geospatial_bounds)
        .apply(&mut file, &args.metadata, args.format)?;
    Ok(applied)
}

fn change_flags(args: QcFlagArgs) -> Result<Vec<String>> {
    let flags = QcFlagSet::with_meanings(args.meanings.as_slice())?;
    let mut file = open_for_update(&args.file)?;
    change_qc_flags(&mut file, &args.variable, &flags)?;
    Ok(Vec::new())
}

fn prune(args: PruneArgs, settings: &Settings) -> Result<Vec<String>> {
    let standard = args.instrument.is_none() && args.products.is_empty();
    let (variables, dimensions): (Vec<String>, Vec<String>) = if standard {
        (
            STANDARD_VARIABLES.iter().map(|s| s.to_string()).collect(),
            STANDARD_DIMENSIONS.iter().map(|s| s.to_string()).collect(),
        )
    } else {
        let tables = load_tables(settings)?;
        let schema = resolve_request(
            &tables,
            args.instrument.as_deref(),
            &args.products,
            args.mode,
            args.platform.as_deref(),
        )?;
        (schema.common_variable_names(), schema.common_dimension_names())
    };
    let variables: Vec<String> = variables.into_iter().chain(args.keep).collect();
    let pruner = EmptyVariablePruner::new(variables, dimensions);
    let removed = pruner
        .prune(&args.file)
        .with_context(|| format!("Failed to prune {}", args.file.display()))?;
    Ok(removed)
}
