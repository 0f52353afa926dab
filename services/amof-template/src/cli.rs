//! Command-line arguments.

use std::path::PathBuf;

use amof_common::DeploymentMode;
use amof_netcdf::MetadataFormat;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "amof-template")]
#[command(about = "Create and complete AMOF netCDF files from the NCAS controlled vocabularies")]
pub struct Cli {
    #[command(flatten)]
    pub vocab: VocabArgs,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Where the vocabulary comes from.
#[derive(Args, Debug, Clone)]
pub struct VocabArgs {
    /// Base URL of the vocabulary repository
    #[arg(long, env = "AMOF_VOCAB_URL", global = true)]
    pub vocab_url: Option<String>,

    /// Vocabulary version tag, e.g. v2.0.0
    #[arg(long, env = "AMOF_VOCAB_VERSION", global = true)]
    pub vocab_version: Option<String>,

    /// Local mirror of the vocabulary repository (no network access)
    #[arg(long, env = "AMOF_VOCAB_PATH", global = true)]
    pub vocab_path: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long, env = "AMOF_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a file for an instrument and one or more data products
    Create(CreateArgs),

    /// Create a file for a data product without a registered instrument
    CreateFromProduct(ProductArgs),

    /// List available data products
    ListProducts {
        /// Only products of this instrument
        #[arg(long)]
        instrument: Option<String>,
    },

    /// Print the resolved schema as JSON without creating a file
    Resolve(ResolveArgs),

    /// Write data into a variable of an existing file
    Update(UpdateArgs),

    /// Derive time fields from timestamps, optionally writing them to a file
    Times(TimesArgs),

    /// Merge a CSV, JSON, YAML or XML metadata file into an existing file
    AddMetadata(MetadataArgs),

    /// Replace the flag set of a QC variable
    ChangeQcFlags(QcFlagArgs),

    /// Remove variables that hold only fill values
    Prune(PruneArgs),

    /// List attributes still holding placeholders
    Placeholders {
        /// netCDF file to inspect
        file: PathBuf,
    },
}

/// Options shared by the file-creating commands.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Deployment mode: land, sea, air or trajectory
    #[arg(long, default_value = "land")]
    pub mode: DeploymentMode,

    /// Platform name; defaults to the instrument's site, else "mobile"
    #[arg(long)]
    pub platform: Option<String>,

    /// Date stamp for the file name (YYYYMMDD[-HH[MM[SS]]]); defaults to today
    #[arg(long)]
    pub date: Option<String>,

    /// Extra file name option (up to 3)
    #[arg(long = "option")]
    pub options: Vec<String>,

    /// Product version for the file name
    #[arg(long)]
    pub product_version: Option<String>,

    /// Dimension length as NAME=LENGTH
    #[arg(long = "dim", value_parser = parse_dimension)]
    pub dimensions: Vec<(String, usize)>,

    /// Prompt for dimension lengths not given on the command line
    #[arg(long)]
    pub interactive: bool,

    /// Directory for the new file
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Metadata file merged into the new file
    #[arg(long)]
    pub metadata: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Instrument name from the vocabulary
    #[arg(long)]
    pub instrument: String,

    /// Data product (repeat for several)
    #[arg(long = "product", required = true)]
    pub products: Vec<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ProductArgs {
    /// Data product
    #[arg(long)]
    pub product: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Instrument name; without it the product is resolved on its own
    #[arg(long)]
    pub instrument: Option<String>,

    /// Data product (repeat for several)
    #[arg(long = "product", required = true)]
    pub products: Vec<String>,

    #[arg(long, default_value = "land")]
    pub mode: DeploymentMode,

    #[arg(long)]
    pub platform: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    /// netCDF file to update
    pub file: PathBuf,

    /// Variable to write
    #[arg(long)]
    pub variable: String,

    /// Text file of values separated by commas or whitespace, in row-major order
    #[arg(long)]
    pub data: PathBuf,

    /// Write QC data outside flag_values with a warning instead of failing
    #[arg(long)]
    pub lenient_qc: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TimesArgs {
    /// Text file with one RFC 3339 timestamp per line
    #[arg(long)]
    pub times: PathBuf,

    /// netCDF file to write the time variables into
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct MetadataArgs {
    /// netCDF file to update
    pub file: PathBuf,

    /// Metadata file
    #[arg(long)]
    pub metadata: PathBuf,

    /// Metadata format; taken from the extension when omitted
    #[arg(long, value_parser = parse_format)]
    pub format: Option<MetadataFormat>,

    /// Set geospatial_bounds from latitude and longitude entries
    #[arg(long)]
    pub geospatial_bounds: bool,
}

#[derive(Args, Debug, Clone)]
pub struct QcFlagArgs {
    /// netCDF file to update
    pub file: PathBuf,

    /// QC variable
    #[arg(long)]
    pub variable: String,

    /// Flag meaning after not_used and good_data (repeat, in order)
    #[arg(long = "meaning", required = true)]
    pub meanings: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct PruneArgs {
    /// netCDF file to prune
    pub file: PathBuf,

    /// Extra variable to keep even if empty (repeat for several)
    #[arg(long = "keep")]
    pub keep: Vec<String>,

    /// Instrument the file was created for
    #[arg(long)]
    pub instrument: Option<String>,

    /// Data product the file was created for (repeat for several). With
    /// products given, the common variables of the resolved schema are kept;
    /// without, the standard time and location set is.
    #[arg(long = "product")]
    pub products: Vec<String>,

    #[arg(long, default_value = "land")]
    pub mode: DeploymentMode,

    #[arg(long)]
    pub platform: Option<String>,
}

fn parse_dimension(raw: &str) -> Result<(String, usize), String> {
    let (name, length) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=LENGTH, got '{}'", raw))?;
    let length = length
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid length for {}: {}", name, e))?;
    Ok((name.trim().to_string(), length))
}

fn parse_format(raw: &str) -> Result<MetadataFormat, String> {
    raw.parse().map_err(|e: amof_netcdf::NetcdfError| e.to_string())
}
