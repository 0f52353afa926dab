//! AMOF netCDF template tool.
//!
//! Creates netCDF files that follow the NCAS AMOF conventions from the
//! controlled vocabularies, then fills in data and metadata.

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use amof_template::{execute, Cli, Settings};

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let logger = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if cli.log_json {
        logger.json().init();
    } else {
        logger.init();
    }

    amof_netcdf::silence_hdf5_errors();

    let settings = Settings::resolve(&cli.vocab)?;
    debug!(command = ?cli.command, "Running command");
    for line in execute(cli.command, &settings)? {
        println!("{}", line);
    }
    Ok(())
}
