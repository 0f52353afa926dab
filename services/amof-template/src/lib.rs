//! Command-line front end for AMOF netCDF template generation.

pub mod cli;
pub mod commands;
pub mod config;

pub use cli::Cli;
pub use commands::execute;
pub use config::Settings;
