//! CLI argument types - shared between binary and tests

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "greater")]
#[command(about = "Greater gateway - serves the UI and relays Google API calls for the browser")]
#[command(version)]
pub enum Cli {
    /// Start the gateway
    Serve(ServeArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
    /// Print the configuration JSON schema
    Schema(SchemaArgs),
}

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,
    /// Host to bind to
    #[arg(short = 'H', long)]
    pub host: Option<String>,
    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Log level, overridden by RUST_LOG
    #[arg(short, long)]
    pub log_level: Option<String>,
    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
    /// Directory with the static UI bundle
    #[arg(long)]
    pub assets: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "greater.toml")]
    pub config: String,
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct SchemaArgs {
    /// Write the schema to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
