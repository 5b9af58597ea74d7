//! CLI interface for tickshift
//!
//! Provides subcommands for:
//! - `serve`: run the WebSocket replay server
//! - `instruments`: list datasets available in the data directory
//! - `status`: show current state
//! - `config`: show configuration

mod instruments;
mod serve;

pub use instruments::InstrumentsArgs;
pub use serve::ServeArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tickshift")]
#[command(about = "Market replay and position simulation engine")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the WebSocket replay server
    Serve(ServeArgs),
    /// List datasets available in the data directory
    Instruments(InstrumentsArgs),
    /// Show current state
    Status,
    /// Show configuration
    Config,
}
