//! CLI command definitions.
//!
//! The CLI structure is defined with clap's derive macros; the `Cli` struct
//! is the entry point and `serve` is the default subcommand.

use clap::{Parser, Subcommand};

/// Default port for the HTTP API.
pub const DEFAULT_PORT: u16 = 8080;

/// Task board server and CLI tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to database file (default: platform data directory)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Port for the HTTP API (default: 8080)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server (default if no subcommand given)
    Serve,
}
