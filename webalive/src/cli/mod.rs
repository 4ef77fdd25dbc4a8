//! CLI module for webalive
//!
//! Provides command-line interface for the web alive checker.

pub mod check;
pub mod serve;

use clap::{Parser, Subcommand};

/// Web alive checker - periodic HTTP endpoint health checks
#[derive(Parser, Debug)]
#[command(name = "webalive")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    WEBALIVE_CONFIG         Path to the YAML configuration (default: webalive.yaml)
    WEBALIVE_HOST           Status API bind address (default: 127.0.0.1)
    WEBALIVE_PORT           Status API listen port (default: 8123)
    WEBALIVE_LOG_LEVEL      Log filter (default: info)
    WEBALIVE_LOG_DIR        Directory for daily-rotated JSON logs (optional)
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the checker until interrupted
    Serve(serve::ServeArgs),
    /// Probe a single URL once and print the result
    Check(check::CheckArgs),
}
