//! CLI command definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Simulated wearable heart-rate telemetry
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the log level (overridden by RUST_LOG)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, env = "WEARABLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Main command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the gRPC telemetry server
    Serve {
        /// Address to listen on
        #[arg(long, env = "WEARABLE_LISTEN_ADDR")]
        listen_addr: Option<String>,

        /// Push-sender address used for alerts
        #[arg(long, env = "WEARABLE_PUSH_SENDER_ADDR")]
        push_sender_addr: Option<String>,
    },

    /// Connect to a server and print the heart-rate stream
    Stream {
        /// Server address
        #[arg(short, long, default_value = "http://127.0.0.1:50051")]
        addr: String,

        /// Wearable identifier sent with the request
        #[arg(short, long, default_value = "")]
        uuid: String,

        /// Print one JSON object per reading
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        /// Configuration action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// List all configuration
    List,
    /// Show configuration file path
    Path,
}
