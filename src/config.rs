//! Configuration management for tilestack.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `TILESTACK_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Commands
//!
//! - `serve` - Start the tile server
//! - `check` - Discover tilesets and print their metadata and the stack
//!
//! # Environment Variables
//!
//! - `TILESTACK_HOST` - Server bind address (default: 0.0.0.0)
//! - `TILESTACK_PORT` - Server port (default: 3000)
//! - `TILESTACK_PATHS` - MBTiles files or directories (comma-separated)
//! - `TILESTACK_STACK_ORDER` - Stack members, highest priority first (comma-separated)
//! - `TILESTACK_CACHE_SOURCES` - Max open sources to keep (default: 64)
//! - `TILESTACK_MAX_CONNECTIONS` - SQLite connections per source (default: 4)
//! - `TILESTACK_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `TILESTACK_CORS_ORIGINS` - Allowed CORS origins (comma-separated)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::source::{DEFAULT_MAX_CONNECTIONS, DEFAULT_SOURCE_CACHE_CAPACITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// CLI
// =============================================================================

/// tilestack - a vector tile server for MBTiles files.
///
/// Serves tiles from individual tilesets and from a priority-ordered stack
/// of tilesets, falling back to an empty tile when none has data.
#[derive(Parser, Debug, Clone)]
#[command(name = "tilestack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the tile server
    Serve(ServeConfig),

    /// Discover tilesets and report their metadata and the effective stack
    Check(CheckConfig),
}

// =============================================================================
// Serve
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// MBTiles files, or directories to scan for *.mbtiles.
    #[arg(
        value_name = "PATHS",
        required = true,
        env = "TILESTACK_PATHS",
        value_delimiter = ','
    )]
    pub paths: Vec<PathBuf>,

    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "TILESTACK_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TILESTACK_PORT")]
    pub port: u16,

    /// Source names for the stack, highest priority first (comma-separated).
    ///
    /// Defaults to every discovered source in discovery order.
    #[arg(long, env = "TILESTACK_STACK_ORDER", value_delimiter = ',')]
    pub stack_order: Option<Vec<String>>,

    /// Maximum number of open sources to keep.
    #[arg(long, default_value_t = DEFAULT_SOURCE_CACHE_CAPACITY, env = "TILESTACK_CACHE_SOURCES")]
    pub cache_sources: usize,

    /// SQLite connections per source.
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS, env = "TILESTACK_MAX_CONNECTIONS")]
    pub max_connections: u32,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "TILESTACK_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "TILESTACK_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.paths.is_empty() {
            return Err(
                "At least one MBTiles path is required. Pass PATHS or set TILESTACK_PATHS"
                    .to_string(),
            );
        }

        if self.cache_sources == 0 {
            return Err("cache_sources must be greater than 0".to_string());
        }

        if self.max_connections == 0 {
            return Err("max_connections must be greater than 0".to_string());
        }

        validate_stack_order(self.stack_order.as_deref())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Check
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// MBTiles files, or directories to scan for *.mbtiles.
    #[arg(
        value_name = "PATHS",
        required = true,
        env = "TILESTACK_PATHS",
        value_delimiter = ','
    )]
    pub paths: Vec<PathBuf>,

    /// Source names for the stack, highest priority first (comma-separated).
    #[arg(long, env = "TILESTACK_STACK_ORDER", value_delimiter = ',')]
    pub stack_order: Option<Vec<String>>,

    /// SQLite connections per source.
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS, env = "TILESTACK_MAX_CONNECTIONS")]
    pub max_connections: u32,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CheckConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_connections == 0 {
            return Err("max_connections must be greater than 0".to_string());
        }
        validate_stack_order(self.stack_order.as_deref())
    }
}

fn validate_stack_order(order: Option<&[String]>) -> Result<(), String> {
    match order {
        Some([]) => Err("stack_order must name at least one source".to_string()),
        Some(names) if names.iter().any(|n| n.trim().is_empty()) => {
            Err("stack_order contains an empty source name".to_string())
        }
        _ => Ok(()),
    }
}

/// Names in `order` that are not in `known`, in the order given.
pub fn unknown_stack_members<'a>(order: &'a [String], known: &[String]) -> Vec<&'a str> {
    order
        .iter()
        .filter(|name| !known.contains(*name))
        .map(String::as_str)
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
