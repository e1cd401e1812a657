//! Command-line interface parsing for zdbtree
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the `ClientOptions` used to build a `ZdbClient`.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::ClientOptions;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A zero timeout would kill zdb before it could print anything
    #[error("Invalid timeout: must be at least 1 second")]
    InvalidTimeout,
}

/// zdbtree - Show the vdev tree of a ZFS pool as reported by `zdb -C`
#[derive(Parser, Debug)]
#[command(name = "zdbtree")]
#[command(about = "Show the vdev tree of a ZFS pool as reported by zdb")]
#[command(version)]
pub struct Cli {
    /// Name of the pool to inspect
    pub pool: String,

    /// Pool GUID, if known; reported back verbatim and used as part of the cache key
    #[arg(long, default_value = "")]
    pub guid: String,

    /// Print the pool as JSON instead of a tree
    #[arg(long)]
    pub json: bool,

    /// Run zdb through sudo
    #[arg(long)]
    pub sudo: bool,

    /// Path to the zdb binary
    #[arg(long, value_name = "PATH")]
    pub zdb_bin: Option<PathBuf>,

    /// Cache TTL in seconds (0 or less disables caching)
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub cache_ttl: Option<i64>,

    /// Kill zdb if it runs longer than this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Parse a saved `zdb -C` dump instead of running zdb
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set
    pub fn default_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

impl ClientOptions {
    /// Creates client options from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(ClientOptions)` with defaults filled in for unset flags
    /// * `Err(CliError)` if a flag value is out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let command_timeout = match cli.timeout {
            None => None,
            Some(0) => return Err(CliError::InvalidTimeout),
            Some(secs) => Some(Duration::from_secs(secs)),
        };

        let defaults = ClientOptions::default();
        Ok(ClientOptions {
            zdb_bin: cli.zdb_bin.clone().unwrap_or(defaults.zdb_bin),
            sudo: cli.sudo,
            cache_ttl_secs: cli.cache_ttl,
            command_timeout,
        })
    }
}
