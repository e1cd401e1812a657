//! Client configuration
//!
//! Options are plain values with sensible defaults; the binary fills them in
//! from command-line flags.

use std::path::PathBuf;
use std::time::Duration;

/// Default zdb binary, resolved through `PATH`
pub const DEFAULT_ZDB_BIN: &str = "zdb";

/// Cache TTL used when none is configured
pub const DEFAULT_CACHE_TTL_SECS: i64 = 300;

/// Configuration for a `ZdbClient`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Path or name of the zdb binary
    pub zdb_bin: PathBuf,
    /// Run zdb through `sudo`
    pub sudo: bool,
    /// Cache TTL in seconds; `None` uses the default, zero or less disables caching
    pub cache_ttl_secs: Option<i64>,
    /// Kill zdb if it runs longer than this
    pub command_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            zdb_bin: PathBuf::from(DEFAULT_ZDB_BIN),
            sudo: false,
            cache_ttl_secs: None,
            command_timeout: None,
        }
    }
}

impl ClientOptions {
    /// Effective cache TTL in seconds
    pub fn cache_ttl_secs(&self) -> i64 {
        self.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS)
    }

    pub fn caching_enabled(&self) -> bool {
        self.cache_ttl_secs() > 0
    }
}
